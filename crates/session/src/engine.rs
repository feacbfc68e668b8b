//! The session engine: single owner of all per-session alignment state.

use chrono::{DateTime, Utc};
use orator_align::{AlignedWord, AlignmentMatcher, MatcherConfig, WordAlignmentState};
use orator_events::event_names::{SESSION_ALIGNED, SESSION_FINALIZED, SESSION_FLOW_EVENT};
use orator_events::{EventBusRef, FlowEvent, FlowEventKind};
use orator_fillers::{classify, FillerLexicon};
use orator_score::{compute, ScoreBreakdown, ScoreInputs};
use orator_text::{normalize, passage_accuracy, tokenize};
use orator_timing::{rhythm_stability, words_per_minute};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

/// Tunables for a session. `Default` carries the canonical values.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub matcher: MatcherConfig,
    pub lexicon: FillerLexicon,
    /// Gap between consecutive word timestamps flagged as a hesitation.
    pub hesitation_gap_secs: f64,
    /// Consecutive correct words that mark a strong moment.
    pub strong_moment_run: usize,
    /// Consecutive stumbles that mark a flow break.
    pub flow_break_run: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            lexicon: FillerLexicon::default(),
            hesitation_gap_secs: 1.5,
            strong_moment_run: 8,
            flow_break_run: 3,
        }
    }
}

/// Everything measured about a finished session. Built exactly once at
/// finalize and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    /// Speaking rate over real speech tokens (hard fillers excluded;
    /// context words count even when over allowance).
    pub wpm: u32,
    pub filler_count: usize,
    pub filler_words: Vec<String>,
    /// In-order alignment accuracy from the live matcher, `0..=100`.
    pub accuracy_percent: f64,
    /// Order-independent fuzzy-match accuracy over the whole passage.
    pub fuzzy_accuracy_percent: f64,
    /// Reference words no spoken word fuzzy-matched, capped at 15.
    pub missed_words: Vec<String>,
    /// `-1` when unmeasured, else `5..=100`.
    pub rhythm_stability: f64,
    pub duration_seconds: f64,
    /// Final cumulative transcript as received.
    pub transcript: String,
}

/// The immutable result of a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metrics: SessionMetrics,
    pub score: ScoreBreakdown,
    pub flow_events: Vec<FlowEvent>,
}

/// Single owner of one session's mutable state.
///
/// All mutation happens through `&mut self`; callers in a multi-threaded
/// host confine an engine behind one mutex (see `SessionRunner`) and only
/// submit snapshots or read published results.
pub struct SessionEngine {
    id: Uuid,
    config: SessionConfig,
    bus: EventBusRef,
    matcher: AlignmentMatcher,
    transcript: String,
    word_timestamps: Vec<f64>,
    flow_events: Vec<FlowEvent>,
    /// Spoken tokens already scanned for hard fillers.
    scanned_spoken: usize,
    /// Resolved reference tokens already folded into the run counters.
    scanned_resolved: usize,
    correct_run: usize,
    stumble_run: usize,
    started_at: Instant,
    last_activity: Instant,
    report: Option<SessionReport>,
}

impl SessionEngine {
    /// Create an engine with no passage loaded yet (an empty passage is a
    /// valid, vacuously complete one).
    pub fn new(config: SessionConfig, bus: EventBusRef) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            matcher: AlignmentMatcher::new("", config.matcher.clone()),
            config,
            bus,
            transcript: String::new(),
            word_timestamps: Vec::new(),
            flow_events: Vec::new(),
            scanned_spoken: 0,
            scanned_resolved: 0,
            correct_run: 0,
            stumble_run: 0,
            started_at: now,
            last_activity: now,
            report: None,
        }
    }

    /// Load (or replace) the reference passage, discarding all prior
    /// session state.
    pub fn load_passage(&mut self, text: &str) {
        let now = Instant::now();
        self.id = Uuid::new_v4();
        self.matcher = AlignmentMatcher::new(text, self.config.matcher.clone());
        self.transcript.clear();
        self.word_timestamps.clear();
        self.flow_events.clear();
        self.scanned_spoken = 0;
        self.scanned_resolved = 0;
        self.correct_run = 0;
        self.stumble_run = 0;
        self.started_at = now;
        self.last_activity = now;
        self.report = None;
        tracing::info!(session_id = %self.id, tokens = self.matcher.total(), "passage loaded");
    }

    /// Apply a cumulative transcript snapshot from the recognizer.
    ///
    /// Shrinking or repeated snapshots are recognizer artifacts and leave
    /// all state untouched.
    pub fn on_transcript_update(&mut self, full_text: &str) {
        if self.report.is_some() {
            tracing::debug!("transcript update after finalize, ignoring");
            return;
        }

        let spoken: Vec<String> = tokenize(full_text)
            .iter()
            .map(|t| normalize(t))
            .filter(|t| !t.is_empty())
            .collect();

        if spoken.len() > self.scanned_spoken {
            self.last_activity = Instant::now();
            self.transcript = full_text.to_string();

            let elapsed = self.elapsed_seconds();
            for word in &spoken[self.scanned_spoken..] {
                if self.config.lexicon.is_hard_filler(word) {
                    self.push_flow_event(FlowEvent::new(
                        elapsed,
                        FlowEventKind::Filler { word: word.clone() },
                    ));
                }
            }
            self.scanned_spoken = spoken.len();
        }

        self.matcher.ingest(full_text);
        self.scan_resolved_runs();

        self.bus.emit(
            SESSION_ALIGNED,
            json!({
                "sessionId": self.id,
                "currentIndex": self.matcher.current_index(),
                "correctCount": self.matcher.correct_count(),
                "total": self.matcher.total(),
            }),
        );
    }

    /// Accept the monotonically extended per-word timestamp array.
    ///
    /// An input not longer than what we already hold is ignored.
    pub fn on_word_timestamps(&mut self, timestamps: &[f64]) {
        if self.report.is_some() || timestamps.len() <= self.word_timestamps.len() {
            return;
        }

        let mut prev = self.word_timestamps.last().copied();
        for &ts in &timestamps[self.word_timestamps.len()..] {
            if let Some(p) = prev {
                if ts - p > self.config.hesitation_gap_secs {
                    self.push_flow_event(FlowEvent::new(ts, FlowEventKind::Hesitation));
                }
            }
            prev = Some(ts);
        }

        self.word_timestamps = timestamps.to_vec();
        self.last_activity = Instant::now();
    }

    /// Finalize the session and build its report. Idempotent: the first
    /// call computes everything exactly once, later calls return the
    /// stored report unchanged.
    pub fn finish(&mut self, elapsed_seconds: f64, eye_contact_percent: u8) -> SessionReport {
        if let Some(report) = &self.report {
            tracing::debug!(session_id = %self.id, "finish called on finished session");
            return report.clone();
        }

        let report = self.build_report(elapsed_seconds, eye_contact_percent);
        self.bus.emit(
            SESSION_FINALIZED,
            json!({
                "sessionId": report.id,
                "total": report.score.total,
                "wpm": report.metrics.wpm,
            }),
        );
        self.report = Some(report.clone());
        report
    }

    fn build_report(&mut self, elapsed_seconds: f64, eye_contact_percent: u8) -> SessionReport {
        self.matcher.finalize();

        let spoken = tokenize(&self.transcript);
        let minutes = elapsed_seconds / 60.0;

        let filler = classify(&spoken, minutes, &self.config.lexicon);
        let wpm = words_per_minute(filler.speech_token_count, elapsed_seconds);

        let reference: Vec<String> = self
            .matcher
            .words()
            .iter()
            .map(|w| w.token.text.clone())
            .collect();
        let (fuzzy_accuracy_percent, missed_words) = passage_accuracy(&reference, &spoken);

        let rhythm = rhythm_stability(&self.word_timestamps);

        let score = compute(&ScoreInputs {
            wpm,
            filler_count: filler.filler_count,
            eye_contact_percent,
            rhythm_stability: rhythm,
            duration_seconds: elapsed_seconds,
            spoke_any_word: !spoken.is_empty(),
        });

        tracing::info!(
            session_id = %self.id,
            wpm,
            accuracy = self.matcher.accuracy_percent(),
            fillers = filler.filler_count,
            total = score.total,
            "session finalized"
        );

        SessionReport {
            id: self.id,
            created_at: Utc::now(),
            metrics: SessionMetrics {
                wpm,
                filler_count: filler.filler_count,
                filler_words: filler.filler_words,
                accuracy_percent: self.matcher.accuracy_percent(),
                fuzzy_accuracy_percent,
                missed_words,
                rhythm_stability: rhythm,
                duration_seconds: elapsed_seconds,
                transcript: self.transcript.clone(),
            },
            score,
            flow_events: self.flow_events.clone(),
        }
    }

    /// Fold newly resolved reference tokens into the correct/stumble run
    /// counters, appending strong-moment and flow-break events when a run
    /// first reaches its threshold.
    fn scan_resolved_runs(&mut self) {
        let elapsed = self.elapsed_seconds();
        let mut events = Vec::new();

        let new_states: Vec<WordAlignmentState> = self
            .matcher
            .words()
            .iter()
            .skip(self.scanned_resolved)
            .map(|w| w.state)
            .collect();

        for state in new_states {
            match state {
                WordAlignmentState::Correct => {
                    self.correct_run += 1;
                    self.stumble_run = 0;
                    if self.correct_run == self.config.strong_moment_run {
                        events.push(FlowEvent::new(elapsed, FlowEventKind::StrongMoment));
                    }
                }
                WordAlignmentState::Stumbled => {
                    self.stumble_run += 1;
                    self.correct_run = 0;
                    if self.stumble_run == self.config.flow_break_run {
                        events.push(FlowEvent::new(elapsed, FlowEventKind::FlowBreak));
                    }
                }
                // First unresolved token: everything past it is too.
                _ => break,
            }
            self.scanned_resolved += 1;
        }

        for event in events {
            self.push_flow_event(event);
        }
    }

    fn push_flow_event(&mut self, event: FlowEvent) {
        match serde_json::to_value(&event) {
            Ok(payload) => self.bus.emit(SESSION_FLOW_EVENT, payload),
            Err(e) => tracing::warn!("failed to serialize flow event: {e}"),
        }
        self.flow_events.push(event);
    }

    // Live projections, readable at any point during the session.

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn words(&self) -> &[AlignedWord] {
        self.matcher.words()
    }

    pub fn current_index(&self) -> usize {
        self.matcher.current_index()
    }

    pub fn flow_events(&self) -> &[FlowEvent] {
        &self.flow_events
    }

    pub fn near_end(&self) -> bool {
        self.matcher.near_end()
    }

    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }

    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn has_spoken(&self) -> bool {
        self.scanned_spoken > 0
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    pub fn seconds_since_activity(&self) -> f64 {
        self.last_activity.elapsed().as_secs_f64()
    }

    pub fn end_grace(&self) -> std::time::Duration {
        self.matcher.config().end_grace
    }

    /// Running WPM estimate over correctly delivered words.
    pub fn live_wpm(&self) -> u32 {
        words_per_minute(self.matcher.correct_count(), self.elapsed_seconds())
    }

    /// Running filler estimate over the partial transcript.
    pub fn live_filler_count(&self) -> usize {
        let spoken = tokenize(&self.transcript);
        classify(&spoken, self.elapsed_seconds() / 60.0, &self.config.lexicon).filler_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orator_events::{InMemoryEventBus, NullEventBus};
    use std::sync::Arc;

    fn engine(passage: &str) -> SessionEngine {
        let mut e = SessionEngine::new(SessionConfig::default(), Arc::new(NullEventBus));
        e.load_passage(passage);
        e
    }

    #[test]
    fn test_full_session_exact_reading() {
        let mut e = engine("the quick brown fox");
        e.on_transcript_update("the quick");
        e.on_transcript_update("the quick brown fox");

        let report = e.finish(30.0, 80);
        assert_eq!(report.metrics.accuracy_percent, 100.0);
        assert_eq!(report.metrics.fuzzy_accuracy_percent, 100.0);
        assert!(report.metrics.missed_words.is_empty());
        assert_eq!(report.metrics.filler_count, 0);
        assert_eq!(report.metrics.duration_seconds, 30.0);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut e = engine("the quick brown fox");
        e.on_transcript_update("the quick brown fox");

        let first = e.finish(30.0, 80);
        // Different arguments on the second call must not recompute.
        let second = e.finish(99.0, 0);
        assert_eq!(second.metrics.duration_seconds, first.metrics.duration_seconds);
        assert_eq!(second.score, first.score);
        assert_eq!(second.id, first.id);
    }

    #[test]
    fn test_updates_after_finish_ignored() {
        let mut e = engine("the quick brown fox");
        e.on_transcript_update("the quick");
        e.finish(30.0, 80);

        e.on_transcript_update("the quick brown fox");
        e.on_word_timestamps(&[0.0, 0.5, 1.0]);
        assert_eq!(e.report().unwrap().metrics.accuracy_percent, 50.0);
        assert!(e.word_timestamps.is_empty());
    }

    #[test]
    fn test_empty_passage_finalizes_vacuously() {
        let mut e = engine("");
        assert!(e.near_end());
        let report = e.finish(0.0, 0);
        assert_eq!(report.metrics.accuracy_percent, 100.0);
        assert_eq!(report.metrics.wpm, 0);
        assert_eq!(report.score.total, 0);
    }

    #[test]
    fn test_no_speech_yields_zero_score() {
        let mut e = engine("the quick brown fox");
        let report = e.finish(30.0, 100);
        assert_eq!(report.score.total, 0);
        assert_eq!(report.metrics.wpm, 0);
        assert_eq!(report.metrics.rhythm_stability, -1.0);
    }

    #[test]
    fn test_hard_filler_produces_flow_event() {
        let mut e = engine("the quick brown fox");
        e.on_transcript_update("the um quick");

        let fillers: Vec<_> = e
            .flow_events()
            .iter()
            .filter(|ev| matches!(ev.kind, FlowEventKind::Filler { .. }))
            .collect();
        assert_eq!(fillers.len(), 1);
    }

    #[test]
    fn test_hesitation_flow_event_on_long_gap() {
        let mut e = engine("one two three");
        e.on_word_timestamps(&[0.0, 0.4]);
        e.on_word_timestamps(&[0.0, 0.4, 3.0]);

        assert!(e
            .flow_events()
            .iter()
            .any(|ev| ev.kind == FlowEventKind::Hesitation));
    }

    #[test]
    fn test_shorter_timestamp_array_ignored() {
        let mut e = engine("one two three");
        e.on_word_timestamps(&[0.0, 0.4, 0.8]);
        e.on_word_timestamps(&[0.0]);
        assert_eq!(e.word_timestamps.len(), 3);
    }

    #[test]
    fn test_strong_moment_after_consecutive_correct_run() {
        let passage = "one two three four five six seven eight nine";
        let mut e = engine(passage);
        e.on_transcript_update(passage);

        let strong: Vec<_> = e
            .flow_events()
            .iter()
            .filter(|ev| ev.kind == FlowEventKind::StrongMoment)
            .collect();
        assert_eq!(strong.len(), 1);
    }

    #[test]
    fn test_flow_break_after_consecutive_stumbles() {
        let mut e = engine("alpha beta gamma delta epsilon");
        e.on_transcript_update("wrong words entirely here");

        assert!(e
            .flow_events()
            .iter()
            .any(|ev| ev.kind == FlowEventKind::FlowBreak));
    }

    #[test]
    fn test_events_published_on_bus() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut e = SessionEngine::new(SessionConfig::default(), bus.clone());
        e.load_passage("the quick brown fox");

        e.on_transcript_update("the quick");
        e.finish(30.0, 50);

        assert_eq!(
            bus.events_for(SESSION_ALIGNED).len(),
            1,
            "one aligned event per update"
        );
        assert_eq!(bus.events_for(SESSION_FINALIZED).len(), 1);
    }

    #[test]
    fn test_live_projections() {
        let mut e = engine("the quick brown fox");
        e.on_transcript_update("the um quick");
        assert_eq!(e.live_filler_count(), 1);
        assert!(e.has_spoken());
        assert!(!e.is_finished());
    }
}
