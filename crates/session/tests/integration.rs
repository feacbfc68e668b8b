//! End-to-end session flow: cumulative transcript updates, timestamps,
//! finalize, and the composite score.

use orator_align::WordAlignmentState;
use orator_events::{event_names, InMemoryEventBus};
use orator_session::{SessionConfig, SessionEngine};
use std::sync::Arc;

const PASSAGE: &str = "the quick brown fox jumps over the lazy dog";

fn engine_with_bus() -> (SessionEngine, Arc<InMemoryEventBus>) {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut engine = SessionEngine::new(SessionConfig::default(), bus.clone());
    engine.load_passage(PASSAGE);
    (engine, bus)
}

#[test]
fn clean_reading_end_to_end() {
    let (mut engine, bus) = engine_with_bus();

    // Recognizer sends cumulative snapshots as it refines its hypothesis.
    engine.on_transcript_update("the quick");
    engine.on_transcript_update("the quick brown fox");
    engine.on_transcript_update("the quick brown fox jumps over");
    engine.on_transcript_update(PASSAGE);

    // Even 0.4s pacing over nine words.
    let timestamps: Vec<f64> = (0..9).map(|i| i as f64 * 0.4).collect();
    engine.on_word_timestamps(&timestamps);

    let report = engine.finish(30.0, 90);

    assert_eq!(report.metrics.accuracy_percent, 100.0);
    assert_eq!(report.metrics.fuzzy_accuracy_percent, 100.0);
    assert!(report.metrics.missed_words.is_empty());
    assert_eq!(report.metrics.filler_count, 0);
    // 9 words in 30s = 18 WPM.
    assert_eq!(report.metrics.wpm, 18);
    assert_eq!(report.metrics.rhythm_stability, 100.0);
    assert_eq!(report.score.rhythm_points, 15);
    assert!(report.score.total <= 100);

    // Every token resolved correct.
    assert!(engine
        .words()
        .iter()
        .all(|w| w.state == WordAlignmentState::Correct));

    assert_eq!(bus.events_for(event_names::SESSION_ALIGNED).len(), 4);
    assert_eq!(bus.events_for(event_names::SESSION_FINALIZED).len(), 1);
}

#[test]
fn stumbled_reading_with_fillers() {
    let (mut engine, _bus) = engine_with_bus();

    engine.on_transcript_update("the um brown fox");
    engine.on_transcript_update("the um brown fox jumps over the lazy dog");

    let report = engine.finish(60.0, 50);

    // "um" consumed a step against "quick", so accuracy is 8/9.
    assert!(report.metrics.accuracy_percent < 100.0);
    assert_eq!(report.metrics.filler_count, 1);
    assert_eq!(report.metrics.filler_words, vec!["um".to_string()]);
    // "quick" was never spoken anywhere.
    assert_eq!(report.metrics.missed_words, vec!["quick".to_string()]);
    assert!(report.score.total <= 100);
}

#[test]
fn cursor_is_monotone_under_appended_updates() {
    let (mut engine, _bus) = engine_with_bus();

    let updates = [
        "the",
        "the quick",
        "the quick brown",
        "the quick brown fox jumps",
        "the quick brown fox jumps over the",
        PASSAGE,
    ];

    let mut last = 0;
    for update in updates {
        engine.on_transcript_update(update);
        let index = engine.current_index();
        assert!(index >= last, "cursor regressed from {last} to {index}");
        let active = engine
            .words()
            .iter()
            .filter(|w| w.state == WordAlignmentState::Active)
            .count();
        assert!(active <= 1, "more than one active token");
        last = index;
    }
}

#[test]
fn shrinking_transcript_leaves_state_unchanged() {
    let (mut engine, _bus) = engine_with_bus();

    engine.on_transcript_update("the quick brown fox");
    let states_before: Vec<_> = engine.words().iter().map(|w| w.state).collect();
    let cursor_before = engine.current_index();

    engine.on_transcript_update("the quick");

    let states_after: Vec<_> = engine.words().iter().map(|w| w.state).collect();
    assert_eq!(states_before, states_after);
    assert_eq!(engine.current_index(), cursor_before);
}

#[test]
fn short_session_total_is_capped() {
    let (mut engine, _bus) = engine_with_bus();
    engine.on_transcript_update(PASSAGE);

    let timestamps: Vec<f64> = (0..9).map(|i| i as f64 * 0.4).collect();
    engine.on_word_timestamps(&timestamps);

    // Perfect components, but only 10 seconds of material.
    let report = engine.finish(10.0, 100);
    assert!(report.score.total <= 60);
}

#[test]
fn session_with_no_passage_and_no_speech() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut engine = SessionEngine::new(SessionConfig::default(), bus);

    // Upstream recognizer never delivered anything.
    let report = engine.finish(0.0, 0);
    assert_eq!(report.score.total, 0);
    assert_eq!(report.metrics.wpm, 0);
    assert_eq!(report.metrics.accuracy_percent, 100.0);
    assert_eq!(report.metrics.rhythm_stability, -1.0);
}

#[test]
fn report_serializes_for_subscribers() {
    let (mut engine, _bus) = engine_with_bus();
    engine.on_transcript_update(PASSAGE);

    let report = engine.finish(30.0, 75);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"accuracyPercent\":100.0"));
    assert!(json.contains("\"wpmPoints\""));
}
