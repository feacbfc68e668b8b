//! The alignment state machine.

use crate::{AlignedWord, MatcherConfig, ReferenceToken, WordAlignmentState};
use orator_text::{normalize, tokenize};

/// Maps a cumulatively growing transcript onto the reference passage,
/// one spoken token at a time, with bounded lookahead.
///
/// The cursor (`source_idx`) is monotonically non-decreasing for the life
/// of a session: a transcript that appears to shrink or repeat is a
/// recognizer artifact and is ignored, never rewound.
pub struct AlignmentMatcher {
    words: Vec<AlignedWord>,
    /// Next reference token to resolve. Every token below it is Correct or
    /// Stumbled, which is what lets cumulative re-ingestion skip the prefix.
    source_idx: usize,
    /// Mirror of `source_idx` published for UI highlighting.
    current_index: usize,
    config: MatcherConfig,
    finished: bool,
}

impl AlignmentMatcher {
    /// Tokenize a passage into reference tokens, all `Pending`, and mark the
    /// first one `Active`. Tokens that normalize to nothing (stray dashes,
    /// ellipses) are dropped at load - there is nothing to say for them.
    pub fn new(passage: &str, config: MatcherConfig) -> Self {
        let words: Vec<AlignedWord> = tokenize(passage)
            .into_iter()
            .filter_map(|text| {
                let normalized = normalize(&text);
                if normalized.is_empty() {
                    return None;
                }
                Some((text, normalized))
            })
            .enumerate()
            .map(|(index, (text, normalized))| AlignedWord {
                token: ReferenceToken {
                    index,
                    text,
                    normalized,
                },
                state: WordAlignmentState::Pending,
                recognized_as: None,
            })
            .collect();

        let mut matcher = Self {
            words,
            source_idx: 0,
            current_index: 0,
            config,
            finished: false,
        };
        matcher.refresh_active();
        matcher
    }

    /// Apply a cumulative transcript snapshot (the full text observed so
    /// far, not a diff).
    ///
    /// Exactly one spoken token is consumed per step, matched or not - the
    /// tie-break that keeps the cursor advancing under noisy recognizer
    /// output. Out-of-position matches are accepted within the configured
    /// lookahead, marking the skipped-over tokens `Stumbled`.
    pub fn ingest(&mut self, full_transcript: &str) {
        if self.finished {
            return;
        }

        let spoken: Vec<String> = tokenize(full_transcript)
            .iter()
            .map(|t| normalize(t))
            .filter(|t| !t.is_empty())
            .collect();

        let already_matched = self
            .words
            .iter()
            .filter(|w| {
                matches!(
                    w.state,
                    WordAlignmentState::Correct | WordAlignmentState::Stumbled
                )
            })
            .count();

        // Recognizers re-send and occasionally shrink their hypothesis.
        // Anything not strictly longer than what we already consumed is
        // an artifact, not real regression.
        if spoken.len() <= already_matched {
            tracing::debug!(
                spoken = spoken.len(),
                already_matched,
                "transcript did not grow, ignoring update"
            );
            return;
        }

        debug_assert_eq!(already_matched, self.source_idx);

        for spoken_word in &spoken[already_matched..] {
            if self.source_idx >= self.words.len() {
                break;
            }

            if *spoken_word == self.words[self.source_idx].token.normalized {
                self.resolve(self.source_idx, WordAlignmentState::Correct, spoken_word);
                self.source_idx += 1;
                continue;
            }

            if let Some(target) = self.lookahead_match(spoken_word) {
                tracing::debug!(
                    word = %spoken_word,
                    skipped = target - self.source_idx,
                    "lookahead match"
                );
                for idx in self.source_idx..target {
                    if matches!(
                        self.words[idx].state,
                        WordAlignmentState::Pending | WordAlignmentState::Active
                    ) {
                        self.words[idx].state = WordAlignmentState::Stumbled;
                    }
                }
                self.resolve(target, WordAlignmentState::Correct, spoken_word);
                self.source_idx = target + 1;
                continue;
            }

            // Total mismatch: consume the spoken token against the cursor.
            tracing::debug!(
                expected = %self.words[self.source_idx].token.normalized,
                heard = %spoken_word,
                "mismatch, marking stumbled"
            );
            self.resolve(self.source_idx, WordAlignmentState::Stumbled, spoken_word);
            self.source_idx += 1;
        }

        self.current_index = self.source_idx;
        self.refresh_active();
    }

    /// Whether the cursor has reached the final reference token, meaning
    /// the caller should schedule a finalize after the grace window unless
    /// further speech arrives first.
    pub fn near_end(&self) -> bool {
        self.source_idx >= self.words.len().saturating_sub(1)
    }

    /// Resolve the session: every token still `Pending` or `Active`
    /// becomes `Skipped`. Idempotent - later calls are no-ops.
    pub fn finalize(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for word in &mut self.words {
            if matches!(
                word.state,
                WordAlignmentState::Pending | WordAlignmentState::Active
            ) {
                word.state = WordAlignmentState::Skipped;
            }
        }
        tracing::debug!(
            correct = self.correct_count(),
            total = self.words.len(),
            "alignment finalized"
        );
    }

    /// Percentage of reference tokens resolved `Correct`, in `[0, 100]`.
    /// An empty passage is vacuously 100% accurate.
    pub fn accuracy_percent(&self) -> f64 {
        if self.words.is_empty() {
            return 100.0;
        }
        100.0 * self.correct_count() as f64 / self.words.len() as f64
    }

    pub fn words(&self) -> &[AlignedWord] {
        &self.words
    }

    /// Index of the next unresolved reference token, for UI highlighting.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn correct_count(&self) -> usize {
        self.words
            .iter()
            .filter(|w| w.state == WordAlignmentState::Correct)
            .count()
    }

    pub fn total(&self) -> usize {
        self.words.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    fn lookahead_match(&self, spoken_word: &str) -> Option<usize> {
        for distance in 1..=self.config.lookahead {
            let target = self.source_idx + distance;
            if target >= self.words.len() {
                return None;
            }
            if *spoken_word == self.words[target].token.normalized {
                return Some(target);
            }
        }
        None
    }

    fn resolve(&mut self, idx: usize, state: WordAlignmentState, heard: &str) {
        let word = &mut self.words[idx];
        word.state = state;
        word.recognized_as = Some(heard.to_string());
    }

    /// Promote the first unresolved token at or after the cursor to `Active`.
    /// There may be none once everything is resolved.
    fn refresh_active(&mut self) {
        if self.finished {
            return;
        }
        let mut promoted = false;
        for word in self.words.iter_mut().skip(self.current_index) {
            match word.state {
                WordAlignmentState::Pending | WordAlignmentState::Active if !promoted => {
                    word.state = WordAlignmentState::Active;
                    promoted = true;
                }
                WordAlignmentState::Active => {
                    // A stale Active behind a freshly promoted one.
                    word.state = WordAlignmentState::Pending;
                }
                _ => {}
            }
        }
    }
}
