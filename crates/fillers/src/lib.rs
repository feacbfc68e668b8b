//! Tiered filler-word detection.
//!
//! Two tiers: hard fillers ("um", "uh", ...) always count as disfluencies;
//! context words ("like", "so", ...) are real words that only count once
//! their occurrence rate exceeds a per-minute allowance - and then only the
//! excess occurrences count, not all of them.

use orator_text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Words that count as a disfluency on every occurrence.
pub const DEFAULT_HARD_FILLERS: &[&str] = &["um", "uh", "er", "hmm", "umm", "erm", "uhh"];

/// Context words with their allowed occurrences-per-minute.
pub const DEFAULT_CONTEXT_ALLOWANCES: &[(&str, f64)] = &[
    ("like", 2.0),
    ("so", 2.0),
    ("right", 1.5),
    ("okay", 1.5),
    ("actually", 1.5),
    ("basically", 1.0),
    ("literally", 1.0),
    ("anyway", 1.5),
    ("honestly", 1.0),
    ("seriously", 1.0),
];

/// Floor for elapsed minutes in rate computations, so a near-zero session
/// cannot turn every context word into excess.
const MIN_MINUTES: f64 = 1.0 / 60.0;

/// The word lists driving classification. Serde-deserializable so a caller
/// can supply a custom lexicon; `Default` carries the canonical lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillerLexicon {
    /// Always counted, every occurrence.
    pub hard: HashSet<String>,
    /// Word -> allowed occurrences per minute. BTreeMap keeps reporting
    /// order deterministic.
    pub context: BTreeMap<String, f64>,
}

impl Default for FillerLexicon {
    fn default() -> Self {
        Self {
            hard: DEFAULT_HARD_FILLERS.iter().map(|w| w.to_string()).collect(),
            context: DEFAULT_CONTEXT_ALLOWANCES
                .iter()
                .map(|(w, rate)| (w.to_string(), *rate))
                .collect(),
        }
    }
}

impl FillerLexicon {
    pub fn is_hard_filler(&self, word: &str) -> bool {
        self.hard.contains(word)
    }
}

/// Result of classifying a session's token stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillerReport {
    /// Hard fillers plus context-word excess.
    pub filler_count: usize,
    /// One entry per counted occurrence (hard) or excess occurrence (context).
    pub filler_words: Vec<String>,
    pub hard_filler_count: usize,
    /// Tokens counted as real speech for pacing: everything except hard
    /// fillers. Context words - even excess ones - are still utterances.
    pub speech_token_count: usize,
}

/// Classify a full token stream against the lexicon.
///
/// `minutes` is the elapsed session time; context-word allowances are
/// per-minute rates, so `allowed = floor(rate * minutes)` occurrences are
/// free and only the remainder counts.
pub fn classify(tokens: &[String], minutes: f64, lexicon: &FillerLexicon) -> FillerReport {
    let minutes = minutes.max(MIN_MINUTES);

    let mut hard_filler_count = 0usize;
    let mut speech_token_count = 0usize;
    let mut filler_words = Vec::new();
    let mut context_counts: BTreeMap<String, usize> = BTreeMap::new();

    for raw in tokens {
        let word = normalize(raw);
        if word.is_empty() {
            continue;
        }
        if lexicon.hard.contains(&word) {
            hard_filler_count += 1;
            filler_words.push(word);
            continue;
        }
        speech_token_count += 1;
        if lexicon.context.contains_key(&word) {
            *context_counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut excess_total = 0usize;
    for (word, count) in &context_counts {
        let allowed_rate = lexicon.context[word];
        let rate = *count as f64 / minutes;
        if rate > allowed_rate {
            let permitted = (allowed_rate * minutes).floor() as usize;
            let excess = count.saturating_sub(permitted);
            tracing::debug!(word = %word, count, permitted, excess, "context word over allowance");
            excess_total += excess;
            filler_words.extend(std::iter::repeat_n(word.clone(), excess));
        }
    }

    FillerReport {
        filler_count: hard_filler_count + excess_total,
        filler_words,
        hard_filler_count,
        speech_token_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hard_fillers_always_count() {
        let report = classify(
            &tokens(&["um", "the", "uh", "fox", "um"]),
            1.0,
            &FillerLexicon::default(),
        );
        assert_eq!(report.hard_filler_count, 3);
        assert_eq!(report.filler_count, 3);
        assert_eq!(report.speech_token_count, 2);
    }

    #[test]
    fn test_context_word_under_allowance_is_free() {
        // "so" allows 2.0/min; two occurrences in one minute is fine.
        let report = classify(
            &tokens(&["so", "the", "fox", "so"]),
            1.0,
            &FillerLexicon::default(),
        );
        assert_eq!(report.filler_count, 0);
        assert!(report.filler_words.is_empty());
    }

    #[test]
    fn test_context_word_excess_counts_only_excess() {
        // "so" spoken 3 times in exactly one minute, allowance 2.0/min:
        // excess = 3 - floor(2.0 * 1) = 1.
        let report = classify(
            &tokens(&["so", "so", "so"]),
            1.0,
            &FillerLexicon::default(),
        );
        assert_eq!(report.filler_count, 1);
        assert_eq!(report.filler_words, vec!["so".to_string()]);
    }

    #[test]
    fn test_context_excess_still_counts_as_speech() {
        let report = classify(
            &tokens(&["so", "so", "so", "um"]),
            1.0,
            &FillerLexicon::default(),
        );
        // Only the hard filler is excluded from the speech count.
        assert_eq!(report.speech_token_count, 3);
        assert_eq!(report.filler_count, 2);
    }

    #[test]
    fn test_allowance_scales_with_minutes() {
        // Over two minutes "so" is allowed floor(2.0 * 2) = 4 occurrences.
        let report = classify(
            &tokens(&["so", "so", "so", "so"]),
            2.0,
            &FillerLexicon::default(),
        );
        assert_eq!(report.filler_count, 0);
    }

    #[test]
    fn test_zero_minutes_guard() {
        let report = classify(&tokens(&["the", "fox"]), 0.0, &FillerLexicon::default());
        assert_eq!(report.filler_count, 0);
        assert_eq!(report.speech_token_count, 2);
    }

    #[test]
    fn test_tokens_normalized_before_lookup() {
        let report = classify(&tokens(&["Um,", "UH!"]), 1.0, &FillerLexicon::default());
        assert_eq!(report.hard_filler_count, 2);
    }

    #[test]
    fn test_custom_lexicon_roundtrip() {
        let json = r#"{"hard": ["eh"], "context": {"well": 1.0}}"#;
        let lexicon: FillerLexicon = serde_json::from_str(json).unwrap();
        let report = classify(&tokens(&["eh", "well", "well"]), 1.0, &lexicon);
        assert_eq!(report.hard_filler_count, 1);
        assert_eq!(report.filler_count, 2);
    }
}
