//! Word tokenization and fuzzy word matching.
//!
//! Everything here is pure: the alignment matcher, filler classifier and
//! post-session accuracy pass all compare words through these functions,
//! so they must agree on what a "word" is.

mod fuzzy;

pub use fuzzy::{fuzzy_match, levenshtein, passage_accuracy, MAX_REPORTED_MISSES};

/// Split text into word tokens on any whitespace, dropping empty fragments.
///
/// Returns an empty vec for empty or whitespace-only input.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Normalize a token for comparison: lower-case, strip leading/trailing
/// punctuation and whitespace.
///
/// Interior punctuation is kept ("don't" stays "don't"); a punctuation-only
/// token normalizes to the empty string.
pub fn normalize(token: &str) -> String {
    token
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
