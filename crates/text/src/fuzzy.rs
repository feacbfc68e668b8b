//! Order-independent near-match test between two words.
//!
//! Used by the post-session accuracy pass: a reference word counts as spoken
//! if any spoken word fuzzy-matches it, regardless of position. The live
//! alignment matcher deliberately does NOT use this - it requires exact
//! normalized matches so the cursor stays honest.

use crate::normalize;

/// Words shorter than this only match exactly.
const MIN_FUZZY_LEN: usize = 3;

/// Minimum length ratio for the prefix rule ("recognit" vs "recognition").
const PREFIX_RATIO: f64 = 0.8;

/// Words at or below this length allow edit distance 1; longer words allow 2.
const SHORT_WORD_LEN: usize = 6;

/// Cap on how many missed words are reported back to the caller.
pub const MAX_REPORTED_MISSES: usize = 15;

/// Near-equality test between two words.
///
/// Exact match always passes. Short words (< 3 chars) must match exactly,
/// otherwise "a"/"at" style collisions drown the signal. Longer words pass
/// on a close prefix or a small edit distance.
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a < MIN_FUZZY_LEN || len_b < MIN_FUZZY_LEN {
        return false;
    }

    let (shorter, longer, len_short, len_long) = if len_a <= len_b {
        (a, b, len_a, len_b)
    } else {
        (b, a, len_b, len_a)
    };

    if longer.starts_with(shorter) && len_short as f64 / len_long as f64 >= PREFIX_RATIO {
        return true;
    }

    let allowed = if len_long <= SHORT_WORD_LEN { 1 } else { 2 };
    levenshtein(a, b) <= allowed
}

/// Standard single-character insert/delete/substitute edit distance.
///
/// O(|a|*|b|) dynamic program over chars (not bytes), two rolling rows.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Order-independent passage accuracy.
///
/// For every reference word, check whether any spoken word fuzzy-matches its
/// normalized form. Returns the matched percentage and the missed words
/// (original casing, capped at [`MAX_REPORTED_MISSES`]; words beyond the cap
/// still count against accuracy).
///
/// An empty reference is vacuously 100% accurate.
pub fn passage_accuracy(reference: &[String], spoken: &[String]) -> (f64, Vec<String>) {
    if reference.is_empty() {
        return (100.0, Vec::new());
    }

    let spoken_norm: Vec<String> = spoken
        .iter()
        .map(|w| normalize(w))
        .filter(|w| !w.is_empty())
        .collect();

    let mut matched = 0usize;
    let mut missed = Vec::new();

    for word in reference {
        let norm = normalize(word);
        if norm.is_empty() {
            // Punctuation-only fragment, nothing to speak.
            matched += 1;
            continue;
        }
        if spoken_norm.iter().any(|s| fuzzy_match(&norm, s)) {
            matched += 1;
        } else if missed.len() < MAX_REPORTED_MISSES {
            missed.push(word.clone());
        }
    }

    let accuracy = 100.0 * matched as f64 / reference.len() as f64;
    (accuracy, missed)
}
