//! Speaking-rate and rhythm-stability analysis over per-word timestamps.

/// Fewer timestamps than this and rhythm is not measurable at all.
pub const MIN_TIMESTAMPS: usize = 8;

/// Only the most recent timestamps contribute; older material reflects a
/// different part of the session.
pub const MAX_TIMESTAMPS: usize = 60;

/// Gaps outside this window are recognizer hiccups, not speech rhythm.
pub const MIN_GAP_SECS: f64 = 0.05;
pub const MAX_GAP_SECS: f64 = 1.5;

/// Minimum surviving gaps after the outlier filter.
pub const MIN_VALID_GAPS: usize = 5;

/// How hard the coefficient of variation is penalized.
pub const CV_PENALTY: f64 = 65.0;

/// Stability never reports below this once it is measurable at all.
pub const STABILITY_FLOOR: f64 = 5.0;

/// Sentinel for "insufficient data" - never a computed value.
pub const UNMEASURED: f64 = -1.0;

const MIN_MINUTES: f64 = 1e-6;

/// Words per minute, rounded to an integer. Non-positive elapsed time
/// yields 0 rather than a fault.
pub fn words_per_minute(word_count: usize, elapsed_seconds: f64) -> u32 {
    if elapsed_seconds <= 0.0 {
        return 0;
    }
    let minutes = (elapsed_seconds / 60.0).max(MIN_MINUTES);
    (word_count as f64 / minutes).round() as u32
}

/// Rhythm stability in `[5, 100]`, or [`UNMEASURED`] when there is not
/// enough clean data.
///
/// Derived from the coefficient of variation of consecutive inter-word
/// gaps: perfectly even pacing scores 100, erratic pacing decays toward
/// the floor.
pub fn rhythm_stability(timestamps: &[f64]) -> f64 {
    if timestamps.len() < MIN_TIMESTAMPS {
        return UNMEASURED;
    }

    let recent = &timestamps[timestamps.len().saturating_sub(MAX_TIMESTAMPS)..];

    let gaps: Vec<f64> = recent
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| (MIN_GAP_SECS..=MAX_GAP_SECS).contains(gap))
        .collect();

    if gaps.len() < MIN_VALID_GAPS {
        tracing::debug!(valid_gaps = gaps.len(), "too few clean gaps for rhythm");
        return UNMEASURED;
    }

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let variance = gaps.iter().map(|g| (g - mean) * (g - mean)).sum::<f64>() / gaps.len() as f64;
    let cv = variance.sqrt() / mean;

    (100.0 - cv * CV_PENALTY).clamp(STABILITY_FLOOR, 100.0)
}
