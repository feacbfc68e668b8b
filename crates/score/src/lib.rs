//! Composite coaching score out of 100.
//!
//! Weighted blend of pacing, filler rate, eye contact and rhythm, with
//! explicit guards against short, unreliable sessions.

use serde::{Deserialize, Serialize};

/// Component weights. They sum to 100.
pub const WPM_WEIGHT: u32 = 35;
pub const FILLER_WEIGHT: u32 = 25;
pub const EYE_WEIGHT: u32 = 25;
pub const RHYTHM_WEIGHT: u32 = 15;

/// Below this duration the WPM estimate is too noisy to band; it gets a
/// flat midline award instead.
pub const MIN_RELIABLE_WPM_SECS: f64 = 25.0;
const UNRELIABLE_WPM_POINTS: u32 = 15;

/// Sessions shorter than this cap the total: a brief sample must not
/// produce a misleadingly high score.
pub const SHORT_SESSION_SECS: f64 = 20.0;
pub const SHORT_SESSION_CAP: u32 = 60;

/// Banding stand-in when rhythm was unmeasured. Used for scoring only -
/// the reported stability stays `-1` so "unmeasured" is never displayed
/// as "average".
pub const NEUTRAL_RHYTHM_BASELINE: f64 = 68.0;

/// Fillers per minute that cost nothing.
const FILLER_FREE_PER_MIN: f64 = 1.5;
/// Additional fillers per minute over which the filler score reaches zero.
const FILLER_PENALTY_RANGE_PER_MIN: f64 = 4.5;
/// Minutes floor for the filler rate, so tiny sessions don't explode it.
const FILLER_MIN_MINUTES: f64 = 0.5;

/// Everything the scorer consumes. All values are already resolved;
/// nothing here can fail.
#[derive(Debug, Clone)]
pub struct ScoreInputs {
    pub wpm: u32,
    pub filler_count: usize,
    /// Supplied by the external face-tracking collaborator, `0..=100`.
    pub eye_contact_percent: u8,
    /// `-1.0` means unmeasured.
    pub rhythm_stability: f64,
    pub duration_seconds: f64,
    /// Minimum-speech precondition: without it the score is zero.
    pub spoke_any_word: bool,
}

/// Per-component points plus the capped total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub wpm_points: u32,
    pub filler_points: u32,
    pub eye_points: u32,
    pub rhythm_points: u32,
    /// `0..=100`.
    pub total: u32,
}

/// Compute the composite score.
pub fn compute(inputs: &ScoreInputs) -> ScoreBreakdown {
    if !inputs.spoke_any_word {
        tracing::debug!("no speech detected, score is zero");
        return ScoreBreakdown::default();
    }

    let wpm_points = wpm_points(inputs.wpm, inputs.duration_seconds);
    let filler_points = filler_points(inputs.filler_count, inputs.duration_seconds / 60.0);
    let eye_points = eye_points(inputs.eye_contact_percent);
    let rhythm_points = rhythm_points(inputs.rhythm_stability);

    let mut total = (wpm_points + filler_points + eye_points + rhythm_points).min(100);
    if inputs.duration_seconds < SHORT_SESSION_SECS {
        total = total.min(SHORT_SESSION_CAP);
    }

    ScoreBreakdown {
        wpm_points,
        filler_points,
        eye_points,
        rhythm_points,
        total,
    }
}

fn wpm_points(wpm: u32, duration_seconds: f64) -> u32 {
    if duration_seconds < MIN_RELIABLE_WPM_SECS {
        return UNRELIABLE_WPM_POINTS;
    }
    match wpm {
        130..=150 => 35,
        120..=129 | 151..=160 => 30,
        110..=119 | 161..=170 => 23,
        95..=109 | 171..=190 => 15,
        70..=94 | 191..=220 => 7,
        _ => 2,
    }
}

fn filler_points(filler_count: usize, minutes: f64) -> u32 {
    let per_min = filler_count as f64 / minutes.max(FILLER_MIN_MINUTES);
    let excess = (per_min - FILLER_FREE_PER_MIN).max(0.0);
    let fraction = (1.0 - excess / FILLER_PENALTY_RANGE_PER_MIN).max(0.0);
    (FILLER_WEIGHT as f64 * fraction).round() as u32
}

fn eye_points(eye_contact_percent: u8) -> u32 {
    (f64::from(eye_contact_percent) / 100.0 * EYE_WEIGHT as f64).round() as u32
}

fn rhythm_points(stability: f64) -> u32 {
    let banded = if stability < 0.0 {
        NEUTRAL_RHYTHM_BASELINE
    } else {
        stability
    };
    if banded >= 85.0 {
        15
    } else if banded >= 70.0 {
        12
    } else if banded >= 55.0 {
        9
    } else if banded >= 40.0 {
        5
    } else {
        1
    }
}
