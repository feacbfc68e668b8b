//! Live word-by-word alignment of a growing transcript onto a reference passage.
//!
//! The [`AlignmentMatcher`] is the single source of truth for which passage
//! words have been spoken correctly, stumbled over, or skipped. UI layers
//! subscribe to its published state; they never mutate it.

mod matcher;

pub use matcher::AlignmentMatcher;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many reference tokens ahead of the cursor a spoken word may match.
///
/// Tunable, not sacred: 2 keeps recovery fast after a dropped word without
/// letting the cursor teleport across the passage.
pub const LOOKAHEAD_WINDOW: usize = 2;

/// Grace period after the final reference token resolves before the session
/// should auto-finalize, tolerating trailing recognizer lag on the last word.
pub const END_GRACE: Duration = Duration::from_millis(1200);

/// One normalized word of the passage being read aloud.
///
/// Immutable once the passage is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceToken {
    /// Position within the passage.
    pub index: usize,
    /// Original text as written, for display.
    pub text: String,
    /// Lower-cased, punctuation-stripped form used for matching.
    pub normalized: String,
}

/// Alignment state of a single reference token.
///
/// Legal transitions: `Pending -> Active -> Correct | Stumbled`, or
/// `Pending -> Stumbled` (skipped over by a lookahead match), or
/// `Pending | Active -> Skipped` at finalize. At most one token is
/// `Active` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordAlignmentState {
    /// Not yet reached.
    Pending,
    /// The next token the reader is expected to say.
    Active,
    /// Spoken and matched.
    Correct,
    /// Mismatched or skipped over mid-session.
    Stumbled,
    /// Never resolved; assigned only at finalize.
    Skipped,
}

/// A reference token together with its live alignment state.
///
/// Owned exclusively by the [`AlignmentMatcher`]; mutated only by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedWord {
    pub token: ReferenceToken,
    pub state: WordAlignmentState,
    /// What the recognizer actually heard, when it differed or when the
    /// token resolved via a match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognized_as: Option<String>,
}

/// Tunable knobs for the alignment matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Bounded lookahead distance for out-of-position matches.
    pub lookahead: usize,
    /// End-of-passage grace window; the session runner owns the timer,
    /// the matcher only signals `near_end`.
    pub end_grace: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            lookahead: LOOKAHEAD_WINDOW,
            end_grace: END_GRACE,
        }
    }
}
