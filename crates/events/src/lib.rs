//! Shared event contracts between the session engine and its subscribers.
//!
//! The session state is the single source of truth; UI layers subscribe to
//! these events rather than owning any mutation. Using shared types keeps
//! payload field names honest across that boundary.

mod bus;

pub use bus::{CapturedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};

/// What kind of delivery moment a [`FlowEvent`] records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowEventKind {
    /// A hard filler word was heard.
    Filler { word: String },
    /// A long pause between recognized words.
    Hesitation,
    /// A run of consecutive stumbles.
    FlowBreak,
    /// A sustained run of correctly delivered words.
    StrongMoment,
}

/// A delivery moment, produced incrementally during the recording phase
/// and immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEvent {
    /// Seconds since session start.
    pub timestamp_secs: f64,
    #[serde(flatten)]
    pub kind: FlowEventKind,
}

impl FlowEvent {
    pub fn new(timestamp_secs: f64, kind: FlowEventKind) -> Self {
        Self {
            timestamp_secs,
            kind,
        }
    }
}

/// Event topic names as constants to prevent typos.
pub mod event_names {
    /// Alignment state changed after a transcript update.
    pub const SESSION_ALIGNED: &str = "session:aligned";
    /// A flow event was appended.
    pub const SESSION_FLOW_EVENT: &str = "session:flow_event";
    /// The session finalized and its report is available.
    pub const SESSION_FINALIZED: &str = "session:finalized";
}
