//! Event bus abstraction for decoupled state publication.
//!
//! The session engine emits through this trait so the core stays testable
//! without any UI runtime attached, and so a headless caller can poll the
//! in-memory bus instead of wiring real subscribers.

use std::sync::{Arc, Mutex};

/// Trait for publishing session events to subscribers.
pub trait EventBus: Send + Sync {
    /// Emit an event with a JSON payload.
    ///
    /// `topic` is one of the names in [`crate::event_names`].
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

/// Shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// In-memory event bus that captures everything for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<CapturedEvent>>,
}

/// A captured event from [`InMemoryEventBus`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in emission order.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Captured events for one topic.
    pub fn events_for(&self, topic: &str) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.events.lock().unwrap().push(CapturedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// No-op bus that discards all events. The default when a caller only
/// wants to poll engine state directly.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {
        // Intentionally empty
    }
}
