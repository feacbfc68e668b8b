//! Session ownership and lifecycle for the coaching engine.
//!
//! [`SessionEngine`] is the single logical owner of all per-session state:
//! external collaborators submit transcript snapshots, word timestamps and
//! an eye-contact ratio, and read published results back out. The
//! [`SessionRunner`] wraps an engine in the background timers a live
//! session needs (elapsed ticker, end-of-passage grace, silence watchdog).

mod engine;
mod runner;

pub use engine::{SessionConfig, SessionEngine, SessionMetrics, SessionReport};
pub use runner::{RunnerConfig, SessionRunner};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session runner already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, SessionError>;
