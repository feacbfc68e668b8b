//! Background runner: the periodic timers a live session needs.
//!
//! The engine itself is pure state; this wraps it in a ticker thread that
//! recomputes elapsed time, applies the end-of-passage grace window and
//! runs the silence watchdog. All engine mutation stays behind one mutex.

use crate::{SessionEngine, SessionError, SessionReport};
use orator_align::AlignedWord;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default tick interval for the elapsed-time / watchdog loop.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// The watchdog never fires this early in a session, giving the reader
/// time to start speaking.
pub const DEFAULT_SILENCE_GRACE: Duration = Duration::from_secs(6);

/// Silence after the last voice activity that triggers auto-finalize -
/// but only once the reader has spoken at least one word.
pub const DEFAULT_SILENCE_THRESHOLD: Duration = Duration::from_secs(4);

/// Timer tunables for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub tick_interval: Duration,
    pub silence_grace: Duration,
    pub silence_threshold: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            silence_grace: DEFAULT_SILENCE_GRACE,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

/// Owns a [`SessionEngine`] behind a mutex and drives its lifecycle from a
/// background thread. Dropping the runner stops the thread.
pub struct SessionRunner {
    engine: Arc<Mutex<SessionEngine>>,
    running: Arc<AtomicBool>,
    /// Last eye-contact reading from the external face tracker, `0..=100`.
    eye_contact: Arc<AtomicU8>,
    handle: Option<std::thread::JoinHandle<()>>,
    config: RunnerConfig,
}

impl SessionRunner {
    pub fn new(engine: SessionEngine, config: RunnerConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            running: Arc::new(AtomicBool::new(false)),
            eye_contact: Arc::new(AtomicU8::new(0)),
            handle: None,
            config,
        }
    }

    /// Start the ticker thread. Fails if already running.
    pub fn start(&mut self) -> crate::Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SessionError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let eye_contact = Arc::clone(&self.eye_contact);
        let config = self.config.clone();

        let handle = std::thread::spawn(move || {
            tracing::info!(interval = ?config.tick_interval, "session runner started");

            while running.load(Ordering::SeqCst) {
                std::thread::sleep(config.tick_interval);

                let mut engine = engine.lock().unwrap();
                if engine.is_finished() {
                    break;
                }

                let elapsed = engine.elapsed_seconds();
                let since_activity = engine.seconds_since_activity();

                // Never auto-stop before any speech at all; a recognizer
                // that goes silent forever is reported, not waited on.
                if !engine.has_spoken() {
                    continue;
                }

                let end_grace = engine.end_grace().as_secs_f64();
                let past_end = engine.near_end() && since_activity >= end_grace;

                let silent = elapsed >= config.silence_grace.as_secs_f64()
                    && since_activity >= config.silence_threshold.as_secs_f64();

                if past_end || silent {
                    tracing::info!(
                        elapsed,
                        since_activity,
                        past_end,
                        "auto-finalizing session"
                    );
                    engine.finish(elapsed, eye_contact.load(Ordering::SeqCst));
                    break;
                }
            }

            running.store(false, Ordering::SeqCst);
            tracing::info!("session runner stopped");
        });

        self.handle = Some(handle);
        Ok(())
    }

    /// Explicit stop: cancels the timers and finalizes (idempotently) with
    /// the given eye-contact ratio.
    pub fn stop(&mut self, eye_contact_percent: u8) -> SessionReport {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let mut engine = self.engine.lock().unwrap();
        let elapsed = engine.elapsed_seconds();
        engine.finish(elapsed, eye_contact_percent)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest eye-contact reading from the face-tracking collaborator,
    /// used when the watchdog finalizes on its own.
    pub fn update_eye_contact(&self, percent: u8) {
        self.eye_contact.store(percent.min(100), Ordering::SeqCst);
    }

    // Collaborator inputs are forwarded through the single mutex, keeping
    // updates serialized in arrival order.

    pub fn on_transcript_update(&self, full_text: &str) {
        self.engine.lock().unwrap().on_transcript_update(full_text);
    }

    pub fn on_word_timestamps(&self, timestamps: &[f64]) {
        self.engine.lock().unwrap().on_word_timestamps(timestamps);
    }

    // Published state snapshots.

    pub fn aligned_words(&self) -> Vec<AlignedWord> {
        self.engine.lock().unwrap().words().to_vec()
    }

    pub fn current_index(&self) -> usize {
        self.engine.lock().unwrap().current_index()
    }

    pub fn report(&self) -> Option<SessionReport> {
        self.engine.lock().unwrap().report().cloned()
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
