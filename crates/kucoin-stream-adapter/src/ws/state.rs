/*
[INPUT]:  Lifecycle transitions from the supervisor and controller
[OUTPUT]: Observable session run state and last recorded error
[POS]:    WebSocket layer - shared per-session state
[UPDATE]: When adding lifecycle phases or observable fields
*/

use crate::error::KucoinError;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Per-session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Connecting,
    Subscribing,
    Streaming,
    Stopping,
    Stopped,
}

/// State shared between the lifecycle controller, the connection supervisor
/// and the session's background tasks. The run state is the only field with
/// waiters; `connected` and the last error are plain observables.
#[derive(Debug)]
pub(crate) struct SessionState {
    run_state: watch::Sender<RunState>,
    connected: AtomicBool,
    last_error: Mutex<Option<KucoinError>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            run_state: watch::Sender::new(RunState::Idle),
            connected: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn run_state(&self) -> RunState {
        *self.run_state.borrow()
    }

    pub fn set_run_state(&self, state: RunState) {
        self.run_state.send_replace(state);
    }

    /// Transition `from -> to` atomically; returns false if the current
    /// state is not `from`.
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        let mut moved = false;
        self.run_state.send_if_modified(|current| {
            if *current == from {
                *current = to;
                moved = true;
                true
            } else {
                false
            }
        });
        moved
    }

    /// Subscribe to run-state changes (used by `wait_stopped`)
    pub fn watch(&self) -> watch::Receiver<RunState> {
        self.run_state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Record a session error; the most recent one wins
    pub fn record_error(&self, error: KucoinError) {
        let mut guard = self.last_error.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(error);
    }

    /// Human-readable form of the last recorded error
    pub fn last_error(&self) -> Option<String> {
        let guard = self.last_error.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().map(|e| e.to_string())
    }

    /// Remove and return the last recorded error
    pub fn take_last_error(&self) -> Option<KucoinError> {
        let mut guard = self.last_error.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.take()
    }
}
