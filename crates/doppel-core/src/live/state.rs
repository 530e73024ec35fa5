//! Live session phase machine.
//!
//! Legal transitions:
//!   idle -> connecting -> open <-> interrupted
//! and any phase except closed may go to closed. Closed is terminal;
//! interrupted is only reachable from open and recovers to open when
//! model audio resumes.

use std::sync::Mutex;

use doppel_types::error::LiveError;
use doppel_types::live::LivePhase;

struct Inner {
    phase: LivePhase,
    status: Option<String>,
}

/// Tracks the phase of one live session.
pub struct LiveState {
    inner: Mutex<Inner>,
}

impl LiveState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: LivePhase::Idle,
                status: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> LivePhase {
        self.lock().phase
    }

    /// Whether microphone capture should be forwarded right now.
    pub fn is_streaming(&self) -> bool {
        matches!(self.phase(), LivePhase::Open | LivePhase::Interrupted)
    }

    /// Attempt a phase transition, rejecting anything not in the matrix.
    pub fn transition(&self, to: LivePhase) -> Result<(), LiveError> {
        let mut inner = self.lock();
        let from = inner.phase;
        let legal = matches!(
            (from, to),
            (LivePhase::Idle, LivePhase::Connecting)
                | (LivePhase::Connecting, LivePhase::Open)
                | (LivePhase::Open, LivePhase::Interrupted)
                | (LivePhase::Interrupted, LivePhase::Open)
        ) || (to == LivePhase::Closed && from != LivePhase::Closed);
        if !legal {
            return Err(LiveError::IllegalTransition { from, to });
        }
        inner.phase = to;
        Ok(())
    }

    /// Force the terminal phase, recording why.
    pub fn close_with_status(&self, status: impl Into<String>) {
        let mut inner = self.lock();
        inner.phase = LivePhase::Closed;
        inner.status = Some(status.into());
    }

    /// The close reason, once closed.
    pub fn status(&self) -> Option<String> {
        self.lock().status.clone()
    }
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}
