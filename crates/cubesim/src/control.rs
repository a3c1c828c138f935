//! Run lifecycle shared by the host, the UI thread and the engine thread.

use std::sync::atomic::{AtomicBool, Ordering};

/// Stop request and running flag of one simulator run.
#[derive(Debug, Default)]
pub struct RunControl {
    stop_requested: AtomicBool,
    running: AtomicBool,
}

impl RunControl {
    /// Creates a control for a run that has not started.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Asks the engine thread to stop after its current tick.
    pub fn request_stop(&self) {
        if !self.stop_requested.swap(true, Ordering::AcqRel) {
            tracing::info!("stop requested");
        }
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Whether the engine thread is still ticking.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}
