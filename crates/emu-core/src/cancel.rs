//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

/// A cooperative cancellation signal.
///
/// The controlling thread trips the token; the execution worker samples it
/// only at instruction boundaries and inside the frame-pacing wait, so an
/// in-flight instruction always completes atomically. Cancellation is
/// therefore prompt but bounded by one instruction's worst-case tact cost.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Re-arm the token for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
