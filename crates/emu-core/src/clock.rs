//! Host clock provider for frame pacing.

use std::time::{Duration, Instant};

use crate::CancelToken;

/// A monotonic host clock used to pace emulated frames against real time.
///
/// The counter unit is implementation-defined; `frequency` reports counts
/// per second. Pacing targets are computed from a start counter plus a
/// frequency ratio, never from repeated deltas, so rounding drift does not
/// accumulate across frames.
pub trait HostClock {
    /// Current value of the monotonic counter.
    fn counter(&self) -> u64;

    /// Counter increments per second.
    fn frequency(&self) -> u64;

    /// Block until the counter reaches `target` or the token is cancelled.
    fn wait_until(&self, target: u64, cancel: &CancelToken);
}

/// Host clock backed by `std::time::Instant`, counting nanoseconds.
///
/// Sleeps in short slices so a cancellation request interrupts the wait
/// promptly.
#[derive(Debug)]
pub struct StdClock {
    origin: Instant,
}

/// Longest single sleep inside `wait_until`.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(2);

impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for StdClock {
    fn counter(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }

    fn wait_until(&self, target: u64, cancel: &CancelToken) {
        loop {
            let now = self.counter();
            if now >= target || cancel.is_cancelled() {
                return;
            }
            let remaining = Duration::from_nanos(target - now);
            std::thread::sleep(remaining.min(MAX_SLEEP_SLICE));
        }
    }
}
