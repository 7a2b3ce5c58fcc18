//! Core traits and types for cycle-accurate emulation.
//!
//! Everything is measured in tacts of the CPU clock. All component timing
//! derives from the tact counter. No exceptions.

mod bus;
mod cancel;
mod clock;
mod ticks;

pub use bus::{Bus, ReadResult};
pub use cancel::CancelToken;
pub use clock::{HostClock, StdClock};
pub use ticks::Ticks;
