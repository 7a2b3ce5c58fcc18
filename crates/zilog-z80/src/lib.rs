//! Cycle-accurate Z80 CPU emulator.
//!
//! Each call to [`Z80::step`] executes one complete instruction (or one
//! interrupt acknowledge, or one halted idle cycle) and advances the tact
//! counter by the exact number of T-states the hardware would spend,
//! including any wait states reported by the [`emu_core::Bus`].

mod alu;
mod cpu;
mod flags;
mod registers;

pub use cpu::{CpuState, Z80};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::Registers;
