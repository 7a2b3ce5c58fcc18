//! Contention-aware system bus.
//!
//! Routes CPU accesses to the memory map and I/O space and answers every
//! access with the wait states the ULA would impose at that exact
//! frame-relative tact. The bus holds a frame origin (CPU tact of the
//! current frame start) that the engine re-anchors once per frame, so the
//! conversion from the CPU's free-running counter to a ULA tact is a
//! subtraction and a divide by the clock multiplier.

use emu_core::{Bus, ReadResult, Ticks};
use sinclair_ula::ScreenTiming;

use crate::memory::Memory48;

/// System bus of the 48K Spectrum.
pub struct SpectrumBus {
    /// The 64K memory map.
    pub memory: Memory48,
    timing: ScreenTiming,
    frame_start_tick: u64,
    clock_multiplier: u32,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Memory48, timing: ScreenTiming) -> Self {
        Self {
            memory,
            timing,
            frame_start_tick: 0,
            clock_multiplier: 1,
        }
    }

    /// Re-anchors the frame origin. The engine calls this at every frame
    /// boundary (and on reset) so contention tracks the running frame.
    pub fn set_frame_origin(&mut self, start_tick: u64, clock_multiplier: u32) {
        self.frame_start_tick = start_tick;
        self.clock_multiplier = clock_multiplier;
    }

    /// Converts a CPU tact count to a frame-relative ULA tact.
    fn frame_tact(&self, tacts: Ticks) -> u32 {
        let elapsed =
            tacts.get().saturating_sub(self.frame_start_tick) / u64::from(self.clock_multiplier);
        elapsed as u32
    }

    fn memory_wait(&self, addr: u16, tacts: Ticks) -> u8 {
        if self.memory.contended_page(addr) {
            self.timing.contention_delay(self.frame_tact(tacts))
        } else {
            0
        }
    }
}

impl Bus for SpectrumBus {
    fn read(&mut self, addr: u16, tacts: Ticks) -> ReadResult {
        ReadResult::with_wait(self.memory.read(addr), self.memory_wait(addr, tacts))
    }

    fn write(&mut self, addr: u16, value: u8, tacts: Ticks) -> u8 {
        let wait = self.memory_wait(addr, tacts);
        self.memory.write(addr, value);
        wait
    }

    fn io_read(&mut self, port: u16, tacts: Ticks) -> ReadResult {
        // Nothing drives the data bus on this machine model, so reads
        // float high. The timing cost is still the real one.
        let wait = self.timing.io_contention_delay(
            self.frame_tact(tacts),
            self.memory.contended_page(port),
            port & 1 == 0,
        );
        ReadResult::with_wait(0xFF, wait)
    }

    fn io_write(&mut self, port: u16, _value: u8, tacts: Ticks) -> u8 {
        self.timing.io_contention_delay(
            self.frame_tact(tacts),
            self.memory.contended_page(port),
            port & 1 == 0,
        )
    }
}
