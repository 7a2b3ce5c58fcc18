//! ULA frame interrupt.
//!
//! The ULA pulls INT low once per frame and holds it for a fixed number
//! of tacts. The device raises the CPU's INT line inside that window and
//! revokes it when the window closes, whether or not the CPU got around
//! to acknowledging. A raise is deferred while the CPU blocks interrupts
//! (the instruction after EI), matching the level-triggered hardware.

use sinclair_ula::ScreenTiming;
use zilog_z80::Z80;

/// Per-frame INT pulse generator.
pub struct InterruptDevice {
    interrupt_tact: u32,
    pulse_tacts: u32,
    raised: bool,
    revoked: bool,
    frames: u64,
}

impl InterruptDevice {
    #[must_use]
    pub fn new(timing: &ScreenTiming) -> Self {
        Self {
            interrupt_tact: timing.interrupt_tact,
            pulse_tacts: timing.interrupt_pulse_tacts,
            raised: false,
            revoked: false,
            frames: 0,
        }
    }

    /// Drives the INT line for the given frame tact. Called by the engine
    /// once per executed instruction.
    pub fn check_for_interrupt(&mut self, cpu: &mut Z80, frame_tact: u32) {
        if self.revoked {
            return;
        }
        if frame_tact < self.interrupt_tact {
            return;
        }
        if frame_tact > self.interrupt_tact + self.pulse_tacts {
            // Window closed before the CPU sampled the line.
            self.revoked = true;
            cpu.set_int_line(false);
            return;
        }
        if self.raised {
            return;
        }
        if cpu.is_interrupt_blocked() {
            return;
        }
        cpu.set_int_line(true);
        self.raised = true;
    }

    /// Re-arms the pulse at the start of a frame.
    pub fn on_new_frame(&mut self) {
        self.raised = false;
        self.revoked = false;
        self.frames += 1;
    }

    pub fn reset(&mut self) {
        self.raised = false;
        self.revoked = false;
        self.frames = 0;
    }

    /// Whether the pulse was raised in the current frame.
    #[must_use]
    pub fn interrupt_raised(&self) -> bool {
        self.raised
    }

    /// Whether the pulse window has already closed this frame.
    #[must_use]
    pub fn interrupt_revoked(&self) -> bool {
        self.revoked
    }

    /// Number of frames the device has seen since reset.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub(crate) fn restore(&mut self, raised: bool, revoked: bool, frames: u64) {
        self.raised = raised;
        self.revoked = revoked;
        self.frames = frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device() -> InterruptDevice {
        InterruptDevice::new(&ScreenTiming::spectrum_48k())
    }

    #[test]
    fn raises_inside_the_window() {
        let mut device = make_device();
        let mut cpu = Z80::new();
        device.check_for_interrupt(&mut cpu, 10);
        assert!(!cpu.int_line());
        device.check_for_interrupt(&mut cpu, 32);
        assert!(cpu.int_line());
        assert!(device.interrupt_raised());
    }

    #[test]
    fn revokes_after_the_window() {
        let mut device = make_device();
        let mut cpu = Z80::new();
        device.check_for_interrupt(&mut cpu, 40);
        assert!(cpu.int_line());
        device.check_for_interrupt(&mut cpu, 56);
        assert!(!cpu.int_line());
        assert!(device.interrupt_revoked());
        // Stays revoked for the rest of the frame.
        device.check_for_interrupt(&mut cpu, 60);
        assert!(!cpu.int_line());
    }

    #[test]
    fn missed_window_never_raises() {
        let mut device = make_device();
        let mut cpu = Z80::new();
        device.check_for_interrupt(&mut cpu, 100);
        assert!(!cpu.int_line());
        assert!(device.interrupt_revoked());
        assert!(!device.interrupt_raised());
    }

    #[test]
    fn new_frame_re_arms() {
        let mut device = make_device();
        let mut cpu = Z80::new();
        device.check_for_interrupt(&mut cpu, 100);
        device.on_new_frame();
        assert_eq!(device.frame_count(), 1);
        device.check_for_interrupt(&mut cpu, 35);
        assert!(cpu.int_line());
    }

    #[test]
    fn deferred_while_cpu_blocks_interrupts() {
        let mut device = make_device();
        let mut cpu = Z80::new();
        let mut bus = DummyBus;
        // EI sets the block for exactly one following instruction.
        cpu.step(&mut bus);
        assert!(cpu.is_interrupt_blocked());
        device.check_for_interrupt(&mut cpu, 32);
        assert!(!cpu.int_line());
        assert!(!device.interrupt_raised());
        // NOP clears the block; the next check raises.
        cpu.step(&mut bus);
        device.check_for_interrupt(&mut cpu, 33);
        assert!(cpu.int_line());
    }

    /// EI at 0x0000, NOPs after.
    struct DummyBus;

    impl emu_core::Bus for DummyBus {
        fn read(&mut self, addr: u16, _tacts: emu_core::Ticks) -> emu_core::ReadResult {
            emu_core::ReadResult::new(if addr == 0 { 0xFB } else { 0x00 })
        }

        fn write(&mut self, _addr: u16, _value: u8, _tacts: emu_core::Ticks) -> u8 {
            0
        }

        fn io_read(&mut self, _port: u16, _tacts: emu_core::Ticks) -> emu_core::ReadResult {
            emu_core::ReadResult::new(0xFF)
        }

        fn io_write(&mut self, _port: u16, _value: u8, _tacts: emu_core::Ticks) -> u8 {
            0
        }
    }
}
