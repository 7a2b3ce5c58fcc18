//! Frame-synchronous execution engine.
//!
//! The machine runs the CPU in physical frames of the ULA's tact count,
//! re-anchoring the frame origin whenever a frame completes. Because
//! instructions do not align with frame ends, the engine tracks the
//! overflow (tacts the last instruction spilled into the new frame) and
//! starts the next frame that far in.
//!
//! `execute_cycle` is the single entry point: it runs frames until its
//! options say otherwise, checking cancellation, timeout, termination
//! points and the debug stepping rules only at instruction boundaries so
//! a stop never lands mid-instruction.

use emu_core::{CancelToken, HostClock, StdClock};
use sinclair_ula::ScreenTiming;
use zilog_z80::Z80;

use crate::bus::SpectrumBus;
use crate::config::{MachineBuildError, MachineConfig, ROM_SIZE, normalize_clock_multiplier};
use crate::debug::DebugInfoProvider;
use crate::devices::Device;
use crate::interrupt::InterruptDevice;
use crate::memory::Memory48;
use crate::options::{
    CompletionReason, CycleResult, DebugStepMode, EmulationMode, ExecuteCycleOptions,
};
use crate::screen::{NullScreen, ScreenSink};

/// PC of the RET that leaves the 48K ROM's maskable interrupt routine.
/// Reaching it clears the in-interrupt-routine flag.
const INTERRUPT_ROUTINE_EXIT: u16 = 0x0052;

/// The ZX Spectrum 48K with its execution engine.
pub struct SpectrumMachine {
    cpu: Z80,
    bus: SpectrumBus,
    interrupt: InterruptDevice,
    timing: ScreenTiming,
    clock: Box<dyn HostClock + Send>,
    screen: Box<dyn ScreenSink + Send>,
    debug_provider: Option<Box<dyn DebugInfoProvider + Send>>,
    devices: Vec<Box<dyn Device + Send>>,
    base_clock_hz: u32,
    clock_multiplier: u32,
    /// Frame length in ULA tacts, cached from the timing descriptor.
    frame_tacts: u64,
    /// Physical frames completed since reset.
    frame_count: u64,
    /// ULA tacts the last instruction of the previous frame spilled into
    /// the current one.
    overflow: u64,
    /// CPU tact count at the start of the current frame.
    last_frame_start_tick: u64,
    /// Last frame tact reported to the screen sink.
    last_rendered_tact: i64,
    frame_completed: bool,
    runs_in_maskable_interrupt: bool,
    /// PC of the most recent debug stop, kept so resuming does not
    /// immediately re-trigger the same breakpoint.
    last_breakpoint: Option<u16>,
}

impl std::fmt::Debug for SpectrumMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumMachine")
            .field("base_clock_hz", &self.base_clock_hz)
            .field("clock_multiplier", &self.clock_multiplier)
            .field("frame_tacts", &self.frame_tacts)
            .field("frame_count", &self.frame_count)
            .field("overflow", &self.overflow)
            .field("frame_completed", &self.frame_completed)
            .finish_non_exhaustive()
    }
}

impl SpectrumMachine {
    /// Builds a machine from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MachineBuildError::InvalidRomSize`] when the ROM image
    /// is not exactly 16K.
    pub fn new(config: MachineConfig) -> Result<Self, MachineBuildError> {
        if config.rom.len() != ROM_SIZE {
            return Err(MachineBuildError::InvalidRomSize(config.rom.len()));
        }
        let timing = config.timing;
        let memory = Memory48::new(&config.rom);
        let mut machine = Self {
            cpu: Z80::new(),
            bus: SpectrumBus::new(memory, timing),
            interrupt: InterruptDevice::new(&timing),
            timing,
            clock: Box::new(StdClock::new()),
            screen: Box::new(NullScreen),
            debug_provider: None,
            devices: Vec::new(),
            base_clock_hz: config.base_clock_hz,
            clock_multiplier: normalize_clock_multiplier(config.clock_multiplier),
            frame_tacts: u64::from(timing.frame_tacts()),
            frame_count: 0,
            overflow: 0,
            last_frame_start_tick: 0,
            last_rendered_tact: -1,
            frame_completed: true,
            runs_in_maskable_interrupt: false,
            last_breakpoint: None,
        };
        machine.reset();
        Ok(machine)
    }

    /// Hard reset: CPU, memory fill, devices and all frame bookkeeping.
    /// The next `execute_cycle` starts a fresh frame at tact zero.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.memory.reset();
        self.interrupt.reset();
        for device in &mut self.devices {
            device.reset();
        }
        if let Some(provider) = self.debug_provider.as_mut() {
            provider.set_imminent_breakpoint(None);
        }
        self.frame_count = 0;
        self.overflow = 0;
        self.last_frame_start_tick = 0;
        self.last_rendered_tact = -1;
        self.frame_completed = true;
        self.runs_in_maskable_interrupt = false;
        self.last_breakpoint = None;
        self.bus.set_frame_origin(0, self.clock_multiplier);
        log::debug!("machine reset");
    }

    /// Runs the machine according to `options` until one of its exit
    /// conditions fires. Returns how and why the cycle ended.
    pub fn execute_cycle(
        &mut self,
        cancel: &CancelToken,
        options: &ExecuteCycleOptions,
    ) -> CycleResult {
        let cycle_start_tact = self.cpu.tacts().get();
        let cycle_start_counter = self.clock.counter();
        let physical_frame_clock_count = self.clock.frequency() as f64
            / f64::from(self.base_clock_hz)
            * self.frame_tacts as f64;
        let mut cycle_frames: u64 = 0;
        let mut executed_instructions: i64 = -1;

        loop {
            if self.frame_completed {
                self.frame_completed = false;
                self.last_frame_start_tick = self.cpu.tacts().get() - self.overflow;
                self.bus
                    .set_frame_origin(self.last_frame_start_tick, self.clock_multiplier);
                self.interrupt.on_new_frame();
                for device in &mut self.devices {
                    if device.capabilities().frame_bound {
                        device.on_new_frame();
                    }
                }
                self.last_rendered_tact = self.overflow as i64;
            }

            while !self.frame_completed {
                if self.runs_in_maskable_interrupt
                    && self.cpu.registers().pc == INTERRUPT_ROUTINE_EXIT
                {
                    self.runs_in_maskable_interrupt = false;
                }

                if !self.cpu.is_in_op_execution() {
                    executed_instructions += 1;

                    if cancel.is_cancelled() {
                        return self.finish(false, CompletionReason::Cancelled);
                    }
                    if options.timeout_tacts > 0
                        && cycle_start_tact + options.timeout_tacts < self.cpu.tacts().get()
                    {
                        return self.finish(false, CompletionReason::Timeout);
                    }
                    if options.emulation_mode == EmulationMode::UntilExecutionPoint
                        && self.termination_point_reached(options)
                    {
                        return self.finish(true, CompletionReason::TerminationPointReached);
                    }
                    if self.cpu.maskable_interrupt_mode_entered() {
                        self.runs_in_maskable_interrupt = true;
                    }
                    if options.emulation_mode == EmulationMode::Debugger
                        && self.is_debug_stop(options, executed_instructions)
                    {
                        self.last_breakpoint = Some(self.cpu.registers().pc);
                        // Freeze the picture as it stands.
                        self.screen.frame_completed();
                        return self.finish(true, CompletionReason::BreakpointReached);
                    }
                }

                let frame_tact = self.current_frame_tact() as u32;
                self.interrupt.check_for_interrupt(&mut self.cpu, frame_tact);

                self.cpu.step(&mut self.bus);
                self.last_breakpoint = None;

                let current = self.current_frame_tact() as i64;
                let render_to = current.min(self.frame_tacts as i64 - 1);
                if render_to > self.last_rendered_tact {
                    self.screen
                        .render_range((self.last_rendered_tact + 1) as u32, render_to as u32);
                    self.last_rendered_tact = render_to;
                }

                if options.emulation_mode == EmulationMode::UntilHalt && self.cpu.is_halted() {
                    return self.finish(true, CompletionReason::Halted);
                }

                for device in &mut self.devices {
                    if device.capabilities().cpu_op_bound {
                        device.on_cpu_operation_completed();
                    }
                }

                self.frame_completed = !self.cpu.is_in_op_execution()
                    && self.current_frame_tact() >= self.frame_tacts;
            }

            self.frame_count += 1;
            cycle_frames += 1;
            self.overflow = self.current_frame_tact() % self.frame_tacts;
            for device in &mut self.devices {
                if device.capabilities().frame_bound {
                    device.on_frame_completed();
                }
            }
            self.screen.frame_completed();

            if options.emulation_mode == EmulationMode::UntilFrameEnds {
                return self.finish(true, CompletionReason::FrameCompleted);
            }

            if !options.fast_vm_mode {
                let target = cycle_start_counter
                    + (cycle_frames as f64 * physical_frame_clock_count) as u64;
                self.clock.wait_until(target, cancel);
            }
        }
    }

    /// ULA tact within the current frame. May exceed the frame length
    /// while the last instruction of a frame spills over.
    #[must_use]
    pub fn current_frame_tact(&self) -> u64 {
        (self.cpu.tacts().get() - self.last_frame_start_tick) / u64::from(self.clock_multiplier)
    }

    fn finish(&self, completed: bool, reason: CompletionReason) -> CycleResult {
        log::debug!(
            "execution cycle ended: {reason:?} (completed: {completed}, frames: {})",
            self.frame_count
        );
        CycleResult { completed, reason }
    }

    fn termination_point_reached(&self, options: &ExecuteCycleOptions) -> bool {
        let pc = self.cpu.registers().pc;
        if options.termination_point < 0x4000 {
            // ROM addresses only match the active ROM; the 48K machine
            // has a single ROM, index 0.
            options.termination_rom == 0 && pc == options.termination_point
        } else {
            pc == options.termination_point
        }
    }

    fn is_debug_stop(&mut self, options: &ExecuteCycleOptions, executed_instructions: i64) -> bool {
        if self.debug_provider.is_none() {
            return false;
        }
        if options.skip_interrupt_routine && self.runs_in_maskable_interrupt {
            return false;
        }
        let pc = self.cpu.registers().pc;
        match options.debug_step_mode {
            DebugStepMode::StepInto => executed_instructions > 0,
            DebugStepMode::StopAtBreakpoint => {
                let Some(provider) = self.debug_provider.as_ref() else {
                    return false;
                };
                provider.should_break_at(pc)
                    && (executed_instructions > 0 || self.last_breakpoint != Some(pc))
            }
            DebugStepMode::StepOver => {
                let imminent = self
                    .debug_provider
                    .as_ref()
                    .and_then(|provider| provider.imminent_breakpoint());
                if imminent == Some(pc) {
                    if let Some(provider) = self.debug_provider.as_mut() {
                        provider.set_imminent_breakpoint(None);
                    }
                    return true;
                }
                let mut imminent_just_created = false;
                if imminent.is_none() {
                    let length = self.cpu.call_instruction_length(&mut self.bus);
                    if length > 0 {
                        if let Some(provider) = self.debug_provider.as_mut() {
                            provider.set_imminent_breakpoint(Some(pc.wrapping_add(length)));
                        }
                        imminent_just_created = true;
                    }
                }
                executed_instructions > 0 && imminent.is_none() && !imminent_just_created
            }
        }
    }

    /// Writes a byte through the memory map; ROM stays protected.
    pub fn write_spectrum_memory(&mut self, addr: u16, value: u8) {
        self.bus.memory.write(addr, value);
    }

    /// Copies a code block into memory at `addr`, honoring ROM protection.
    pub fn inject_code(&mut self, addr: u16, code: &[u8]) {
        for (offset, byte) in code.iter().enumerate() {
            self.write_spectrum_memory(addr.wrapping_add(offset as u16), *byte);
        }
    }

    pub fn attach_device(&mut self, device: Box<dyn Device + Send>) {
        self.devices.push(device);
    }

    pub fn set_screen_sink(&mut self, sink: Box<dyn ScreenSink + Send>) {
        self.screen = sink;
    }

    pub fn set_debug_provider(&mut self, provider: Box<dyn DebugInfoProvider + Send>) {
        self.debug_provider = Some(provider);
    }

    /// Swaps the pacing clock. Tests use this to make pacing deterministic.
    pub fn set_clock(&mut self, clock: Box<dyn HostClock + Send>) {
        self.clock = clock;
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }

    #[must_use]
    pub fn memory(&self) -> &Memory48 {
        &self.bus.memory
    }

    #[must_use]
    pub fn interrupt_device(&self) -> &InterruptDevice {
        &self.interrupt
    }

    #[must_use]
    pub fn timing(&self) -> &ScreenTiming {
        &self.timing
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    #[must_use]
    pub fn clock_multiplier(&self) -> u32 {
        self.clock_multiplier
    }

    #[must_use]
    pub fn runs_in_maskable_interrupt(&self) -> bool {
        self.runs_in_maskable_interrupt
    }

    pub(crate) fn interrupt_mut(&mut self) -> &mut InterruptDevice {
        &mut self.interrupt
    }

    pub(crate) fn base_clock_hz(&self) -> u32 {
        self.base_clock_hz
    }

    pub(crate) fn frame_state(&self) -> FrameState {
        FrameState {
            frame_count: self.frame_count,
            overflow: self.overflow,
            last_frame_start_tick: self.last_frame_start_tick,
            last_rendered_tact: self.last_rendered_tact,
            frame_completed: self.frame_completed,
            runs_in_maskable_interrupt: self.runs_in_maskable_interrupt,
        }
    }

    pub(crate) fn restore_frame_state(&mut self, state: &FrameState) {
        self.frame_count = state.frame_count;
        self.overflow = state.overflow;
        self.last_frame_start_tick = state.last_frame_start_tick;
        self.last_rendered_tact = state.last_rendered_tact;
        self.frame_completed = state.frame_completed;
        self.runs_in_maskable_interrupt = state.runs_in_maskable_interrupt;
        self.last_breakpoint = None;
        self.bus
            .set_frame_origin(state.last_frame_start_tick, self.clock_multiplier);
    }
}

/// Frame bookkeeping captured into and restored from snapshots.
pub(crate) struct FrameState {
    pub frame_count: u64,
    pub overflow: u64,
    pub last_frame_start_tick: u64,
    pub last_rendered_tact: i64,
    pub frame_completed: bool,
    pub runs_in_maskable_interrupt: bool,
}
