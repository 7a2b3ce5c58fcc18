//! Execution cycle modes and options.

/// How long an execution cycle keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationMode {
    /// Run frame after frame until cancelled.
    Continuous,
    /// Like `Continuous`, but instruction boundaries consult the debug
    /// stepping rules.
    Debugger,
    /// Return as soon as the CPU executes a HALT.
    UntilHalt,
    /// Return at the end of the current frame.
    UntilFrameEnds,
    /// Return when PC reaches the configured termination point.
    UntilExecutionPoint,
}

/// Stepping behavior in [`EmulationMode::Debugger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugStepMode {
    /// Stop when PC hits a registered breakpoint.
    StopAtBreakpoint,
    /// Stop after one instruction, following calls inward.
    StepInto,
    /// Stop after one instruction, running CALL-family instructions
    /// (CALL, CALL cc, RST) to completion first.
    StepOver,
}

/// Why an execution cycle returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The cycle has not produced a result yet.
    None,
    /// The cancel token was tripped.
    Cancelled,
    /// The tact budget ran out.
    Timeout,
    /// PC reached the configured termination point.
    TerminationPointReached,
    /// A debug stepping rule fired.
    BreakpointReached,
    /// The CPU executed a HALT in `UntilHalt` mode.
    Halted,
    /// The frame finished in `UntilFrameEnds` mode.
    FrameCompleted,
}

/// Outcome of [`SpectrumMachine::execute_cycle`].
///
/// `completed` is `false` only for the externally forced exits
/// (cancellation and timeout).
///
/// [`SpectrumMachine::execute_cycle`]: crate::SpectrumMachine::execute_cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleResult {
    pub completed: bool,
    pub reason: CompletionReason,
}

/// Options for a single execution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteCycleOptions {
    pub emulation_mode: EmulationMode,
    pub debug_step_mode: DebugStepMode,
    /// ROM index a sub-16K termination point must match. The 48K machine
    /// has a single ROM, index 0.
    pub termination_rom: usize,
    /// PC value that ends the cycle in `UntilExecutionPoint` mode.
    pub termination_point: u16,
    /// Suppress debug stops while inside the maskable interrupt routine.
    pub skip_interrupt_routine: bool,
    /// Skip frame pacing and run the CPU flat out.
    pub fast_vm_mode: bool,
    /// Tact budget for the cycle; 0 means no limit.
    pub timeout_tacts: u64,
}

impl ExecuteCycleOptions {
    #[must_use]
    pub fn new(emulation_mode: EmulationMode) -> Self {
        Self {
            emulation_mode,
            debug_step_mode: DebugStepMode::StopAtBreakpoint,
            termination_rom: 0,
            termination_point: 0,
            skip_interrupt_routine: false,
            fast_vm_mode: false,
            timeout_tacts: 0,
        }
    }
}

impl Default for ExecuteCycleOptions {
    fn default() -> Self {
        Self::new(EmulationMode::Continuous)
    }
}
