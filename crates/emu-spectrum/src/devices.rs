//! Attachable peripheral devices.
//!
//! Devices hang off the engine in a flat list and declare which
//! notifications they want through [`DeviceCaps`]. Frame-bound devices
//! hear about frame starts and physical frame completions; operation-bound
//! devices get a callback after every retired instruction.

/// Notification capabilities a device opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCaps {
    /// Receives `on_new_frame` and `on_frame_completed`.
    pub frame_bound: bool,
    /// Receives `on_cpu_operation_completed`.
    pub cpu_op_bound: bool,
}

impl DeviceCaps {
    pub const FRAME_BOUND: Self = Self {
        frame_bound: true,
        cpu_op_bound: false,
    };

    pub const CPU_OP_BOUND: Self = Self {
        frame_bound: false,
        cpu_op_bound: true,
    };

    pub const ALL: Self = Self {
        frame_bound: true,
        cpu_op_bound: true,
    };
}

/// A peripheral attached to the machine.
pub trait Device {
    fn capabilities(&self) -> DeviceCaps;

    /// Hard reset. Called from `SpectrumMachine::reset`.
    fn reset(&mut self) {}

    /// A new frame is starting.
    fn on_new_frame(&mut self) {}

    /// The frame that just ran reached its full tact count.
    fn on_frame_completed(&mut self) {}

    /// An instruction retired.
    fn on_cpu_operation_completed(&mut self) {}
}
