//! ZX Spectrum 48K emulator core.
//!
//! Wires the Z80 core, the ULA timing model and the 48K memory map into
//! a frame-synchronous machine. The CPU sees contention through the bus
//! on every access, the ULA interrupt device drives the INT line inside
//! its per-frame window, and [`SpectrumMachine::execute_cycle`] runs it
//! all in physical frames with pluggable exit conditions: continuous,
//! until HALT, until frame end, until an execution point, or under
//! debugger stepping rules.
//!
//! [`MachineController`] adds the threaded lifecycle on top: it moves
//! the machine onto a worker thread to run, and brings it back on pause
//! or stop. Full machine state round-trips through JSON snapshots.

mod bus;
mod config;
mod controller;
mod debug;
mod devices;
mod engine;
mod interrupt;
mod memory;
mod options;
mod screen;
mod snapshot;

pub use bus::SpectrumBus;
pub use config::{
    BASE_CLOCK_48K, MachineBuildError, MachineConfig, ROM_SIZE, normalize_clock_multiplier,
};
pub use controller::{MachineController, VmControlError, VmState};
pub use debug::{Breakpoints, DebugInfoProvider};
pub use devices::{Device, DeviceCaps};
pub use engine::SpectrumMachine;
pub use interrupt::InterruptDevice;
pub use memory::{Memory48, RAM_SIZE};
pub use options::{CompletionReason, CycleResult, DebugStepMode, EmulationMode, ExecuteCycleOptions};
pub use screen::{NullScreen, ScreenSink};
pub use snapshot::{DeviceSnapshot, MODEL_48K, MachineSnapshot, SNAPSHOT_VERSION, SnapshotError};
