//! Machine state snapshots.
//!
//! A snapshot is a JSON document: a model tag, a format version and one
//! entry per stateful device. RAM travels base64-encoded. Restoring
//! validates everything before touching the machine, so a rejected
//! snapshot leaves the current state intact.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use zilog_z80::CpuState;

use crate::engine::{FrameState, SpectrumMachine};
use crate::memory::RAM_SIZE;

/// Model tag written into snapshots of the 48K machine.
pub const MODEL_48K: &str = "spectrum-48k";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Why a snapshot could not be produced or restored.
#[derive(Debug)]
pub enum SnapshotError {
    /// The snapshot was taken on a different machine model.
    ModelMismatch {
        expected: &'static str,
        found: String,
    },
    /// The snapshot format version is newer than this build understands.
    UnsupportedVersion(u32),
    /// A required device entry is absent.
    MissingDevice(&'static str),
    /// The RAM block failed to decode or has the wrong size.
    InvalidRam(String),
    /// The JSON itself did not parse, including unknown device tags.
    Json(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelMismatch { expected, found } => {
                write!(f, "snapshot is for model {found:?}, this machine is {expected:?}")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported snapshot version {version} (expected {SNAPSHOT_VERSION})")
            }
            Self::MissingDevice(name) => write!(f, "snapshot has no {name} device entry"),
            Self::InvalidRam(reason) => write!(f, "invalid RAM block: {reason}"),
            Self::Json(reason) => write!(f, "malformed snapshot: {reason}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Serialized state of the whole machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub model: String,
    pub version: u32,
    pub devices: Vec<DeviceSnapshot>,
}

/// State of one device, tagged by device name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device")]
pub enum DeviceSnapshot {
    Cpu(CpuState),
    Ula {
        last_rendered_tact: i64,
    },
    Memory {
        /// Base64 of the 48K RAM block.
        ram: String,
    },
    Interrupt {
        raised: bool,
        revoked: bool,
        frame_count: u64,
    },
    Engine {
        frame_count: u64,
        overflow: u64,
        last_frame_start_tick: u64,
        frame_completed: bool,
        runs_in_maskable_interrupt: bool,
    },
}

impl MachineSnapshot {
    /// Serializes the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] when serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|err| SnapshotError::Json(err.to_string()))
    }

    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] when the document does not parse,
    /// including snapshots carrying unknown device tags.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(text).map_err(|err| SnapshotError::Json(err.to_string()))
    }
}

impl SpectrumMachine {
    /// Captures the full machine state at the current instruction boundary.
    #[must_use]
    pub fn get_state(&self) -> MachineSnapshot {
        let frame = self.frame_state();
        MachineSnapshot {
            model: MODEL_48K.to_string(),
            version: SNAPSHOT_VERSION,
            devices: vec![
                DeviceSnapshot::Cpu(self.cpu().state()),
                DeviceSnapshot::Ula {
                    last_rendered_tact: frame.last_rendered_tact,
                },
                DeviceSnapshot::Memory {
                    ram: STANDARD.encode(self.memory().ram()),
                },
                DeviceSnapshot::Interrupt {
                    raised: self.interrupt_device().interrupt_raised(),
                    revoked: self.interrupt_device().interrupt_revoked(),
                    frame_count: self.interrupt_device().frame_count(),
                },
                DeviceSnapshot::Engine {
                    frame_count: frame.frame_count,
                    overflow: frame.overflow,
                    last_frame_start_tick: frame.last_frame_start_tick,
                    frame_completed: frame.frame_completed,
                    runs_in_maskable_interrupt: frame.runs_in_maskable_interrupt,
                },
            ],
        }
    }

    /// Restores the machine from a snapshot.
    ///
    /// # Errors
    ///
    /// Rejects snapshots for other models, unsupported versions, missing
    /// device entries and undecodable RAM blocks. On any error the
    /// machine state is left unchanged.
    pub fn restore_state(&mut self, snapshot: &MachineSnapshot) -> Result<(), SnapshotError> {
        if snapshot.model != MODEL_48K {
            return Err(SnapshotError::ModelMismatch {
                expected: MODEL_48K,
                found: snapshot.model.clone(),
            });
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        let mut cpu_state: Option<&CpuState> = None;
        let mut ula_tact: Option<i64> = None;
        let mut ram_text: Option<&str> = None;
        let mut interrupt_state: Option<(bool, bool, u64)> = None;
        let mut engine_state: Option<(u64, u64, u64, bool, bool)> = None;
        for device in &snapshot.devices {
            match device {
                DeviceSnapshot::Cpu(state) => cpu_state = Some(state),
                DeviceSnapshot::Ula { last_rendered_tact } => ula_tact = Some(*last_rendered_tact),
                DeviceSnapshot::Memory { ram } => ram_text = Some(ram),
                DeviceSnapshot::Interrupt {
                    raised,
                    revoked,
                    frame_count,
                } => interrupt_state = Some((*raised, *revoked, *frame_count)),
                DeviceSnapshot::Engine {
                    frame_count,
                    overflow,
                    last_frame_start_tick,
                    frame_completed,
                    runs_in_maskable_interrupt,
                } => {
                    engine_state = Some((
                        *frame_count,
                        *overflow,
                        *last_frame_start_tick,
                        *frame_completed,
                        *runs_in_maskable_interrupt,
                    ));
                }
            }
        }
        let cpu_state = cpu_state.ok_or(SnapshotError::MissingDevice("cpu"))?;
        let ula_tact = ula_tact.ok_or(SnapshotError::MissingDevice("ula"))?;
        let ram_text = ram_text.ok_or(SnapshotError::MissingDevice("memory"))?;
        let (raised, revoked, interrupt_frames) =
            interrupt_state.ok_or(SnapshotError::MissingDevice("interrupt"))?;
        let (frame_count, overflow, last_frame_start_tick, frame_completed, in_interrupt) =
            engine_state.ok_or(SnapshotError::MissingDevice("engine"))?;

        let ram = STANDARD
            .decode(ram_text)
            .map_err(|err| SnapshotError::InvalidRam(err.to_string()))?;
        if ram.len() != RAM_SIZE {
            return Err(SnapshotError::InvalidRam(format!(
                "RAM block must be {RAM_SIZE} bytes, got {}",
                ram.len()
            )));
        }

        self.cpu_mut().restore(cpu_state);
        // The INT line itself is transient bus state; rebuild it from the
        // pulse flags so a snapshot taken mid-window keeps its interrupt.
        self.cpu_mut().set_int_line(raised && !revoked);
        self.bus_mut().memory.load_ram(&ram);
        self.interrupt_mut().restore(raised, revoked, interrupt_frames);
        self.restore_frame_state(&FrameState {
            frame_count,
            overflow,
            last_frame_start_tick,
            last_rendered_tact: ula_tact,
            frame_completed,
            runs_in_maskable_interrupt: in_interrupt,
        });
        log::debug!("snapshot restored at frame {frame_count}");
        Ok(())
    }
}
