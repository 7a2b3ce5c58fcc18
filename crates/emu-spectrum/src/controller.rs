//! Machine lifecycle controller.
//!
//! The controller owns the machine and moves it onto a worker thread for
//! the duration of an execution cycle. Pausing or stopping trips the
//! shared cancel token, joins the worker and takes the machine back, so
//! exactly one thread touches machine state at any moment. All control
//! calls must come from the thread that created the controller.
//!
//! A panic inside the cycle (a device or bus fault) is caught on the
//! worker; the machine comes back with its state frozen at the failure
//! point and the controller lands in `Stopped`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use emu_core::CancelToken;

use crate::config::{MachineBuildError, MachineConfig};
use crate::engine::SpectrumMachine;
use crate::options::{CycleResult, ExecuteCycleOptions};

/// Lifecycle states of the controlled machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// Controller exists, machine not built yet.
    None,
    /// Machine construction in progress.
    BuildingMachine,
    /// Built and configured, never started.
    BeforeRun,
    Running,
    /// Pause requested, waiting for the worker to wind down.
    Pausing,
    Paused,
    /// Stop requested, waiting for the worker to wind down.
    Stopping,
    Stopped,
}

/// Control operation failure.
#[derive(Debug)]
pub enum VmControlError {
    /// The call came from a thread other than the controller's owner.
    NotOwnerThread,
    /// The operation is not valid in the current state.
    InvalidTransition {
        from: VmState,
        operation: &'static str,
    },
    /// The execution cycle panicked; the machine state is preserved at
    /// the failure point.
    VmFailed(String),
}

impl std::fmt::Display for VmControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOwnerThread => {
                write!(f, "operation must run on the thread that created the machine")
            }
            Self::InvalidTransition { from, operation } => {
                write!(f, "cannot {operation} from state {from:?}")
            }
            Self::VmFailed(message) => write!(f, "execution cycle failed: {message}"),
        }
    }
}

impl std::error::Error for VmControlError {}

type WorkerOutcome = (SpectrumMachine, Result<CycleResult, String>);

/// Owns a [`SpectrumMachine`] and runs its cycles on a worker thread.
pub struct MachineController {
    state: VmState,
    machine: Option<SpectrumMachine>,
    worker: Option<JoinHandle<WorkerOutcome>>,
    cancel: Arc<CancelToken>,
    owner: ThreadId,
    last_result: Option<CycleResult>,
}

impl std::fmt::Debug for MachineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineController")
            .field("state", &self.state)
            .field("owner", &self.owner)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl MachineController {
    /// Builds the machine and takes ownership of it.
    ///
    /// # Errors
    ///
    /// Propagates [`MachineBuildError`] from machine construction.
    pub fn new(config: MachineConfig) -> Result<Self, MachineBuildError> {
        let mut controller = Self {
            state: VmState::None,
            machine: None,
            worker: None,
            cancel: Arc::new(CancelToken::new()),
            owner: thread::current().id(),
            last_result: None,
        };
        controller.transition(VmState::BuildingMachine);
        controller.machine = Some(SpectrumMachine::new(config)?);
        controller.transition(VmState::BeforeRun);
        Ok(controller)
    }

    /// Starts an execution cycle on the worker thread.
    ///
    /// # Errors
    ///
    /// Fails off the owner thread and in any state but `BeforeRun`,
    /// `Paused` or `Stopped`.
    pub fn start(&mut self, options: ExecuteCycleOptions) -> Result<(), VmControlError> {
        self.ensure_owner()?;
        match self.state {
            VmState::BeforeRun | VmState::Paused | VmState::Stopped => {}
            from => {
                return Err(VmControlError::InvalidTransition {
                    from,
                    operation: "start",
                });
            }
        }
        let Some(mut machine) = self.machine.take() else {
            return Err(VmControlError::InvalidTransition {
                from: self.state,
                operation: "start",
            });
        };
        self.cancel.reset();
        let cancel = Arc::clone(&self.cancel);
        let handle = thread::spawn(move || {
            let outcome =
                catch_unwind(AssertUnwindSafe(|| machine.execute_cycle(&cancel, &options)));
            (machine, outcome.map_err(|payload| panic_message(&payload)))
        });
        self.worker = Some(handle);
        self.transition(VmState::Running);
        Ok(())
    }

    /// Interrupts the running cycle and returns its result. The machine
    /// keeps all state and can be resumed with [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Fails off the owner thread, outside `Running`, and when the cycle
    /// panicked (the controller then lands in `Stopped`).
    pub fn pause(&mut self) -> Result<CycleResult, VmControlError> {
        self.ensure_owner()?;
        if self.state != VmState::Running {
            return Err(VmControlError::InvalidTransition {
                from: self.state,
                operation: "pause",
            });
        }
        self.transition(VmState::Pausing);
        self.cancel.cancel();
        self.join_worker(VmState::Paused)
    }

    /// Stops the machine. From `Running` this interrupts the cycle first.
    ///
    /// # Errors
    ///
    /// Fails off the owner thread, in states with nothing to stop, and
    /// when the cycle panicked.
    pub fn stop(&mut self) -> Result<(), VmControlError> {
        self.ensure_owner()?;
        match self.state {
            VmState::Running => {
                self.transition(VmState::Stopping);
                self.cancel.cancel();
                self.join_worker(VmState::Stopped).map(|_| ())
            }
            VmState::BeforeRun | VmState::Paused => {
                self.transition(VmState::Stopping);
                self.transition(VmState::Stopped);
                Ok(())
            }
            from => Err(VmControlError::InvalidTransition {
                from,
                operation: "stop",
            }),
        }
    }

    /// Blocks until the running cycle completes on its own (for modes
    /// that terminate, like `UntilHalt`) and returns its result.
    ///
    /// # Errors
    ///
    /// Fails off the owner thread, outside `Running`, and when the cycle
    /// panicked.
    pub fn wait_for_completion(&mut self) -> Result<CycleResult, VmControlError> {
        self.ensure_owner()?;
        if self.state != VmState::Running {
            return Err(VmControlError::InvalidTransition {
                from: self.state,
                operation: "wait for",
            });
        }
        self.join_worker(VmState::Paused)
    }

    #[must_use]
    pub fn state(&self) -> VmState {
        self.state
    }

    /// Result of the most recently finished cycle.
    #[must_use]
    pub fn last_result(&self) -> Option<CycleResult> {
        self.last_result
    }

    /// The machine, when not running on the worker.
    #[must_use]
    pub fn machine(&self) -> Option<&SpectrumMachine> {
        self.machine.as_ref()
    }

    pub fn machine_mut(&mut self) -> Option<&mut SpectrumMachine> {
        self.machine.as_mut()
    }

    fn ensure_owner(&self) -> Result<(), VmControlError> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(VmControlError::NotOwnerThread)
        }
    }

    fn join_worker(&mut self, on_success: VmState) -> Result<CycleResult, VmControlError> {
        let Some(handle) = self.worker.take() else {
            return Err(VmControlError::InvalidTransition {
                from: self.state,
                operation: "join",
            });
        };
        match handle.join() {
            Ok((machine, Ok(result))) => {
                self.machine = Some(machine);
                self.last_result = Some(result);
                self.transition(on_success);
                Ok(result)
            }
            Ok((machine, Err(message))) => {
                self.machine = Some(machine);
                self.transition(VmState::Stopped);
                log::warn!("execution cycle panicked: {message}");
                Err(VmControlError::VmFailed(message))
            }
            Err(payload) => {
                self.transition(VmState::Stopped);
                Err(VmControlError::VmFailed(panic_message(&payload)))
            }
        }
    }

    fn transition(&mut self, to: VmState) {
        log::debug!("vm state: {:?} -> {to:?}", self.state);
        self.state = to;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker thread panicked".to_string()
    }
}
