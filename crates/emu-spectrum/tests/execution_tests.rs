//! Execution cycle behavior: exit modes, frame accounting, interrupt
//! delivery and pacing.

mod common;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use common::{RecordingScreen, ScreenLog, machine_with_program, machine_with_rom, rom_with};
use emu_core::{CancelToken, HostClock};
use emu_spectrum::{
    CompletionReason, EmulationMode, ExecuteCycleOptions, MachineConfig, SpectrumMachine,
};

const FRAME_TACTS: u64 = 69_888;

fn run(machine: &mut SpectrumMachine, options: &ExecuteCycleOptions) -> emu_spectrum::CycleResult {
    machine.execute_cycle(&CancelToken::new(), options)
}

#[test]
fn until_halt_stops_on_halt() {
    let mut machine = machine_with_program(&[0xF3, 0x76]); // DI; HALT
    let result = run(
        &mut machine,
        &ExecuteCycleOptions::new(EmulationMode::UntilHalt),
    );
    assert!(result.completed);
    assert_eq!(result.reason, CompletionReason::Halted);
    assert!(machine.cpu().is_halted());
    assert_eq!(machine.cpu().tacts().get(), 8);
    assert_eq!(machine.frame_count(), 0);
}

#[test]
fn until_frame_ends_runs_exactly_one_frame() {
    // JR loop: 12 tacts per iteration, 5824 iterations per frame.
    let mut machine = machine_with_program(&[0x18, 0xFE]);
    let result = run(
        &mut machine,
        &ExecuteCycleOptions::new(EmulationMode::UntilFrameEnds),
    );
    assert!(result.completed);
    assert_eq!(result.reason, CompletionReason::FrameCompleted);
    assert_eq!(machine.frame_count(), 1);
    assert_eq!(machine.overflow(), 0);
    assert_eq!(machine.cpu().tacts().get(), FRAME_TACTS);
}

#[test]
fn frame_overflow_carries_into_the_next_frame() {
    // JP 0x0000 jumping to itself: 10 tacts per loop, which does not
    // divide the frame length, so frames end mid-instruction and the
    // spill grows by 2 tacts each frame.
    let mut machine = machine_with_program(&[0xC3, 0x00, 0x00]);
    let options = ExecuteCycleOptions::new(EmulationMode::UntilFrameEnds);

    run(&mut machine, &options);
    assert_eq!(machine.frame_count(), 1);
    assert_eq!(machine.overflow(), 2);
    assert_eq!(machine.cpu().tacts().get(), FRAME_TACTS + 2);

    run(&mut machine, &options);
    assert_eq!(machine.frame_count(), 2);
    assert_eq!(machine.overflow(), 4);
    assert_eq!(machine.cpu().tacts().get(), 2 * FRAME_TACTS + 4);

    run(&mut machine, &options);
    assert_eq!(machine.frame_count(), 3);
    assert_eq!(machine.overflow(), 6);
    assert_eq!(machine.cpu().tacts().get(), 3 * FRAME_TACTS + 6);

    // Conservation: the CPU clock always equals completed frames plus
    // the spill into the current one.
    assert_eq!(
        machine.cpu().tacts().get(),
        machine.frame_count() * FRAME_TACTS + machine.overflow()
    );
}

#[test]
fn until_execution_point_stops_in_rom() {
    let mut machine = machine_with_program(&[0x3E, 0x42, 0x06, 0x13, 0x76]);
    let options = ExecuteCycleOptions {
        termination_point: 0x0004,
        ..ExecuteCycleOptions::new(EmulationMode::UntilExecutionPoint)
    };
    let result = run(&mut machine, &options);
    assert!(result.completed);
    assert_eq!(result.reason, CompletionReason::TerminationPointReached);
    assert_eq!(machine.cpu().registers().pc, 0x0004);
    assert_eq!(machine.cpu().registers().a, 0x42);
    assert_eq!(machine.cpu().registers().b, 0x13);
    // The HALT at the termination point never executed.
    assert!(!machine.cpu().is_halted());
    assert_eq!(machine.cpu().tacts().get(), 14);
}

#[test]
fn until_execution_point_stops_in_ram() {
    let mut machine = machine_with_program(&[0xC3, 0x00, 0x80]); // JP 0x8000
    machine.inject_code(0x8000, &[0x06, 0x07, 0x76]); // LD B,7; HALT
    let options = ExecuteCycleOptions {
        termination_point: 0x8002,
        ..ExecuteCycleOptions::new(EmulationMode::UntilExecutionPoint)
    };
    let result = run(&mut machine, &options);
    assert!(result.completed);
    assert_eq!(result.reason, CompletionReason::TerminationPointReached);
    assert_eq!(machine.cpu().registers().pc, 0x8002);
    assert_eq!(machine.cpu().registers().b, 0x07);
    assert_eq!(machine.cpu().tacts().get(), 17);
}

#[test]
fn timeout_interrupts_at_an_instruction_boundary() {
    let mut machine = machine_with_program(&[0x18, 0xFE]);
    let options = ExecuteCycleOptions {
        timeout_tacts: 1000,
        fast_vm_mode: true,
        ..ExecuteCycleOptions::new(EmulationMode::Continuous)
    };
    let result = run(&mut machine, &options);
    assert!(!result.completed);
    assert_eq!(result.reason, CompletionReason::Timeout);
    // First boundary past the budget: 84 JRs at 12 tacts each.
    assert_eq!(machine.cpu().tacts().get(), 1008);
    assert_eq!(machine.frame_count(), 0);
}

#[test]
fn cancellation_returns_before_any_instruction() {
    let mut machine = machine_with_program(&[0x18, 0xFE]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = machine.execute_cycle(
        &cancel,
        &ExecuteCycleOptions::new(EmulationMode::Continuous),
    );
    assert!(!result.completed);
    assert_eq!(result.reason, CompletionReason::Cancelled);
    assert_eq!(machine.cpu().tacts().get(), 0);
    assert_eq!(machine.cpu().registers().pc, 0);
}

#[test]
fn ula_interrupt_fires_once_per_frame() {
    // EI; IM 1; spin. The service routine increments A, then leaves
    // through the ROM's standard exit path at 0x0052.
    let mut machine = machine_with_rom(&[
        (0, &[0xFB, 0xED, 0x56, 0x18, 0xFE]),
        (0x38, &[0x3C, 0xC3, 0x52, 0x00]), // INC A; JP 0x0052
        (0x52, &[0xFB, 0xC9]),             // EI; RET
    ]);
    let options = ExecuteCycleOptions::new(EmulationMode::UntilFrameEnds);

    run(&mut machine, &options);
    assert_eq!(machine.cpu().registers().a, 1);
    assert!(!machine.runs_in_maskable_interrupt());
    assert!(machine.interrupt_device().interrupt_revoked());

    run(&mut machine, &options);
    assert_eq!(machine.cpu().registers().a, 2);
    assert_eq!(machine.interrupt_device().frame_count(), 2);
}

#[test]
fn interrupt_entry_tracks_the_service_routine() {
    let mut machine = machine_with_rom(&[
        (0, &[0xFB, 0xED, 0x56, 0x18, 0xFE]),
        (0x38, &[0x76]), // HALT inside the routine
    ]);
    let result = run(
        &mut machine,
        &ExecuteCycleOptions::new(EmulationMode::UntilHalt),
    );
    assert_eq!(result.reason, CompletionReason::Halted);
    // Halted inside the handler, before any 0x0052 exit.
    assert!(machine.runs_in_maskable_interrupt());
}

#[test]
fn inject_code_respects_rom_protection() {
    let mut machine = machine_with_program(&[]);
    machine.inject_code(0x0000, &[0xAA]);
    assert_eq!(machine.memory().peek(0x0000), 0x00);
    machine.inject_code(0x8000, &[0xAA, 0xBB]);
    assert_eq!(machine.memory().peek(0x8000), 0xAA);
    assert_eq!(machine.memory().peek(0x8001), 0xBB);
}

#[test]
fn screen_sink_sees_contiguous_ranges_and_one_completion() {
    let log = Arc::new(Mutex::new(ScreenLog::default()));
    let mut machine = machine_with_program(&[0x18, 0xFE]);
    machine.set_screen_sink(Box::new(RecordingScreen(Arc::clone(&log))));
    run(
        &mut machine,
        &ExecuteCycleOptions::new(EmulationMode::UntilFrameEnds),
    );

    let log = log.lock().unwrap();
    assert_eq!(log.completed_frames, 1);
    assert_eq!(log.ranges.len(), 5824);
    assert_eq!(log.ranges[0], (1, 12));
    assert_eq!(log.ranges.last().copied().unwrap().1, 69_887);
    for window in log.ranges.windows(2) {
        assert_eq!(window[1].0, window[0].1 + 1);
    }
}

/// Deterministic pacing clock: one counter unit per emulated tact, and
/// waits complete instantly by jumping the counter to the target.
struct MockClock {
    now: Arc<AtomicU64>,
    waits: Arc<Mutex<Vec<u64>>>,
}

impl HostClock for MockClock {
    fn counter(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn frequency(&self) -> u64 {
        3_500_000
    }

    fn wait_until(&self, target: u64, _cancel: &CancelToken) {
        self.waits.lock().unwrap().push(target);
        let now = self.now.load(Ordering::SeqCst);
        self.now.store(now.max(target), Ordering::SeqCst);
    }
}

#[test]
fn continuous_mode_paces_each_frame() {
    let now = Arc::new(AtomicU64::new(0));
    let waits = Arc::new(Mutex::new(Vec::new()));
    let mut machine = machine_with_program(&[0x18, 0xFE]);
    machine.set_clock(Box::new(MockClock {
        now: Arc::clone(&now),
        waits: Arc::clone(&waits),
    }));
    let options = ExecuteCycleOptions {
        timeout_tacts: 150_000,
        ..ExecuteCycleOptions::new(EmulationMode::Continuous)
    };
    let result = run(&mut machine, &options);
    assert_eq!(result.reason, CompletionReason::Timeout);
    assert_eq!(machine.frame_count(), 2);
    // At 3.5 MHz counter frequency one frame is exactly 69888 counts,
    // and targets accumulate from the cycle start without drift.
    assert_eq!(*waits.lock().unwrap(), vec![69_888, 139_776]);
}

#[test]
fn pacing_follows_ula_frames_under_clock_multiplier() {
    let now = Arc::new(AtomicU64::new(0));
    let waits = Arc::new(Mutex::new(Vec::new()));
    let config = MachineConfig {
        clock_multiplier: 2,
        ..MachineConfig::spectrum_48k(rom_with(&[(0, &[0x18, 0xFE])]))
    };
    let mut machine = SpectrumMachine::new(config).unwrap();
    machine.set_clock(Box::new(MockClock {
        now: Arc::clone(&now),
        waits: Arc::clone(&waits),
    }));
    let options = ExecuteCycleOptions {
        timeout_tacts: 300_000,
        ..ExecuteCycleOptions::new(EmulationMode::Continuous)
    };
    let result = run(&mut machine, &options);
    assert_eq!(result.reason, CompletionReason::Timeout);
    // The CPU covers twice the tacts per frame, but wall-clock pacing
    // still targets one ULA frame per frame.
    assert_eq!(machine.frame_count(), 2);
    assert_eq!(machine.cpu().tacts().get(), 300_012);
    assert_eq!(*waits.lock().unwrap(), vec![69_888, 139_776]);
}
