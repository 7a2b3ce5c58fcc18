//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use emu_spectrum::{MachineConfig, ROM_SIZE, ScreenSink, SpectrumMachine};

/// Builds a 16K ROM image of NOPs with byte patches at the given offsets.
pub fn rom_with(patches: &[(usize, &[u8])]) -> Vec<u8> {
    let mut rom = vec![0u8; ROM_SIZE];
    for (addr, bytes) in patches {
        rom[*addr..*addr + bytes.len()].copy_from_slice(bytes);
    }
    rom
}

/// Machine whose ROM starts with `program` at address 0.
pub fn machine_with_program(program: &[u8]) -> SpectrumMachine {
    machine_with_rom(&[(0, program)])
}

/// Machine with an arbitrarily patched ROM.
pub fn machine_with_rom(patches: &[(usize, &[u8])]) -> SpectrumMachine {
    SpectrumMachine::new(MachineConfig::spectrum_48k(rom_with(patches))).unwrap()
}

/// What a [`RecordingScreen`] observed.
#[derive(Default)]
pub struct ScreenLog {
    pub ranges: Vec<(u32, u32)>,
    pub completed_frames: usize,
}

/// Screen sink that records every callback into a shared log.
pub struct RecordingScreen(pub Arc<Mutex<ScreenLog>>);

impl ScreenSink for RecordingScreen {
    fn render_range(&mut self, from: u32, to: u32) {
        self.0.lock().unwrap().ranges.push((from, to));
    }

    fn frame_completed(&mut self) {
        self.0.lock().unwrap().completed_frames += 1;
    }
}
