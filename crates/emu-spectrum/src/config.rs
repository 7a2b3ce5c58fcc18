//! Machine configuration.

use std::fmt;

use sinclair_ula::ScreenTiming;

/// Base CPU clock of the 48K Spectrum in Hz.
pub const BASE_CLOCK_48K: u32 = 3_500_000;

/// ROM image size expected by the 48K memory map.
pub const ROM_SIZE: usize = 0x4000;

/// Construction-time validation failure.
#[derive(Debug)]
pub enum MachineBuildError {
    /// The supplied ROM image is not exactly 16K.
    InvalidRomSize(usize),
}

impl fmt::Display for MachineBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRomSize(size) => {
                write!(f, "ROM image must be {ROM_SIZE} bytes, got {size}")
            }
        }
    }
}

impl std::error::Error for MachineBuildError {}

/// Configuration for building a Spectrum machine.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// 16K ROM image mapped at `$0000`.
    pub rom: Vec<u8>,
    /// Screen timing descriptor driving contention and the INT window.
    pub timing: ScreenTiming,
    /// Base CPU clock in Hz, used for frame pacing.
    pub base_clock_hz: u32,
    /// Requested CPU speed multiplier, normalized to 1, 2, 4 or 8 at build.
    pub clock_multiplier: u32,
}

impl MachineConfig {
    /// Standard 48K configuration with the given ROM image.
    #[must_use]
    pub const fn spectrum_48k(rom: Vec<u8>) -> Self {
        Self {
            rom,
            timing: ScreenTiming::spectrum_48k(),
            base_clock_hz: BASE_CLOCK_48K,
            clock_multiplier: 1,
        }
    }
}

/// Clamps a requested clock multiplier to the supported set.
///
/// 0 and 1 run at base speed; intermediate values round down to the
/// nearest power of two; anything above 8 caps at 8.
#[must_use]
pub const fn normalize_clock_multiplier(multiplier: u32) -> u32 {
    match multiplier {
        0 | 1 => 1,
        2..=3 => 2,
        4..=7 => 4,
        _ => 8,
    }
}
