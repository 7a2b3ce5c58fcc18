//! 48K memory map: 16K ROM at `$0000`, 48K RAM at `$4000`.

use crate::config::ROM_SIZE;

/// RAM size in bytes (`$4000..=$FFFF`).
pub const RAM_SIZE: usize = 0xC000;

/// First RAM address.
const RAM_BASE: u16 = 0x4000;

/// End of the contended RAM page (exclusive). Only `$4000..$8000` sits on
/// the ULA side of the bus.
const CONTENDED_END: u16 = 0x8000;

/// Flat 64K address space of the 48K Spectrum.
///
/// Writes to the ROM area are ignored, matching the hardware: the write
/// strobe reaches the ROM chip but nothing latches.
pub struct Memory48 {
    rom: [u8; ROM_SIZE],
    ram: [u8; RAM_SIZE],
}

impl Memory48 {
    /// Creates the memory map from a 16K ROM image. RAM starts zeroed;
    /// [`reset`](Self::reset) gives it the `$FF` power-on fill.
    ///
    /// # Panics
    ///
    /// Panics when the image is not exactly 16K. The machine config
    /// validates ROM sizes before construction reaches this point.
    #[must_use]
    pub fn new(rom_image: &[u8]) -> Self {
        let mut rom = [0u8; ROM_SIZE];
        rom.copy_from_slice(rom_image);
        Self {
            rom,
            ram: [0u8; RAM_SIZE],
        }
    }

    /// Reads a byte. No timing effects; contention lives on the bus.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        if addr < RAM_BASE {
            self.rom[addr as usize]
        } else {
            self.ram[(addr - RAM_BASE) as usize]
        }
    }

    /// Writes a byte. ROM addresses are silently ignored.
    pub fn write(&mut self, addr: u16, value: u8) {
        if addr >= RAM_BASE {
            self.ram[(addr - RAM_BASE) as usize] = value;
        }
    }

    /// Side-effect-free read for debuggers and snapshots.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Whether the address falls in the ULA-contended page.
    #[must_use]
    pub fn contended_page(&self, addr: u16) -> bool {
        (RAM_BASE..CONTENDED_END).contains(&addr)
    }

    /// Fills RAM with `$FF` and leaves the ROM untouched.
    pub fn reset(&mut self) {
        self.ram.fill(0xFF);
    }

    /// The full 48K RAM block.
    #[must_use]
    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        &self.ram
    }

    /// Replaces the full 48K RAM block. Used by snapshot restore, which
    /// checks the length before calling.
    ///
    /// # Panics
    ///
    /// Panics when `data` is not exactly 48K.
    pub fn load_ram(&mut self, data: &[u8]) {
        self.ram.copy_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_memory() -> Memory48 {
        let mut rom = vec![0u8; ROM_SIZE];
        rom[0] = 0xF3;
        rom[1] = 0x76;
        Memory48::new(&rom)
    }

    #[test]
    fn rom_reads_back() {
        let memory = make_memory();
        assert_eq!(memory.read(0x0000), 0xF3);
        assert_eq!(memory.read(0x0001), 0x76);
        assert_eq!(memory.read(0x0002), 0x00);
    }

    #[test]
    fn rom_writes_ignored() {
        let mut memory = make_memory();
        memory.write(0x0000, 0xAA);
        assert_eq!(memory.read(0x0000), 0xF3);
    }

    #[test]
    fn ram_round_trip() {
        let mut memory = make_memory();
        memory.write(0x4000, 0x12);
        memory.write(0xFFFF, 0x34);
        assert_eq!(memory.read(0x4000), 0x12);
        assert_eq!(memory.read(0xFFFF), 0x34);
        assert_eq!(memory.peek(0x4000), 0x12);
    }

    #[test]
    fn contended_page_bounds() {
        let memory = make_memory();
        assert!(!memory.contended_page(0x0000));
        assert!(!memory.contended_page(0x3FFF));
        assert!(memory.contended_page(0x4000));
        assert!(memory.contended_page(0x7FFF));
        assert!(!memory.contended_page(0x8000));
        assert!(!memory.contended_page(0xFFFF));
    }

    #[test]
    fn reset_fills_ram_keeps_rom() {
        let mut memory = make_memory();
        memory.write(0x5000, 0x42);
        memory.reset();
        assert_eq!(memory.read(0x5000), 0xFF);
        assert_eq!(memory.read(0x0000), 0xF3);
    }
}
