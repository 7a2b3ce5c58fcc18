//! Z80 register file.

/// The full Z80 register set, including the shadow bank and the internal
/// WZ (MEMPTR) register.
///
/// All registers start at zero; hardware leaves most of them undefined at
/// power-on, but a deterministic start state keeps execution reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,

    /// Interrupt page register.
    pub i: u8,
    /// Memory refresh register. Bit 7 is only changed by `LD R,A`.
    pub r: u8,

    /// Internal address latch, also known as MEMPTR. Not directly
    /// addressable, but it leaks into bits 3/5 of `BIT n,(HL)`.
    pub wz: u16,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn af(&self) -> u16 {
        (u16::from(self.a) << 8) | u16::from(self.f)
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    #[must_use]
    pub fn bc(&self) -> u16 {
        (u16::from(self.b) << 8) | u16::from(self.c)
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    #[must_use]
    pub fn de(&self) -> u16 {
        (u16::from(self.d) << 8) | u16::from(self.e)
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    #[must_use]
    pub fn hl(&self) -> u16 {
        (u16::from(self.h) << 8) | u16::from(self.l)
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    /// The I and R registers as a 16-bit pair, I in the high byte.
    #[must_use]
    pub fn ir(&self) -> u16 {
        (u16::from(self.i) << 8) | u16::from(self.r)
    }

    /// High byte of WZ; source of bits 3/5 for `BIT n,(HL)`.
    #[must_use]
    pub fn wz_high(&self) -> u8 {
        (self.wz >> 8) as u8
    }

    /// `EX AF,AF'`.
    pub fn exchange_af(&mut self) {
        core::mem::swap(&mut self.a, &mut self.a_alt);
        core::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// `EXX`: swaps BC, DE and HL with their shadow bank.
    pub fn exchange_banks(&mut self) {
        core::mem::swap(&mut self.b, &mut self.b_alt);
        core::mem::swap(&mut self.c, &mut self.c_alt);
        core::mem::swap(&mut self.d, &mut self.d_alt);
        core::mem::swap(&mut self.e, &mut self.e_alt);
        core::mem::swap(&mut self.h, &mut self.h_alt);
        core::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// `EX DE,HL`.
    pub fn exchange_de_hl(&mut self) {
        core::mem::swap(&mut self.d, &mut self.h);
        core::mem::swap(&mut self.e, &mut self.l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_combine_high_and_low_bytes() {
        let mut regs = Registers::new();
        regs.set_bc(0x1234);
        assert_eq!(regs.b, 0x12);
        assert_eq!(regs.c, 0x34);
        assert_eq!(regs.bc(), 0x1234);

        regs.set_af(0xA55A);
        assert_eq!(regs.a, 0xA5);
        assert_eq!(regs.f, 0x5A);
    }

    #[test]
    fn exx_swaps_only_the_three_pairs() {
        let mut regs = Registers::new();
        regs.set_bc(0x1111);
        regs.set_de(0x2222);
        regs.set_hl(0x3333);
        regs.a = 0x44;
        regs.exchange_banks();
        assert_eq!(regs.bc(), 0x0000);
        assert_eq!(regs.b_alt, 0x11);
        assert_eq!(regs.h_alt, 0x33);
        assert_eq!(regs.a, 0x44);
    }

    #[test]
    fn ex_af_swaps_accumulator_and_flags() {
        let mut regs = Registers::new();
        regs.a = 0x12;
        regs.f = 0x34;
        regs.exchange_af();
        assert_eq!(regs.a, 0x00);
        assert_eq!(regs.a_alt, 0x12);
        assert_eq!(regs.f_alt, 0x34);
    }
}
