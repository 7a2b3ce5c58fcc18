//! Z80 flag register bits and common flag computations.

/// Carry flag.
pub const CF: u8 = 0x01;
/// Add/subtract flag.
pub const NF: u8 = 0x02;
/// Parity/overflow flag.
pub const PF: u8 = 0x04;
/// Undocumented bit 3 flag.
pub const XF: u8 = 0x08;
/// Half-carry flag.
pub const HF: u8 = 0x10;
/// Undocumented bit 5 flag.
pub const YF: u8 = 0x20;
/// Zero flag.
pub const ZF: u8 = 0x40;
/// Sign flag.
pub const SF: u8 = 0x80;

/// S, Z and the undocumented bits 3/5 of `value`.
#[must_use]
pub fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | YF | XF);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// Like [`sz53`] but with P set for even parity.
#[must_use]
pub fn sz53p(value: u8) -> u8 {
    sz53(value) | parity(value)
}

/// P flag for `value`: set when the number of one bits is even.
#[must_use]
pub fn parity(value: u8) -> u8 {
    if value.count_ones() % 2 == 0 { PF } else { 0 }
}
