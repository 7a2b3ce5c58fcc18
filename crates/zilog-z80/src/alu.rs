//! ALU helpers: each function computes a result and the full set of flag
//! bits it defines, leaving composition with preserved flags to the caller.

#![allow(clippy::cast_possible_truncation)]

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53, sz53p};

/// Result of an 8-bit ALU operation.
pub struct AluOut {
    pub value: u8,
    pub flags: u8,
}

/// 8-bit increment. Flags exclude C.
pub fn inc8(value: u8) -> AluOut {
    let result = value.wrapping_add(1);
    let mut flags = sz53(result);
    if result & 0x0F == 0 {
        flags |= HF;
    }
    if result == 0x80 {
        flags |= PF;
    }
    AluOut {
        value: result,
        flags,
    }
}

/// 8-bit decrement. Flags exclude C.
pub fn dec8(value: u8) -> AluOut {
    let result = value.wrapping_sub(1);
    let mut flags = sz53(result) | NF;
    if value & 0x0F == 0 {
        flags |= HF;
    }
    if result == 0x7F {
        flags |= PF;
    }
    AluOut {
        value: result,
        flags,
    }
}

/// 8-bit addition, optionally with carry in.
pub fn add8(a: u8, b: u8, carry: bool) -> AluOut {
    let c = u16::from(carry);
    let wide = u16::from(a) + u16::from(b) + c;
    let result = wide as u8;
    let mut flags = sz53(result);
    if (u16::from(a & 0x0F) + u16::from(b & 0x0F) + c) & 0x10 != 0 {
        flags |= HF;
    }
    if wide & 0x100 != 0 {
        flags |= CF;
    }
    if !(a ^ b) & (a ^ result) & 0x80 != 0 {
        flags |= PF;
    }
    AluOut {
        value: result,
        flags,
    }
}

/// 8-bit subtraction, optionally with borrow in.
pub fn sub8(a: u8, b: u8, carry: bool) -> AluOut {
    let c = u16::from(carry);
    let wide = u16::from(a).wrapping_sub(u16::from(b)).wrapping_sub(c);
    let result = wide as u8;
    let mut flags = sz53(result) | NF;
    if (u16::from(a & 0x0F))
        .wrapping_sub(u16::from(b & 0x0F))
        .wrapping_sub(c)
        & 0x10
        != 0
    {
        flags |= HF;
    }
    if wide & 0x100 != 0 {
        flags |= CF;
    }
    if (a ^ b) & (a ^ result) & 0x80 != 0 {
        flags |= PF;
    }
    AluOut {
        value: result,
        flags,
    }
}

pub fn and8(a: u8, b: u8) -> AluOut {
    let result = a & b;
    AluOut {
        value: result,
        flags: sz53p(result) | HF,
    }
}

pub fn xor8(a: u8, b: u8) -> AluOut {
    let result = a ^ b;
    AluOut {
        value: result,
        flags: sz53p(result),
    }
}

pub fn or8(a: u8, b: u8) -> AluOut {
    let result = a | b;
    AluOut {
        value: result,
        flags: sz53p(result),
    }
}

/// Compare: subtraction flags with the result discarded. Bits 3/5 follow
/// the comparison result.
pub fn cp8(a: u8, b: u8) -> u8 {
    sub8(a, b, false).flags
}

/// 16-bit addition for `ADD HL,rr`. Defines only H, C and bits 3/5 of the
/// high result byte; the caller preserves S, Z and P.
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let result = a.wrapping_add(b);
    let mut flags = (result >> 8) as u8 & (YF | XF);
    if ((a & 0x0FFF) + (b & 0x0FFF)) & 0x1000 != 0 {
        flags |= HF;
    }
    if (u32::from(a) + u32::from(b)) & 0x1_0000 != 0 {
        flags |= CF;
    }
    (result, flags)
}

/// 16-bit add with carry. Defines the full flag set.
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u32::from(carry);
    let wide = u32::from(a) + u32::from(b) + c;
    let result = wide as u16;
    let mut flags = (result >> 8) as u8 & (SF | YF | XF);
    if result == 0 {
        flags |= ZF;
    }
    if (u32::from(a & 0x0FFF) + u32::from(b & 0x0FFF) + c) & 0x1000 != 0 {
        flags |= HF;
    }
    if wide & 0x1_0000 != 0 {
        flags |= CF;
    }
    if !(a ^ b) & (a ^ result) & 0x8000 != 0 {
        flags |= PF;
    }
    (result, flags)
}

/// 16-bit subtract with borrow. Defines the full flag set.
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u32::from(carry);
    let wide = u32::from(a).wrapping_sub(u32::from(b)).wrapping_sub(c);
    let result = wide as u16;
    let mut flags = ((result >> 8) as u8 & (SF | YF | XF)) | NF;
    if result == 0 {
        flags |= ZF;
    }
    if (u32::from(a & 0x0FFF))
        .wrapping_sub(u32::from(b & 0x0FFF))
        .wrapping_sub(c)
        & 0x1000
        != 0
    {
        flags |= HF;
    }
    if wide & 0x1_0000 != 0 {
        flags |= CF;
    }
    if (a ^ b) & (a ^ result) & 0x8000 != 0 {
        flags |= PF;
    }
    (result, flags)
}

pub fn rlc(value: u8) -> AluOut {
    let result = value.rotate_left(1);
    AluOut {
        value: result,
        flags: sz53p(result) | (value >> 7),
    }
}

pub fn rrc(value: u8) -> AluOut {
    let result = value.rotate_right(1);
    AluOut {
        value: result,
        flags: sz53p(result) | (value & CF),
    }
}

pub fn rl(value: u8, carry: bool) -> AluOut {
    let result = (value << 1) | u8::from(carry);
    AluOut {
        value: result,
        flags: sz53p(result) | (value >> 7),
    }
}

pub fn rr(value: u8, carry: bool) -> AluOut {
    let result = (value >> 1) | (u8::from(carry) << 7);
    AluOut {
        value: result,
        flags: sz53p(result) | (value & CF),
    }
}

pub fn sla(value: u8) -> AluOut {
    let result = value << 1;
    AluOut {
        value: result,
        flags: sz53p(result) | (value >> 7),
    }
}

pub fn sra(value: u8) -> AluOut {
    let result = (value >> 1) | (value & 0x80);
    AluOut {
        value: result,
        flags: sz53p(result) | (value & CF),
    }
}

/// Undocumented shift left that sets bit 0.
pub fn sll(value: u8) -> AluOut {
    let result = (value << 1) | 1;
    AluOut {
        value: result,
        flags: sz53p(result) | (value >> 7),
    }
}

pub fn srl(value: u8) -> AluOut {
    let result = value >> 1;
    AluOut {
        value: result,
        flags: sz53p(result) | (value & CF),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add8_sets_half_carry_and_overflow() {
        let r = add8(0x0F, 0x01, false);
        assert_eq!(r.value, 0x10);
        assert_ne!(r.flags & HF, 0);
        assert_eq!(r.flags & CF, 0);

        let r = add8(0x7F, 0x01, false);
        assert_eq!(r.value, 0x80);
        assert_ne!(r.flags & PF, 0);
        assert_ne!(r.flags & SF, 0);

        let r = add8(0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert_ne!(r.flags & CF, 0);
        assert_ne!(r.flags & ZF, 0);
    }

    #[test]
    fn sub8_sets_borrow_and_sign() {
        let r = sub8(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert_ne!(r.flags & CF, 0);
        assert_ne!(r.flags & SF, 0);
        assert_ne!(r.flags & NF, 0);

        let r = sub8(0x80, 0x01, false);
        assert_ne!(r.flags & PF, 0);
    }

    #[test]
    fn cp_takes_bits_3_and_5_from_the_result() {
        let f = cp8(0x3A, 0x02);
        assert_eq!(f & (YF | XF), YF | XF);
        let f = cp8(0x00, 0x28);
        assert_eq!(f & (YF | XF), XF);
    }

    #[test]
    fn inc_dec_set_overflow_at_boundaries() {
        assert_ne!(inc8(0x7F).flags & PF, 0);
        assert_eq!(inc8(0x00).flags & PF, 0);
        assert_ne!(dec8(0x80).flags & PF, 0);
        assert_ne!(dec8(0x10).flags & HF, 0);
    }

    #[test]
    fn add16_keeps_only_h_c_and_result_bits() {
        let (r, f) = add16(0x0FFF, 0x0001);
        assert_eq!(r, 0x1000);
        assert_ne!(f & HF, 0);
        assert_eq!(f & CF, 0);

        let (r, f) = add16(0xFFFF, 0x0001);
        assert_eq!(r, 0x0000);
        assert_ne!(f & CF, 0);
    }

    #[test]
    fn sbc16_detects_overflow() {
        let (r, f) = sbc16(0x8000, 0x0001, false);
        assert_eq!(r, 0x7FFF);
        assert_ne!(f & PF, 0);
        assert_eq!(f & CF, 0);
    }

    #[test]
    fn shifts_report_the_displaced_bit_in_carry() {
        assert_ne!(rlc(0x80).flags & CF, 0);
        assert_eq!(rlc(0x80).value, 0x01);
        assert_ne!(rrc(0x01).flags & CF, 0);
        assert_eq!(sra(0x81).value, 0xC0);
        assert_eq!(sll(0x01).value, 0x03);
        assert_eq!(srl(0x81).value, 0x40);
    }
}
