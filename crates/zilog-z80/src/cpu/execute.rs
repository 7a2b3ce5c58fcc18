//! The unprefixed instruction page and its DD/FD index-substituted variant.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53p};

use super::Z80;

impl Z80 {
    // =========================================================================
    // Unprefixed instructions
    // =========================================================================

    /// Executes one operation from the unprefixed page. The opcode byte has
    /// already been fetched and paid for.
    pub(super) fn execute_unprefixed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word(bus);
                self.set_reg16((op >> 4) & 3, value);
            }

            // LD (BC), A
            0x02 => {
                let addr = self.regs.bc();
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
                self.write_mem(bus, addr, self.regs.a);
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.add_tacts(2);
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (op >> 3) & 7;
                let out = alu::inc8(self.get_reg8(r));
                self.set_reg8(r, out.value);
                self.regs.f = out.flags | (self.regs.f & CF);
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (op >> 3) & 7;
                let out = alu::dec8(self.get_reg8(r));
                self.set_reg8(r, out.value);
                self.regs.f = out.flags | (self.regs.f & CF);
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.fetch_byte(bus);
                self.set_reg8((op >> 3) & 7, value);
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = self.regs.a.rotate_left(1);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | carry;
            }

            // EX AF, AF'
            0x08 => self.regs.exchange_af(),

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let hl = self.regs.hl();
                self.regs.wz = hl.wrapping_add(1);
                let (value, flags) = alu::add16(hl, self.get_reg16((op >> 4) & 3));
                self.regs.set_hl(value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
                self.add_tacts(7);
            }

            // LD A, (BC)
            0x0A => {
                let addr = self.regs.bc();
                self.regs.wz = addr.wrapping_add(1);
                self.regs.a = self.read_mem(bus, addr);
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.add_tacts(2);
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & CF;
                self.regs.a = self.regs.a.rotate_right(1);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | carry;
            }

            // DJNZ e
            0x10 => {
                let e = self.fetch_byte(bus);
                self.add_tacts(1);
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(e);
                }
            }

            // LD (DE), A
            0x12 => {
                let addr = self.regs.de();
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
                self.write_mem(bus, addr, self.regs.a);
            }

            // RLA
            0x17 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | (self.regs.f & CF);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | carry;
            }

            // JR e
            0x18 => {
                let e = self.fetch_byte(bus);
                self.jump_relative(e);
            }

            // LD A, (DE)
            0x1A => {
                let addr = self.regs.de();
                self.regs.wz = addr.wrapping_add(1);
                self.regs.a = self.read_mem(bus, addr);
            }

            // RRA
            0x1F => {
                let carry = self.regs.a & CF;
                self.regs.a = (self.regs.a >> 1) | (self.regs.f << 7);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | carry;
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let e = self.fetch_byte(bus);
                if self.condition((op >> 3) & 3) {
                    self.jump_relative(e);
                }
            }

            // LD (nn), HL
            0x22 => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                self.write_mem(bus, addr, self.regs.l);
                self.write_mem(bus, self.regs.wz, self.regs.h);
            }

            // DAA
            0x27 => self.daa(),

            // LD HL, (nn)
            0x2A => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                self.regs.l = self.read_mem(bus, addr);
                self.regs.h = self.read_mem(bus, self.regs.wz);
            }

            // CPL
            0x2F => {
                self.regs.a ^= 0xFF;
                self.regs.f =
                    (self.regs.f & !(YF | XF)) | NF | HF | (self.regs.a & (YF | XF));
            }

            // LD (nn), A
            0x32 => {
                let addr = self.fetch_word(bus);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
                self.write_mem(bus, addr, self.regs.a);
            }

            // INC (HL)
            0x34 => {
                let addr = self.regs.hl();
                let out = alu::inc8(self.read_mem(bus, addr));
                self.regs.f = out.flags | (self.regs.f & CF);
                self.add_tacts(1);
                self.write_mem(bus, addr, out.value);
            }

            // DEC (HL)
            0x35 => {
                let addr = self.regs.hl();
                let out = alu::dec8(self.read_mem(bus, addr));
                self.regs.f = out.flags | (self.regs.f & CF);
                self.add_tacts(1);
                self.write_mem(bus, addr, out.value);
            }

            // LD (HL), n
            0x36 => {
                let value = self.fetch_byte(bus);
                self.write_mem(bus, self.regs.hl(), value);
            }

            // SCF
            0x37 => {
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | CF;
            }

            // LD A, (nn)
            0x3A => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                self.regs.a = self.read_mem(bus, addr);
            }

            // CCF
            0x3F => {
                let old_carry = self.regs.f & CF;
                self.regs.f = (self.regs.f & (SF | ZF | PF))
                    | (self.regs.a & (YF | XF))
                    | if old_carry != 0 { HF } else { CF };
            }

            // LD r, r' (40-7F except 76=HALT)
            0x40..=0x7F if op != 0x76 => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    // LD r, (HL)
                    let value = self.read_mem(bus, self.regs.hl());
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    // LD (HL), r
                    let value = self.get_reg8(src);
                    self.write_mem(bus, self.regs.hl(), value);
                } else {
                    let value = self.get_reg8(src);
                    self.set_reg8(dst, value);
                }
            }

            // HALT
            0x76 => {
                self.halted = true;
                self.regs.pc = self.regs.pc.wrapping_sub(1);
            }

            // ALU A, r (80-BF: ADD/ADC/SUB/SBC/AND/XOR/OR/CP)
            0x80..=0xBF => {
                let value = if (op & 7) == 6 {
                    self.read_mem(bus, self.regs.hl())
                } else {
                    self.get_reg8(op & 7)
                };
                self.alu_a((op >> 3) & 7, value);
            }

            // RET cc (C0=NZ, C8=Z, D0=NC, D8=C, E0=PO, E8=PE, F0=P, F8=M)
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.add_tacts(1);
                if self.condition((op >> 3) & 7) {
                    self.return_from_call(bus);
                }
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_word(bus);
                self.set_reg16_af((op >> 4) & 3, value);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = addr;
                }
            }

            // JP nn
            0xC3 => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                self.regs.pc = addr;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    self.call_to(bus, addr);
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.get_reg16_af((op >> 4) & 3);
                self.push_word(bus, value);
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch_byte(bus);
                self.alu_a((op >> 3) & 7, value);
            }

            // RST n (C7=00, CF=08, D7=10, DF=18, E7=20, EF=28, F7=30, FF=38)
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = u16::from(op & 0x38);
                self.push_word(bus, self.regs.pc);
                self.regs.wz = target;
                self.regs.pc = target;
            }

            // RET
            0xC9 => self.return_from_call(bus),

            // CALL nn
            0xCD => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                self.call_to(bus, addr);
            }

            // OUT (n), A
            0xD3 => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | u16::from(n.wrapping_add(1));
                self.io_write(bus, port, self.regs.a);
            }

            // EXX
            0xD9 => self.regs.exchange_banks(),

            // IN A, (n)
            0xDB => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.wz = port.wrapping_add(1);
                self.regs.a = self.io_read(bus, port);
            }

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let lo = self.read_mem(bus, sp);
                self.write_mem(bus, sp, self.regs.l);
                self.add_tacts(1);
                let hi = self.read_mem(bus, sp.wrapping_add(1));
                self.write_mem(bus, sp.wrapping_add(1), self.regs.h);
                let value = (u16::from(hi) << 8) | u16::from(lo);
                self.regs.wz = value;
                self.regs.set_hl(value);
                self.add_tacts(2);
            }

            // JP (HL)
            0xE9 => self.regs.pc = self.regs.hl(),

            // EX DE, HL
            0xEB => self.regs.exchange_de_hl(),

            // DI
            0xF3 => {
                self.iff1 = false;
                self.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                self.add_tacts(2);
                self.regs.sp = self.regs.hl();
            }

            // EI
            0xFB => {
                self.iff1 = true;
                self.iff2 = true;
                self.interrupt_blocked = true;
            }

            // 0xCB, 0xDD, 0xED and 0xFD are consumed as prefixes before
            // dispatch and never reach this page.
            _ => {}
        }
    }

    // =========================================================================
    // DD/FD-prefixed instructions
    // =========================================================================

    /// Executes one operation with the IX or IY substitution applied. Only
    /// the HL-touching forms differ; everything else falls through to the
    /// unprefixed page with the real register set.
    pub(super) fn execute_indexed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // ADD IX, rr (09=BC, 19=DE, 29=IX, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let ix = self.index_reg();
                self.regs.wz = ix.wrapping_add(1);
                let rp = (op >> 4) & 3;
                let other = if rp == 2 { ix } else { self.get_reg16(rp) };
                let (value, flags) = alu::add16(ix, other);
                self.set_index_reg(value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
                self.add_tacts(7);
            }

            // LD IX, nn
            0x21 => {
                let value = self.fetch_word(bus);
                self.set_index_reg(value);
            }

            // LD (nn), IX
            0x22 => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                let ix = self.index_reg();
                self.write_mem(bus, addr, ix as u8);
                self.write_mem(bus, self.regs.wz, (ix >> 8) as u8);
            }

            // INC IX
            0x23 => {
                self.add_tacts(2);
                let value = self.index_reg().wrapping_add(1);
                self.set_index_reg(value);
            }

            // INC IXH / INC IXL (24, 2C)
            0x24 | 0x2C => {
                let r = (op >> 3) & 7;
                let out = alu::inc8(self.get_reg8_indexed(r));
                self.set_reg8_indexed(r, out.value);
                self.regs.f = out.flags | (self.regs.f & CF);
            }

            // DEC IXH / DEC IXL (25, 2D)
            0x25 | 0x2D => {
                let r = (op >> 3) & 7;
                let out = alu::dec8(self.get_reg8_indexed(r));
                self.set_reg8_indexed(r, out.value);
                self.regs.f = out.flags | (self.regs.f & CF);
            }

            // LD IXH, n / LD IXL, n (26, 2E)
            0x26 | 0x2E => {
                let value = self.fetch_byte(bus);
                self.set_reg8_indexed((op >> 3) & 7, value);
            }

            // LD IX, (nn)
            0x2A => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                let lo = self.read_mem(bus, addr);
                let hi = self.read_mem(bus, self.regs.wz);
                self.set_index_reg((u16::from(hi) << 8) | u16::from(lo));
            }

            // DEC IX
            0x2B => {
                self.add_tacts(2);
                let value = self.index_reg().wrapping_sub(1);
                self.set_index_reg(value);
            }

            // INC (IX+d)
            0x34 => {
                let addr = self.indexed_address(bus);
                let out = alu::inc8(self.read_mem(bus, addr));
                self.regs.f = out.flags | (self.regs.f & CF);
                self.add_tacts(1);
                self.write_mem(bus, addr, out.value);
            }

            // DEC (IX+d)
            0x35 => {
                let addr = self.indexed_address(bus);
                let out = alu::dec8(self.read_mem(bus, addr));
                self.regs.f = out.flags | (self.regs.f & CF);
                self.add_tacts(1);
                self.write_mem(bus, addr, out.value);
            }

            // LD (IX+d), n
            0x36 => {
                let d = self.fetch_byte(bus);
                let value = self.read_mem(bus, self.regs.pc);
                self.touch(bus, self.regs.pc);
                self.touch(bus, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                let addr = self.index_reg().wrapping_add(d as i8 as u16);
                self.write_mem(bus, addr, value);
            }

            // LD r, r' with IXH/IXL substituted; LD r,(IX+d); LD (IX+d),r.
            // The (IX+d) forms address memory but keep the real H and L.
            0x40..=0x7F if op != 0x76 => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    let addr = self.indexed_address(bus);
                    let value = self.read_mem(bus, addr);
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    let addr = self.indexed_address(bus);
                    let value = self.get_reg8(src);
                    self.write_mem(bus, addr, value);
                } else {
                    let value = self.get_reg8_indexed(src);
                    self.set_reg8_indexed(dst, value);
                }
            }

            // ALU A, r with IXH/IXL substituted; ALU A,(IX+d)
            0x80..=0xBF => {
                let value = if (op & 7) == 6 {
                    let addr = self.indexed_address(bus);
                    self.read_mem(bus, addr)
                } else {
                    self.get_reg8_indexed(op & 7)
                };
                self.alu_a((op >> 3) & 7, value);
            }

            // POP IX
            0xE1 => {
                let value = self.pop_word(bus);
                self.set_index_reg(value);
            }

            // EX (SP), IX
            0xE3 => {
                let sp = self.regs.sp;
                let lo = self.read_mem(bus, sp);
                let hi = self.read_mem(bus, sp.wrapping_add(1));
                self.touch(bus, sp.wrapping_add(1));
                let ix = self.index_reg();
                self.write_mem(bus, sp.wrapping_add(1), (ix >> 8) as u8);
                self.write_mem(bus, sp, ix as u8);
                self.touch(bus, sp);
                self.touch(bus, sp);
                let value = (u16::from(hi) << 8) | u16::from(lo);
                self.regs.wz = value;
                self.set_index_reg(value);
            }

            // PUSH IX
            0xE5 => {
                let value = self.index_reg();
                self.push_word(bus, value);
            }

            // JP (IX)
            0xE9 => self.regs.pc = self.index_reg(),

            // LD SP, IX
            0xF9 => {
                self.add_tacts(2);
                self.regs.sp = self.index_reg();
            }

            _ => self.execute_unprefixed(bus, op),
        }
    }

    // =========================================================================
    // Shared instruction helpers
    // =========================================================================

    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP on the accumulator.
    pub(super) fn alu_a(&mut self, operation: u8, value: u8) {
        let carry = (self.regs.f & CF) != 0;
        let out = match operation {
            0 => alu::add8(self.regs.a, value, false),
            1 => alu::add8(self.regs.a, value, carry),
            2 => alu::sub8(self.regs.a, value, false),
            3 => alu::sub8(self.regs.a, value, carry),
            4 => alu::and8(self.regs.a, value),
            5 => alu::xor8(self.regs.a, value),
            6 => alu::or8(self.regs.a, value),
            _ => {
                self.regs.f = alu::cp8(self.regs.a, value);
                return;
            }
        };
        self.regs.a = out.value;
        self.regs.f = out.flags;
    }

    /// BCD-adjusts the accumulator after an addition or subtraction.
    fn daa(&mut self) {
        let a = self.regs.a;
        let high = a >> 4;
        let low = a & 0x0F;
        let half = (self.regs.f & HF) != 0;
        let negative = (self.regs.f & NF) != 0;

        let mut diff = 0u8;
        let mut carry = false;
        if (self.regs.f & CF) != 0 {
            carry = true;
            diff = if low <= 9 && !half { 0x60 } else { 0x66 };
        } else if high <= 9 && low <= 9 {
            if half {
                diff = 0x06;
            }
        } else if high <= 8 {
            diff = 0x06;
        } else if low <= 9 && !half {
            diff = 0x60;
            carry = true;
        } else if low >= 0x0A {
            diff = 0x66;
            carry = true;
        } else {
            diff = 0x66;
            carry = true;
        }

        let half_after = (low >= 0x0A && !negative) || (low <= 5 && negative && half);
        let result = if negative {
            a.wrapping_sub(diff)
        } else {
            a.wrapping_add(diff)
        };

        let mut f = sz53p(result);
        if negative {
            f |= NF;
        }
        if half_after {
            f |= HF;
        }
        if carry {
            f |= CF;
        }
        self.regs.a = result;
        self.regs.f = f;
    }

    /// Relative jump: sign-extends `e`, updates PC and WZ and burns the
    /// five internal tacts.
    fn jump_relative(&mut self, e: u8) {
        self.regs.pc = self.regs.pc.wrapping_add(e as i8 as u16);
        self.regs.wz = self.regs.pc;
        self.add_tacts(5);
    }

    /// Pops a word from the stack, low byte first.
    pub(super) fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.read_mem(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read_mem(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (u16::from(hi) << 8) | u16::from(lo)
    }

    /// Pushes a word with the leading internal tact, high byte first.
    fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.add_tacts(1);
        self.write_mem(bus, self.regs.sp, (value >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_mem(bus, self.regs.sp, value as u8);
    }

    /// The taken tail of CALL: pushes the return address and jumps.
    fn call_to<B: Bus>(&mut self, bus: &mut B, target: u16) {
        self.push_word(bus, self.regs.pc);
        self.regs.pc = target;
    }

    /// The shared tail of RET and taken RET cc.
    fn return_from_call<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.pop_word(bus);
        self.regs.wz = addr;
        self.regs.pc = addr;
    }

    /// Reads the displacement byte of an `(IX+d)` operand and burns the
    /// five address-calculation tacts against that byte's address.
    pub(super) fn indexed_address<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let d = self.read_mem(bus, self.regs.pc);
        for _ in 0..5 {
            self.touch(bus, self.regs.pc);
        }
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.index_reg().wrapping_add(d as i8 as u16)
    }

    // =========================================================================
    // Register access by opcode field
    // =========================================================================

    /// Gets a register by its 3-bit encoding. Encoding 6 addresses memory
    /// and is handled by the caller.
    pub(super) fn get_reg8(&self, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => 0,
        }
    }

    /// Sets a register by its 3-bit encoding.
    pub(super) fn set_reg8(&mut self, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => {}
        }
    }

    /// Gets a register by 3-bit encoding with the undocumented IXH/IXL
    /// (IYH/IYL) substitution for encodings 4 and 5.
    pub(super) fn get_reg8_indexed(&self, r: u8) -> u8 {
        match r & 7 {
            4 => (self.index_reg() >> 8) as u8,
            5 => self.index_reg() as u8,
            _ => self.get_reg8(r),
        }
    }

    /// Sets a register by 3-bit encoding with the IXH/IXL substitution.
    pub(super) fn set_reg8_indexed(&mut self, r: u8, value: u8) {
        match r & 7 {
            4 => {
                let ix = self.index_reg();
                self.set_index_reg((ix & 0x00FF) | (u16::from(value) << 8));
            }
            5 => {
                let ix = self.index_reg();
                self.set_index_reg((ix & 0xFF00) | u16::from(value));
            }
            _ => self.set_reg8(r, value),
        }
    }

    /// Gets a register pair by its 2-bit encoding (SP variant).
    pub(super) fn get_reg16(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    /// Sets a register pair by its 2-bit encoding (SP variant).
    pub(super) fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Gets a register pair for PUSH/POP (AF instead of SP).
    fn get_reg16_af(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.af(),
        }
    }

    /// Sets a register pair for PUSH/POP (AF instead of SP).
    fn set_reg16_af(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.set_af(value),
        }
    }

    /// Evaluates a condition code.
    pub(super) fn condition(&self, cc: u8) -> bool {
        match cc & 7 {
            0 => (self.regs.f & ZF) == 0, // NZ
            1 => (self.regs.f & ZF) != 0, // Z
            2 => (self.regs.f & CF) == 0, // NC
            3 => (self.regs.f & CF) != 0, // C
            4 => (self.regs.f & PF) == 0, // PO
            5 => (self.regs.f & PF) != 0, // PE
            6 => (self.regs.f & SF) == 0, // P
            _ => (self.regs.f & SF) != 0, // M
        }
    }
}
