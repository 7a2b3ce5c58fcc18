//! The CB-prefixed page: rotates, shifts and single-bit operations,
//! including the displaced DD CB / FD CB forms.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, PF, SF, XF, YF, ZF};

use super::{Index, Z80};

impl Z80 {
    /// Executes one CB-page operation. For the displaced forms the byte
    /// fetched as the opcode is really the displacement; the true opcode
    /// follows it.
    pub(super) fn execute_bit<B: Bus>(&mut self, bus: &mut B, op: u8) {
        if self.index != Index::None {
            self.execute_bit_indexed(bus, op);
            return;
        }

        let r = op & 7;
        match op >> 6 {
            // RLC/RRC/RL/RR/SLA/SRA/SLL/SRL r|(HL)
            0 => {
                if r == 6 {
                    let addr = self.regs.hl();
                    let value = self.read_mem(bus, addr);
                    let result = self.shift_rotate((op >> 3) & 7, value);
                    self.touch(bus, addr);
                    self.write_mem(bus, addr, result);
                } else {
                    let value = self.get_reg8(r);
                    let result = self.shift_rotate((op >> 3) & 7, value);
                    self.set_reg8(r, result);
                }
            }

            // BIT n, r|(HL)
            1 => {
                let n = (op >> 3) & 7;
                if r == 6 {
                    let addr = self.regs.hl();
                    let value = self.read_mem(bus, addr);
                    let high = self.regs.wz_high();
                    self.bit_flags(n, value, high);
                    self.touch(bus, addr);
                } else {
                    let value = self.get_reg8(r);
                    self.bit_flags(n, value, value);
                }
            }

            // RES n, r|(HL)
            2 => {
                let mask = !(1u8 << ((op >> 3) & 7));
                if r == 6 {
                    let addr = self.regs.hl();
                    let value = self.read_mem(bus, addr) & mask;
                    self.touch(bus, addr);
                    self.write_mem(bus, addr, value);
                } else {
                    let value = self.get_reg8(r) & mask;
                    self.set_reg8(r, value);
                }
            }

            // SET n, r|(HL)
            _ => {
                let mask = 1u8 << ((op >> 3) & 7);
                if r == 6 {
                    let addr = self.regs.hl();
                    let value = self.read_mem(bus, addr) | mask;
                    self.touch(bus, addr);
                    self.write_mem(bus, addr, value);
                } else {
                    let value = self.get_reg8(r) | mask;
                    self.set_reg8(r, value);
                }
            }
        }
    }

    /// The DD CB / FD CB path. `d` arrived through the opcode fetch; the
    /// real opcode is read next, and every form addresses `IX+d` while
    /// the undocumented register copy lands in the low-bits register.
    fn execute_bit_indexed<B: Bus>(&mut self, bus: &mut B, d: u8) {
        let addr = self.index_reg().wrapping_add(d as i8 as u16);
        self.regs.wz = addr;
        self.touch(bus, self.regs.pc.wrapping_sub(1));
        let op = self.read_mem(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let r = op & 7;
        match op >> 6 {
            0 => {
                let value = self.read_mem(bus, addr);
                let result = self.shift_rotate((op >> 3) & 7, value);
                self.touch(bus, addr);
                self.write_mem(bus, addr, result);
                if r != 6 {
                    self.set_reg8(r, result);
                }
            }

            // BIT ignores the register field beyond flag selection.
            1 => {
                let n = (op >> 3) & 7;
                let value = self.read_mem(bus, addr);
                let high = self.regs.wz_high();
                self.bit_flags(n, value, high);
                self.touch(bus, addr);
            }

            2 => {
                let mask = !(1u8 << ((op >> 3) & 7));
                let value = self.read_mem(bus, addr) & mask;
                self.touch(bus, addr);
                self.write_mem(bus, addr, value);
                if r != 6 {
                    self.set_reg8(r, value);
                }
            }

            _ => {
                let mask = 1u8 << ((op >> 3) & 7);
                let value = self.read_mem(bus, addr) | mask;
                self.touch(bus, addr);
                self.write_mem(bus, addr, value);
                if r != 6 {
                    self.set_reg8(r, value);
                }
            }
        }
    }

    /// Applies one of the eight rotate/shift operations and stores its
    /// flags.
    fn shift_rotate(&mut self, sub: u8, value: u8) -> u8 {
        let carry = (self.regs.f & CF) != 0;
        let out = match sub & 7 {
            0 => alu::rlc(value),
            1 => alu::rrc(value),
            2 => alu::rl(value, carry),
            3 => alu::rr(value, carry),
            4 => alu::sla(value),
            5 => alu::sra(value),
            6 => alu::sll(value),
            _ => alu::srl(value),
        };
        self.regs.f = out.flags;
        out.value
    }

    /// Flags for BIT n: Z and PV mirror each other, S only appears for a
    /// set bit 7, and bits 3/5 come from `xy_source` (the tested value
    /// for registers, the internal address latch for memory forms).
    fn bit_flags(&mut self, n: u8, value: u8, xy_source: u8) {
        let mut f = HF | (self.regs.f & CF) | (xy_source & (XF | YF));
        if value & (1 << n) == 0 {
            f |= ZF | PF;
        } else if n == 7 {
            f |= SF;
        }
        self.regs.f = f;
    }
}
