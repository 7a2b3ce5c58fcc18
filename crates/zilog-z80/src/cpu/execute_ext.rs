//! The ED-prefixed extended page: carry-aware 16-bit arithmetic, the
//! block transfer, search and I/O families, and interrupt plumbing.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_truncation)]

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53p};

use super::Z80;

impl Z80 {
    /// Executes one operation from the extended page. Opcodes the page
    /// does not define behave as two-byte NOPs.
    pub(super) fn execute_extended<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // IN r, (C) (40=B, 48=C, 50=D, 58=E, 60=H, 68=L, 78=A);
            // 70 is IN F, (C), which only sets flags
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc();
                self.regs.wz = port.wrapping_add(1);
                let value = self.io_read(bus, port);
                self.regs.f = sz53p(value) | (self.regs.f & CF);
                if op != 0x70 {
                    self.set_reg8((op >> 3) & 7, value);
                }
            }

            // OUT (C), r; 71 is OUT (C), 0
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let port = self.regs.bc();
                self.regs.wz = port.wrapping_add(1);
                let value = if op == 0x71 {
                    0
                } else {
                    self.get_reg8((op >> 3) & 7)
                };
                self.io_write(bus, port, value);
            }

            // SBC HL, rr (42=BC, 52=DE, 62=HL, 72=SP)
            0x42 | 0x52 | 0x62 | 0x72 => {
                let hl = self.regs.hl();
                self.regs.wz = hl.wrapping_add(1);
                let carry = (self.regs.f & CF) != 0;
                let (value, flags) =
                    alu::sbc16(hl, self.get_reg16((op >> 4) & 3), carry);
                self.regs.set_hl(value);
                self.regs.f = flags;
                self.add_tacts(7);
            }

            // ADC HL, rr (4A=BC, 5A=DE, 6A=HL, 7A=SP)
            0x4A | 0x5A | 0x6A | 0x7A => {
                let hl = self.regs.hl();
                self.regs.wz = hl.wrapping_add(1);
                let carry = (self.regs.f & CF) != 0;
                let (value, flags) =
                    alu::adc16(hl, self.get_reg16((op >> 4) & 3), carry);
                self.regs.set_hl(value);
                self.regs.f = flags;
                self.add_tacts(7);
            }

            // LD (nn), rr (43=BC, 53=DE, 63=HL, 73=SP)
            0x43 | 0x53 | 0x63 | 0x73 => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                let value = self.get_reg16((op >> 4) & 3);
                self.write_mem(bus, addr, value as u8);
                self.write_mem(bus, self.regs.wz, (value >> 8) as u8);
            }

            // LD rr, (nn) (4B=BC, 5B=DE, 6B=HL, 7B=SP)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr.wrapping_add(1);
                let lo = self.read_mem(bus, addr);
                let hi = self.read_mem(bus, self.regs.wz);
                self.set_reg16((op >> 4) & 3, (u16::from(hi) << 8) | u16::from(lo));
            }

            // NEG (44 and its seven mirrors)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let out = alu::sub8(0, self.regs.a, false);
                self.regs.a = out.value;
                self.regs.f = out.flags;
            }

            // RETN/RETI (45 and mirrors); both restore IFF1 from IFF2
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.iff1 = self.iff2;
                let addr = self.pop_word(bus);
                self.regs.wz = addr;
                self.regs.pc = addr;
            }

            // IM 0/1/2 (46, 4E, 56, 5E, 66, 6E, 76, 7E)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x76 | 0x7E => {
                let mode = (op >> 3) & 3;
                self.interrupt_mode = if mode < 2 { 0 } else { mode - 1 };
            }

            // LD I, A
            0x47 => {
                self.add_tacts(1);
                self.regs.i = self.regs.a;
            }

            // LD R, A
            0x4F => {
                self.add_tacts(1);
                self.regs.r = self.regs.a;
            }

            // LD A, I / LD A, R; PV reports IFF2
            0x57 | 0x5F => {
                self.add_tacts(1);
                let value = if op == 0x57 { self.regs.i } else { self.regs.r };
                self.regs.a = value;
                let mut f = (self.regs.f & CF) | (value & (SF | YF | XF));
                if value == 0 {
                    f |= ZF;
                }
                if self.iff2 {
                    f |= PF;
                }
                self.regs.f = f;
            }

            // RRD
            0x67 => {
                let addr = self.regs.hl();
                let tmp = self.read_mem(bus, addr);
                for _ in 0..4 {
                    self.touch(bus, addr);
                }
                self.regs.wz = addr.wrapping_add(1);
                self.write_mem(bus, addr, (self.regs.a << 4) | (tmp >> 4));
                self.regs.a = (self.regs.a & 0xF0) | (tmp & 0x0F);
                self.regs.f = sz53p(self.regs.a) | (self.regs.f & CF);
            }

            // RLD
            0x6F => {
                let addr = self.regs.hl();
                let tmp = self.read_mem(bus, addr);
                for _ in 0..4 {
                    self.touch(bus, addr);
                }
                self.regs.wz = addr.wrapping_add(1);
                self.write_mem(bus, addr, (tmp << 4) | (self.regs.a & 0x0F));
                self.regs.a = (self.regs.a & 0xF0) | (tmp >> 4);
                self.regs.f = sz53p(self.regs.a) | (self.regs.f & CF);
            }

            // LDI
            0xA0 => {
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_add(1));
                let de = self.regs.de();
                self.write_mem(bus, de, value);
                self.write_touch(bus, de, value);
                self.write_touch(bus, de, value);
                self.regs.set_de(de.wrapping_add(1));
                self.ld_block_flags(value);
            }

            // CPI
            0xA1 => {
                let flags = self.cp_block_core(bus, false);
                self.regs.f = flags;
                self.regs.wz = self.regs.wz.wrapping_add(1);
            }

            // INI
            0xA2 => {
                self.add_tacts(1);
                let bc = self.regs.bc();
                self.regs.wz = bc.wrapping_add(1);
                let value = self.io_read(bus, bc);
                let hl = self.regs.hl();
                self.write_mem(bus, hl, value);
                self.regs.f = alu::dec8(self.regs.b).flags | (self.regs.f & CF);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.regs.set_hl(hl.wrapping_add(1));
            }

            // OUTI
            0xA3 => {
                self.add_tacts(1);
                self.regs.f = alu::dec8(self.regs.b).flags;
                self.regs.b = self.regs.b.wrapping_sub(1);
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.io_write(bus, self.regs.bc(), value);
                self.regs.set_hl(hl.wrapping_add(1));
                self.regs.f &= !CF;
                if self.regs.l == 0 {
                    self.regs.f |= CF;
                }
                self.regs.wz = self.regs.bc().wrapping_add(1);
            }

            // LDD
            0xA8 => {
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_sub(1));
                let de = self.regs.de();
                self.write_mem(bus, de, value);
                self.write_touch(bus, de, value);
                self.write_touch(bus, de, value);
                self.regs.set_de(de.wrapping_sub(1));
                self.ld_block_flags(value);
            }

            // CPD
            0xA9 => {
                let flags = self.cp_block_core(bus, true);
                self.regs.f = flags;
                self.regs.wz = self.regs.wz.wrapping_sub(1);
            }

            // IND
            0xAA => {
                self.add_tacts(1);
                let bc = self.regs.bc();
                self.regs.wz = bc.wrapping_sub(1);
                let value = self.io_read(bus, bc);
                let hl = self.regs.hl();
                self.write_mem(bus, hl, value);
                self.regs.f = alu::dec8(self.regs.b).flags | (self.regs.f & CF);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.regs.set_hl(hl.wrapping_sub(1));
            }

            // OUTD
            0xAB => {
                self.add_tacts(1);
                self.regs.f = alu::dec8(self.regs.b).flags;
                self.regs.b = self.regs.b.wrapping_sub(1);
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.io_write(bus, self.regs.bc(), value);
                self.regs.set_hl(hl.wrapping_sub(1));
                self.regs.f &= !CF;
                if self.regs.l == 0xFF {
                    self.regs.f |= CF;
                }
                self.regs.wz = self.regs.bc().wrapping_sub(1);
            }

            // LDIR
            0xB0 => {
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_add(1));
                let de = self.regs.de();
                self.write_mem(bus, de, value);
                self.touch(bus, de);
                self.touch(bus, de);
                self.regs.set_de(de.wrapping_add(1));
                self.ld_block_flags(value);
                if self.regs.bc() != 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, de);
                    }
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                }
            }

            // CPIR
            0xB1 => {
                self.regs.wz = self.regs.wz.wrapping_add(1);
                let flags = self.cp_block_core(bus, false);
                if self.regs.bc() != 0 && (flags & ZF) == 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    let addr = self.regs.hl().wrapping_sub(1);
                    for _ in 0..5 {
                        self.touch(bus, addr);
                    }
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                }
                self.regs.f = flags;
            }

            // INIR
            0xB2 => {
                self.add_tacts(1);
                let bc = self.regs.bc();
                self.regs.wz = bc.wrapping_add(1);
                let value = self.io_read(bus, bc);
                let hl = self.regs.hl();
                self.write_mem(bus, hl, value);
                self.regs.f = alu::dec8(self.regs.b).flags | (self.regs.f & CF);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.regs.set_hl(hl.wrapping_add(1));
                if self.regs.b != 0 {
                    self.regs.f |= PF;
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, hl);
                    }
                } else {
                    self.regs.f &= !PF;
                }
            }

            // OTIR
            0xB3 => {
                self.add_tacts(1);
                self.regs.f = alu::dec8(self.regs.b).flags;
                self.regs.b = self.regs.b.wrapping_sub(1);
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_add(1));
                let bc = self.regs.bc();
                self.io_write(bus, bc, value);
                if self.regs.b != 0 {
                    self.regs.f |= PF;
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, bc);
                    }
                } else {
                    self.regs.f &= !PF;
                }
                self.regs.f &= !CF;
                if self.regs.l == 0 {
                    self.regs.f |= CF;
                }
                self.regs.wz = bc.wrapping_add(1);
            }

            // LDDR
            0xB8 => {
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_sub(1));
                let de = self.regs.de();
                self.write_mem(bus, de, value);
                self.write_touch(bus, de, value);
                self.write_touch(bus, de, value);
                self.regs.set_de(de.wrapping_sub(1));
                self.ld_block_flags(value);
                if self.regs.bc() != 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, de);
                    }
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                }
            }

            // CPDR
            0xB9 => {
                self.regs.wz = self.regs.wz.wrapping_sub(1);
                let flags = self.cp_block_core(bus, true);
                if self.regs.bc() != 0 && (flags & ZF) == 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    let addr = self.regs.hl().wrapping_add(1);
                    for _ in 0..5 {
                        self.touch(bus, addr);
                    }
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                }
                self.regs.f = flags;
            }

            // INDR
            0xBA => {
                self.add_tacts(1);
                let bc = self.regs.bc();
                self.regs.wz = bc.wrapping_sub(1);
                let value = self.io_read(bus, bc);
                let hl = self.regs.hl();
                self.write_mem(bus, hl, value);
                self.regs.f = alu::dec8(self.regs.b).flags | (self.regs.f & CF);
                self.regs.b = self.regs.b.wrapping_sub(1);
                self.regs.set_hl(hl.wrapping_sub(1));
                if self.regs.b != 0 {
                    self.regs.f |= PF;
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, hl);
                    }
                } else {
                    self.regs.f &= !PF;
                }
            }

            // OTDR
            0xBB => {
                self.add_tacts(1);
                self.regs.f = alu::dec8(self.regs.b).flags;
                self.regs.b = self.regs.b.wrapping_sub(1);
                let hl = self.regs.hl();
                let value = self.read_mem(bus, hl);
                self.regs.set_hl(hl.wrapping_sub(1));
                let bc = self.regs.bc();
                self.io_write(bus, bc, value);
                if self.regs.b != 0 {
                    self.regs.f |= PF;
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    for _ in 0..5 {
                        self.touch(bus, bc);
                    }
                } else {
                    self.regs.f &= !PF;
                }
                self.regs.f &= !CF;
                if self.regs.l == 0xFF {
                    self.regs.f |= CF;
                }
                self.regs.wz = bc.wrapping_sub(1);
            }

            // The remaining codes execute as two-byte NOPs.
            _ => {}
        }
    }

    /// Flag update shared by the LDI/LDD family. H and N clear, PV tracks
    /// the decremented byte counter and bits 3/5 come from `value + A`.
    fn ld_block_flags(&mut self, value: u8) {
        let n = value.wrapping_add(self.regs.a);
        let mut f =
            (self.regs.f & !(NF | HF | PF | XF | YF)) | (n & XF) | ((n << 4) & YF);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;
    }

    /// The comparison, pointer and counter work shared by the CPI/CPD
    /// family. Returns the new flags; WZ and any repeat handling stay
    /// with the caller.
    fn cp_block_core<B: Bus>(&mut self, bus: &mut B, step_down: bool) -> u8 {
        let hl = self.regs.hl();
        let value = self.read_mem(bus, hl);
        let result = self.regs.a.wrapping_sub(value);
        let mut r3r5 = result;
        let mut flags = (self.regs.f & CF) | NF;
        if (self.regs.a & 0x0F).wrapping_sub(result & 0x0F) & 0x10 != 0 {
            flags |= HF;
            r3r5 = result.wrapping_sub(1);
        }
        if result == 0 {
            flags |= ZF;
        }
        flags |= result & SF;
        flags |= (r3r5 & XF) | ((r3r5 << 4) & YF);
        for _ in 0..5 {
            self.touch(bus, hl);
        }
        let next = if step_down {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        };
        self.regs.set_hl(next);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        if bc != 0 {
            flags |= PF;
        }
        flags
    }
}
