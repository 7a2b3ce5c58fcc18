//! The Z80 CPU core: instruction stepping, signal handling and interrupt
//! acknowledge sequences.

mod execute;
mod execute_bit;
mod execute_ext;

use emu_core::{Bus, Ticks};

use crate::registers::Registers;

/// Multi-byte opcode prefix the decoder is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    /// After a `0xCB` byte.
    Bit,
    /// After a `0xED` byte.
    Extended,
}

/// Active index register substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Index {
    None,
    /// After a `0xDD` byte: HL-based operations use IX.
    Ix,
    /// After a `0xFD` byte: HL-based operations use IY.
    Iy,
}

/// A Zilog Z80 CPU.
///
/// [`Z80::step`] runs exactly one instruction, charging every memory and
/// I/O access to the tact counter at the moment the access starts so a bus
/// implementation can inject position-dependent wait states.
pub struct Z80 {
    regs: Registers,
    tacts: Ticks,

    iff1: bool,
    iff2: bool,
    interrupt_mode: u8,

    halted: bool,
    int_line: bool,
    nmi_pending: bool,

    /// Set between an `EI` (or a prefix byte) and the start of the next
    /// operation; a maskable interrupt must not fire while this holds.
    interrupt_blocked: bool,
    /// True while a prefixed opcode has been partially decoded.
    in_op_execution: bool,
    prefix: Prefix,
    index: Index,

    /// Set by a maskable interrupt acknowledge; cleared when the next
    /// regular instruction starts.
    maskable_interrupt_mode_entered: bool,
}

impl Z80 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            tacts: Ticks::ZERO,
            iff1: false,
            iff2: false,
            interrupt_mode: 0,
            halted: false,
            int_line: false,
            nmi_pending: false,
            interrupt_blocked: false,
            in_op_execution: false,
            prefix: Prefix::None,
            index: Index::None,
            maskable_interrupt_mode_entered: false,
        }
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Total tacts elapsed since power-on or the last reset.
    #[must_use]
    pub fn tacts(&self) -> Ticks {
        self.tacts
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn iff1(&self) -> bool {
        self.iff1
    }

    #[must_use]
    pub fn iff2(&self) -> bool {
        self.iff2
    }

    #[must_use]
    pub fn interrupt_mode(&self) -> u8 {
        self.interrupt_mode
    }

    #[must_use]
    pub fn is_in_op_execution(&self) -> bool {
        self.in_op_execution
    }

    #[must_use]
    pub fn is_interrupt_blocked(&self) -> bool {
        self.interrupt_blocked
    }

    /// True right after a maskable interrupt was acknowledged; reset when
    /// the next ordinary instruction begins.
    #[must_use]
    pub fn maskable_interrupt_mode_entered(&self) -> bool {
        self.maskable_interrupt_mode_entered
    }

    /// Drives the level-triggered INT line.
    pub fn set_int_line(&mut self, active: bool) {
        self.int_line = active;
    }

    #[must_use]
    pub fn int_line(&self) -> bool {
        self.int_line
    }

    /// Latches an edge-triggered NMI request; it is consumed by the next
    /// [`Z80::step`].
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Hardware reset: clears the control state and PC, IR and the tact
    /// counter. The general and shadow registers keep their contents.
    pub fn reset(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
        self.interrupt_mode = 0;
        self.halted = false;
        self.int_line = false;
        self.nmi_pending = false;
        self.interrupt_blocked = false;
        self.in_op_execution = false;
        self.prefix = Prefix::None;
        self.index = Index::None;
        self.maskable_interrupt_mode_entered = false;
        self.regs.pc = 0;
        self.regs.i = 0;
        self.regs.r = 0;
        self.tacts = Ticks::ZERO;
    }

    /// Executes one instruction, one interrupt acknowledge or one halted
    /// idle cycle, whichever the current signals select.
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        if self.process_signals(bus) {
            return;
        }
        self.maskable_interrupt_mode_entered = false;

        loop {
            let op = self.fetch_opcode(bus);
            match self.prefix {
                Prefix::None => match op {
                    0xDD => {
                        self.index = Index::Ix;
                        self.in_op_execution = true;
                        self.interrupt_blocked = true;
                    }
                    0xFD => {
                        self.index = Index::Iy;
                        self.in_op_execution = true;
                        self.interrupt_blocked = true;
                    }
                    0xCB => {
                        self.prefix = Prefix::Bit;
                        self.in_op_execution = true;
                        self.interrupt_blocked = true;
                    }
                    0xED => {
                        self.prefix = Prefix::Extended;
                        self.in_op_execution = true;
                        self.interrupt_blocked = true;
                    }
                    _ => {
                        self.interrupt_blocked = false;
                        if self.index == Index::None {
                            self.execute_unprefixed(bus, op);
                        } else {
                            self.execute_indexed(bus, op);
                        }
                        break;
                    }
                },
                Prefix::Bit => {
                    self.interrupt_blocked = false;
                    self.execute_bit(bus, op);
                    break;
                }
                Prefix::Extended => {
                    self.interrupt_blocked = false;
                    self.execute_extended(bus, op);
                    break;
                }
            }
        }

        self.prefix = Prefix::None;
        self.index = Index::None;
        self.in_op_execution = false;
    }

    /// Handles NMI, INT and the halted state, in that priority order.
    /// Returns true when a signal consumed this step.
    fn process_signals<B: Bus>(&mut self, bus: &mut B) -> bool {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.execute_nmi(bus);
            return true;
        }

        if self.int_line && !self.interrupt_blocked && self.iff1 {
            self.execute_interrupt(bus);
            return true;
        }

        if self.halted {
            // The halted CPU keeps executing NOPs to drive memory refresh.
            self.add_tacts(3);
            self.refresh_r();
            self.add_tacts(1);
            return true;
        }

        false
    }

    fn execute_nmi<B: Bus>(&mut self, bus: &mut B) {
        if self.halted {
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.halted = false;
        }
        self.iff2 = self.iff1;
        self.iff1 = false;
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.add_tacts(1);
        self.write_mem(bus, self.regs.sp, (self.regs.pc >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_mem(bus, self.regs.sp, self.regs.pc as u8);
        self.regs.pc = 0x0066;
    }

    fn execute_interrupt<B: Bus>(&mut self, bus: &mut B) {
        if self.halted {
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.halted = false;
        }
        self.iff1 = false;
        self.iff2 = false;
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.add_tacts(1);
        self.write_mem(bus, self.regs.sp, (self.regs.pc >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_mem(bus, self.regs.sp, self.regs.pc as u8);

        match self.interrupt_mode {
            // IM 0 is handled as IM 1: no emulated device places an
            // instruction on the data bus, so a RST 38H is assumed.
            0 | 1 => {
                self.regs.wz = 0x0038;
                self.add_tacts(5);
            }
            _ => {
                self.add_tacts(2);
                let vector = bus.int_vector();
                let addr = (u16::from(self.regs.i) << 8) | u16::from(vector);
                self.add_tacts(5);
                let lo = self.read_mem(bus, addr);
                let hi = self.read_mem(bus, addr.wrapping_add(1));
                self.regs.wz = (u16::from(hi) << 8) | u16::from(lo);
                self.add_tacts(6);
            }
        }
        self.regs.pc = self.regs.wz;
        self.maskable_interrupt_mode_entered = true;
    }

    /// Byte count of the instruction at PC when it is a `CALL`,
    /// conditional `CALL` or `RST` (with any number of index prefixes),
    /// otherwise 0. Reads memory without charging tacts.
    pub fn call_instruction_length<B: Bus>(&self, bus: &mut B) -> u16 {
        let mut addr = self.regs.pc;
        let mut prefixes = 0u16;
        loop {
            let op = bus.read(addr, self.tacts).data;
            match op {
                0xDD | 0xFD => {
                    if prefixes == 4 {
                        return 0;
                    }
                    prefixes += 1;
                    addr = addr.wrapping_add(1);
                }
                0xCD => return prefixes + 3,
                op if op & 0xC7 == 0xC4 => return prefixes + 3,
                op if op & 0xC7 == 0xC7 => return prefixes + 1,
                _ => return 0,
            }
        }
    }

    // ---------------------------------------------------------------------
    // Bus access helpers
    // ---------------------------------------------------------------------

    fn add_tacts(&mut self, count: u64) {
        self.tacts += Ticks::new(count);
    }

    /// R register refresh: the low seven bits increment, bit 7 is kept.
    fn refresh_r(&mut self) {
        self.regs.r = (self.regs.r.wrapping_add(1) & 0x7F) | (self.regs.r & 0x80);
    }

    /// M1 opcode fetch: 4 tacts plus wait states, with memory refresh.
    fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let result = bus.read(self.regs.pc, self.tacts);
        self.add_tacts(u64::from(result.wait) + 3);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.refresh_r();
        self.add_tacts(1);
        result.data
    }

    /// Memory read: 3 tacts plus wait states.
    fn read_mem<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u8 {
        let result = bus.read(addr, self.tacts);
        self.add_tacts(u64::from(result.wait) + 3);
        result.data
    }

    /// Memory write: 3 tacts plus wait states.
    fn write_mem<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u8) {
        let wait = bus.write(addr, value, self.tacts);
        self.add_tacts(u64::from(wait) + 3);
    }

    /// One internal tact spent with `addr` on the address bus, so the
    /// access picks up that address's wait states.
    fn touch<B: Bus>(&mut self, bus: &mut B, addr: u16) {
        let result = bus.read(addr, self.tacts);
        self.add_tacts(u64::from(result.wait) + 1);
    }

    /// The write-cycle variant of [`Z80::touch`], used by the block
    /// transfer operations which re-drive the destination write.
    fn write_touch<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u8) {
        let wait = bus.write(addr, value, self.tacts);
        self.add_tacts(u64::from(wait) + 1);
    }

    /// I/O read: 4 tacts plus the port's wait states.
    fn io_read<B: Bus>(&mut self, bus: &mut B, port: u16) -> u8 {
        let result = bus.io_read(port, self.tacts);
        self.add_tacts(u64::from(result.wait) + 4);
        result.data
    }

    /// I/O write: 4 tacts plus the port's wait states.
    fn io_write<B: Bus>(&mut self, bus: &mut B, port: u16, value: u8) {
        let wait = bus.io_write(port, value, self.tacts);
        self.add_tacts(u64::from(wait) + 4);
    }

    /// Reads the next code byte and advances PC.
    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = self.read_mem(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Reads a little-endian word from the code stream.
    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        (u16::from(hi) << 8) | u16::from(lo)
    }

    fn index_reg(&self) -> u16 {
        match self.index {
            Index::Iy => self.regs.iy,
            _ => self.regs.ix,
        }
    }

    fn set_index_reg(&mut self, value: u16) {
        match self.index {
            Index::Iy => self.regs.iy = value,
            _ => self.regs.ix = value,
        }
    }

    // ---------------------------------------------------------------------
    // State save and restore
    // ---------------------------------------------------------------------

    /// Captures the CPU state at an instruction boundary.
    #[must_use]
    pub fn state(&self) -> CpuState {
        CpuState {
            af: self.regs.af(),
            bc: self.regs.bc(),
            de: self.regs.de(),
            hl: self.regs.hl(),
            af_alt: (u16::from(self.regs.a_alt) << 8) | u16::from(self.regs.f_alt),
            bc_alt: (u16::from(self.regs.b_alt) << 8) | u16::from(self.regs.c_alt),
            de_alt: (u16::from(self.regs.d_alt) << 8) | u16::from(self.regs.e_alt),
            hl_alt: (u16::from(self.regs.h_alt) << 8) | u16::from(self.regs.l_alt),
            ix: self.regs.ix,
            iy: self.regs.iy,
            sp: self.regs.sp,
            pc: self.regs.pc,
            wz: self.regs.wz,
            i: self.regs.i,
            r: self.regs.r,
            iff1: self.iff1,
            iff2: self.iff2,
            interrupt_mode: self.interrupt_mode,
            halted: self.halted,
            interrupt_blocked: self.interrupt_blocked,
            maskable_interrupt_mode_entered: self.maskable_interrupt_mode_entered,
            tacts: self.tacts.get(),
        }
    }

    /// Restores a state captured by [`Z80::state`]. Pending signal lines
    /// are cleared; the caller re-asserts them as needed.
    pub fn restore(&mut self, state: &CpuState) {
        self.regs.set_af(state.af);
        self.regs.set_bc(state.bc);
        self.regs.set_de(state.de);
        self.regs.set_hl(state.hl);
        self.regs.a_alt = (state.af_alt >> 8) as u8;
        self.regs.f_alt = state.af_alt as u8;
        self.regs.b_alt = (state.bc_alt >> 8) as u8;
        self.regs.c_alt = state.bc_alt as u8;
        self.regs.d_alt = (state.de_alt >> 8) as u8;
        self.regs.e_alt = state.de_alt as u8;
        self.regs.h_alt = (state.hl_alt >> 8) as u8;
        self.regs.l_alt = state.hl_alt as u8;
        self.regs.ix = state.ix;
        self.regs.iy = state.iy;
        self.regs.sp = state.sp;
        self.regs.pc = state.pc;
        self.regs.wz = state.wz;
        self.regs.i = state.i;
        self.regs.r = state.r;
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.interrupt_mode = state.interrupt_mode;
        self.halted = state.halted;
        self.interrupt_blocked = state.interrupt_blocked;
        self.maskable_interrupt_mode_entered = state.maskable_interrupt_mode_entered;
        self.tacts = Ticks::new(state.tacts);
        self.int_line = false;
        self.nmi_pending = false;
        self.prefix = Prefix::None;
        self.index = Index::None;
        self.in_op_execution = false;
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable CPU state captured at an instruction boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "state", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuState {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub wz: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub interrupt_mode: u8,
    pub halted: bool,
    pub interrupt_blocked: bool,
    pub maskable_interrupt_mode_entered: bool,
    pub tacts: u64,
}
