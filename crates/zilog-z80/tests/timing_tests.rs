//! Tact-exact timing tests.
//!
//! Every instruction charges its machine cycles as it executes, so a
//! single `step` must land on the documented tact total. Wait states
//! reported by the bus stretch the individual machine cycles.

use emu_core::{Bus, ReadResult, Ticks};
use zilog_z80::Z80;

/// Flat 64KB RAM bus with no wait states.
struct TestBus {
    ram: [u8; 65536],
}

impl TestBus {
    #[allow(clippy::large_stack_arrays)]
    fn new() -> Self {
        Self { ram: [0; 65536] }
    }

    fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.ram[addr as usize + i] = byte;
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16, _tacts: Ticks) -> ReadResult {
        ReadResult::new(self.ram[addr as usize])
    }

    fn write(&mut self, addr: u16, value: u8, _tacts: Ticks) -> u8 {
        self.ram[addr as usize] = value;
        0
    }

    fn io_read(&mut self, _port: u16, _tacts: Ticks) -> ReadResult {
        ReadResult::new(0xFF)
    }

    fn io_write(&mut self, _port: u16, _value: u8, _tacts: Ticks) -> u8 {
        0
    }
}

/// Bus that inserts two wait states on every memory access at or above
/// 0x8000, mimicking a slow upper region.
struct WaitBus {
    ram: [u8; 65536],
}

impl WaitBus {
    #[allow(clippy::large_stack_arrays)]
    fn new() -> Self {
        Self { ram: [0; 65536] }
    }

    fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.ram[addr as usize + i] = byte;
        }
    }

    fn wait_for(addr: u16) -> u8 {
        if addr >= 0x8000 { 2 } else { 0 }
    }
}

impl Bus for WaitBus {
    fn read(&mut self, addr: u16, _tacts: Ticks) -> ReadResult {
        ReadResult::with_wait(self.ram[addr as usize], Self::wait_for(addr))
    }

    fn write(&mut self, addr: u16, value: u8, _tacts: Ticks) -> u8 {
        self.ram[addr as usize] = value;
        Self::wait_for(addr)
    }

    fn io_read(&mut self, _port: u16, _tacts: Ticks) -> ReadResult {
        ReadResult::new(0xFF)
    }

    fn io_write(&mut self, _port: u16, _value: u8, _tacts: Ticks) -> u8 {
        0
    }
}

/// Execute a single instruction on a fresh CPU and return its tacts.
fn tacts_for(bytes: &[u8]) -> u64 {
    tacts_with(|_| {}, bytes)
}

/// Like [`tacts_for`] but with a register setup step first.
fn tacts_with(setup: impl FnOnce(&mut Z80), bytes: &[u8]) -> u64 {
    let mut bus = TestBus::new();
    bus.load(0x0000, bytes);
    let mut cpu = Z80::new();
    setup(&mut cpu);
    cpu.step(&mut bus);
    cpu.tacts().get()
}

#[test]
fn unprefixed_timing() {
    let cases: &[(&str, &[u8], u64)] = &[
        ("NOP", &[0x00], 4),
        ("LD BC,nn", &[0x01, 0x34, 0x12], 10),
        ("LD (BC),A", &[0x02], 7),
        ("INC BC", &[0x03], 6),
        ("INC B", &[0x04], 4),
        ("DEC B", &[0x05], 4),
        ("LD B,n", &[0x06, 0x42], 7),
        ("RLCA", &[0x07], 4),
        ("EX AF,AF'", &[0x08], 4),
        ("ADD HL,BC", &[0x09], 11),
        ("LD A,(BC)", &[0x0A], 7),
        ("DEC BC", &[0x0B], 6),
        ("JR e", &[0x18, 0x05], 12),
        ("LD (nn),HL", &[0x22, 0x00, 0x90], 16),
        ("LD HL,(nn)", &[0x2A, 0x00, 0x90], 16),
        ("DAA", &[0x27], 4),
        ("CPL", &[0x2F], 4),
        ("INC (HL)", &[0x34], 11),
        ("LD (HL),n", &[0x36, 0x42], 10),
        ("SCF", &[0x37], 4),
        ("LD (nn),A", &[0x32, 0x00, 0x90], 13),
        ("LD A,(nn)", &[0x3A, 0x00, 0x90], 13),
        ("CCF", &[0x3F], 4),
        ("LD B,C", &[0x41], 4),
        ("LD B,(HL)", &[0x46], 7),
        ("LD (HL),B", &[0x70], 7),
        ("HALT", &[0x76], 4),
        ("ADD A,B", &[0x80], 4),
        ("ADD A,n", &[0xC6, 0x10], 7),
        ("POP BC", &[0xC1], 10),
        ("JP nn", &[0xC3, 0x00, 0x90], 10),
        ("JP Z,nn (untaken)", &[0xCA, 0x00, 0x90], 10),
        ("CALL nn", &[0xCD, 0x00, 0x90], 17),
        ("PUSH BC", &[0xC5], 11),
        ("RST 38H", &[0xFF], 11),
        ("RET", &[0xC9], 10),
        ("OUT (n),A", &[0xD3, 0x34], 11),
        ("IN A,(n)", &[0xDB, 0x34], 11),
        ("EX (SP),HL", &[0xE3], 19),
        ("JP (HL)", &[0xE9], 4),
        ("EX DE,HL", &[0xEB], 4),
        ("EXX", &[0xD9], 4),
        ("DI", &[0xF3], 4),
        ("EI", &[0xFB], 4),
        ("LD SP,HL", &[0xF9], 6),
    ];
    for &(name, bytes, expected) in cases {
        assert_eq!(tacts_for(bytes), expected, "{name}");
    }
}

#[test]
fn conditional_timing() {
    // A fresh CPU has F=0: NZ/NC are satisfied, Z/C are not.
    assert_eq!(tacts_for(&[0xC0]), 11, "RET NZ taken");
    assert_eq!(tacts_for(&[0xC8]), 5, "RET Z untaken");
    assert_eq!(tacts_for(&[0xC4, 0x00, 0x90]), 17, "CALL NZ taken");
    assert_eq!(tacts_for(&[0xCC, 0x00, 0x90]), 10, "CALL Z untaken");
    assert_eq!(tacts_for(&[0x20, 0x05]), 12, "JR NZ taken");
    assert_eq!(tacts_for(&[0x28, 0x05]), 7, "JR Z untaken");

    let set_b = |b: u8| move |cpu: &mut Z80| cpu.registers_mut().b = b;
    assert_eq!(tacts_with(set_b(2), &[0x10, 0xFE]), 13, "DJNZ taken");
    assert_eq!(tacts_with(set_b(1), &[0x10, 0xFE]), 8, "DJNZ fallthrough");
}

#[test]
fn bit_page_timing() {
    let cases: &[(&str, &[u8], u64)] = &[
        ("RLC B", &[0xCB, 0x00], 8),
        ("RLC (HL)", &[0xCB, 0x06], 15),
        ("BIT 0,B", &[0xCB, 0x40], 8),
        ("BIT 0,(HL)", &[0xCB, 0x46], 12),
        ("RES 0,(HL)", &[0xCB, 0x86], 15),
        ("SET 0,(HL)", &[0xCB, 0xC6], 15),
    ];
    for &(name, bytes, expected) in cases {
        assert_eq!(tacts_for(bytes), expected, "{name}");
    }
}

#[test]
fn indexed_page_timing() {
    let cases: &[(&str, &[u8], u64)] = &[
        ("LD IX,nn", &[0xDD, 0x21, 0x00, 0x90], 14),
        ("ADD IX,BC", &[0xDD, 0x09], 15),
        ("INC IX", &[0xDD, 0x23], 10),
        ("INC IXH", &[0xDD, 0x24], 8),
        ("LD IXH,n", &[0xDD, 0x26, 0x42], 11),
        ("INC (IX+d)", &[0xDD, 0x34, 0x02], 23),
        ("LD (IX+d),n", &[0xDD, 0x36, 0x02, 0x42], 19),
        ("LD B,(IX+d)", &[0xDD, 0x46, 0x02], 19),
        ("LD (IX+d),B", &[0xDD, 0x70, 0x02], 19),
        ("ADD A,(IX+d)", &[0xDD, 0x86, 0x02], 19),
        ("POP IX", &[0xDD, 0xE1], 14),
        ("EX (SP),IX", &[0xDD, 0xE3], 23),
        ("PUSH IX", &[0xDD, 0xE5], 15),
        ("JP (IX)", &[0xDD, 0xE9], 8),
        ("LD SP,IX", &[0xDD, 0xF9], 10),
        ("BIT 0,(IX+d)", &[0xDD, 0xCB, 0x02, 0x46], 20),
        ("SET 0,(IX+d)", &[0xDD, 0xCB, 0x02, 0xC6], 23),
        ("RLC (IX+d)->B", &[0xDD, 0xCB, 0x02, 0x00], 23),
    ];
    for &(name, bytes, expected) in cases {
        assert_eq!(tacts_for(bytes), expected, "{name}");
    }
}

#[test]
fn extended_page_timing() {
    let cases: &[(&str, &[u8], u64)] = &[
        ("IN B,(C)", &[0xED, 0x40], 12),
        ("OUT (C),B", &[0xED, 0x41], 12),
        ("SBC HL,BC", &[0xED, 0x42], 15),
        ("LD (nn),BC", &[0xED, 0x43, 0x00, 0x90], 20),
        ("ADC HL,BC", &[0xED, 0x4A], 15),
        ("LD BC,(nn)", &[0xED, 0x4B, 0x00, 0x90], 20),
        ("NEG", &[0xED, 0x44], 8),
        ("RETN", &[0xED, 0x45], 14),
        ("IM 1", &[0xED, 0x56], 8),
        ("LD I,A", &[0xED, 0x47], 9),
        ("LD A,I", &[0xED, 0x57], 9),
        ("RRD", &[0xED, 0x67], 18),
        ("RLD", &[0xED, 0x6F], 18),
        ("LDI", &[0xED, 0xA0], 16),
        ("CPI", &[0xED, 0xA1], 16),
        ("INI", &[0xED, 0xA2], 16),
        ("OUTI", &[0xED, 0xA3], 16),
        ("ED NOP", &[0xED, 0x00], 8),
    ];
    for &(name, bytes, expected) in cases {
        assert_eq!(tacts_for(bytes), expected, "{name}");
    }
}

#[test]
fn ldir_repeat_timing() {
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0xED, 0xB0]); // LDIR
    let mut cpu = Z80::new();
    cpu.registers_mut().set_bc(2);
    cpu.registers_mut().set_hl(0x9000);
    cpu.registers_mut().set_de(0x9800);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 21, "repeating iteration");
    assert_eq!(cpu.registers().pc, 0x0000, "PC rewound onto the opcode");
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 37, "final iteration adds 16");
    assert_eq!(cpu.registers().pc, 0x0002);
}

#[test]
fn cpir_repeat_timing() {
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0xED, 0xB1]); // CPIR
    let mut cpu = Z80::new();
    cpu.registers_mut().a = 0xFF; // never matches the zeroed memory
    cpu.registers_mut().set_bc(2);
    cpu.registers_mut().set_hl(0x9000);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 21);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 37);
}

#[test]
fn inir_repeat_timing() {
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0xED, 0xB2]); // INIR
    let mut cpu = Z80::new();
    cpu.registers_mut().b = 2;
    cpu.registers_mut().set_hl(0x9000);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 21);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 37);
}

#[test]
fn otir_repeat_timing() {
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0xED, 0xB3]); // OTIR
    let mut cpu = Z80::new();
    cpu.registers_mut().b = 2;
    cpu.registers_mut().set_hl(0x9000);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 21);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 37);
}

/// CPU primed to accept a maskable interrupt on the next step.
fn interrupt_ready_cpu(mode: u8) -> Z80 {
    let mut cpu = Z80::new();
    let mut state = cpu.state();
    state.iff1 = true;
    state.iff2 = true;
    state.interrupt_mode = mode;
    state.sp = 0x8000;
    state.i = 0x20;
    cpu.restore(&state);
    cpu
}

#[test]
fn im1_acknowledge_timing() {
    let mut bus = TestBus::new();
    let mut cpu = interrupt_ready_cpu(1);
    cpu.set_int_line(true);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 12);
    assert_eq!(cpu.registers().pc, 0x0038);
}

#[test]
fn im2_acknowledge_timing() {
    let mut bus = TestBus::new();
    bus.load(0x20FF, &[0x00, 0x90]); // vector table entry
    let mut cpu = interrupt_ready_cpu(2);
    cpu.set_int_line(true);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 26);
    assert_eq!(cpu.registers().pc, 0x9000);
}

#[test]
fn nmi_acknowledge_timing() {
    let mut bus = TestBus::new();
    let mut cpu = Z80::new();
    cpu.request_nmi();
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 7);
    assert_eq!(cpu.registers().pc, 0x0066);
}

#[test]
fn halted_idle_timing() {
    let mut bus = TestBus::new();
    let mut cpu = Z80::new();
    let mut state = cpu.state();
    state.halted = true;
    state.pc = 0x1234;
    cpu.restore(&state);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 4);
    assert_eq!(cpu.registers().pc, 0x1234, "PC stays on the HALT");
    assert!(cpu.is_halted());
}

#[test]
fn wait_states_extend_machine_cycles() {
    // Opcode fetch in the slow region: 4 + 2.
    let mut bus = WaitBus::new();
    bus.load(0x8000, &[0x00]); // NOP
    let mut cpu = Z80::new();
    cpu.registers_mut().pc = 0x8000;
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 6);

    // Fast fetch, slow data read: 13 + 2.
    let mut bus = WaitBus::new();
    bus.load(0x0000, &[0x3A, 0x00, 0x90]); // LD A, (0x9000)
    let mut cpu = Z80::new();
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 15);

    // Read-modify-write with both data cycles stretched: 11 + 4.
    let mut bus = WaitBus::new();
    bus.load(0x0000, &[0x34]); // INC (HL)
    let mut cpu = Z80::new();
    cpu.registers_mut().set_hl(0x9000);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 15);
}

#[test]
fn reset_state_program_total() {
    // From power-on state: LD A,n (7) then RST 10H (11), with the push
    // wrapping the zeroed stack pointer to the top of memory.
    let mut bus = TestBus::new();
    bus.load(0x0000, &[0x3E, 0x12, 0xD7]);
    let mut cpu = Z80::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.tacts().get(), 18);
    assert_eq!(cpu.registers().a, 0x12);
    assert_eq!(cpu.registers().pc, 0x0010);
    assert_eq!(cpu.registers().sp, 0xFFFE);
    assert_eq!(bus.peek(0xFFFE), 0x03);
    assert_eq!(bus.peek(0xFFFF), 0x00);
}
