//! Memory and I/O bus interface.

use crate::Ticks;

/// Result of a bus read: the data byte plus any wait states the access
/// incurred (e.g. ULA memory contention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    pub data: u8,
    /// Extra tacts the CPU must insert before the access completes.
    pub wait: u8,
}

impl ReadResult {
    #[must_use]
    pub const fn new(data: u8) -> Self {
        Self { data, wait: 0 }
    }

    #[must_use]
    pub const fn with_wait(data: u8, wait: u8) -> Self {
        Self { data, wait }
    }
}

/// Memory and I/O bus interface.
///
/// The CPU accesses memory and peripherals through this trait. The bus
/// handles address decoding, routing, and wait-state (contention)
/// calculation.
///
/// The CPU is instruction-stepped: a whole instruction retires per `step`
/// call, with several bus accesses at different points inside it. Each
/// access passes the CPU's tact counter as it stands when the access
/// begins, so the bus can derive the frame-relative position and return
/// the wait states the video hardware would impose at that exact tact.
/// The CPU adds the returned wait to its counter before the access cost,
/// so later accesses within the same instruction see an already-advanced
/// position.
pub trait Bus {
    /// Read a byte from memory.
    fn read(&mut self, addr: u16, tacts: Ticks) -> ReadResult;

    /// Write a byte to memory. Returns the wait states for the access.
    fn write(&mut self, addr: u16, value: u8, tacts: Ticks) -> u8;

    /// Read a byte from an I/O port.
    fn io_read(&mut self, port: u16, tacts: Ticks) -> ReadResult;

    /// Write a byte to an I/O port. Returns the wait states for the access.
    fn io_write(&mut self, port: u16, value: u8, tacts: Ticks) -> u8;

    /// The byte the interrupting device places on the data bus during an
    /// INT acknowledge cycle. On machines with nothing driving the bus it
    /// floats high; IM2 uses it as the low byte of the vector-table
    /// pointer, and IM0 interprets it as an instruction (0xFF = RST 38h).
    fn int_vector(&mut self) -> u8 {
        0xFF
    }
}
