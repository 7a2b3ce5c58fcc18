//! Debugger integration.
//!
//! The engine asks a provider two questions at every instruction
//! boundary: is this address a breakpoint, and is there an imminent
//! breakpoint (the return address StepOver is running toward). How
//! breakpoints are stored, and any hit-count or condition filtering,
//! is the provider's business.

use std::collections::HashSet;

/// Breakpoint knowledge supplied by an external debugger.
pub trait DebugInfoProvider {
    /// Whether execution should stop at the given address. Providers with
    /// conditional breakpoints evaluate their conditions here.
    fn should_break_at(&self, addr: u16) -> bool;

    /// The address a StepOver is currently running toward.
    fn imminent_breakpoint(&self) -> Option<u16>;

    fn set_imminent_breakpoint(&mut self, addr: Option<u16>);
}

/// Minimal provider backed by a plain address set.
#[derive(Debug, Default)]
pub struct Breakpoints {
    addresses: HashSet<u16>,
    imminent: Option<u16>,
}

impl Breakpoints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, addr: u16) {
        self.addresses.insert(addr);
    }

    pub fn remove(&mut self, addr: u16) {
        self.addresses.remove(&addr);
    }

    #[must_use]
    pub fn contains(&self, addr: u16) -> bool {
        self.addresses.contains(&addr)
    }
}

impl DebugInfoProvider for Breakpoints {
    fn should_break_at(&self, addr: u16) -> bool {
        self.addresses.contains(&addr)
    }

    fn imminent_breakpoint(&self) -> Option<u16> {
        self.imminent
    }

    fn set_imminent_breakpoint(&mut self, addr: Option<u16>) {
        self.imminent = addr;
    }
}
