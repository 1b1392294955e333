//! # Register Allocator
//!
//! Hands out VM register handles for intermediate values. Unlike a virtual
//! register supply, slots here are real: every allocated register must be
//! released once its value has been consumed, so that the slot can be reused
//! by the next temporary.
//!
//! The allocator always returns the lowest free slot, which keeps the emitted
//! code deterministic for a given tree.

use super::instruction::Origin;
use crate::{Error, Result};
use std::fmt;

/// Handle to a VM storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u32);

impl Register {
    /// Creates a handle for the given slot index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    live: bool,
    name: Option<String>,
    origin: Option<Origin>,
}

/// Pool of VM registers for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct RegisterAllocator {
    slots: Vec<Slot>,
    /// Maximum simultaneously live registers (None = grow without bound)
    limit: Option<usize>,
    peak: usize,
}

impl RegisterAllocator {
    /// Creates an unbounded allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that refuses to hold more than `limit` live registers
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Allocate the lowest free register, optionally tagging it with a debug name
    pub fn allocate(&mut self, origin: Origin, name: Option<&str>) -> Result<Register> {
        if let Some(limit) = self.limit {
            if self.live_count() >= limit {
                return Err(Error::RegisterLimit {
                    node: origin.node,
                    line: origin.line,
                    limit,
                });
            }
        }

        let index = match self.slots.iter().position(|slot| !slot.live) {
            Some(free) => free,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };

        self.slots[index] = Slot {
            live: true,
            name: name.map(str::to_string),
            origin: Some(origin),
        };

        let reg = Register::new(index as u32);
        self.peak = self.peak.max(self.live_count());
        tracing::trace!(
            "alloc {} for node {}{}",
            reg,
            origin.node,
            name.map(|n| format!(" ({})", n)).unwrap_or_default()
        );
        Ok(reg)
    }

    /// Mark a register reusable
    pub fn release(&mut self, reg: Register) -> Result<()> {
        match self.slots.get_mut(reg.index() as usize) {
            Some(slot) if slot.live => {
                slot.live = false;
                slot.name = None;
                slot.origin = None;
                tracing::trace!("release {}", reg);
                Ok(())
            }
            _ => Err(Error::DoubleRelease { index: reg.index() }),
        }
    }

    /// Is the register currently allocated?
    pub fn is_live(&self, reg: Register) -> bool {
        self.slots
            .get(reg.index() as usize)
            .map(|slot| slot.live)
            .unwrap_or(false)
    }

    /// Number of registers currently allocated
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.live).count()
    }

    /// Highest number of simultaneously live registers seen
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Debug name of a live register
    pub fn name(&self, reg: Register) -> Option<&str> {
        self.slots
            .get(reg.index() as usize)
            .filter(|slot| slot.live)
            .and_then(|slot| slot.name.as_deref())
    }

    /// Node that allocated a live register
    pub fn origin(&self, reg: Register) -> Option<Origin> {
        self.slots
            .get(reg.index() as usize)
            .filter(|slot| slot.live)
            .and_then(|slot| slot.origin)
    }

    /// Live registers, lowest first
    pub fn live_registers(&self) -> Vec<Register> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.live)
            .map(|(i, _)| Register::new(i as u32))
            .collect()
    }
}
