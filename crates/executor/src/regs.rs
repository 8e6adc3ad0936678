//! Sixteen-slot register file with a write-protected accumulator.
//!
//! Slots 0–14 are general purpose. Slot 15 is the accumulator: it holds
//! the last ALU or comparison result and cannot be named as an explicit
//! destination — writes aimed at 15 land in 14 instead.

use serde::{Deserialize, Serialize};

/// Number of register slots.
pub const NUM_REGS: usize = 16;

/// Accumulator index: implicit destination of ALU and comparison opcodes.
pub const ACC: u8 = 15;

/// Register file state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [u32; NUM_REGS],
}

impl RegisterFile {
    /// Create a zeroed register file.
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_REGS],
        }
    }

    /// Read slot `i`. Callers resolve operand bytes to 0..=15 first.
    #[inline]
    pub fn get(&self, i: u8) -> u32 {
        self.regs[i as usize]
    }

    /// Write an explicit destination. Index 15 is redirected to 14; the
    /// accumulator is only reachable through [`set_acc`](Self::set_acc).
    #[inline]
    pub fn set(&mut self, i: u8, val: u32) {
        let i = i.min(ACC - 1);
        self.regs[i as usize] = val;
    }

    /// Accumulator writeback for ALU and comparison results.
    #[inline]
    pub fn set_acc(&mut self, val: u32) {
        self.regs[ACC as usize] = val;
    }

    /// Read the accumulator.
    #[inline]
    pub fn acc(&self) -> u32 {
        self.regs[ACC as usize]
    }

    /// Copy of the full register state, for inspection and traces.
    pub fn snapshot(&self) -> [u32; NUM_REGS] {
        self.regs
    }

    /// Zero every slot.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_REGS];
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
