//! Trap kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conditions that halt the machine.
///
/// Traps are reported, never recovered. The engine latches the trap and
/// leaves PC at the faulting instruction so the host can diagnose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Trap {
    #[error("memory access out of bounds: address {addr:#010x}")]
    OutOfBounds { addr: u32 },

    #[error("reserved opcode 0x0000 at pc={pc:#010x}")]
    ReservedOpcode { pc: u32 },

    #[error("unknown opcode {opcode:#06x} at pc={pc:#010x}")]
    UnknownOpcode { pc: u32, opcode: u16 },

    #[error("division by zero at pc={pc:#010x}")]
    DivideByZero { pc: u32 },

    #[error("stack underflow: sp={sp:#010x}")]
    StackUnderflow { sp: u32 },

    #[error("stack overflow: sp={sp:#010x}")]
    StackOverflow { sp: u32 },

    #[error("execution budget exhausted after {max_steps} steps")]
    BudgetExhausted { max_steps: u64 },
}
