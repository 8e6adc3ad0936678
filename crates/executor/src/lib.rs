//! decavm-executor: deterministic virtual machine for a fixed-width
//! 10-byte big-endian bytecode.
//!
//! This crate provides:
//! - A flat byte-addressable [`Memory`] with big-endian word access
//! - A sixteen-slot [`RegisterFile`] with a write-protected accumulator
//! - A downward-growing word [`Stack`] addressed by an SP outside the
//!   register file
//! - The fetch–decode–execute [`Cpu`] with fatal traps and an optional
//!   execution trace

pub mod cpu;
pub mod decode;
pub mod error;
pub mod memory;
pub mod regs;
pub mod stack;
pub mod trace;

pub use cpu::{assemble, Cpu, RunResult, StepOutcome};
pub use decode::{Instr, INSTR_LEN};
pub use error::Trap;
pub use memory::Memory;
pub use regs::{RegisterFile, ACC, NUM_REGS};
pub use stack::Stack;
pub use trace::{ExecutionTrace, TraceRow};
