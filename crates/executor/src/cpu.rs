//! Fetch–decode–execute engine for the decavm instruction set.
//!
//! The machine executes fixed-width ten-byte instructions over a flat
//! big-endian memory:
//!
//! - **Data movement**: LD, LC, DR, CPY
//! - **Bitwise**: OR, AND, XOR, NAND, NOR, NOT
//! - **Arithmetic**: ADD, SUB, MUL, DIV, EXP (all unsigned, wrapping mod 2³²;
//!   DIV traps on a zero divisor)
//! - **Control flow**: JMP, JMR, CMP, CMR (relative forms take a
//!   two's-complement offset based at the jump's own PC)
//! - **Stack / calls**: PSH, POP, MOVSP, CALL, RET
//! - **Comparisons**: GT, LT, EQ, NE, GE, LE (unsigned; result is all-ones
//!   or zero)
//! - **Indirect memory**: LDI, STI
//!
//! ALU and comparison results go to the accumulator (register 15) through a
//! dedicated writeback path; explicit destinations naming 15 are redirected
//! to 14.
//!
//! # Execution model
//!
//! Execution is deterministic and single-threaded: given the same image,
//! initial PC/SP, memory size, and budget, two runs produce identical final
//! state. Each step fetches ten bytes at PC, dispatches on the 16-bit
//! opcode, and advances PC by ten unless the instruction overrode it. Any
//! trap latches the machine with PC still at the faulting instruction; a
//! trapping instruction leaves registers, memory, and SP unchanged.
//!
//! ```rust,ignore
//! use decavm_executor::Cpu;
//!
//! let mut cpu = Cpu::boot(4096, &image, 0, 0, 4096)?;
//! let result = cpu.run(1_000_000);
//! println!("stopped after {} steps: {}", result.steps, result.trap);
//! ```

use crate::decode::{opcode, Instr, INSTR_LEN};
use crate::error::Trap;
use crate::memory::Memory;
use crate::regs::RegisterFile;
use crate::stack::Stack;
use crate::trace::{ExecutionTrace, TraceRow};
use serde::{Deserialize, Serialize};

/// Result of a single [`Cpu::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction retired; the machine can take another step.
    Continue,
    /// The machine was already halted; nothing executed.
    Halted,
}

/// Result of a [`Cpu::run`]: how many instructions retired and why it
/// stopped. Every run ends in a trap — the instruction set has no halt
/// opcode, so programs terminate by walking off memory or by exhausting
/// the step budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunResult {
    /// Instructions retired before the stop.
    pub steps: u64,
    /// The trap that stopped the run.
    pub trap: Trap,
}

/// Machine state.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Register file, r0..r15.
    pub regs: RegisterFile,
    /// Memory subsystem.
    pub memory: Memory,
    /// Stack pointer and bounds.
    pub stack: Stack,
    /// Program counter.
    pub pc: u32,
    /// Cycle counter.
    pub cycle: u64,
    /// Latched trap once the machine has halted.
    halt: Option<Trap>,
    /// Execution trace (if tracing is enabled).
    trace: Option<ExecutionTrace>,
    /// Tracing enabled flag.
    tracing: bool,
}

impl Cpu {
    /// Create a machine with zeroed registers, `memory_size` bytes of
    /// memory, PC at zero, and SP at the top of memory.
    pub fn new(memory_size: usize) -> Self {
        Self {
            regs: RegisterFile::new(),
            memory: Memory::new(memory_size),
            stack: Stack::new(memory_size as u32),
            pc: 0,
            cycle: 0,
            halt: None,
            trace: None,
            tracing: false,
        }
    }

    /// Build a machine from a raw program image: copy the image in at
    /// `base` and set the initial PC and SP.
    pub fn boot(
        memory_size: usize,
        image: &[u8],
        base: u32,
        pc: u32,
        sp: u32,
    ) -> Result<Self, Trap> {
        let mut cpu = Self::new(memory_size);
        cpu.load_image(base, image)?;
        cpu.pc = pc;
        cpu.stack = Stack::new(sp);
        Ok(cpu)
    }

    /// Copy a raw image into memory at the given base address.
    pub fn load_image(&mut self, base: u32, image: &[u8]) -> Result<(), Trap> {
        self.memory.load_image(base, image)
    }

    /// Enable execution tracing.
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
        self.trace = Some(ExecutionTrace::new());
    }

    /// Disable tracing and return the collected trace with the final
    /// machine state filled in.
    pub fn take_trace(&mut self) -> Option<ExecutionTrace> {
        self.tracing = false;
        let mut trace = self.trace.take()?;
        trace.final_regs = self.regs.snapshot();
        trace.final_pc = self.pc;
        trace.final_sp = self.stack.sp;
        trace.total_cycles = self.cycle;
        trace.halt_reason = self.halt.map(|t| t.to_string());
        Some(trace)
    }

    /// Read a register.
    #[inline]
    pub fn reg(&self, i: u8) -> u32 {
        self.regs.get(i)
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> u32 {
        self.stack.sp
    }

    /// The trap that halted the machine, if any.
    pub fn halt_reason(&self) -> Option<Trap> {
        self.halt
    }

    /// Whether the machine has halted.
    pub fn halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Execute a single instruction.
    ///
    /// Returns `Continue` when an instruction retired, `Halted` when the
    /// machine was already stopped, and the trap kind when this step
    /// faulted. A trap latches the machine; PC stays at the faulting
    /// instruction.
    pub fn step(&mut self) -> Result<StepOutcome, Trap> {
        if self.halt.is_some() {
            return Ok(StepOutcome::Halted);
        }
        match self.exec() {
            Ok(()) => Ok(StepOutcome::Continue),
            Err(trap) => {
                self.halt = Some(trap);
                Err(trap)
            }
        }
    }

    /// Step until a trap or until `max_steps` instructions have retired.
    ///
    /// Budget exhaustion is reported as [`Trap::BudgetExhausted`] but does
    /// not latch the machine: the budget is a cooperative cancellation
    /// point and the host may call `run` again to resume.
    pub fn run(&mut self, max_steps: u64) -> RunResult {
        if let Some(trap) = self.halt {
            return RunResult { steps: 0, trap };
        }
        let mut steps = 0;
        while steps < max_steps {
            match self.exec() {
                Ok(()) => steps += 1,
                Err(trap) => {
                    self.halt = Some(trap);
                    return RunResult { steps, trap };
                }
            }
        }
        RunResult {
            steps,
            trap: Trap::BudgetExhausted { max_steps },
        }
    }

    /// Reset registers, PC, SP, and the halt latch. Memory is untouched.
    pub fn reset(&mut self, pc: u32, sp: u32) {
        self.regs.reset();
        self.pc = pc;
        self.stack = Stack::new(sp);
        self.cycle = 0;
        self.halt = None;
        self.trace = None;
        self.tracing = false;
    }

    fn fetch(&self) -> Result<[u8; INSTR_LEN], Trap> {
        let bytes = self.memory.read_bytes(self.pc, INSTR_LEN)?;
        let mut word = [0u8; INSTR_LEN];
        word.copy_from_slice(bytes);
        Ok(word)
    }

    fn exec(&mut self) -> Result<(), Trap> {
        let word = self.fetch()?;
        let instr = Instr::decode(&word);

        // Tentative; branch instructions overwrite it.
        let mut next_pc = self.pc.wrapping_add(INSTR_LEN as u32);

        match instr.op {
            opcode::RESERVED => return Err(Trap::ReservedOpcode { pc: self.pc }),

            // ===== Data movement =====
            opcode::LD => {
                let value = self.memory.read_word(instr.a)?;
                self.regs.set(instr.dst_b(), value);
            }
            opcode::LC => {
                self.regs.set(instr.dst_b(), instr.a);
            }
            opcode::DR => {
                let value = self.regs.get(instr.src_a());
                self.memory.write_word(instr.b, value)?;
            }
            opcode::CPY => {
                let value = self.regs.get(instr.src_a());
                self.regs.set(instr.dst_b(), value);
            }

            // ===== Bitwise =====
            opcode::OR => self.acc_binop(&instr, |a, b| a | b),
            opcode::AND => self.acc_binop(&instr, |a, b| a & b),
            opcode::XOR => self.acc_binop(&instr, |a, b| a ^ b),
            opcode::NAND => self.acc_binop(&instr, |a, b| !(a & b)),
            opcode::NOR => self.acc_binop(&instr, |a, b| !(a | b)),
            opcode::NOT => {
                let value = self.regs.get(instr.src_a());
                self.regs.set_acc(!value);
            }

            // ===== Arithmetic =====
            opcode::ADD => self.acc_binop(&instr, u32::wrapping_add),
            opcode::SUB => self.acc_binop(&instr, u32::wrapping_sub),
            opcode::MUL => self.acc_binop(&instr, u32::wrapping_mul),
            opcode::DIV => {
                let dividend = self.regs.get(instr.src_a());
                let divisor = self.regs.get(instr.src_b());
                if divisor == 0 {
                    return Err(Trap::DivideByZero { pc: self.pc });
                }
                self.regs.set_acc(dividend / divisor);
            }
            opcode::EXP => self.acc_binop(&instr, u32::wrapping_pow),

            // ===== Control flow =====
            opcode::JMP => next_pc = instr.a,
            opcode::JMR => next_pc = self.pc.wrapping_add(instr.a),
            opcode::CMP => {
                if self.regs.get(instr.src_a()) != 0 {
                    next_pc = instr.b;
                }
            }
            opcode::CMR => {
                if self.regs.get(instr.src_a()) != 0 {
                    next_pc = self.pc.wrapping_add(instr.b);
                }
            }

            // ===== Stack and calls =====
            opcode::PSH => {
                let value = self.regs.get(instr.src_a());
                self.stack.push(&mut self.memory, value)?;
            }
            opcode::POP => {
                let value = self.stack.pop(&self.memory)?;
                self.regs.set(instr.dst_a(), value);
            }
            opcode::MOVSP => self.stack.move_by(instr.a as i32),
            opcode::CALL => {
                // The return address is the instruction after the CALL.
                self.stack.push(&mut self.memory, next_pc)?;
                next_pc = instr.a;
            }
            opcode::RET => next_pc = self.stack.pop(&self.memory)?,

            // ===== Comparisons (unsigned) =====
            opcode::GT => self.acc_cmp(&instr, |a, b| a > b),
            opcode::LT => self.acc_cmp(&instr, |a, b| a < b),
            opcode::EQ => self.acc_cmp(&instr, |a, b| a == b),
            opcode::NE => self.acc_cmp(&instr, |a, b| a != b),
            opcode::GE => self.acc_cmp(&instr, |a, b| a >= b),
            opcode::LE => self.acc_cmp(&instr, |a, b| a <= b),

            // ===== Indirect memory =====
            opcode::LDI => {
                let addr = self.regs.get(instr.src_a());
                let value = self.memory.read_word(addr)?;
                self.regs.set(instr.dst_b(), value);
            }
            opcode::STI => {
                let value = self.regs.get(instr.src_a());
                let addr = self.regs.get(instr.src_b());
                self.memory.write_word(addr, value)?;
            }

            op => return Err(Trap::UnknownOpcode { pc: self.pc, opcode: op }),
        }

        if self.tracing {
            if let Some(trace) = &mut self.trace {
                trace.push(TraceRow {
                    clk: self.cycle,
                    pc: self.pc,
                    next_pc,
                    instr,
                    acc: self.regs.acc(),
                });
            }
        }

        self.pc = next_pc;
        self.cycle += 1;
        Ok(())
    }

    /// Binary ALU operation: both sources from registers, result to the
    /// accumulator.
    #[inline]
    fn acc_binop(&mut self, instr: &Instr, f: impl Fn(u32, u32) -> u32) {
        let a = self.regs.get(instr.src_a());
        let b = self.regs.get(instr.src_b());
        self.regs.set_acc(f(a, b));
    }

    /// Comparison: all-ones to the accumulator when the predicate holds,
    /// zero otherwise.
    #[inline]
    fn acc_cmp(&mut self, instr: &Instr, f: impl Fn(u32, u32) -> bool) {
        let a = self.regs.get(instr.src_a());
        let b = self.regs.get(instr.src_b());
        self.regs.set_acc(if f(a, b) { u32::MAX } else { 0 });
    }
}

// ============================================================================
// Instruction Assembler Helper (for testing)
// ============================================================================

/// Assemble a ten-byte instruction word from opcode and operands.
pub fn assemble(op: u16, a: u32, b: u32) -> [u8; INSTR_LEN] {
    let mut word = [0u8; INSTR_LEN];
    word[0..2].copy_from_slice(&op.to_be_bytes());
    word[2..6].copy_from_slice(&a.to_be_bytes());
    word[6..10].copy_from_slice(&b.to_be_bytes());
    word
}
