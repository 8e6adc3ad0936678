//! Instruction encoders for test programs.
//!
//! Each encoder produces one ten-byte instruction word. Register operands
//! take the index in the operand's low byte; address and constant operands
//! take the full 32-bit value.

use decavm_executor::decode::opcode;
use decavm_executor::INSTR_LEN;

/// Raw instruction word from opcode and operands.
pub fn instr(op: u16, a: u32, b: u32) -> [u8; INSTR_LEN] {
    let mut word = [0u8; INSTR_LEN];
    word[0..2].copy_from_slice(&op.to_be_bytes());
    word[2..6].copy_from_slice(&a.to_be_bytes());
    word[6..10].copy_from_slice(&b.to_be_bytes());
    word
}

/// LD: load the word at `addr` into `r[dst]`.
pub fn ld(addr: u32, dst: u8) -> [u8; INSTR_LEN] {
    instr(opcode::LD, addr, dst.into())
}

/// LC: load the constant `value` into `r[dst]`.
pub fn lc(value: u32, dst: u8) -> [u8; INSTR_LEN] {
    instr(opcode::LC, value, dst.into())
}

/// DR: store `r[src]` at `addr`.
pub fn dr(src: u8, addr: u32) -> [u8; INSTR_LEN] {
    instr(opcode::DR, src.into(), addr)
}

/// CPY: copy `r[src]` into `r[dst]`.
pub fn cpy(src: u8, dst: u8) -> [u8; INSTR_LEN] {
    instr(opcode::CPY, src.into(), dst.into())
}

pub fn or(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::OR, ra.into(), rb.into())
}

pub fn and(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::AND, ra.into(), rb.into())
}

pub fn xor(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::XOR, ra.into(), rb.into())
}

pub fn nand(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::NAND, ra.into(), rb.into())
}

pub fn nor(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::NOR, ra.into(), rb.into())
}

pub fn not(ra: u8) -> [u8; INSTR_LEN] {
    instr(opcode::NOT, ra.into(), 0)
}

pub fn add(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::ADD, ra.into(), rb.into())
}

pub fn sub(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::SUB, ra.into(), rb.into())
}

pub fn mul(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::MUL, ra.into(), rb.into())
}

pub fn div(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::DIV, ra.into(), rb.into())
}

pub fn exp(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::EXP, ra.into(), rb.into())
}

/// JMP: absolute jump.
pub fn jmp(addr: u32) -> [u8; INSTR_LEN] {
    instr(opcode::JMP, addr, 0)
}

/// JMR: relative jump, based at the jump's own address.
pub fn jmr(offset: i32) -> [u8; INSTR_LEN] {
    instr(opcode::JMR, offset as u32, 0)
}

/// CMP: jump to `addr` when `r[pred]` is nonzero.
pub fn cmp(pred: u8, addr: u32) -> [u8; INSTR_LEN] {
    instr(opcode::CMP, pred.into(), addr)
}

/// CMR: relative jump when `r[pred]` is nonzero.
pub fn cmr(pred: u8, offset: i32) -> [u8; INSTR_LEN] {
    instr(opcode::CMR, pred.into(), offset as u32)
}

pub fn psh(src: u8) -> [u8; INSTR_LEN] {
    instr(opcode::PSH, src.into(), 0)
}

pub fn pop(dst: u8) -> [u8; INSTR_LEN] {
    instr(opcode::POP, dst.into(), 0)
}

pub fn movsp(offset: i32) -> [u8; INSTR_LEN] {
    instr(opcode::MOVSP, offset as u32, 0)
}

pub fn call(addr: u32) -> [u8; INSTR_LEN] {
    instr(opcode::CALL, addr, 0)
}

pub fn ret() -> [u8; INSTR_LEN] {
    instr(opcode::RET, 0, 0)
}

pub fn gt(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::GT, ra.into(), rb.into())
}

pub fn lt(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::LT, ra.into(), rb.into())
}

pub fn eq(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::EQ, ra.into(), rb.into())
}

pub fn ne(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::NE, ra.into(), rb.into())
}

pub fn ge(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::GE, ra.into(), rb.into())
}

pub fn le(ra: u8, rb: u8) -> [u8; INSTR_LEN] {
    instr(opcode::LE, ra.into(), rb.into())
}

/// LDI: load the word at address `r[addr_reg]` into `r[dst]`.
pub fn ldi(addr_reg: u8, dst: u8) -> [u8; INSTR_LEN] {
    instr(opcode::LDI, addr_reg.into(), dst.into())
}

/// STI: store `r[src]` at address `r[addr_reg]`.
pub fn sti(src: u8, addr_reg: u8) -> [u8; INSTR_LEN] {
    instr(opcode::STI, src.into(), addr_reg.into())
}
