//! Arithmetic logic unit.
//!
//! Register A is always the left operand and is never written. Register B is
//! the right operand and receives the result.

use crate::memory::Byte;

/// Operations the ALU can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
}

/// Outcome of an ALU operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AluResult {
    /// New value of register B
    pub value: Byte,
    /// The low byte of the result is zero
    pub zero: bool,
    /// The result left the unsigned byte range (overflow or underflow)
    pub carry: bool,
}

/// Applies `op` to `a` and `b`.
///
/// The computation is done in `i16` so neither overflow nor underflow wraps
/// before the flags are computed.
pub fn apply(op: AluOp, a: Byte, b: Byte) -> AluResult {
    let (a, b) = (i16::from(a), i16::from(b));
    let result = match op {
        AluOp::Add => a + b,
        AluOp::Sub => a - b,
    };

    AluResult {
        value: (result & 0xFF) as Byte,
        zero: (result & 0xFF) == 0,
        carry: !(0..=0xFF).contains(&result),
    }
}
