//! Binary byte arithmetic
//!
//! Operands are little-endian words of 1, 2 or 4 bytes. Every function takes
//! the two operand slices and an output slice of the same width, so the
//! dispatch loop can stage all three in scratch lanes without allocating.
//!
//! Integer results wrap at the declared width. Division and modulo are signed
//! at that width and truncate toward zero. Float operations read and write
//! `f32` and therefore require 4-byte operands.

use crate::bytecode::flags::{ArithmeticMode, NumberKind, Operation};
use crate::interpreter::errors::ReturnCode;
use crate::memory::value::{to_signed, write_int, WordSize};

/// Check that all three slices share one legal width
#[inline]
fn same_width(a: &[u8], b: &[u8], out: &[u8]) -> Result<WordSize, ReturnCode> {
    if a.len() != b.len() || a.len() != out.len() {
        return Err(ReturnCode::InvalidWordSize);
    }
    WordSize::from_len(a.len())
}

#[inline]
fn int_op(
    a: &[u8],
    b: &[u8],
    out: &mut [u8],
    op: impl FnOnce(i32, i32) -> Result<i32, ReturnCode>,
) -> Result<(), ReturnCode> {
    same_width(a, b, out)?;
    let result = op(to_signed(a)?, to_signed(b)?)?;
    write_int(result, out)
}

#[inline]
fn read_f32(bytes: &[u8]) -> Result<f32, ReturnCode> {
    match *bytes {
        [b0, b1, b2, b3] => Ok(f32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(ReturnCode::InvalidWordSize),
    }
}

#[inline]
fn float_op(
    a: &[u8],
    b: &[u8],
    out: &mut [u8],
    op: impl FnOnce(f32, f32) -> f32,
) -> Result<(), ReturnCode> {
    if same_width(a, b, out)? != WordSize::LWord {
        return Err(ReturnCode::InvalidWordSize);
    }
    let result = op(read_f32(a)?, read_f32(b)?);
    out.copy_from_slice(&result.to_le_bytes());
    Ok(())
}

pub fn add_bytes(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    int_op(a, b, out, |x, y| Ok(x.wrapping_add(y)))
}

/// `a - b`, computed as `a + (-b)`
pub fn subtract_bytes(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    same_width(a, b, out)?;
    let mut negated = [0u8; 4];
    let negated = &mut negated[..b.len()];
    super::unary::negate_bytes(b, negated)?;
    add_bytes(a, negated, out)
}

pub fn multiply_bytes(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    int_op(a, b, out, |x, y| Ok(x.wrapping_mul(y)))
}

pub fn divide_bytes(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    int_op(a, b, out, |x, y| {
        if y == 0 {
            return Err(ReturnCode::DivisionByZero);
        }
        Ok(x.wrapping_div(y))
    })
}

pub fn modulo_bytes(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    int_op(a, b, out, |x, y| {
        if y == 0 {
            return Err(ReturnCode::DivisionByZero);
        }
        Ok(x.wrapping_rem(y))
    })
}

pub fn add_floats(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    float_op(a, b, out, |x, y| x + y)
}

pub fn subtract_floats(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    float_op(a, b, out, |x, y| x - y)
}

pub fn multiply_floats(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    float_op(a, b, out, |x, y| x * y)
}

pub fn divide_floats(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    float_op(a, b, out, |x, y| x / y)
}

pub fn modulo_floats(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    float_op(a, b, out, |x, y| x % y)
}

/// Run the operation selected by `mode` on `a` and `b`
pub fn apply(mode: ArithmeticMode, a: &[u8], b: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    match (mode.kind, mode.operation) {
        (NumberKind::Int, Operation::Add) => add_bytes(a, b, out),
        (NumberKind::Int, Operation::Sub) => subtract_bytes(a, b, out),
        (NumberKind::Int, Operation::Div) => divide_bytes(a, b, out),
        (NumberKind::Int, Operation::Mul) => multiply_bytes(a, b, out),
        (NumberKind::Int, Operation::Mod) => modulo_bytes(a, b, out),
        (NumberKind::Float, Operation::Add) => add_floats(a, b, out),
        (NumberKind::Float, Operation::Sub) => subtract_floats(a, b, out),
        (NumberKind::Float, Operation::Div) => divide_floats(a, b, out),
        (NumberKind::Float, Operation::Mul) => multiply_floats(a, b, out),
        (NumberKind::Float, Operation::Mod) => modulo_floats(a, b, out),
    }
}
