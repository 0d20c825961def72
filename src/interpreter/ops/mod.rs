//! Byte-level arithmetic
//!
//! - [`binary`]: add, subtract, multiply, divide and modulo over equal-width words
//! - [`unary`]: negation, increment, decrement and the literal 1

pub mod binary;
pub mod unary;

pub use binary::apply;
