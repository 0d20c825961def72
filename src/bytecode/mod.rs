//! Bytecode format
//!
//! - [`opcode`]: the opcode table
//! - [`flags`]: values of the flags register and the modes they select
//! - [`builder`]: assembling programs in code
//! - [`disasm`]: decoding programs back into instructions

pub mod builder;
pub mod disasm;
pub mod flags;
pub mod opcode;

pub use builder::ProgramBuilder;
pub use disasm::{decode, disassemble, DecodeError, Instruction, Listing, Operand};
pub use opcode::Opcode;
