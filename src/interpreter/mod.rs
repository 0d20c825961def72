//! Bytecode execution engine
//!
//! This module provides the machine and its opcode handlers:
//! - [`engine`]: machine state, the fetch/dispatch loop and `Exit`
//! - [`errors`]: return codes and history errors
//! - [`constants`]: default sizes and [`MachineConfig`](constants::MachineConfig)
//! - [`stack_ops`], [`register_ops`], [`jumps`], [`memory_ops`], [`builtins`]:
//!   opcode handlers, grouped by what they touch
//! - [`ops`]: width-generic byte arithmetic
//! - [`history`]: recorded execution for stepping back and forth
//!
//! # Execution Model
//!
//! `pc` indexes the loaded program, which lives outside machine memory. Each
//! step decodes one opcode, consumes its operands and runs its handler. A
//! handler either succeeds or returns the [`ReturnCode`](errors::ReturnCode)
//! the machine exits with; the code byte is then pushed onto the stack.
//! Running off the end of the program halts with `Ok` and pushes nothing.

pub mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod history;
pub mod jumps;
pub mod memory_ops;
pub mod ops;
pub mod register_ops;
pub mod stack_ops;

pub use constants::MachineConfig;
pub use engine::Machine;
pub use errors::ReturnCode;
pub use history::Recording;
