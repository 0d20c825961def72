//! # Introduction
//!
//! svm is a register-based bytecode virtual machine. Programs are flat byte
//! streams of one-byte opcodes with little-endian operands; the machine runs
//! them over a single growable memory holding a 64-byte register file
//! followed by an upward-growing stack.
//!
//! ## Execution pipeline
//!
//! ```text
//! ProgramBuilder / file → Machine (step loop) → ReturnCode
//!                                  ↓
//!                         Snapshots → TUI debugger
//! ```
//!
//! 1. [`bytecode`]: opcode table, flag values, program builder and
//!    disassembler.
//! 2. [`interpreter`]: the [`Machine`](interpreter::Machine), its opcode
//!    handlers and recorded execution.
//! 3. [`memory`]: flat memory, register table, scratch buffers and the
//!    little-endian integer codec.
//! 4. [`snapshot`]: output sinks and the per-step snapshot store.
//! 5. [`ui`]: ratatui-based debugger; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use svm::bytecode::{flags, ProgramBuilder};
//! use svm::interpreter::{Machine, ReturnCode};
//! use svm::memory::WordSize;
//!
//! let program = ProgramBuilder::new()
//!     .push(WordSize::Word, 40)
//!     .push(WordSize::Word, 2)
//!     .set_flag(flags::INT_ADD)
//!     .arithmetic_stack(WordSize::Word, WordSize::Word)
//!     .set_flag(flags::PRINT_NUMBER)
//!     .print(WordSize::HWord, 2)
//!     .build();
//!
//! let mut machine = Machine::default();
//! assert_eq!(machine.run_program(&program), ReturnCode::Ok);
//! assert_eq!(machine.sink().get_output(), &["42".to_string()]);
//! ```

pub mod bytecode;
pub mod interpreter;
pub mod memory;
pub mod snapshot;
pub mod ui;
