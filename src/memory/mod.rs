//! Memory model for the virtual machine
//!
//! This module provides the core memory abstractions:
//! - [`flat`]: One contiguous growable byte region
//! - [`registers`]: Fixed register windows over the low addresses of that region
//! - [`scratch`]: Reusable staging buffers for the dispatch loop
//! - [`value`]: Word sizes and the little-endian integer codec
//!
//! # Layout
//!
//! ```text
//! 0                64                                   len
//! ├─ registers ────┼─ stack (grows up) ──►       free   ┤
//!                  ▲                   ▲
//!          STACK_LOW_ADDRESS           sp
//! ```
//!
//! There is no separate heap. Programs that want heap-like data compute
//! addresses above the stack and write through the pointer opcodes.

pub mod flat;
pub mod registers;
pub mod scratch;
pub mod value;

pub use flat::{FlatMemory, MemoryError};
pub use registers::{register_capacity, STACK_LOW_ADDRESS};
pub use scratch::ScratchPool;
pub use value::WordSize;
