//! TUI pane rendering modules
//!
//! Each pane module exports a primary `render_*_pane()` function plus the
//! render data and scroll state types it needs. Panes are stateless apart
//! from the scroll state the app hands them.
//!
//! # Pane Modules
//!
//! - [`program`]: disassembly with the current instruction highlighted
//! - [`registers`]: register file bytes and values
//! - [`stack`]: hex dump of the live stack
//! - [`terminal`]: lines the program printed
//! - [`status`]: status bar with keybindings and execution state

mod utils;

pub mod program;
pub mod registers;
pub mod stack;
pub mod status;
pub mod terminal;

pub use program::{render_program_pane, ProgramRenderData, ProgramScrollState};
pub use registers::{render_registers_pane, RegistersRenderData};
pub use stack::{render_stack_pane, StackRenderData, StackScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use terminal::render_terminal_pane;
