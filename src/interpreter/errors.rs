//! Return codes and history errors
//!
//! This module defines [`ReturnCode`], the single outcome type of a program
//! run. Every fault the machine can detect maps to one code; the dispatch loop
//! turns it into an `Exit`, so faults never escape a run as panics.
//!
//! [`HistoryError`] covers the time-travel layer on top of a recorded run.

use std::fmt;

/// Outcome of a program run
///
/// The discriminant is the byte written to the stack by `Exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReturnCode {
    /// Normal termination
    Ok = 0,

    /// Unexpected internal fault
    DebugFault = 1,

    /// The program executed `Abort`
    AbortCalled = 2,

    /// Byte at `pc` is not an opcode, or operands run past the program
    ProgramCounterCorrupted = 3,

    /// Pointer write at or below the stack low address
    AccessingProtectedMemory = 4,

    /// Width outside {1, 2, 4}, or operands of different widths
    InvalidWordSize = 5,

    /// Pop or read below the stack low address
    StackUnderflow = 6,

    /// Memory growth hit the configured limit
    StackOverflow = 7,

    /// Write wider than the destination register
    RegisterOverflow = 8,

    /// Byte is not a register start address
    InvalidRegisterAddress = 9,

    /// Branch target outside the program
    InvalidJumpAddress = 10,

    /// Flags register does not select an operation
    InvalidFlag = 11,

    /// Integer division or modulo by zero
    DivisionByZero = 12,

    /// Read or write outside memory
    InvalidMemoryAccess = 13,
}

impl ReturnCode {
    /// All codes in discriminant order
    pub const ALL: [ReturnCode; 14] = [
        ReturnCode::Ok,
        ReturnCode::DebugFault,
        ReturnCode::AbortCalled,
        ReturnCode::ProgramCounterCorrupted,
        ReturnCode::AccessingProtectedMemory,
        ReturnCode::InvalidWordSize,
        ReturnCode::StackUnderflow,
        ReturnCode::StackOverflow,
        ReturnCode::RegisterOverflow,
        ReturnCode::InvalidRegisterAddress,
        ReturnCode::InvalidJumpAddress,
        ReturnCode::InvalidFlag,
        ReturnCode::DivisionByZero,
        ReturnCode::InvalidMemoryAccess,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == ReturnCode::Ok
    }

    /// Variant name as shown by the debugger
    pub fn name(self) -> &'static str {
        match self {
            ReturnCode::Ok => "Ok",
            ReturnCode::DebugFault => "DebugFault",
            ReturnCode::AbortCalled => "AbortCalled",
            ReturnCode::ProgramCounterCorrupted => "ProgramCounterCorrupted",
            ReturnCode::AccessingProtectedMemory => "AccessingProtectedMemory",
            ReturnCode::InvalidWordSize => "InvalidWordSize",
            ReturnCode::StackUnderflow => "StackUnderflow",
            ReturnCode::StackOverflow => "StackOverflow",
            ReturnCode::RegisterOverflow => "RegisterOverflow",
            ReturnCode::InvalidRegisterAddress => "InvalidRegisterAddress",
            ReturnCode::InvalidJumpAddress => "InvalidJumpAddress",
            ReturnCode::InvalidFlag => "InvalidFlag",
            ReturnCode::DivisionByZero => "DivisionByZero",
            ReturnCode::InvalidMemoryAccess => "InvalidMemoryAccess",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnCode::Ok => write!(f, "Program terminated normally"),
            ReturnCode::DebugFault => write!(f, "Internal fault in the virtual machine"),
            ReturnCode::AbortCalled => write!(f, "Abort was called"),
            ReturnCode::ProgramCounterCorrupted => {
                write!(f, "Program counter points at an invalid instruction")
            }
            ReturnCode::AccessingProtectedMemory => {
                write!(f, "Attempted to write to protected register memory")
            }
            ReturnCode::InvalidWordSize => {
                write!(f, "Invalid word size (expected 1, 2 or 4 bytes)")
            }
            ReturnCode::StackUnderflow => write!(f, "Stack underflow"),
            ReturnCode::StackOverflow => write!(f, "Stack overflow: memory limit reached"),
            ReturnCode::RegisterOverflow => {
                write!(f, "Value is wider than the destination register")
            }
            ReturnCode::InvalidRegisterAddress => write!(f, "Invalid register address"),
            ReturnCode::InvalidJumpAddress => {
                write!(f, "Jump target is outside the program")
            }
            ReturnCode::InvalidFlag => {
                write!(f, "Flags register does not select an operation")
            }
            ReturnCode::DivisionByZero => write!(f, "Division by zero"),
            ReturnCode::InvalidMemoryAccess => write!(f, "Memory access out of bounds"),
        }
    }
}

impl std::error::Error for ReturnCode {}

/// Errors from navigating or recording execution history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Nothing has been recorded
    Empty,

    /// Already at the first snapshot
    AtStart,

    /// Already at the last snapshot
    AtEnd,

    /// Snapshot budget exhausted
    SnapshotLimitExceeded { current: usize, limit: usize },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Empty => write!(f, "No snapshots available"),
            HistoryError::AtStart => write!(f, "Already at the beginning of execution"),
            HistoryError::AtEnd => {
                write!(f, "No more snapshots available (execution finished)")
            }
            HistoryError::SnapshotLimitExceeded { current, limit } => {
                write!(
                    f,
                    "Snapshot memory limit exceeded: {} bytes used, limit is {}",
                    current, limit
                )
            }
        }
    }
}

impl std::error::Error for HistoryError {}
