//! Flags register encoding
//!
//! The low byte of the flags register selects what the next arithmetic or
//! print instruction does. Programs keep the two-step protocol (set the flag,
//! then operate); inside the machine the byte is decoded once into a [`Flag`]
//! and the resulting mode is passed explicitly to the arithmetic and print
//! code.
//!
//! | Byte        | Meaning                                   |
//! |-------------|-------------------------------------------|
//! | `0x00-0x04` | integer add, sub, div, mul, mod           |
//! | `0x05-0x09` | float add, sub, div, mul, mod             |
//! | `0x10`      | print as text                             |
//! | `0x11`      | print as characters                       |
//! | `0x12`      | print as number                           |

use crate::interpreter::errors::ReturnCode;
use std::fmt;

pub const INT_ADD: u8 = 0x00;
pub const INT_SUB: u8 = 0x01;
pub const INT_DIV: u8 = 0x02;
pub const INT_MUL: u8 = 0x03;
pub const INT_MOD: u8 = 0x04;
pub const FLOAT_ADD: u8 = 0x05;
pub const FLOAT_SUB: u8 = 0x06;
pub const FLOAT_DIV: u8 = 0x07;
pub const FLOAT_MUL: u8 = 0x08;
pub const FLOAT_MOD: u8 = 0x09;
pub const PRINT_TEXT: u8 = 0x10;
pub const PRINT_CHARS: u8 = 0x11;
pub const PRINT_NUMBER: u8 = 0x12;

/// Interpretation of operand bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Int,
    Float,
}

/// Binary operation, in flag-byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Sub,
    Div,
    Mul,
    Mod,
}

impl Operation {
    const ORDER: [Operation; 5] = [
        Operation::Add,
        Operation::Sub,
        Operation::Div,
        Operation::Mul,
        Operation::Mod,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Div => "/",
            Operation::Mul => "*",
            Operation::Mod => "%",
        }
    }
}

/// Arithmetic selection: operand kind × operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArithmeticMode {
    pub kind: NumberKind,
    pub operation: Operation,
}

impl ArithmeticMode {
    pub const fn new(kind: NumberKind, operation: Operation) -> Self {
        ArithmeticMode { kind, operation }
    }

    pub fn as_byte(self) -> u8 {
        let base = match self.kind {
            NumberKind::Int => INT_ADD,
            NumberKind::Float => FLOAT_ADD,
        };
        let index = Operation::ORDER
            .iter()
            .position(|op| *op == self.operation)
            .unwrap_or(0);
        base + index as u8
    }
}

/// How `Print` renders bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintFormat {
    /// Lossy UTF-8
    Text,
    /// One character per byte
    Chars,
    /// Signed integer of the printed width
    Number,
    /// `f32`
    Float,
}

/// Decoded flags byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Arithmetic(ArithmeticMode),
    Print(PrintFormat),
}

impl Flag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            INT_ADD..=INT_MOD => Some(Flag::Arithmetic(ArithmeticMode::new(
                NumberKind::Int,
                Operation::ORDER[(byte - INT_ADD) as usize],
            ))),
            FLOAT_ADD..=FLOAT_MOD => Some(Flag::Arithmetic(ArithmeticMode::new(
                NumberKind::Float,
                Operation::ORDER[(byte - FLOAT_ADD) as usize],
            ))),
            PRINT_TEXT => Some(Flag::Print(PrintFormat::Text)),
            PRINT_CHARS => Some(Flag::Print(PrintFormat::Chars)),
            PRINT_NUMBER => Some(Flag::Print(PrintFormat::Number)),
            _ => None,
        }
    }

    /// Arithmetic mode selected by `byte`, or `InvalidFlag`
    pub fn arithmetic(byte: u8) -> Result<ArithmeticMode, ReturnCode> {
        match Self::from_byte(byte) {
            Some(Flag::Arithmetic(mode)) => Ok(mode),
            _ => Err(ReturnCode::InvalidFlag),
        }
    }

    /// Print format selected by `byte`.
    ///
    /// Integer arithmetic modes print numbers and float modes print `f32`s.
    pub fn print_format(byte: u8) -> Result<PrintFormat, ReturnCode> {
        match Self::from_byte(byte) {
            Some(Flag::Print(format)) => Ok(format),
            Some(Flag::Arithmetic(mode)) => Ok(match mode.kind {
                NumberKind::Int => PrintFormat::Number,
                NumberKind::Float => PrintFormat::Float,
            }),
            None => Err(ReturnCode::InvalidFlag),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Arithmetic(mode) => {
                let kind = match mode.kind {
                    NumberKind::Int => "int",
                    NumberKind::Float => "float",
                };
                write!(f, "{} {}", kind, mode.operation.symbol())
            }
            Flag::Print(PrintFormat::Text) => write!(f, "print text"),
            Flag::Print(PrintFormat::Chars) => write!(f, "print chars"),
            Flag::Print(PrintFormat::Number) => write!(f, "print number"),
            Flag::Print(PrintFormat::Float) => write!(f, "print float"),
        }
    }
}
