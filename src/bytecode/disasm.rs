//! Instruction decoder and disassembler
//!
//! [`decode`] reads one instruction at an offset, following the same operand
//! layouts the machine uses. Widths must be valid to know how many bytes
//! follow, so an invalid width byte is a decode error; an invalid register
//! byte is not, and is shown as a raw address instead.

use crate::bytecode::opcode::Opcode;
use crate::memory::registers::{register_capacity, register_name};
use crate::memory::value::{to_int, WordSize};
use rustc_hash::FxHashMap;
use std::fmt;

/// A decoded operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Width(WordSize),
    Register(u8),
    /// Little-endian literal
    Value(i64),
    /// Raw byte (flag literals, pop counts)
    Byte(u8),
    /// Bulk-push elements
    Elements(Vec<i64>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Width(width) => write!(f, "{}", width),
            Operand::Register(address) => match register_name(*address) {
                Some(name) => f.write_str(name),
                None => write!(f, "@{}", address),
            },
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Byte(byte) => write!(f, "0x{:02X}", byte),
            Operand::Elements(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of the opcode byte
    pub offset: usize,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    /// Encoded length including the opcode byte
    pub len: usize,
}

impl Instruction {
    /// Offset of the following instruction
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Literal jump target, for branches that encode one
    pub fn jump_target(&self) -> Option<i64> {
        if !self.opcode.is_branch() || self.opcode == Opcode::JumpStack {
            return None;
        }
        match self.operands.last() {
            Some(Operand::Value(target)) => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}  {}", self.offset, self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Offset past the end of the program
    OutOfBounds { offset: usize },
    UnknownOpcode { offset: usize, byte: u8 },
    InvalidWidth { offset: usize, byte: u8 },
    /// A count operand is negative
    InvalidCount { offset: usize, count: i32 },
    /// Operands run past the end of the program
    Truncated { offset: usize, opcode: Opcode },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::OutOfBounds { offset } => {
                write!(f, "Offset {} is past the end of the program", offset)
            }
            DecodeError::UnknownOpcode { offset, byte } => {
                write!(f, "Unknown opcode 0x{:02X} at offset {}", byte, offset)
            }
            DecodeError::InvalidWidth { offset, byte } => {
                write!(f, "Invalid width byte {} at offset {}", byte, offset)
            }
            DecodeError::InvalidCount { offset, count } => {
                write!(f, "Negative count {} at offset {}", count, offset)
            }
            DecodeError::Truncated { offset, opcode } => {
                write!(f, "Truncated '{}' instruction at offset {}", opcode, offset)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

struct Cursor<'a> {
    program: &'a [u8],
    opcode: Opcode,
    start: usize,
    pos: usize,
    operands: Vec<Operand>,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|end| *end <= self.program.len())
            .ok_or(DecodeError::Truncated {
                offset: self.start,
                opcode: self.opcode,
            })?;
        let bytes = &self.program[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_width(&mut self) -> Result<WordSize, DecodeError> {
        let offset = self.pos;
        let byte = self.read_byte()?;
        WordSize::from_byte(byte).ok_or(DecodeError::InvalidWidth { offset, byte })
    }

    fn read_int(&mut self, width: WordSize) -> Result<i32, DecodeError> {
        let bytes = self.take(width.bytes())?;
        // Width is already validated, so the codec cannot fail
        Ok(to_int(bytes).unwrap_or_default())
    }

    fn width(&mut self) -> Result<WordSize, DecodeError> {
        let width = self.read_width()?;
        self.operands.push(Operand::Width(width));
        Ok(width)
    }

    fn value(&mut self, width: WordSize) -> Result<i32, DecodeError> {
        let value = self.read_int(width)?;
        self.operands.push(Operand::Value(value as i64));
        Ok(value)
    }

    fn sized(&mut self) -> Result<i32, DecodeError> {
        let width = self.width()?;
        self.value(width)
    }

    fn register(&mut self) -> Result<u8, DecodeError> {
        let address = self.read_byte()?;
        self.operands.push(Operand::Register(address));
        Ok(address)
    }

    fn byte(&mut self) -> Result<(), DecodeError> {
        let byte = self.read_byte()?;
        self.operands.push(Operand::Byte(byte));
        Ok(())
    }

    /// `loadd`: literal sized by the register's capacity
    fn register_literal(&mut self, register: u8) -> Result<(), DecodeError> {
        let value = match register_capacity(register) {
            8 => {
                let bytes = self.take(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                i64::from_le_bytes(raw)
            }
            capacity => match WordSize::from_byte(capacity) {
                Some(width) => self.read_int(width)? as i64,
                // The machine faults on the register before reading a literal
                None => return Ok(()),
            },
        };
        self.operands.push(Operand::Value(value));
        Ok(())
    }

    /// `pushb`: element width, count, then the elements
    fn elements(&mut self) -> Result<(), DecodeError> {
        let element_width = self.width()?;
        let count_offset = self.pos;
        let count = self.sized()?;
        let count = usize::try_from(count).map_err(|_| DecodeError::InvalidCount {
            offset: count_offset,
            count,
        })?;
        let bytes = self.take(count.saturating_mul(element_width.bytes()))?;
        let elements = bytes
            .chunks(element_width.bytes())
            .map(|chunk| to_int(chunk).unwrap_or_default() as i64)
            .collect();
        self.operands.push(Operand::Elements(elements));
        Ok(())
    }
}

/// Decode the instruction starting at `offset`
pub fn decode(program: &[u8], offset: usize) -> Result<Instruction, DecodeError> {
    let byte = *program
        .get(offset)
        .ok_or(DecodeError::OutOfBounds { offset })?;
    let opcode =
        Opcode::try_from(byte).map_err(|_| DecodeError::UnknownOpcode { offset, byte })?;

    let mut cursor = Cursor {
        program,
        opcode,
        start: offset,
        pos: offset + 1,
        operands: Vec::new(),
    };

    match opcode {
        Opcode::Abort | Opcode::Halt | Opcode::Nop | Opcode::SetFlagStack => {}

        Opcode::IncReg
        | Opcode::DecReg
        | Opcode::Clear
        | Opcode::PushRegister
        | Opcode::Sp
        | Opcode::SetFlagRegister => {
            cursor.register()?;
        }

        Opcode::IncStack | Opcode::DecStack | Opcode::JumpStack => {
            cursor.width()?;
        }

        Opcode::SetFlagDirect | Opcode::Pop => cursor.byte()?,

        Opcode::ArithmeticStack => {
            cursor.width()?;
            cursor.width()?;
        }
        Opcode::ArithmeticRegister => {
            cursor.register()?;
            cursor.register()?;
        }
        Opcode::ArithmeticRegisterRegister => {
            cursor.register()?;
            cursor.register()?;
            cursor.register()?;
        }

        Opcode::Load => {
            cursor.register()?;
            cursor.sized()?;
        }
        Opcode::LoadDirect => {
            let register = cursor.register()?;
            cursor.register_literal(register)?;
        }
        Opcode::CopyStack => {
            cursor.register()?;
            cursor.width()?;
            cursor.sized()?;
        }
        Opcode::CopyStackRegister => {
            cursor.width()?;
            cursor.register()?;
            cursor.register()?;
        }
        Opcode::Top => {
            cursor.width()?;
            cursor.register()?;
        }

        Opcode::StackAlloc
        | Opcode::ZeroMemory
        | Opcode::Print
        | Opcode::PushDirect
        | Opcode::Jump => {
            cursor.sized()?;
        }
        Opcode::PtrStack => {
            cursor.sized()?;
            cursor.sized()?;
        }
        Opcode::PtrStackRegister => {
            cursor.register()?;
            cursor.sized()?;
        }

        Opcode::Jez | Opcode::Jlz | Opcode::Jgz => {
            cursor.width()?;
            cursor.sized()?;
        }
        Opcode::Jeq | Opcode::Jneq => {
            cursor.width()?;
            cursor.width()?;
            cursor.sized()?;
        }

        Opcode::PrintOffset => {
            let address_width = cursor.width()?;
            cursor.value(address_width)?;
            cursor.value(address_width)?;
            cursor.sized()?;
        }
        Opcode::PushBytes => cursor.elements()?,
    }

    Ok(Instruction {
        offset,
        opcode,
        operands: cursor.operands,
        len: cursor.pos - offset,
    })
}

/// Result of decoding a whole program
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub instructions: Vec<Instruction>,
    /// Why decoding stopped before the end, if it did
    pub error: Option<DecodeError>,
    rows: FxHashMap<usize, usize>,
}

impl Listing {
    /// Row of the instruction starting at `offset`
    pub fn row_of(&self, offset: usize) -> Option<usize> {
        self.rows.get(&offset).copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Decode `program` from offset 0, stopping at the first undecodable byte
pub fn disassemble(program: &[u8]) -> Listing {
    let mut listing = Listing::default();
    let mut offset = 0;
    while offset < program.len() {
        match decode(program, offset) {
            Ok(instruction) => {
                listing.rows.insert(offset, listing.instructions.len());
                offset = instruction.end();
                listing.instructions.push(instruction);
            }
            Err(e) => {
                listing.error = Some(e);
                break;
            }
        }
    }
    listing
}
