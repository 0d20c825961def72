//! Word sizes and the little-endian integer codec
//!
//! Every operand the machine touches is a run of 1, 2 or 4 bytes stored
//! little-endian (`[0]` holds the least significant byte). This module defines
//! [`WordSize`] and the conversions between byte runs and integers:
//!
//! - [`to_int`]: zero-extends 1- and 2-byte words, reinterprets 4-byte words as `i32`
//! - [`to_signed`]: sign-extends at the word's own width
//! - [`to_bytes`] / [`write_int`]: encode the low `width` bytes of a value
//!
//! 8-byte words (`dword`) exist as a register class only; the codec rejects
//! them with [`ReturnCode::InvalidWordSize`].

use crate::interpreter::errors::ReturnCode;
use std::fmt;

/// Width of an operand in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WordSize {
    /// 8-bit word
    HWord = 1,
    /// 16-bit word
    Word = 2,
    /// 32-bit word
    LWord = 4,
}

/// Declared size of the 64-bit register class; never a valid operand width
pub const DWORD: u8 = 8;

impl WordSize {
    /// Decode a width byte from the program stream
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(WordSize::HWord),
            2 => Some(WordSize::Word),
            4 => Some(WordSize::LWord),
            _ => None,
        }
    }

    /// Validate a width byte, failing with `InvalidWordSize`
    pub fn validate(byte: u8) -> Result<Self, ReturnCode> {
        Self::from_byte(byte).ok_or(ReturnCode::InvalidWordSize)
    }

    /// Validate a byte count (e.g. a register capacity or slice length)
    pub fn from_len(len: usize) -> Result<Self, ReturnCode> {
        u8::try_from(len)
            .ok()
            .and_then(Self::from_byte)
            .ok_or(ReturnCode::InvalidWordSize)
    }

    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Assembler keyword for this size
    pub fn keyword(self) -> &'static str {
        match self {
            WordSize::HWord => "hword",
            WordSize::Word => "word",
            WordSize::LWord => "lword",
        }
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Decode a little-endian word.
///
/// 1- and 2-byte words are zero-extended; a 4-byte word is reinterpreted as `i32`.
pub fn to_int(bytes: &[u8]) -> Result<i32, ReturnCode> {
    match *bytes {
        [b0] => Ok(b0 as i32),
        [b0, b1] => Ok(u16::from_le_bytes([b0, b1]) as i32),
        [b0, b1, b2, b3] => Ok(i32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(ReturnCode::InvalidWordSize),
    }
}

/// Decode a little-endian word, sign-extending at its own width
pub fn to_signed(bytes: &[u8]) -> Result<i32, ReturnCode> {
    match *bytes {
        [b0] => Ok(b0 as i8 as i32),
        [b0, b1] => Ok(i16::from_le_bytes([b0, b1]) as i32),
        [b0, b1, b2, b3] => Ok(i32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(ReturnCode::InvalidWordSize),
    }
}

/// Decode a non-negative address or count.
///
/// Uses [`to_int`], so only a 4-byte word can come out negative.
pub fn to_address(bytes: &[u8]) -> Result<Option<usize>, ReturnCode> {
    let value = to_int(bytes)?;
    Ok(usize::try_from(value).ok())
}

/// Encode the low `out.len()` bytes of `value` into `out`
pub fn write_int(value: i32, out: &mut [u8]) -> Result<(), ReturnCode> {
    let width = WordSize::from_len(out.len())?;
    out.copy_from_slice(&value.to_le_bytes()[..width.bytes()]);
    Ok(())
}

/// Encode `value` as a freshly allocated word of `width` bytes
pub fn to_bytes(value: i32, width: usize) -> Result<Vec<u8>, ReturnCode> {
    let mut bytes = vec![0; width];
    write_int(value, &mut bytes)?;
    Ok(bytes)
}
