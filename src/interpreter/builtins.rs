//! Flag and print opcodes
//!
//! The flags register (low byte at [`FLAGS`]) is the only global mode in the
//! machine. This module writes it and decodes it: arithmetic opcodes ask for
//! an [`ArithmeticMode`], the print opcodes for a [`PrintFormat`].
//!
//! # Print formats
//!
//! - text: lossy UTF-8
//! - chars: one `char` per byte
//! - number: signed integer of the printed width (1, 2 or 4 bytes)
//! - float: `f32` (4 bytes)
//!
//! Every `Print` produces exactly one line on the machine's output sink.

use crate::bytecode::flags::{ArithmeticMode, Flag, PrintFormat};
use crate::interpreter::engine::Machine;
use crate::interpreter::errors::ReturnCode;
use crate::interpreter::memory_ops::top_of_stack;
use crate::memory::registers::FLAGS;
use crate::memory::value::to_signed;
use crate::snapshot::OutputSink;

/// Render `bytes` as one output line
pub fn format_output(format: PrintFormat, bytes: &[u8]) -> Result<String, ReturnCode> {
    match format {
        PrintFormat::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
        PrintFormat::Chars => Ok(bytes.iter().map(|b| *b as char).collect()),
        PrintFormat::Number => Ok(to_signed(bytes)?.to_string()),
        PrintFormat::Float => match *bytes {
            [b0, b1, b2, b3] => Ok(f32::from_le_bytes([b0, b1, b2, b3]).to_string()),
            _ => Err(ReturnCode::InvalidWordSize),
        },
    }
}

impl<S: OutputSink> Machine<S> {
    /// Current flags byte
    pub fn flags(&self) -> u8 {
        self.memory.read_byte(FLAGS as usize).unwrap_or_default()
    }

    pub(crate) fn arithmetic_mode(&self) -> Result<ArithmeticMode, ReturnCode> {
        Flag::arithmetic(self.flags())
    }

    fn print_format(&self) -> Result<PrintFormat, ReturnCode> {
        Flag::print_format(self.flags())
    }

    fn write_flags(&mut self, value: u8) -> Result<(), ReturnCode> {
        self.memory.write_byte(FLAGS as usize, value)?;
        Ok(())
    }

    /// `flag lit`
    pub(crate) fn set_flag_direct(&mut self) -> Result<(), ReturnCode> {
        let value = self.next_byte()?;
        self.write_flags(value)
    }

    /// `flagr reg`; low byte of the register
    pub(crate) fn set_flag_register(&mut self) -> Result<(), ReturnCode> {
        let (register, _) = self.next_register()?;
        let value = self.memory.read_byte(register as usize)?;
        self.write_flags(value)
    }

    /// `flags`; byte just below `sp`
    pub(crate) fn set_flag_stack(&mut self) -> Result<(), ReturnCode> {
        let low = top_of_stack(self.sp, 1)?;
        let value = self.memory.read_byte(low)?;
        self.write_flags(value)
    }

    /// `print w count`; the `count` bytes ending at `sp`
    pub(crate) fn print(&mut self) -> Result<(), ReturnCode> {
        let count = self.next_sized_count(ReturnCode::StackUnderflow)?;
        let format = self.print_format()?;

        let low = top_of_stack(self.sp, count)?;
        let line = format_output(format, self.memory.slice(low, self.sp)?)?;
        self.sink.write_line(&line);
        Ok(())
    }

    /// `printo addrW low high countW count`; the first `count` bytes of `[low, high)`
    pub(crate) fn print_offset(&mut self) -> Result<(), ReturnCode> {
        let address_width = self.next_width()?;
        let low = self.next_value(address_width)?;
        let high = self.next_value(address_width)?;
        let count = self.next_sized_count(ReturnCode::InvalidMemoryAccess)?;
        let format = self.print_format()?;

        let low = usize::try_from(low).map_err(|_| ReturnCode::InvalidMemoryAccess)?;
        let high = usize::try_from(high).map_err(|_| ReturnCode::InvalidMemoryAccess)?;
        if low > high || count > high - low {
            return Err(ReturnCode::InvalidMemoryAccess);
        }

        let line = format_output(format, self.memory.slice(low, low + count)?)?;
        self.sink.write_line(&line);
        Ok(())
    }
}
