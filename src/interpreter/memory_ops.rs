//! Memory operations
//!
//! This module provides the pointer and bulk-memory opcodes plus the small
//! helpers every other opcode family uses to touch flat memory:
//!
//! - [`push_slice`]: reserve, write and advance `sp`
//! - [`top_of_stack`]: the low address of the top `n` stack bytes
//! - [`write_register`] / [`write_register_extended`]: register writes that
//!   never spill past the register's window
//!
//! The helpers are free functions over [`FlatMemory`] rather than methods so
//! callers can hold a scratch lane and the memory at the same time.
//!
//! # Protection
//!
//! Pointer writes may not touch the register file or the stack low address
//! itself; such writes fail with `AccessingProtectedMemory`.

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::ReturnCode;
use crate::memory::registers::STACK_LOW_ADDRESS;
use crate::memory::FlatMemory;
use crate::snapshot::OutputSink;

/// Push `bytes` at `sp`, growing memory first
#[inline]
pub(crate) fn push_slice(
    memory: &mut FlatMemory,
    sp: &mut usize,
    bytes: &[u8],
) -> Result<(), ReturnCode> {
    memory.reserve(bytes.len(), *sp)?;
    memory.write_bytes(*sp, bytes)?;
    *sp += bytes.len();
    Ok(())
}

/// Low address of the top `count` bytes below `sp`
#[inline]
pub(crate) fn top_of_stack(sp: usize, count: usize) -> Result<usize, ReturnCode> {
    sp.checked_sub(count)
        .filter(|low| *low >= STACK_LOW_ADDRESS)
        .ok_or(ReturnCode::StackUnderflow)
}

/// Replace the register at `address` with `bytes`, zero-extended to `capacity`
#[inline]
pub(crate) fn write_register(
    memory: &mut FlatMemory,
    address: u8,
    capacity: usize,
    bytes: &[u8],
) -> Result<(), ReturnCode> {
    write_register_extended(memory, address, capacity, bytes, false)
}

/// Replace the register at `address` with `bytes`, sign-extended to
/// `capacity` when `sign_extend` is set
pub(crate) fn write_register_extended(
    memory: &mut FlatMemory,
    address: u8,
    capacity: usize,
    bytes: &[u8],
    sign_extend: bool,
) -> Result<(), ReturnCode> {
    if bytes.len() > capacity {
        return Err(ReturnCode::RegisterOverflow);
    }
    let low = address as usize;
    let negative = bytes.last().is_some_and(|b| b & 0x80 != 0);
    let fill = if sign_extend && negative { 0xFF } else { 0x00 };

    memory.write_bytes(low, bytes)?;
    for offset in low + bytes.len()..low + capacity {
        memory.write_byte(offset, fill)?;
    }
    Ok(())
}

/// Pointer writes must land strictly above the stack low address
#[inline]
fn check_pointer(address: i64) -> Result<usize, ReturnCode> {
    usize::try_from(address)
        .ok()
        .filter(|address| *address > STACK_LOW_ADDRESS)
        .ok_or(ReturnCode::AccessingProtectedMemory)
}

impl<S: OutputSink> Machine<S> {
    /// `ptr addrW addr valueW value`
    pub(crate) fn ptr_stack(&mut self) -> Result<(), ReturnCode> {
        let address_width = self.next_width()?;
        let address = self.next_value(address_width)?;
        let value_width = self.next_width()?;
        let value = self.operand(value_width.bytes())?;

        let address = check_pointer(address as i64)?;
        self.memory.reserve(value.len(), address)?;
        self.memory.write_bytes(address, &self.program[value])?;
        Ok(())
    }

    /// `ptrr reg w value`; the address comes from the register
    pub(crate) fn ptr_stack_register(&mut self) -> Result<(), ReturnCode> {
        let (register, _) = self.next_register()?;
        let value_width = self.next_width()?;
        let value = self.operand(value_width.bytes())?;

        let address = check_pointer(self.read_register_value(register)?)?;
        self.memory.reserve(value.len(), address)?;
        self.memory.write_bytes(address, &self.program[value])?;
        Ok(())
    }

    /// `alloc w count`; push `count` zero bytes
    pub(crate) fn stack_alloc(&mut self) -> Result<(), ReturnCode> {
        let count = self.next_sized_count(ReturnCode::InvalidMemoryAccess)?;
        self.memory.reserve(count, self.sp)?;
        self.memory.clear_range(self.sp, self.sp + count)?;
        self.sp += count;
        Ok(())
    }

    /// `zero w count`; zero the `count` bytes ending at `sp`
    pub(crate) fn zero_memory(&mut self) -> Result<(), ReturnCode> {
        let count = self.next_sized_count(ReturnCode::StackUnderflow)?;
        let low = top_of_stack(self.sp, count)?;
        self.memory.clear_range(low, self.sp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_of_stack_guards_the_register_file() {
        assert_eq!(top_of_stack(STACK_LOW_ADDRESS + 4, 4), Ok(STACK_LOW_ADDRESS));
        assert_eq!(
            top_of_stack(STACK_LOW_ADDRESS + 3, 4),
            Err(ReturnCode::StackUnderflow)
        );
        assert_eq!(top_of_stack(2, 4), Err(ReturnCode::StackUnderflow));
    }

    #[test]
    fn test_register_writes_extend() {
        let mut memory = FlatMemory::new(128, 128);
        memory.write_bytes(12, &[9, 9, 9, 9]).unwrap();

        write_register(&mut memory, 12, 4, &[0xFE]).unwrap();
        assert_eq!(memory.read_bytes(12, 16).unwrap(), vec![0xFE, 0, 0, 0]);

        write_register_extended(&mut memory, 12, 4, &[0xFE], true).unwrap();
        assert_eq!(memory.read_bytes(12, 16).unwrap(), vec![0xFE, 0xFF, 0xFF, 0xFF]);

        assert_eq!(
            write_register(&mut memory, 0, 1, &[1, 2]),
            Err(ReturnCode::RegisterOverflow)
        );
    }

    #[test]
    fn test_push_slice_grows_memory() {
        let mut memory = FlatMemory::new(66, 1024);
        let mut sp = STACK_LOW_ADDRESS;
        push_slice(&mut memory, &mut sp, &[1, 2, 3, 4]).unwrap();
        assert_eq!(sp, STACK_LOW_ADDRESS + 4);
        assert!(memory.len() > sp);
        assert_eq!(memory.read_bytes(64, 68).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_push_slice_reports_overflow() {
        let mut memory = FlatMemory::new(66, 66);
        let mut sp = STACK_LOW_ADDRESS;
        assert_eq!(
            push_slice(&mut memory, &mut sp, &[1, 2, 3, 4]),
            Err(ReturnCode::StackOverflow)
        );
        assert_eq!(sp, STACK_LOW_ADDRESS);
    }
}
