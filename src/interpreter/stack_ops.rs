//! Stack opcodes
//!
//! The stack grows upward from the stack low address and `sp` always points
//! at the first free byte. Every read below `sp` goes through
//! [`top_of_stack`], so the register file is never mistaken for stack data.

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::ReturnCode;
use crate::interpreter::memory_ops::{push_slice, top_of_stack, write_register};
use crate::interpreter::ops::{self, unary};
use crate::memory::value::{write_int, WordSize};
use crate::snapshot::OutputSink;
use tracing::warn;

impl<S: OutputSink> Machine<S> {
    /// `push w lit`
    pub(crate) fn push_direct(&mut self) -> Result<(), ReturnCode> {
        let width = self.next_width()?;
        let literal = self.operand(width.bytes())?;
        push_slice(&mut self.memory, &mut self.sp, &self.program[literal])
    }

    /// `pushreg reg`
    pub(crate) fn push_register(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let buffer = self.scratch.get_buffer(capacity, 0);
        self.memory.read_into(register as usize, buffer)?;
        push_slice(&mut self.memory, &mut self.sp, buffer)
    }

    /// `pop count`
    pub(crate) fn pop(&mut self) -> Result<(), ReturnCode> {
        let count = self.next_byte()? as usize;
        self.sp = top_of_stack(self.sp, count)?;
        Ok(())
    }

    /// `top w reg`; copy the top `w` bytes into a register
    pub(crate) fn top(&mut self) -> Result<(), ReturnCode> {
        let width = self.next_width()?;
        let (register, capacity) = self.next_register()?;
        if width.bytes() > capacity {
            return Err(ReturnCode::RegisterOverflow);
        }

        let low = top_of_stack(self.sp, width.bytes())?;
        let buffer = self.scratch.get_buffer(width.bytes(), 0);
        self.memory.read_into(low, buffer)?;
        write_register(&mut self.memory, register, capacity, buffer)
    }

    /// `sp reg`; store `sp` as a 4-byte value
    pub(crate) fn store_sp(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        if capacity < WordSize::LWord.bytes() {
            return Err(ReturnCode::RegisterOverflow);
        }

        let sp = i32::try_from(self.sp).map_err(|_| ReturnCode::RegisterOverflow)?;
        let buffer = self.scratch.get_buffer(WordSize::LWord.bytes(), 0);
        write_int(sp, buffer)?;
        write_register(&mut self.memory, register, capacity, buffer)
    }

    /// `pushb elemW countW count elements...`
    pub(crate) fn push_bytes(&mut self) -> Result<(), ReturnCode> {
        let element_width = self.next_width()?;
        let count = self.next_sized_count(ReturnCode::InvalidWordSize)?;
        let len = element_width
            .bytes()
            .checked_mul(count)
            .ok_or(ReturnCode::ProgramCounterCorrupted)?;
        let elements = self.operand(len)?;
        push_slice(&mut self.memory, &mut self.sp, &self.program[elements])
    }

    /// `inc w`
    pub(crate) fn inc_stack(&mut self) -> Result<(), ReturnCode> {
        self.adjust_stack_top(unary::increment_bytes)
    }

    /// `dec w`
    pub(crate) fn dec_stack(&mut self) -> Result<(), ReturnCode> {
        self.adjust_stack_top(unary::decrement_bytes)
    }

    fn adjust_stack_top(
        &mut self,
        adjust: fn(&[u8], &mut [u8]) -> Result<(), ReturnCode>,
    ) -> Result<(), ReturnCode> {
        let width = self.next_width()?;
        let low = top_of_stack(self.sp, width.bytes())?;
        let [value, result, _, _] = self
            .scratch
            .lanes(width.bytes())
            .ok_or(ReturnCode::DebugFault)?;
        self.memory.read_into(low, value)?;
        adjust(value, result)?;
        self.memory.write_bytes(low, result)?;
        Ok(())
    }

    /// `arith aW bW`; pop a (top) and b, push `a op b`
    pub(crate) fn arithmetic_stack(&mut self) -> Result<(), ReturnCode> {
        let a_width = self.next_width()?;
        let b_width = self.next_width()?;
        if a_width != b_width {
            warn!(a = %a_width, b = %b_width, "arithmetic on mismatched widths");
            return Err(ReturnCode::InvalidWordSize);
        }
        let mode = self.arithmetic_mode()?;

        let width = a_width.bytes();
        let a_low = top_of_stack(self.sp, width)?;
        let b_low = top_of_stack(a_low, width)?;

        let [a, b, result, _] = self.scratch.lanes(width).ok_or(ReturnCode::DebugFault)?;
        self.memory.read_into(a_low, a)?;
        self.memory.read_into(b_low, b)?;
        ops::apply(mode, a, b, result)?;

        self.memory.write_bytes(b_low, result)?;
        self.sp = b_low + width;
        Ok(())
    }
}
