//! Register opcodes
//!
//! Values moved into a register are zero-extended to its capacity. Integer
//! arithmetic results written by `arithrr` are sign-extended instead, so a
//! negative 2-byte result stays negative in a 4-byte register.

use crate::bytecode::flags::NumberKind;
use crate::interpreter::engine::Machine;
use crate::interpreter::errors::ReturnCode;
use crate::interpreter::memory_ops::{
    push_slice, top_of_stack, write_register, write_register_extended,
};
use crate::interpreter::ops::{self, unary};
use crate::memory::registers::{register_capacity, HIGH_ADDRESS};
use crate::memory::value::WordSize;
use crate::snapshot::OutputSink;
use tracing::warn;

impl<S: OutputSink> Machine<S> {
    /// `load reg w lit`
    pub(crate) fn load_register(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let width = self.next_width()?;
        let literal = self.operand(width.bytes())?;
        if width.bytes() > capacity {
            return Err(ReturnCode::RegisterOverflow);
        }
        write_register(&mut self.memory, register, capacity, &self.program[literal])
    }

    /// `loadd reg lit`; the literal has the register's width
    pub(crate) fn load_direct(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let literal = self.operand(capacity)?;
        write_register(&mut self.memory, register, capacity, &self.program[literal])
    }

    /// `copy reg valueW addrW addr`
    pub(crate) fn copy_stack(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let value_width = self.next_width()?;
        let address_width = self.next_width()?;
        let address = self.next_value(address_width)?;
        if value_width.bytes() > capacity {
            return Err(ReturnCode::RegisterOverflow);
        }

        let address = usize::try_from(address).map_err(|_| ReturnCode::InvalidMemoryAccess)?;
        let buffer = self.scratch.get_buffer(value_width.bytes(), 1);
        self.memory.read_into(address, buffer)?;
        write_register(&mut self.memory, register, capacity, buffer)
    }

    /// `copyr w addrReg dstReg`; dst = top `w` bytes of the stack
    ///
    /// `addrReg` must hold the address of a register.
    pub(crate) fn copy_stack_register(&mut self) -> Result<(), ReturnCode> {
        let width = self.next_width()?;
        let (address_register, _) = self.next_register()?;
        let (target, capacity) = self.next_register()?;
        if width.bytes() > capacity {
            return Err(ReturnCode::RegisterOverflow);
        }

        let address = self.read_register_value(address_register)?;
        u8::try_from(address)
            .ok()
            .filter(|address| *address <= HIGH_ADDRESS && register_capacity(*address) != 0)
            .ok_or(ReturnCode::InvalidRegisterAddress)?;

        let low = top_of_stack(self.sp, width.bytes())?;
        let buffer = self.scratch.get_buffer(width.bytes(), 1);
        self.memory.read_into(low, buffer)?;
        write_register(&mut self.memory, target, capacity, buffer)
    }

    /// `clear reg`
    pub(crate) fn clear_register(&mut self) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let low = register as usize;
        self.memory.clear_range(low, low + capacity)?;
        Ok(())
    }

    /// `increg reg`
    pub(crate) fn inc_reg(&mut self) -> Result<(), ReturnCode> {
        self.adjust_register(unary::increment_bytes)
    }

    /// `decreg reg`
    pub(crate) fn dec_reg(&mut self) -> Result<(), ReturnCode> {
        self.adjust_register(unary::decrement_bytes)
    }

    fn adjust_register(
        &mut self,
        adjust: fn(&[u8], &mut [u8]) -> Result<(), ReturnCode>,
    ) -> Result<(), ReturnCode> {
        let (register, capacity) = self.next_register()?;
        let width = WordSize::from_len(capacity)?;
        let [value, result, _, _] = self
            .scratch
            .lanes(width.bytes())
            .ok_or(ReturnCode::DebugFault)?;
        self.memory.read_into(register as usize, value)?;
        adjust(value, result)?;
        self.memory.write_bytes(register as usize, result)?;
        Ok(())
    }

    /// Operand width shared by two registers
    fn register_operand_width(a: usize, b: usize) -> Result<WordSize, ReturnCode> {
        if a != b {
            warn!(a, b, "arithmetic on registers of different widths");
            return Err(ReturnCode::InvalidWordSize);
        }
        WordSize::from_len(a)
    }

    /// `arithr aReg bReg`; push `a op b`
    pub(crate) fn arithmetic_register(&mut self) -> Result<(), ReturnCode> {
        let (a_register, a_capacity) = self.next_register()?;
        let (b_register, b_capacity) = self.next_register()?;
        let width = Self::register_operand_width(a_capacity, b_capacity)?.bytes();
        let mode = self.arithmetic_mode()?;

        let [a, b, result, _] = self.scratch.lanes(width).ok_or(ReturnCode::DebugFault)?;
        self.memory.read_into(a_register as usize, a)?;
        self.memory.read_into(b_register as usize, b)?;
        ops::apply(mode, a, b, result)?;
        push_slice(&mut self.memory, &mut self.sp, result)
    }

    /// `arithrr aReg bReg dstReg`; dst = a op b
    pub(crate) fn arithmetic_register_register(&mut self) -> Result<(), ReturnCode> {
        let (a_register, a_capacity) = self.next_register()?;
        let (b_register, b_capacity) = self.next_register()?;
        let (target, target_capacity) = self.next_register()?;
        let width = Self::register_operand_width(a_capacity, b_capacity)?.bytes();
        if target_capacity < width {
            return Err(ReturnCode::RegisterOverflow);
        }
        let mode = self.arithmetic_mode()?;

        let [a, b, result, _] = self.scratch.lanes(width).ok_or(ReturnCode::DebugFault)?;
        self.memory.read_into(a_register as usize, a)?;
        self.memory.read_into(b_register as usize, b)?;
        ops::apply(mode, a, b, result)?;

        let sign_extend = mode.kind == NumberKind::Int;
        write_register_extended(&mut self.memory, target, target_capacity, result, sign_extend)
    }
}
