//! Program builder
//!
//! Assembles a byte stream opcode by opcode with typed operands. Methods
//! chain on `&mut self`; [`ProgramBuilder::offset`] and
//! [`ProgramBuilder::patch`] handle forward jump targets:
//!
//! ```
//! use svm::bytecode::builder::ProgramBuilder;
//! use svm::memory::value::WordSize;
//!
//! let mut builder = ProgramBuilder::new();
//! builder.push(WordSize::HWord, 0);
//! let jez = builder.offset();
//! builder.jez(WordSize::HWord, WordSize::HWord, 0).abort();
//! let target = builder.offset();
//! builder.nop();
//! // The target operand sits after the opcode and two width bytes
//! builder.patch(jez + 3, target as i32, WordSize::HWord);
//! let program = builder.build();
//! assert_eq!(program.len(), 9);
//! ```
//!
//! Literals wider than their declared width are truncated to it.

use crate::bytecode::opcode::Opcode;
use crate::memory::registers::register_capacity;
use crate::memory::value::WordSize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBuilder {
    bytes: Vec<u8>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder { bytes: Vec::new() }
    }

    /// Offset the next byte will be written at
    pub fn offset(&self) -> usize {
        self.bytes.len()
    }

    /// Copy of the program built so far
    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Append raw bytes
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append the low `width` bytes of `value`, little-endian
    pub fn value(&mut self, value: i32, width: WordSize) -> &mut Self {
        self.bytes
            .extend_from_slice(&value.to_le_bytes()[..width.bytes()]);
        self
    }

    /// Overwrite `width` bytes at `at` with `value`.
    ///
    /// Bytes past the end of the program are ignored.
    pub fn patch(&mut self, at: usize, value: i32, width: WordSize) -> &mut Self {
        let encoded = value.to_le_bytes();
        for (i, byte) in encoded[..width.bytes()].iter().enumerate() {
            if let Some(slot) = self.bytes.get_mut(at + i) {
                *slot = *byte;
            }
        }
        self
    }

    pub fn opcode(&mut self, opcode: Opcode) -> &mut Self {
        self.bytes.push(opcode.as_byte());
        self
    }

    fn width(&mut self, width: WordSize) -> &mut Self {
        self.bytes.push(width as u8);
        self
    }

    fn sized(&mut self, width: WordSize, value: i32) -> &mut Self {
        self.width(width).value(value, width)
    }

    // ========== Stack ==========

    pub fn push(&mut self, width: WordSize, value: i32) -> &mut Self {
        self.opcode(Opcode::PushDirect).sized(width, value)
    }

    pub fn push_register(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::PushRegister).bytes(&[register])
    }

    pub fn pop(&mut self, count: u8) -> &mut Self {
        self.opcode(Opcode::Pop).bytes(&[count])
    }

    pub fn top(&mut self, width: WordSize, register: u8) -> &mut Self {
        self.opcode(Opcode::Top).width(width).bytes(&[register])
    }

    pub fn sp(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::Sp).bytes(&[register])
    }

    /// Bulk push; the element count is encoded at `count_width`
    pub fn push_bytes(
        &mut self,
        element_width: WordSize,
        count_width: WordSize,
        elements: &[i32],
    ) -> &mut Self {
        self.opcode(Opcode::PushBytes)
            .width(element_width)
            .sized(count_width, elements.len() as i32);
        for element in elements {
            self.value(*element, element_width);
        }
        self
    }

    pub fn inc_stack(&mut self, width: WordSize) -> &mut Self {
        self.opcode(Opcode::IncStack).width(width)
    }

    pub fn dec_stack(&mut self, width: WordSize) -> &mut Self {
        self.opcode(Opcode::DecStack).width(width)
    }

    pub fn arithmetic_stack(&mut self, a: WordSize, b: WordSize) -> &mut Self {
        self.opcode(Opcode::ArithmeticStack).width(a).width(b)
    }

    // ========== Registers ==========

    pub fn load(&mut self, register: u8, width: WordSize, value: i32) -> &mut Self {
        self.opcode(Opcode::Load)
            .bytes(&[register])
            .sized(width, value)
    }

    /// Load a literal sized by the register's capacity
    pub fn load_direct(&mut self, register: u8, value: i64) -> &mut Self {
        let capacity = register_capacity(register) as usize;
        self.opcode(Opcode::LoadDirect)
            .bytes(&[register])
            .bytes(&value.to_le_bytes()[..capacity])
    }

    pub fn copy_stack(
        &mut self,
        register: u8,
        value_width: WordSize,
        address_width: WordSize,
        address: i32,
    ) -> &mut Self {
        self.opcode(Opcode::CopyStack)
            .bytes(&[register])
            .width(value_width)
            .sized(address_width, address)
    }

    pub fn copy_stack_register(
        &mut self,
        width: WordSize,
        address_register: u8,
        target: u8,
    ) -> &mut Self {
        self.opcode(Opcode::CopyStackRegister)
            .width(width)
            .bytes(&[address_register, target])
    }

    pub fn clear(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::Clear).bytes(&[register])
    }

    pub fn inc_reg(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::IncReg).bytes(&[register])
    }

    pub fn dec_reg(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::DecReg).bytes(&[register])
    }

    pub fn arithmetic_register(&mut self, a: u8, b: u8) -> &mut Self {
        self.opcode(Opcode::ArithmeticRegister).bytes(&[a, b])
    }

    pub fn arithmetic_register_register(&mut self, a: u8, b: u8, target: u8) -> &mut Self {
        self.opcode(Opcode::ArithmeticRegisterRegister)
            .bytes(&[a, b, target])
    }

    // ========== Flow ==========

    pub fn abort(&mut self) -> &mut Self {
        self.opcode(Opcode::Abort)
    }

    pub fn halt(&mut self) -> &mut Self {
        self.opcode(Opcode::Halt)
    }

    pub fn nop(&mut self) -> &mut Self {
        self.opcode(Opcode::Nop)
    }

    fn zero_test(
        &mut self,
        opcode: Opcode,
        stack_width: WordSize,
        address_width: WordSize,
        target: i32,
    ) -> &mut Self {
        self.opcode(opcode)
            .width(stack_width)
            .sized(address_width, target)
    }

    pub fn jez(&mut self, stack_width: WordSize, address_width: WordSize, target: i32) -> &mut Self {
        self.zero_test(Opcode::Jez, stack_width, address_width, target)
    }

    pub fn jlz(&mut self, stack_width: WordSize, address_width: WordSize, target: i32) -> &mut Self {
        self.zero_test(Opcode::Jlz, stack_width, address_width, target)
    }

    pub fn jgz(&mut self, stack_width: WordSize, address_width: WordSize, target: i32) -> &mut Self {
        self.zero_test(Opcode::Jgz, stack_width, address_width, target)
    }

    pub fn jeq(
        &mut self,
        a: WordSize,
        b: WordSize,
        address_width: WordSize,
        target: i32,
    ) -> &mut Self {
        self.opcode(Opcode::Jeq)
            .width(a)
            .width(b)
            .sized(address_width, target)
    }

    pub fn jneq(
        &mut self,
        a: WordSize,
        b: WordSize,
        address_width: WordSize,
        target: i32,
    ) -> &mut Self {
        self.opcode(Opcode::Jneq)
            .width(a)
            .width(b)
            .sized(address_width, target)
    }

    pub fn jump(&mut self, address_width: WordSize, target: i32) -> &mut Self {
        self.opcode(Opcode::Jump).sized(address_width, target)
    }

    pub fn jump_stack(&mut self, width: WordSize) -> &mut Self {
        self.opcode(Opcode::JumpStack).width(width)
    }

    // ========== Memory ==========

    pub fn stack_alloc(&mut self, width: WordSize, count: i32) -> &mut Self {
        self.opcode(Opcode::StackAlloc).sized(width, count)
    }

    pub fn zero_memory(&mut self, width: WordSize, count: i32) -> &mut Self {
        self.opcode(Opcode::ZeroMemory).sized(width, count)
    }

    pub fn ptr_stack(
        &mut self,
        address_width: WordSize,
        address: i32,
        value_width: WordSize,
        value: i32,
    ) -> &mut Self {
        self.opcode(Opcode::PtrStack)
            .sized(address_width, address)
            .sized(value_width, value)
    }

    pub fn ptr_stack_register(&mut self, register: u8, width: WordSize, value: i32) -> &mut Self {
        self.opcode(Opcode::PtrStackRegister)
            .bytes(&[register])
            .sized(width, value)
    }

    // ========== Flags and output ==========

    pub fn set_flag(&mut self, flag: u8) -> &mut Self {
        self.opcode(Opcode::SetFlagDirect).bytes(&[flag])
    }

    pub fn set_flag_register(&mut self, register: u8) -> &mut Self {
        self.opcode(Opcode::SetFlagRegister).bytes(&[register])
    }

    pub fn set_flag_stack(&mut self) -> &mut Self {
        self.opcode(Opcode::SetFlagStack)
    }

    pub fn print(&mut self, width: WordSize, count: i32) -> &mut Self {
        self.opcode(Opcode::Print).sized(width, count)
    }

    pub fn print_offset(
        &mut self,
        address_width: WordSize,
        low: i32,
        high: i32,
        count_width: WordSize,
        count: i32,
    ) -> &mut Self {
        self.opcode(Opcode::PrintOffset)
            .width(address_width)
            .value(low, address_width)
            .value(high, address_width)
            .sized(count_width, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::registers::{R16A, R64A};
    use WordSize::{HWord, LWord, Word};

    #[test]
    fn test_encodings() {
        assert_eq!(ProgramBuilder::new().push(Word, 0x1234).build(), vec![0x80, 2, 0x34, 0x12]);
        assert_eq!(ProgramBuilder::new().top(Word, R16A).build(), vec![0x83, 2, R16A]);
        assert_eq!(
            ProgramBuilder::new().jeq(HWord, HWord, Word, 300).build(),
            vec![0x55, 1, 1, 2, 0x2C, 0x01]
        );
        assert_eq!(
            ProgramBuilder::new().load_direct(R64A, 1).build(),
            vec![0x11, R64A, 1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            ProgramBuilder::new().print_offset(HWord, 64, 70, HWord, 3).build(),
            vec![0x7B, 1, 64, 70, 1, 3]
        );
    }

    #[test]
    fn test_push_bytes_encodes_count() {
        assert_eq!(
            ProgramBuilder::new().push_bytes(HWord, Word, &[7, 8]).build(),
            vec![0x85, 1, 2, 2, 0, 7, 8]
        );
    }

    #[test]
    fn test_literals_are_truncated() {
        assert_eq!(ProgramBuilder::new().push(HWord, 0x1FF).build(), vec![0x80, 1, 0xFF]);
        assert_eq!(
            ProgramBuilder::new().push(LWord, -1).build(),
            vec![0x80, 4, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_patch_forward_reference() {
        let mut builder = ProgramBuilder::new();
        builder.jump(Word, 0);
        let at = builder.offset() - 2;
        builder.nop().nop();
        let target = builder.offset() - 1;
        builder.patch(at, target as i32, Word);
        assert_eq!(builder.build(), vec![0x75, 2, 5, 0, 0x95, 0x95]);

        // Out of range patches are ignored
        builder.patch(100, 1, LWord);
        assert_eq!(builder.offset(), 6);
    }
}
