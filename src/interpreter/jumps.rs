use crate::interpreter::engine::Machine;
use crate::interpreter::errors::ReturnCode;
use crate::interpreter::memory_ops::top_of_stack;
use crate::memory::value::to_int;
use crate::snapshot::OutputSink;

impl<S: OutputSink> Machine<S> {
    /// Move `pc` to `target`, which must lie inside the program
    fn jump_to(&mut self, target: i32) -> Result<(), ReturnCode> {
        let target = usize::try_from(target)
            .ok()
            .filter(|target| *target < self.program.len())
            .ok_or(ReturnCode::InvalidJumpAddress)?;
        self.pc = target;
        Ok(())
    }

    /// `jez|jlz|jgz stackW addrW addr`; test the top value without popping it
    ///
    /// Values narrower than 4 bytes are zero-extended, so only an `lword` can
    /// be negative.
    pub(crate) fn jump_if_top(&mut self, condition: fn(i32) -> bool) -> Result<(), ReturnCode> {
        let stack_width = self.next_width()?;
        let address_width = self.next_width()?;
        let target = self.next_value(address_width)?;

        let low = top_of_stack(self.sp, stack_width.bytes())?;
        let value = to_int(self.memory.slice(low, self.sp)?)?;
        if condition(value) {
            self.jump_to(target)?;
        }
        Ok(())
    }

    /// `jeq|jneq aW bW addrW addr`; b is the top value, a the one beneath it
    pub(crate) fn jump_if_pair(&mut self, condition: fn(i32, i32) -> bool) -> Result<(), ReturnCode> {
        let a_width = self.next_width()?;
        let b_width = self.next_width()?;
        let address_width = self.next_width()?;
        let target = self.next_value(address_width)?;

        let b_low = top_of_stack(self.sp, b_width.bytes())?;
        let a_low = top_of_stack(b_low, a_width.bytes())?;
        let a = to_int(self.memory.slice(a_low, b_low)?)?;
        let b = to_int(self.memory.slice(b_low, self.sp)?)?;
        if condition(a, b) {
            self.jump_to(target)?;
        }
        Ok(())
    }

    /// `jmp addrW addr`
    pub(crate) fn jump(&mut self) -> Result<(), ReturnCode> {
        let address_width = self.next_width()?;
        let target = self.next_value(address_width)?;
        self.jump_to(target)
    }

    /// `jmps w`; jump to the address on top of the stack
    pub(crate) fn jump_stack(&mut self) -> Result<(), ReturnCode> {
        let width = self.next_width()?;
        let low = top_of_stack(self.sp, width.bytes())?;
        let target = to_int(self.memory.slice(low, self.sp)?)?;
        self.jump_to(target)
    }
}
