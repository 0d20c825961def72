// Execution engine for the virtual machine

use crate::bytecode::opcode::Opcode;
use crate::interpreter::constants::MachineConfig;
use crate::interpreter::errors::ReturnCode;
use crate::memory::registers::{register_capacity, HIGH_ADDRESS, STACK_LOW_ADDRESS};
use crate::memory::value::{to_int, WordSize};
use crate::memory::{FlatMemory, ScratchPool};
use crate::snapshot::{OutputSink, Terminal};
use std::ops::Range;
use tracing::{debug, trace, warn};

/// A register machine executing one bytecode program at a time
///
/// The machine exclusively owns its memory, scratch pool and output sink.
/// A program runs to completion inside [`Machine::run_program`] or one
/// instruction at a time through [`Machine::step`].
#[derive(Debug)]
pub struct Machine<S: OutputSink = Terminal> {
    /// Registers and stack
    pub(crate) memory: FlatMemory,

    /// Staging buffers for operands and results
    pub(crate) scratch: ScratchPool,

    /// Loaded program; independent of `memory`
    pub(crate) program: Vec<u8>,

    /// Offset of the next opcode in `program`
    pub(crate) pc: usize,

    /// First free stack byte
    pub(crate) sp: usize,

    pub(crate) running: bool,

    /// Set once the machine halts
    pub(crate) exit_code: Option<ReturnCode>,

    /// Offset and opcode of the most recently dispatched instruction
    pub(crate) last_instruction: Option<(usize, Opcode)>,

    /// Receives `Print` output
    pub(crate) sink: S,

    config: MachineConfig,
}

impl Machine<Terminal> {
    /// Create a machine that captures output in a [`Terminal`]
    pub fn new(config: MachineConfig) -> Self {
        Self::with_sink(config, Terminal::new())
    }
}

impl Default for Machine<Terminal> {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl<S: OutputSink> Machine<S> {
    pub fn with_sink(config: MachineConfig, sink: S) -> Self {
        Machine {
            memory: FlatMemory::new(Self::initial_memory_size(&config), config.memory_limit),
            scratch: ScratchPool::new(config.scratch_size),
            program: Vec::new(),
            pc: 0,
            sp: STACK_LOW_ADDRESS,
            running: false,
            exit_code: None,
            last_instruction: None,
            sink,
            config,
        }
    }

    /// Memory must at least hold the register file and one stack byte
    fn initial_memory_size(config: &MachineConfig) -> usize {
        config.memory_size.max(STACK_LOW_ADDRESS + 1)
    }

    /// Reset to the power-on state: zeroed memory and scratch, empty program
    pub fn initialize(&mut self) {
        let size = Self::initial_memory_size(&self.config);
        if self.memory.len() != size {
            if let Err(e) = self.memory.resize(size) {
                warn!(error = %e, size, "failed to restore initial memory size");
            }
        }
        self.memory.clear();
        self.scratch.clear();
        self.program.clear();
        self.pc = 0;
        self.sp = STACK_LOW_ADDRESS;
        self.running = false;
        self.exit_code = None;
        self.last_instruction = None;
    }

    /// Initialize and load `program`, ready for [`step`](Self::step)
    pub fn load(&mut self, program: &[u8]) {
        self.initialize();
        self.program.extend_from_slice(program);
        self.running = true;
        if self.program.is_empty() {
            self.finish();
        }
    }

    /// Run `program` from a fresh state until it halts
    pub fn run_program(&mut self, program: &[u8]) -> ReturnCode {
        self.load(program);
        debug!(len = program.len(), "starting program");

        let mut steps: u64 = 0;
        while self.step() {
            steps += 1;
        }

        let code = self.exit_code.unwrap_or(ReturnCode::Ok);
        debug!(steps, code = code.name(), sp = self.sp, "program finished");
        code
    }

    /// Execute one instruction. Returns whether the machine is still running.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        if let Err(code) = self.execute_next() {
            warn!(
                pc = self.pc,
                instruction = ?self.last_instruction,
                code = code.name(),
                "{}",
                code
            );
            self.exit(code);
        }

        if self.running && self.pc >= self.program.len() {
            self.finish();
        }
        self.running
    }

    /// Halt with `code`, writing it to the top of the stack
    pub(crate) fn exit(&mut self, code: ReturnCode) {
        self.running = false;
        self.exit_code = Some(code);

        let written = self
            .memory
            .reserve(1, self.sp)
            .and_then(|_| self.memory.write_byte(self.sp, code.as_byte()));
        match written {
            Ok(()) => self.sp += 1,
            Err(e) => warn!(error = %e, "could not write exit code to the stack"),
        }
    }

    /// Halt after running off the end of the program
    fn finish(&mut self) {
        self.running = false;
        if self.exit_code.is_none() {
            self.exit_code = Some(ReturnCode::Ok);
        }
    }

    fn execute_next(&mut self) -> Result<(), ReturnCode> {
        let offset = self.pc;
        let byte = self.next_byte()?;
        let opcode = Opcode::try_from(byte).map_err(|_| ReturnCode::ProgramCounterCorrupted)?;
        self.last_instruction = Some((offset, opcode));
        trace!(offset, %opcode, sp = self.sp, "dispatch");
        self.dispatch(opcode)
    }

    fn dispatch(&mut self, opcode: Opcode) -> Result<(), ReturnCode> {
        match opcode {
            // Stack
            Opcode::PushDirect => self.push_direct(),
            Opcode::PushRegister => self.push_register(),
            Opcode::Pop => self.pop(),
            Opcode::Top => self.top(),
            Opcode::Sp => self.store_sp(),
            Opcode::PushBytes => self.push_bytes(),
            Opcode::IncStack => self.inc_stack(),
            Opcode::DecStack => self.dec_stack(),
            Opcode::ArithmeticStack => self.arithmetic_stack(),

            // Registers
            Opcode::Load => self.load_register(),
            Opcode::LoadDirect => self.load_direct(),
            Opcode::CopyStack => self.copy_stack(),
            Opcode::CopyStackRegister => self.copy_stack_register(),
            Opcode::Clear => self.clear_register(),
            Opcode::IncReg => self.inc_reg(),
            Opcode::DecReg => self.dec_reg(),
            Opcode::ArithmeticRegister => self.arithmetic_register(),
            Opcode::ArithmeticRegisterRegister => self.arithmetic_register_register(),

            // Flow
            Opcode::Abort => {
                self.exit(ReturnCode::AbortCalled);
                Ok(())
            }
            Opcode::Halt => {
                self.exit(ReturnCode::Ok);
                Ok(())
            }
            Opcode::Nop => Ok(()),
            Opcode::Jez => self.jump_if_top(|v| v == 0),
            Opcode::Jlz => self.jump_if_top(|v| v < 0),
            Opcode::Jgz => self.jump_if_top(|v| v > 0),
            Opcode::Jeq => self.jump_if_pair(|a, b| a == b),
            Opcode::Jneq => self.jump_if_pair(|a, b| a != b),
            Opcode::Jump => self.jump(),
            Opcode::JumpStack => self.jump_stack(),

            // Memory
            Opcode::StackAlloc => self.stack_alloc(),
            Opcode::ZeroMemory => self.zero_memory(),
            Opcode::PtrStack => self.ptr_stack(),
            Opcode::PtrStackRegister => self.ptr_stack_register(),

            // Flags and output
            Opcode::SetFlagDirect => self.set_flag_direct(),
            Opcode::SetFlagRegister => self.set_flag_register(),
            Opcode::SetFlagStack => self.set_flag_stack(),
            Opcode::Print => self.print(),
            Opcode::PrintOffset => self.print_offset(),
        }
    }

    // ========== Operand fetch ==========

    /// Consume `count` program bytes, returning their range in `program`
    pub(crate) fn operand(&mut self, count: usize) -> Result<Range<usize>, ReturnCode> {
        let start = self.pc;
        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.program.len())
            .ok_or(ReturnCode::ProgramCounterCorrupted)?;
        self.pc = end;
        Ok(start..end)
    }

    pub(crate) fn next_byte(&mut self) -> Result<u8, ReturnCode> {
        let byte = *self
            .program
            .get(self.pc)
            .ok_or(ReturnCode::ProgramCounterCorrupted)?;
        self.pc += 1;
        Ok(byte)
    }

    /// Read and validate a width byte
    pub(crate) fn next_width(&mut self) -> Result<WordSize, ReturnCode> {
        WordSize::validate(self.next_byte()?)
    }

    /// Read a little-endian value of `width` bytes
    pub(crate) fn next_value(&mut self, width: WordSize) -> Result<i32, ReturnCode> {
        let range = self.operand(width.bytes())?;
        to_int(&self.program[range])
    }

    /// Read a width byte followed by a non-negative value of that width.
    ///
    /// A negative value is reported as `negative`.
    pub(crate) fn next_sized_count(&mut self, negative: ReturnCode) -> Result<usize, ReturnCode> {
        let width = self.next_width()?;
        let value = self.next_value(width)?;
        usize::try_from(value).map_err(|_| negative)
    }

    /// Read a register address, returning it with its capacity
    pub(crate) fn next_register(&mut self) -> Result<(u8, usize), ReturnCode> {
        let address = self.next_byte()?;
        match register_capacity(address) {
            0 => Err(ReturnCode::InvalidRegisterAddress),
            capacity => Ok((address, capacity as usize)),
        }
    }

    // ========== Public surface ==========

    /// Current value of the register at `address`.
    ///
    /// 1- and 2-byte registers are zero-extended, 4-byte registers are read as
    /// `i32` and 8-byte registers as `i64`.
    pub fn read_register_value(&self, address: u8) -> Result<i64, ReturnCode> {
        let capacity = register_capacity(address) as usize;
        if capacity == 0 {
            return Err(ReturnCode::InvalidRegisterAddress);
        }
        let low = address as usize;
        let bytes = self.memory.slice(low, low + capacity)?;
        match *bytes {
            [b0, b1, b2, b3, b4, b5, b6, b7] => {
                Ok(i64::from_le_bytes([b0, b1, b2, b3, b4, b5, b6, b7]))
            }
            _ => Ok(to_int(bytes)? as i64),
        }
    }

    /// Copy of memory `[low, high)`
    pub fn read_memory_bytes(&self, low: usize, high: usize) -> Result<Vec<u8>, ReturnCode> {
        Ok(self.memory.read_bytes(low, high)?)
    }

    /// Copy of the live stack, from the stack low address up to `sp`
    pub fn dump_stack(&self) -> Vec<u8> {
        self.stack().to_vec()
    }

    /// Copy of the register file
    pub fn dump_registers(&self) -> Vec<u8> {
        self.registers().to_vec()
    }

    /// Copy of the loaded program
    pub fn dump_program(&self) -> Vec<u8> {
        self.program.clone()
    }

    // ========== Getter methods for UI and tests ==========

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Return code once halted, `None` while running or before a load
    pub fn exit_code(&self) -> Option<ReturnCode> {
        self.exit_code
    }

    pub fn last_instruction(&self) -> Option<(usize, Opcode)> {
        self.last_instruction
    }

    /// Register file bytes
    pub fn registers(&self) -> &[u8] {
        self.memory
            .slice(0, HIGH_ADDRESS as usize + 1)
            .unwrap_or_default()
    }

    /// Live stack bytes
    pub fn stack(&self) -> &[u8] {
        self.memory
            .slice(STACK_LOW_ADDRESS, self.sp)
            .unwrap_or_default()
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
