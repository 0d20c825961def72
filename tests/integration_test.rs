// End-to-end tests for the bytecode machine

use svm::bytecode::builder::ProgramBuilder;
use svm::bytecode::disasm::disassemble;
use svm::bytecode::flags;
use svm::interpreter::constants::MachineConfig;
use svm::interpreter::engine::Machine;
use svm::interpreter::errors::{HistoryError, ReturnCode};
use svm::interpreter::history::Recording;
use svm::memory::registers::*;
use svm::memory::value::WordSize::{self, HWord, LWord, Word};
use svm::snapshot::OutputSink;

fn run(builder: &ProgramBuilder) -> Machine {
    let mut machine = Machine::default();
    machine.run_program(&builder.build());
    machine
}

#[test]
fn test_add_two_words_into_register() {
    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 8)
        .push(Word, 7)
        .set_flag(flags::INT_ADD)
        .arithmetic_stack(Word, Word)
        .top(Word, R16A);

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.read_register_value(R16A), Ok(15));
    assert_eq!(machine.stack(), &[15, 0]);
}

#[test]
fn test_thousand_increments() {
    let mut builder = ProgramBuilder::new();
    builder.clear(R16A);
    for _ in 0..1000 {
        builder.inc_reg(R16A);
    }

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.read_register_value(R16A), Ok(1000));
}

#[test]
fn test_jez_skips_abort() {
    let mut builder = ProgramBuilder::new();
    builder.push(HWord, 0);
    let jez = builder.offset();
    builder.jez(HWord, HWord, 0).abort();
    let skip = builder.offset();
    builder.nop();
    builder.patch(jez + 3, skip as i32, HWord);

    let mut machine = Machine::default();
    assert_eq!(machine.run_program(&builder.build()), ReturnCode::Ok);
    // Normal termination pushes nothing
    assert_eq!(machine.stack(), &[0]);
}

#[test]
fn test_jez_falls_through_to_abort() {
    let mut builder = ProgramBuilder::new();
    builder.push(HWord, 1).jez(HWord, HWord, 0).abort();

    let mut machine = Machine::default();
    assert_eq!(machine.run_program(&builder.build()), ReturnCode::AbortCalled);
    assert_eq!(machine.stack(), &[1, ReturnCode::AbortCalled.as_byte()]);
}

#[test]
fn test_negative_jump_halts_immediately() {
    let mut builder = ProgramBuilder::new();
    builder.jump(LWord, -1).push(HWord, 9);

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::InvalidJumpAddress));
    // Only the exit code; the push never ran
    assert_eq!(machine.stack(), &[ReturnCode::InvalidJumpAddress.as_byte()]);
}

#[test]
fn test_countdown_loop() {
    // r16a = 5; do { push r16a; r16a -= 1 } while r16a != 0
    let mut builder = ProgramBuilder::new();
    builder.load(R16A, Word, 5);
    let top = builder.offset();
    builder
        .push_register(R16A)
        .dec_reg(R16A)
        .push_register(R16A)
        .jez(Word, Word, 0);
    let exit_jump = builder.offset() - 2;
    builder.pop(2).jump(Word, top as i32);
    let done = builder.offset();
    builder.pop(2);
    builder.patch(exit_jump, done as i32, Word);

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.stack(), &[5, 0, 4, 0, 3, 0, 2, 0, 1, 0]);
}

type PairJump = fn(&mut ProgramBuilder, WordSize, WordSize, WordSize, i32) -> &mut ProgramBuilder;

/// `push a; push b; j* <skip>; abort; skip: nop`
fn pair_branch(jump: PairJump, a: (WordSize, i32), b: (WordSize, i32)) -> ReturnCode {
    let mut builder = ProgramBuilder::new();
    builder.push(a.0, a.1).push(b.0, b.1);
    let at = builder.offset();
    jump(&mut builder, a.0, b.0, HWord, 0).abort();
    let skip = builder.offset();
    builder.nop();
    builder.patch(at + 4, skip as i32, HWord);

    let mut machine = Machine::default();
    machine.run_program(&builder.build())
}

#[test]
fn test_jeq_taken_and_not_taken() {
    assert_eq!(pair_branch(ProgramBuilder::jeq, (Word, 5), (Word, 5)), ReturnCode::Ok);
    assert_eq!(
        pair_branch(ProgramBuilder::jeq, (Word, 5), (Word, 6)),
        ReturnCode::AbortCalled
    );
}

#[test]
fn test_jneq_taken_and_not_taken() {
    assert_eq!(pair_branch(ProgramBuilder::jneq, (Word, 5), (Word, 6)), ReturnCode::Ok);
    assert_eq!(
        pair_branch(ProgramBuilder::jneq, (Word, 5), (Word, 5)),
        ReturnCode::AbortCalled
    );
}

#[test]
fn test_pair_jumps_across_widths() {
    assert_eq!(pair_branch(ProgramBuilder::jeq, (LWord, 7), (HWord, 7)), ReturnCode::Ok);
    // 0xFFFF and 0xFF are both zero-extended, so they differ
    assert_eq!(
        pair_branch(ProgramBuilder::jeq, (Word, -1), (HWord, -1)),
        ReturnCode::AbortCalled
    );
    assert_eq!(pair_branch(ProgramBuilder::jneq, (Word, -1), (HWord, -1)), ReturnCode::Ok);
    // A negative lword never equals a narrow value
    assert_eq!(pair_branch(ProgramBuilder::jneq, (LWord, -1), (Word, -1)), ReturnCode::Ok);
}

#[test]
fn test_pair_jump_target_checked_only_when_taken() {
    let mut builder = ProgramBuilder::new();
    builder
        .push(HWord, 1)
        .push(HWord, 1)
        .jeq(HWord, HWord, Word, 1000)
        .abort();
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::InvalidJumpAddress));
    // Operands are left on the stack
    assert_eq!(machine.stack(), &[1, 1, ReturnCode::InvalidJumpAddress.as_byte()]);

    let mut builder = ProgramBuilder::new();
    builder
        .push(HWord, 1)
        .push(HWord, 1)
        .jneq(HWord, HWord, Word, 1000);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::Ok));
}

#[test]
fn test_pair_jump_needs_both_values() {
    let mut builder = ProgramBuilder::new();
    builder.push(Word, 1).jeq(Word, Word, HWord, 0);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::StackUnderflow));
}

#[test]
fn test_jump_stack_to_program_length_is_invalid() {
    // push hword (3 bytes) + jmps hword (2 bytes)
    let mut builder = ProgramBuilder::new();
    builder.push(HWord, 5).jump_stack(HWord);
    assert_eq!(builder.offset(), 5);

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::InvalidJumpAddress));
    assert_eq!(machine.stack(), &[5, ReturnCode::InvalidJumpAddress.as_byte()]);
}

#[test]
fn test_stack_discipline() {
    let mut builder = ProgramBuilder::new();
    builder
        .push_bytes(HWord, HWord, &[1, 2, 3, 4, 5])
        .pop(5)
        .sp(R32A);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.read_register_value(R32A), Ok(STACK_LOW_ADDRESS as i64));

    let mut builder = ProgramBuilder::new();
    builder.push_bytes(HWord, HWord, &[1, 2, 3]).pop(4);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::StackUnderflow));
}

#[test]
fn test_register_overflow() {
    let mut builder = ProgramBuilder::new();
    builder.push(LWord, 70000).top(LWord, R16A);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::RegisterOverflow));

    let mut builder = ProgramBuilder::new();
    builder.sp(R16A);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::RegisterOverflow));
}

#[test]
fn test_invalid_width_byte() {
    let mut machine = Machine::default();
    // push with a width of 3
    assert_eq!(
        machine.run_program(&[0x80, 3, 1, 2, 3]),
        ReturnCode::InvalidWordSize
    );
}

#[test]
fn test_pointer_writes() {
    let mut builder = ProgramBuilder::new();
    builder
        .stack_alloc(HWord, 4)
        .ptr_stack(HWord, STACK_LOW_ADDRESS as i32 + 2, HWord, 0x55)
        .load(R32A, LWord, STACK_LOW_ADDRESS as i32 + 1)
        .ptr_stack_register(R32A, HWord, 7);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.stack(), &[0, 7, 0x55, 0]);
    assert_eq!(
        machine.read_memory_bytes(STACK_LOW_ADDRESS + 1, STACK_LOW_ADDRESS + 3),
        Ok(vec![7, 0x55])
    );
}

#[test]
fn test_pointer_writes_cannot_touch_registers() {
    for address in [0, FLAGS as i32, STACK_LOW_ADDRESS as i32, -5] {
        let mut builder = ProgramBuilder::new();
        builder.ptr_stack(LWord, address, HWord, 1);
        let machine = run(&builder);
        assert_eq!(
            machine.exit_code(),
            Some(ReturnCode::AccessingProtectedMemory),
            "address {}",
            address
        );
    }
}

#[test]
fn test_register_pointer_cannot_touch_registers() {
    for address in [0, R16C as i32, FLAGS as i32, STACK_LOW_ADDRESS as i32] {
        let mut builder = ProgramBuilder::new();
        builder
            .stack_alloc(HWord, 4)
            .load(R32A, LWord, address)
            .ptr_stack_register(R32A, HWord, 1);
        let machine = run(&builder);
        assert_eq!(
            machine.exit_code(),
            Some(ReturnCode::AccessingProtectedMemory),
            "address {}",
            address
        );
    }
}

#[test]
fn test_copy_from_stack_through_register() {
    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 0x1111)
        .push(Word, 0x2222)
        .load(R32A, LWord, R16B as i32)
        .copy_stack_register(Word, R32A, R16C);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.read_register_value(R16C), Ok(0x2222));

    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 0x2222)
        .load(R32A, LWord, STACK_LOW_ADDRESS as i32)
        .copy_stack_register(Word, R32A, R16C);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::InvalidRegisterAddress));
    assert_eq!(machine.read_register_value(R16C), Ok(0));
}

#[test]
fn test_zero_memory() {
    let mut builder = ProgramBuilder::new();
    builder
        .push_bytes(HWord, HWord, &[1, 2, 3, 4])
        .zero_memory(HWord, 2);
    let machine = run(&builder);
    assert_eq!(machine.stack(), &[1, 2, 0, 0]);
}

#[test]
fn test_memory_limit_is_stack_overflow() {
    let config = MachineConfig {
        memory_size: 128,
        memory_limit: 256,
        ..MachineConfig::default()
    };
    let mut machine = Machine::new(config);

    let mut builder = ProgramBuilder::new();
    builder.stack_alloc(Word, 100);
    assert_eq!(machine.run_program(&builder.build()), ReturnCode::Ok);
    assert_eq!(machine.sp(), STACK_LOW_ADDRESS + 100);

    let mut builder = ProgramBuilder::new();
    builder.stack_alloc(Word, 300);
    assert_eq!(
        machine.run_program(&builder.build()),
        ReturnCode::StackOverflow
    );
}

#[test]
fn test_print_forms() {
    let mut builder = ProgramBuilder::new();
    builder
        .push_bytes(HWord, HWord, &[104, 101, 108, 108, 111])
        .set_flag(flags::PRINT_TEXT)
        .print(HWord, 5)
        .pop(5)
        .push(Word, -300)
        .set_flag(flags::PRINT_NUMBER)
        .print(HWord, 2)
        .pop(2)
        .push(LWord, 1.5f32.to_bits() as i32)
        .push(LWord, 2.25f32.to_bits() as i32)
        .set_flag(flags::FLOAT_ADD)
        .arithmetic_stack(LWord, LWord)
        .print(HWord, 4);

    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.sink().get_output(), &["hello", "-300", "3.75"]);
}

#[test]
fn test_arithmetic_faults() {
    // 5 / 0; the divisor is the value beneath the top
    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 0)
        .push(Word, 5)
        .set_flag(flags::INT_DIV)
        .arithmetic_stack(Word, Word);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::DivisionByZero));

    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 1)
        .push(Word, 1)
        .set_flag(flags::PRINT_TEXT)
        .arithmetic_stack(Word, Word);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::InvalidFlag));

    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 1)
        .push(HWord, 1)
        .arithmetic_stack(HWord, Word);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::InvalidWordSize));

    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 1)
        .push(Word, 1)
        .set_flag(flags::FLOAT_MUL)
        .arithmetic_stack(Word, Word);
    assert_eq!(run(&builder).exit_code(), Some(ReturnCode::InvalidWordSize));
}

#[test]
fn test_halt_stops_early() {
    let mut builder = ProgramBuilder::new();
    builder.push(HWord, 1).halt().push(HWord, 2);
    let machine = run(&builder);
    assert_eq!(machine.exit_code(), Some(ReturnCode::Ok));
    assert_eq!(machine.stack(), &[1, 0]);
}

#[test]
fn test_custom_output_sink() {
    #[derive(Default)]
    struct Collect(Vec<String>);

    impl OutputSink for Collect {
        fn write_line(&mut self, line: &str) {
            self.0.push(line.to_uppercase());
        }
    }

    let mut builder = ProgramBuilder::new();
    builder
        .push_bytes(HWord, HWord, &[111, 107])
        .set_flag(flags::PRINT_CHARS)
        .print(HWord, 2);

    let mut machine = Machine::with_sink(MachineConfig::default(), Collect::default());
    assert_eq!(machine.run_program(&builder.build()), ReturnCode::Ok);
    assert_eq!(machine.into_sink().0, vec!["OK".to_string()]);
}

#[test]
fn test_return_codes_are_stable() {
    for (i, code) in ReturnCode::ALL.iter().enumerate() {
        assert_eq!(code.as_byte() as usize, i);
        assert_eq!(ReturnCode::from_byte(code.as_byte()), Some(*code));
        assert!(!code.to_string().is_empty());
    }
    assert_eq!(ReturnCode::from_byte(200), None);
}

#[test]
fn test_recording_of_endless_loop_is_truncated() {
    let mut builder = ProgramBuilder::new();
    builder.nop().jump(HWord, 0);

    let mut recording = Recording::capture(MachineConfig::default(), &builder.build(), 64 * 1024);
    assert_eq!(recording.exit_code(), None);
    assert!(matches!(
        recording.truncated(),
        Some(HistoryError::SnapshotLimitExceeded { .. })
    ));
    assert!(recording.total_snapshots() > 10);
    assert!(recording.memory_usage() <= recording.memory_limit());

    recording.jump_to_end().unwrap();
    assert!(recording.current().unwrap().pc <= 1);
}

#[test]
fn test_disassembly_covers_program() {
    let mut builder = ProgramBuilder::new();
    builder
        .push(Word, 8)
        .push(Word, 7)
        .set_flag(flags::INT_ADD)
        .arithmetic_stack(Word, Word)
        .top(Word, R16A);
    let program = builder.build();

    let listing = disassemble(&program);
    assert!(listing.error.is_none());
    let lines: Vec<String> = listing.instructions.iter().map(|i| i.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "0000  push word 8",
            "0004  push word 7",
            "0008  flag 0x00",
            "000A  arith word word",
            "000D  top word r16a",
        ]
    );
}
