use proptest::prelude::*;
use svm::bytecode::builder::ProgramBuilder;
use svm::bytecode::flags;
use svm::interpreter::engine::Machine;
use svm::interpreter::errors::ReturnCode;
use svm::interpreter::ops::binary::{add_bytes, divide_bytes, multiply_bytes, subtract_bytes};
use svm::memory::registers::register_capacity;
use svm::memory::value::{to_bytes, to_int, to_signed, WordSize};

fn word(value: i32) -> Vec<u8> {
    to_bytes(value, 4).unwrap()
}

proptest! {
    #[test]
    fn int_round_trip(n in any::<i32>()) {
        prop_assert_eq!(to_int(&word(n)), Ok(n));
    }

    #[test]
    fn narrow_round_trip(n in any::<u16>()) {
        prop_assert_eq!(to_int(&to_bytes(n as i32, 2).unwrap()), Ok(n as i32));
        prop_assert_eq!(to_signed(&to_bytes(n as i32, 2).unwrap()), Ok(n as i16 as i32));
    }

    #[test]
    fn add_wraps_at_four_bytes(a in any::<i32>(), b in any::<i32>()) {
        let mut out = [0u8; 4];
        add_bytes(&word(a), &word(b), &mut out).unwrap();
        let expected = ((a as u32 as u64 + b as u32 as u64) % (1u64 << 32)) as u32 as i32;
        prop_assert_eq!(to_int(&out), Ok(expected));
    }

    #[test]
    fn add_wraps_at_one_byte(a in any::<u8>(), b in any::<u8>()) {
        let mut out = [0u8; 1];
        add_bytes(&[a], &[b], &mut out).unwrap();
        prop_assert_eq!(out[0], a.wrapping_add(b));
    }

    #[test]
    fn subtract_inverts_add(a in any::<i32>(), b in any::<i32>()) {
        let mut sum = [0u8; 4];
        let mut back = [0u8; 4];
        add_bytes(&word(a), &word(b), &mut sum).unwrap();
        subtract_bytes(&sum, &word(b), &mut back).unwrap();
        prop_assert_eq!(to_int(&back), Ok(a));
    }

    #[test]
    fn multiply_wraps(a in any::<i16>(), b in any::<i16>()) {
        let mut out = [0u8; 2];
        let (a_bytes, b_bytes) = (a.to_le_bytes(), b.to_le_bytes());
        multiply_bytes(&a_bytes, &b_bytes, &mut out).unwrap();
        prop_assert_eq!(i16::from_le_bytes(out), a.wrapping_mul(b));
    }

    #[test]
    fn divide_truncates_toward_zero(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        let mut out = [0u8; 4];
        divide_bytes(&word(a), &word(b), &mut out).unwrap();
        prop_assert_eq!(to_int(&out), Ok(a.wrapping_div(b)));
    }

    #[test]
    fn push_then_pop_restores_sp(values in proptest::collection::vec(any::<u8>(), 1..200)) {
        let elements: Vec<i32> = values.iter().map(|v| *v as i32).collect();
        let program = ProgramBuilder::new()
            .push_bytes(WordSize::HWord, WordSize::HWord, &elements)
            .pop(values.len() as u8)
            .build();

        let mut machine = Machine::default();
        prop_assert_eq!(machine.run_program(&program), ReturnCode::Ok);
        prop_assert!(machine.stack().is_empty());
    }

    #[test]
    fn register_capacity_is_a_known_size(address in any::<u8>()) {
        prop_assert!([0u8, 1, 2, 4, 8].contains(&register_capacity(address)));
    }
}

#[test]
fn test_eight_byte_operands_rejected() {
    let mut out = [0u8; 8];
    assert_eq!(
        add_bytes(&[0; 8], &[0; 8], &mut out),
        Err(ReturnCode::InvalidWordSize)
    );
}

#[test]
fn test_sum_past_four_bytes() {
    let mut out = [0u8; 4];
    add_bytes(&word(-1), &word(2), &mut out).unwrap();
    assert_eq!(to_int(&out), Ok(1));
}

#[test]
fn test_stack_arithmetic_on_each_width() {
    for (width, a, b, expected) in [
        (WordSize::HWord, 200, 100, 44),
        (WordSize::Word, 0xFFFF, 2, 1),
        (WordSize::LWord, i32::MAX, 1, i32::MIN),
    ] {
        let program = ProgramBuilder::new()
            .push(width, b)
            .push(width, a)
            .set_flag(flags::INT_ADD)
            .arithmetic_stack(width, width)
            .build();
        let mut machine = Machine::default();
        assert_eq!(machine.run_program(&program), ReturnCode::Ok);
        assert_eq!(to_int(machine.stack()), Ok(expected), "{:?}", width);
    }
}
