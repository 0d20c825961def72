//! Unary byte arithmetic

use crate::interpreter::errors::ReturnCode;
use crate::interpreter::ops::binary::{add_bytes, subtract_bytes};
use crate::memory::value::{to_signed, write_int, WordSize};

const ONE_HWORD: [u8; 1] = [1];
const ONE_WORD: [u8; 2] = [1, 0];
const ONE_LWORD: [u8; 4] = [1, 0, 0, 0];

/// Canonical encoding of 1 at `width`
pub fn one_literal(width: WordSize) -> &'static [u8] {
    match width {
        WordSize::HWord => &ONE_HWORD,
        WordSize::Word => &ONE_WORD,
        WordSize::LWord => &ONE_LWORD,
    }
}

/// Two's-complement negation at the width of `bytes`
pub fn negate_bytes(bytes: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    if bytes.len() != out.len() {
        return Err(ReturnCode::InvalidWordSize);
    }
    write_int(to_signed(bytes)?.wrapping_neg(), out)
}

/// `bytes + 1` into `out`, wrapping at the width
pub fn increment_bytes(bytes: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    let one = one_literal(WordSize::from_len(bytes.len())?);
    add_bytes(bytes, one, out)
}

/// `bytes - 1` into `out`, wrapping at the width
pub fn decrement_bytes(bytes: &[u8], out: &mut [u8]) -> Result<(), ReturnCode> {
    let one = one_literal(WordSize::from_len(bytes.len())?);
    subtract_bytes(bytes, one, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_literal() {
        assert_eq!(one_literal(WordSize::HWord), &[1]);
        assert_eq!(one_literal(WordSize::LWord), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_negate() {
        let mut out = [0u8; 2];
        negate_bytes(&[5, 0], &mut out).unwrap();
        assert_eq!(out, [0xFB, 0xFF]);
        negate_bytes(&[0, 0], &mut out).unwrap();
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn test_increment_and_decrement_wrap() {
        let mut out = [0u8; 1];
        increment_bytes(&[0xFF], &mut out).unwrap();
        assert_eq!(out, [0]);
        decrement_bytes(&[0], &mut out).unwrap();
        assert_eq!(out, [0xFF]);

        let mut word = [0u8; 2];
        increment_bytes(&[0xFF, 0x00], &mut word).unwrap();
        assert_eq!(word, [0x00, 0x01]);
        decrement_bytes(&[0x00, 0x01], &mut word).unwrap();
        assert_eq!(word, [0xFF, 0x00]);
    }

    #[test]
    fn test_lword_carry_and_borrow() {
        let mut out = [0u8; 4];
        increment_bytes(&[0xFF, 0xFF, 0xFF, 0x7F], &mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0x80]);
        decrement_bytes(&[0, 0, 0, 0], &mut out).unwrap();
        assert_eq!(out, [0xFF; 4]);
    }

    #[test]
    fn test_eight_byte_increment_is_rejected() {
        let mut out = [0u8; 8];
        assert_eq!(
            increment_bytes(&[0u8; 8], &mut out),
            Err(ReturnCode::InvalidWordSize)
        );
    }

    #[test]
    fn test_mismatched_output_is_rejected() {
        let mut out = [0u8; 2];
        assert_eq!(
            decrement_bytes(&[1], &mut out),
            Err(ReturnCode::InvalidWordSize)
        );
    }
}
