//! Register file layout
//!
//! Registers are not separate storage: each one is a fixed window over the low
//! addresses of [`FlatMemory`](super::flat::FlatMemory). The table below is a
//! bit-exact contract with whatever produces the bytecode; a producer using
//! different addresses silently corrupts memory.
//!
//! ```text
//! 0..4    R8A  R8B  R8C  R8D     1 byte each
//! 4..12   R16A R16B R16C R16D    2 bytes each
//! 12..28  R32A R32B R32C R32D    4 bytes each
//! 28..60  R64A R64B R64C R64D    8 bytes each
//! 60..64  FLAGS                  4 bytes, low byte significant
//! 64..    stack
//! ```

/// Lowest register address
pub const LOW_ADDRESS: u8 = 0;

/// Highest byte owned by the register file
pub const HIGH_ADDRESS: u8 = 63;

/// First stack byte; the stack pointer never drops below it
pub const STACK_LOW_ADDRESS: usize = HIGH_ADDRESS as usize + 1;

pub const R8A: u8 = 0;
pub const R8B: u8 = 1;
pub const R8C: u8 = 2;
pub const R8D: u8 = 3;

pub const R16A: u8 = 4;
pub const R16B: u8 = 6;
pub const R16C: u8 = 8;
pub const R16D: u8 = 10;

pub const R32A: u8 = 12;
pub const R32B: u8 = 16;
pub const R32C: u8 = 20;
pub const R32D: u8 = 24;

pub const R64A: u8 = 28;
pub const R64B: u8 = 36;
pub const R64C: u8 = 44;
pub const R64D: u8 = 52;

pub const FLAGS: u8 = 60;

/// Every register in address order, with its assembler name
pub const REGISTERS: [(u8, &str); 17] = [
    (R8A, "r8a"),
    (R8B, "r8b"),
    (R8C, "r8c"),
    (R8D, "r8d"),
    (R16A, "r16a"),
    (R16B, "r16b"),
    (R16C, "r16c"),
    (R16D, "r16d"),
    (R32A, "r32a"),
    (R32B, "r32b"),
    (R32C, "r32c"),
    (R32D, "r32d"),
    (R64A, "r64a"),
    (R64B, "r64b"),
    (R64C, "r64c"),
    (R64D, "r64d"),
    (FLAGS, "flags"),
];

/// Capacity in bytes of the register starting at `address`.
///
/// Returns 0 for any byte that is not a register's start address.
#[inline]
pub fn register_capacity(address: u8) -> u8 {
    match address {
        R8A | R8B | R8C | R8D => 1,
        R16A | R16B | R16C | R16D => 2,
        R32A | R32B | R32C | R32D => 4,
        R64A | R64B | R64C | R64D => 8,
        FLAGS => 4,
        _ => 0,
    }
}

/// Whether `address` names a register
#[inline]
pub fn is_register(address: u8) -> bool {
    register_capacity(address) != 0
}

/// Assembler name of the register at `address`
pub fn register_name(address: u8) -> Option<&'static str> {
    REGISTERS
        .iter()
        .find(|(addr, _)| *addr == address)
        .map(|(_, name)| *name)
}

/// Memory window `[low, high)` of the register at `address`
pub fn register_window(address: u8) -> Option<(usize, usize)> {
    match register_capacity(address) {
        0 => None,
        capacity => {
            let low = address as usize;
            Some((low, low + capacity as usize))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_drawn_from_fixed_set() {
        for address in 0..=u8::MAX {
            let capacity = register_capacity(address);
            assert!(
                [0, 1, 2, 4, 8].contains(&capacity),
                "address {} has capacity {}",
                address,
                capacity
            );
        }
        assert_eq!(register_capacity(FLAGS), 4);
        assert_eq!(register_capacity(R64D), 8);
    }

    #[test]
    fn test_non_start_addresses_are_invalid() {
        assert_eq!(register_capacity(5), 0); // inside R16A
        assert_eq!(register_capacity(13), 0); // inside R32A
        assert_eq!(register_capacity(HIGH_ADDRESS), 0);
        assert_eq!(register_capacity(STACK_LOW_ADDRESS as u8), 0);
    }

    #[test]
    fn test_windows_do_not_overlap_or_reach_the_stack() {
        let mut windows: Vec<(usize, usize)> = REGISTERS
            .iter()
            .filter_map(|(addr, _)| register_window(*addr))
            .collect();
        windows.sort();

        for pair in windows.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        let last = windows.last().unwrap();
        assert_eq!(last.1, STACK_LOW_ADDRESS);
    }

    #[test]
    fn test_register_names() {
        assert_eq!(register_name(R16A), Some("r16a"));
        assert_eq!(register_name(FLAGS), Some("flags"));
        assert_eq!(register_name(5), None);
    }
}
