//! Opcode table
//!
//! Every instruction is one opcode byte followed by its operands. The
//! `define_opcodes!` invocation below is the single list of opcodes; it
//! generates the [`Opcode`] enum, `TryFrom<u8>` for decoding, and the
//! mnemonic table used by the disassembler.
//!
//! Each opcode has exactly one byte value. Operand layouts are documented per
//! variant; `w` stands for a width byte and `lit(w)` for a little-endian value
//! of that many bytes.

use std::fmt;

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $byte:literal, $mnemonic:literal
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $byte,
            )*
        }

        impl Opcode {
            /// Every opcode in declaration order
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Assembler mnemonic for this opcode
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = UnknownOpcode;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $byte => Ok(Opcode::$name), )*
                    _ => Err(UnknownOpcode(value)),
                }
            }
        }
    };
}

define_opcodes! {
    // Arithmetic, selected by the flags register
    /// `aW bW` ; pop a (top) and b, push `a op b` at width aW
    ArithmeticStack = 0x00, "arith",
    /// `aReg bReg` ; push `a op b`
    ArithmeticRegister = 0x01, "arithr",
    /// `aReg bReg dstReg` ; dst = a op b
    ArithmeticRegisterRegister = 0x02, "arithrr",

    /// Exit with AbortCalled
    Abort = 0x05, "abort",

    /// `reg` ; reg += 1
    IncReg = 0x0A, "increg",
    /// `w` ; top += 1
    IncStack = 0x0B, "inc",
    /// `reg` ; reg -= 1
    DecReg = 0x0C, "decreg",
    /// `w` ; top -= 1
    DecStack = 0x0D, "dec",

    // Registers
    /// `reg w lit(w)` ; reg = lit, zero-extended
    Load = 0x10, "load",
    /// `reg lit(capacity)` ; literal sized by the register
    LoadDirect = 0x11, "loadd",
    /// `reg valueW addrW addr(addrW)` ; reg = memory[addr..addr+valueW]
    CopyStack = 0x12, "copy",
    /// `w addrReg dstReg` ; dst = stack[sp-w..sp], addrReg holds a register address
    CopyStackRegister = 0x13, "copyr",
    /// `reg` ; zero the register
    Clear = 0x14, "clear",
    /// Exit with Ok
    Halt = 0x15, "halt",

    // Memory
    /// `w count(w)` ; push count zero bytes
    StackAlloc = 0x20, "alloc",
    /// `w count(w)` ; zero count bytes ending at sp
    ZeroMemory = 0x21, "zero",
    /// `addrW addr(addrW) valueW value(valueW)` ; memory[addr] = value
    PtrStack = 0x24, "ptr",
    /// `reg w value(w)` ; memory[reg] = value
    PtrStackRegister = 0x26, "ptrr",

    // Branches
    /// `stackW addrW addr` ; jump if top == 0
    Jez = 0x25, "jez",
    /// `stackW addrW addr` ; jump if top < 0
    Jlz = 0x35, "jlz",
    /// `stackW addrW addr` ; jump if top > 0
    Jgz = 0x45, "jgz",
    /// `aW bW addrW addr` ; jump if the two values below sp are equal
    Jeq = 0x55, "jeq",
    /// `aW bW addrW addr` ; jump if the two values below sp differ
    Jneq = 0x65, "jneq",
    /// `addrW addr` ; unconditional jump
    Jump = 0x75, "jmp",
    /// `w` ; jump to the address on top of the stack
    JumpStack = 0x86, "jmps",
    /// No effect
    Nop = 0x95, "nop",

    // Output and flags
    /// `addrW low high countW count` ; print count bytes starting at low
    PrintOffset = 0x7B, "printo",
    /// `w count(w)` ; print count bytes ending at sp
    Print = 0x7C, "print",
    /// Flags = byte below sp
    SetFlagStack = 0x7D, "flags",
    /// `reg` ; flags = low byte of reg
    SetFlagRegister = 0x7E, "flagr",
    /// `lit(1)` ; flags = lit
    SetFlagDirect = 0x7F, "flag",

    // Stack
    /// `w lit(w)` ; push literal
    PushDirect = 0x80, "push",
    /// `reg` ; push the register's bytes
    PushRegister = 0x81, "pushreg",
    /// `count` ; sp -= count
    Pop = 0x82, "pop",
    /// `w reg` ; reg = top w bytes
    Top = 0x83, "top",
    /// `reg` ; reg = sp as a 4-byte value
    Sp = 0x84, "sp",
    /// `elemW countW count(countW) elements` ; bulk push
    PushBytes = 0x85, "pushb",
}

impl Opcode {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether executing this opcode may move `pc` somewhere other than the
    /// next instruction
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::Jez
                | Opcode::Jlz
                | Opcode::Jgz
                | Opcode::Jeq
                | Opcode::Jneq
                | Opcode::Jump
                | Opcode::JumpStack
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Byte that does not name an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode(pub u8);

impl fmt::Display for UnknownOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown opcode 0x{:02X}", self.0)
    }
}

impl std::error::Error for UnknownOpcode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes_are_unique() {
        for (i, a) in Opcode::ALL.iter().enumerate() {
            for b in &Opcode::ALL[i + 1..] {
                assert_ne!(a.as_byte(), b.as_byte(), "{:?} collides with {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_decode_round_trip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.as_byte()), Ok(*op));
        }
        assert_eq!(Opcode::try_from(0xFF), Err(UnknownOpcode(0xFF)));
    }

    #[test]
    fn test_known_bytes() {
        assert_eq!(Opcode::PushDirect.as_byte(), 0x80);
        assert_eq!(Opcode::Jez.as_byte(), 0x25);
        assert_eq!(Opcode::PtrStackRegister.as_byte(), 0x26);
        assert_eq!(Opcode::Print.mnemonic(), "print");
    }
}
