//! Instruction set of the nibble computer.
//!
//! Every instruction is exactly one byte. The high nibble selects the opcode,
//! the low nibble is the operand (an address or a jump target):
//!
//! ```text
//!   7   4 3   0
//! +------+------+
//! |  op  | arg  |
//! +------+------+
//! ```

use std::convert::TryFrom;
use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::memory::Byte;

/// A four bit value. Only the low nibble of the byte is meaningful.
pub type Nibble = u8;

/// Mask selecting the operand bits of an instruction byte
pub const NIBBLE_MASK: Byte = 0x0F;

/// Largest value an operand can hold
pub const MAX_OPERAND: Nibble = NIBBLE_MASK;

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal => $mnemonic:literal , )+ ) => {
        /// Defines the named opcodes. Opcodes 10 to 13 are unassigned.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            /// The lowercase mnemonic used in assembly source
            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $( Self::$name => $mnemonic , )+
                }
            }

            /// Looks up a mnemonic. Matching is exact, `LDA` is not `lda`.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $( $mnemonic => Some(Self::$name) , )+
                    _ => None,
                }
            }
        }

        impl fmt::Display for Opcode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// No operation
    NOP = 0x0 => "nop",
    /// Load register A from memory
    /// @param address The address to read
    LDA = 0x1 => "lda",
    /// Store register A to memory
    /// @param address The address to write
    STA = 0x2 => "sta",
    /// Load register B from memory
    /// @param address The address to read
    LDB = 0x3 => "ldb",
    /// Store register B to memory
    /// @param address The address to write
    STB = 0x4 => "stb",
    /// B = A + B, sets the zero and carry flags
    ADD = 0x5 => "add",
    /// B = A - B, sets the zero and carry flags
    SUB = 0x6 => "sub",
    /// Jump to an address
    /// @param address The address to jump to
    JMP = 0x7 => "jmp",
    /// Jump if the zero flag is clear
    /// @param address The address to jump to
    JNZ = 0x8 => "jnz",
    /// Jump if the carry flag is clear
    /// @param address The address to jump to
    JNC = 0x9 => "jnc",
    /// Stop the execution of the program
    HLT = 0xE => "hlt",
    /// Prints register A as a decimal number
    OUT = 0xF => "out",
}

impl Opcode {
    /// Combines the opcode with an operand into an instruction byte. Operand
    /// bits above the low nibble are dropped.
    pub fn with_operand(self, operand: Nibble) -> Byte {
        u8::from(self) << 4 | (operand & NIBBLE_MASK)
    }

    /// Whether the operand of this opcode means anything
    pub fn uses_operand(&self) -> bool {
        matches!(
            self,
            Opcode::LDA
                | Opcode::STA
                | Opcode::LDB
                | Opcode::STB
                | Opcode::JMP
                | Opcode::JNZ
                | Opcode::JNC
        )
    }
}

/// Translates a mnemonic into its opcode.
///
/// Unknown mnemonics are not an error: they fall back to [`Opcode::NOP`].
/// Callers which want to be strict should use [`Opcode::from_mnemonic`].
pub fn encode(mnemonic: &str) -> Opcode {
    Opcode::from_mnemonic(mnemonic).unwrap_or(Opcode::NOP)
}

/// Splits an instruction byte into its opcode and operand nibbles
pub fn decode(byte: Byte) -> (Nibble, Nibble) {
    (byte >> 4, byte & NIBBLE_MASK)
}

/// What the processor makes of an opcode nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Known(Opcode),
    /// Opcodes 10 to 13
    Unassigned(Nibble),
}

impl Operation {
    pub fn from_nibble(nibble: Nibble) -> Self {
        match Opcode::try_from(nibble & NIBBLE_MASK) {
            Ok(opcode) => Operation::Known(opcode),
            Err(_) => Operation::Unassigned(nibble & NIBBLE_MASK),
        }
    }

    /// The raw opcode nibble
    pub fn nibble(&self) -> Nibble {
        match self {
            Operation::Known(opcode) => (*opcode).into(),
            Operation::Unassigned(nibble) => *nibble,
        }
    }
}

/// A decoded instruction byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub operation: Operation,
    pub operand: Nibble,
}

impl Instruction {
    pub fn decode(byte: Byte) -> Self {
        let (opcode, operand) = decode(byte);

        Self {
            operation: Operation::from_nibble(opcode),
            operand,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Known(opcode) if opcode.uses_operand() => {
                write!(f, "{} {}", opcode, self.operand)
            }
            Operation::Known(opcode) => write!(f, "{}", opcode),
            Operation::Unassigned(nibble) => write!(f, "??? (0x{:X})", nibble),
        }
    }
}
