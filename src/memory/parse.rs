//! Assembler for the nibble computer. Each line holds one instruction, a
//! mnemonic followed by a decimal operand:
//!
//! ```text
//! lda 5
//! ldb 6
//! add 0
//! out 0
//! hlt 0
//! ```

use std::borrow::Cow;
use std::error;
use std::str::FromStr;
use std::{fmt, str::Lines};

use crate::isa::{self, Nibble, Opcode, MAX_OPERAND};

use super::{Byte, Memory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumber,
    MissingOperand,
    OperandOutOfRange { value: i64 },
    UnexpectedToken,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNumber => f.write_str("failed to parse decimal number"),
            ParseErrorKind::MissingOperand => f.write_str("missing operand"),
            ParseErrorKind::OperandOutOfRange { value } => write!(
                f,
                "operand `{}` is not between 0 and {}",
                value, MAX_OPERAND
            ),
            ParseErrorKind::UnexpectedToken => f.write_str("unexpected token"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Line of the source the error occurred on, starting at 1
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    cursor: usize,
    memory: Memory,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data` which will try to populate `memory`
    /// starting at address 0.
    pub fn new(data: &'a str, memory: Memory) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            cursor: 0,
            memory,
        }
    }

    /// Consumes `self` and tries to parse `data` into memory. Once memory is
    /// full the remaining lines are discarded without being parsed.
    ///
    /// # Errors
    ///
    /// Parsing stops at the first malformed line.
    pub fn parse(mut self) -> Result<Memory> {
        while self.cursor < self.memory.len() {
            let line = match self.lines.next() {
                Some(line) => line,
                None => break,
            };
            self.line_nr += 1;

            if let Err(err) = self.parse_line(line) {
                log::error!("{}", err);
                return Err(err);
            }
        }

        let discarded = self.lines.filter(|line| !line.trim().is_empty()).count();
        if discarded > 0 {
            log::debug!(
                "Memory is full, discarded {} line(s) after line {}",
                discarded,
                self.line_nr
            );
        }

        Ok(self.memory)
    }

    /// Tries to parse a line as an instruction. Blank lines are skipped and
    /// do not take up an address.
    ///
    /// # Examples
    ///
    /// - `lda 5`
    /// - `hlt 0`
    fn parse_line(&mut self, line: &str) -> Result<()> {
        let mut tokens = line.split_whitespace();

        let mnemonic = match tokens.next() {
            Some(mnemonic) => mnemonic,
            None => return Ok(()),
        };
        let operand = tokens.next().ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::MissingOperand,
                format!("`{}` needs an operand", mnemonic),
                self.line_nr,
            )
        })?;
        if let Some(token) = tokens.next() {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                format!("`{}` after the operand", token),
                self.line_nr,
            ));
        }

        let opcode = self.parse_mnemonic(mnemonic);
        let operand = self.parse_operand(operand)?;

        if !opcode.uses_operand() && operand != 0 {
            log::warn!(
                "[{}] Operand `{}` is ignored by {}",
                self.line_nr,
                operand,
                opcode
            );
        }

        let byte = opcode.with_operand(operand);
        log::debug!(
            "[{}] Found instruction {} {} => 0x{:02X}",
            self.line_nr,
            opcode,
            operand,
            byte
        );

        self.write_byte(byte);

        Ok(())
    }

    /// Resolves a mnemonic, falling back to NOP for unknown ones.
    fn parse_mnemonic(&self, mnemonic: &str) -> Opcode {
        if Opcode::from_mnemonic(mnemonic).is_none() {
            log::warn!(
                "[{}] Unknown mnemonic `{}`, assembling as NOP",
                self.line_nr,
                mnemonic
            );
        }

        isa::encode(mnemonic)
    }

    /// Parses a decimal operand, which has to fit into a nibble.
    fn parse_operand(&self, operand: &str) -> Result<Nibble> {
        let value = operand.parse::<i64>().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber,
                format!("`{}` is not a decimal number", operand),
                self.line_nr,
            )
        })?;

        if !(0..=i64::from(MAX_OPERAND)).contains(&value) {
            return Err(ParseError::new(
                ParseErrorKind::OperandOutOfRange { value },
                format!("`{}` does not fit into four bits", operand),
                self.line_nr,
            ));
        }

        Ok(value as Nibble)
    }

    /// Writes `byte` into memory at [`Parser::cursor`]. Then it increments
    /// the cursor by one. [`Parser::parse`] stops before the cursor leaves
    /// memory.
    fn write_byte(&mut self, byte: Byte) {
        self.memory.data[self.cursor] = byte;
        self.cursor += 1;
    }
}

impl FromStr for Memory {
    type Err = ParseError;

    /// Assembles `s` into [`crate::memory::DEFAULT_MEMORY_SIZE`] bytes of memory
    fn from_str(s: &str) -> Result<Self> {
        Parser::new(s, Memory::default()).parse()
    }
}
