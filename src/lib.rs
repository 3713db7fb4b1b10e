//! Assembler and simulator for a tiny 8-bit computer.
//!
//! Programs are assembled into a memory image with [`assemble`] and executed
//! with [`run`]:
//!
//! ```
//! let image = nibble::assemble("lda 5\nldb 6\nadd 0\nout 0\nhlt 0", 16).unwrap();
//! let run = nibble::run(image, nibble::processor::DEFAULT_MAX_STEPS).unwrap();
//! assert_eq!(run.output, vec![0]);
//! ```

use std::error;
use std::fmt;

pub mod alu;
pub mod isa;
pub mod logging;
pub mod memory;
pub mod processor;

use memory::parse::{ParseError, Parser};
use memory::{Memory, MemoryError};
use processor::{ExecError, Processor, Run};

/// Any error the assembler or the simulator can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Memory(MemoryError),
    Parse(ParseError),
    Exec(ExecError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Memory(err) => fmt::Display::fmt(err, f),
            Error::Parse(err) => fmt::Display::fmt(err, f),
            Error::Exec(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl error::Error for Error {}

impl From<MemoryError> for Error {
    fn from(err: MemoryError) -> Self {
        Error::Memory(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<ExecError> for Error {
    fn from(err: ExecError) -> Self {
        Error::Exec(err)
    }
}

/// Assembles `source` into `memory_size` bytes of memory.
///
/// # Errors
///
/// Fails on an invalid memory size or the first malformed line. Unknown
/// mnemonics are not an error, they are assembled as NOP.
pub fn assemble(source: &str, memory_size: usize) -> Result<Memory, Error> {
    let memory = Memory::new(memory_size)?;

    Ok(Parser::new(source, memory).parse()?)
}

/// Runs `image` on a fresh processor for at most `max_steps` steps.
pub fn run(image: Memory, max_steps: usize) -> Result<Run, ExecError> {
    Processor::new().run(image, max_steps)
}
