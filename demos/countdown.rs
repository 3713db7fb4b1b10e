use std::fs;

use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use nibble::memory::DEFAULT_MEMORY_SIZE;
use nibble::processor::{Processor, Step};
use simple_logger::SimpleLogger;

/// Counts from 3 down to 0, the counter lives at address 14
const PROGRAM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/programs/countdown.asm");

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    let source =
        fs::read_to_string(PROGRAM).wrap_err_with(|| format!("Failed to read `{}`", PROGRAM))?;
    let mut mem = nibble::assemble(&source, DEFAULT_MEMORY_SIZE)?;

    let mut cpu = Processor::new();
    while cpu.execute(&mut mem)? != Step::Halted {}

    print!("{}", mem.dump());
    print!("{}", cpu.core_dump());

    Ok(())
}
