use std::fs;

use color_eyre::eyre::Result;

use nibble::memory::DEFAULT_MEMORY_SIZE;
use nibble::processor::DEFAULT_MAX_STEPS;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init()?; // logging

    let source = fs::read_to_string("demos/programs/add.asm")?;
    let mem = nibble::assemble(&source, DEFAULT_MEMORY_SIZE)?;
    print!("{}", mem.dump());

    let run = nibble::run(mem, DEFAULT_MAX_STEPS)?;
    println!("Output: {:?}", run.output);

    Ok(())
}
