use color_eyre::eyre::Result;

use nibble::memory::Memory;
use nibble::processor::{Processor, DEFAULT_MAX_STEPS};
use nibble::write_instructions;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init()?; // logging

    let mut mem = Memory::default();
    write_instructions!(mem : 0 =>
        LDA 5,
        LDB 6,
        ADD,
        OUT,
        HLT
    )?;
    mem.write_byte(5, 42)?;
    mem.write_byte(6, 58)?;

    let run = Processor::new().run(mem, DEFAULT_MAX_STEPS)?;
    // OUT prints A, the sum ends up in B
    println!("Output: {:?}", run.output);
    println!("Program terminated. Result: 0x{:02X} / {}", run.processor.b, run.processor.b);

    Ok(())
}
