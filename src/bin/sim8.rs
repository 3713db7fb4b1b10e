use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr};

use nibble::memory::{Memory, DEFAULT_MEMORY_SIZE};
use nibble::processor::DEFAULT_MAX_STEPS;

/// Runs a binary memory image on the nibble computer, then dumps memory and
/// registers.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// `.bin` image to run
    input: PathBuf,
    /// Stop after this many steps if the program doesn't halt
    #[arg(short = 's', long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
    /// Size of memory in bytes [default: size of the image, at least 16]
    #[arg(short, long)]
    memory_size: Option<usize>,
    /// Print more log output, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();
    nibble::logging::init(args.verbose)?; // logging

    let image = fs::read(&args.input)
        .wrap_err_with(|| format!("Failed to read `{}`", args.input.display()))?;
    let size = args
        .memory_size
        .unwrap_or_else(|| image.len().max(DEFAULT_MEMORY_SIZE));
    let memory = Memory::from_image(&image, size)
        .wrap_err_with(|| format!("Failed to load `{}`", args.input.display()))?;

    let run = nibble::run(memory, args.max_steps).wrap_err("Simulation failed")?;

    for value in &run.output {
        println!("OUT: {}", value);
    }
    println!(
        "Simulation ended after {} steps ({})",
        run.steps, run.termination
    );
    print!("{}", run.memory.dump());
    print!("{}", run.processor.core_dump());

    Ok(())
}
