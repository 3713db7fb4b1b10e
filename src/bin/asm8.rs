use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr};
use log::info;

use nibble::memory::DEFAULT_MEMORY_SIZE;

/// Assembles source for the nibble computer into a binary memory image.
///
/// Every line holds one instruction: a mnemonic followed by a decimal operand,
/// e.g. `lda 5`.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// `.asm` file to assemble
    input: PathBuf,
    /// Destination of the binary image
    #[arg(short, long, default_value = "out.bin")]
    output: PathBuf,
    /// Size of the memory image in bytes
    #[arg(short, long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,
    /// Print more log output, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();
    nibble::logging::init(args.verbose)?; // logging

    let source = fs::read_to_string(&args.input)
        .wrap_err_with(|| format!("Failed to read `{}`", args.input.display()))?;
    let image = nibble::assemble(&source, args.memory_size)
        .wrap_err_with(|| format!("Failed to assemble `{}`", args.input.display()))?;

    let len = image.len();
    fs::write(&args.output, image.into_bytes())
        .wrap_err_with(|| format!("Failed to write `{}`", args.output.display()))?;
    info!("Wrote {} bytes to `{}`", len, args.output.display());

    Ok(())
}
