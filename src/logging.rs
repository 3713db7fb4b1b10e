//! Logger set up shared by the binaries.

use log::{LevelFilter, SetLoggerError};
use simple_logger::SimpleLogger;

/// Maps the number of `-v` flags to a level. Warnings are always shown.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs a [`SimpleLogger`] for the given verbosity
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    SimpleLogger::new().with_level(level_for(verbosity)).init()
}
