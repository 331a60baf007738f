//! Core library for the `careboard` task board engine.
//!
//! The pure board logic lives in [`board`]; [`service`] wires it to the
//! remote store through the [`ports`], and [`documents`] layers bulk
//! document operations on top.

pub mod adapters;
pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod documents;
pub mod error;
pub mod logging;
pub mod model;
pub mod ports;
pub mod service;
pub mod session;
pub mod sync;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}
