//! Command-line driver for partpack containers.
//!
//! Three subcommands sit on top of `partpack-format`:
//! - `create`: pack every file under a directory into a new container
//! - `list`: print the table of contents, as a table or JSON
//! - `extract`: write parts back out under a destination root
//!
//! # Example
//!
//! ```no_run
//! use partpack_cli::{Cli, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let cli = Cli::from_args();
//!     cli.validate()?;
//!     run(&cli, &mut std::io::stdout())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config;
pub mod error;

pub use config::{Cli, Command, MethodArg};
pub use error::ConfigError;

use std::io::Write;

/// Dispatch a parsed command line.
///
/// Human-readable output goes to `out`.
///
/// # Errors
///
/// Returns an error if the selected command fails.
pub fn run<O: Write>(cli: &Cli, out: &mut O) -> anyhow::Result<()> {
    match &cli.command {
        Command::Create {
            archive,
            source,
            method,
            level,
        } => {
            let header = commands::create(archive, source, (*method).into(), *level)?;
            writeln!(
                out,
                "Packed {} parts into {}",
                header.item_count,
                archive.display()
            )?;
        }
        Command::List { archive, json } => {
            commands::list(archive, *json, out)?;
        }
        Command::Extract {
            archive,
            destination,
            names,
            overwrite,
            strict,
            continue_on_error,
        } => {
            let options = config::extract_options(*overwrite, *strict, *continue_on_error);
            let report = commands::extract(archive, destination, names, &options)?;
            for failure in &report.failures {
                writeln!(out, "failed: {}: {}", failure.name, failure.error)?;
            }
            writeln!(
                out,
                "Extracted {} parts to {}",
                report.extracted.len(),
                destination.display()
            )?;
            if !report.is_complete() {
                anyhow::bail!("{} parts failed to extract", report.failures.len());
            }
        }
    }
    Ok(())
}
