//! Command-line configuration.
//!
//! Arguments can also be supplied through environment variables
//! (`PARTPACK_METHOD`, `PARTPACK_LEVEL`, `PARTPACK_OVERWRITE`, ...).
//!
//! # Example
//!
//! ```no_run
//! use partpack_cli::Cli;
//!
//! let cli = Cli::from_args();
//! cli.validate().expect("Invalid configuration");
//! ```

use crate::error::ConfigError;
use clap::{Parser, Subcommand, ValueEnum};
use partpack_format::container::{CompressionMethod, ErrorPolicy, ExtractOptions};
use std::path::PathBuf;

/// Top-level command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "partpack",
    about = "Create, list and extract partpack containers",
    version
)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true, env = "PARTPACK_VERBOSE")]
    pub verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Compression method as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Raw Deflate
    Deflate,
    /// GZip members
    Gzip,
}

impl From<MethodArg> for CompressionMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Deflate => Self::Deflate,
            MethodArg::Gzip => Self::GZip,
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Pack every file under a directory into a new container
    Create {
        /// Container to create (must not exist)
        archive: PathBuf,

        /// Directory whose files are packed
        source: PathBuf,

        /// Compression method
        #[arg(long, value_enum, env = "PARTPACK_METHOD", default_value = "deflate")]
        method: MethodArg,

        /// Compression level, 0-9
        #[arg(long, env = "PARTPACK_LEVEL", default_value_t = 6)]
        level: u32,
    },

    /// Print the table of contents
    List {
        /// Container to read
        archive: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Extract parts into a directory
    Extract {
        /// Container to read
        archive: PathBuf,

        /// Destination root
        destination: PathBuf,

        /// Parts to extract (all when omitted)
        names: Vec<String>,

        /// Replace files that already exist
        #[arg(long, env = "PARTPACK_OVERWRITE")]
        overwrite: bool,

        /// Fail parts that decompress short of their recorded size
        #[arg(long, env = "PARTPACK_STRICT")]
        strict: bool,

        /// Keep going after a part fails and report failures at the end
        #[arg(long, env = "PARTPACK_CONTINUE_ON_ERROR")]
        continue_on_error: bool,
    },
}

impl Cli {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the chosen verbosity.
    #[must_use]
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The archive to create already exists
    /// - The create source is not a directory
    /// - The compression level is above 9
    /// - The archive to read does not exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Create {
                archive,
                source,
                level,
                ..
            } => {
                if archive.exists() {
                    return Err(ConfigError::ArchiveExists(archive.clone()));
                }
                if !source.is_dir() {
                    return Err(ConfigError::NotADirectory(source.clone()));
                }
                if *level > 9 {
                    return Err(ConfigError::InvalidLevel(*level));
                }
            }
            Command::List { archive, .. } | Command::Extract { archive, .. } => {
                if !archive.is_file() {
                    return Err(ConfigError::ArchiveNotFound(archive.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Build extraction options from the extract flags.
#[must_use]
pub fn extract_options(overwrite: bool, strict: bool, continue_on_error: bool) -> ExtractOptions {
    let policy = if continue_on_error {
        ErrorPolicy::Continue
    } else {
        ErrorPolicy::Abort
    };
    ExtractOptions::new()
        .with_overwrite(overwrite)
        .with_strict(strict)
        .with_error_policy(policy)
}
