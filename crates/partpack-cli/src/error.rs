//! Error types for the command-line driver.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Refusing to overwrite an existing container
    #[error("Archive already exists: {}", .0.display())]
    ArchiveExists(PathBuf),

    /// Container to read is missing
    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    /// Create source is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Compression level out of range
    #[error("Invalid compression level {0}: expected 0-9")]
    InvalidLevel(u32),
}
