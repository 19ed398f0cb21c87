//! Error types for container operations

use std::path::PathBuf;
use thiserror::Error;

/// Container operation result type
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Error types for container operations
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Stream ended before the magic signature could be read
    #[error("Truncated container header: expected {expected} bytes, got {actual}")]
    TruncatedHeader {
        /// Bytes required
        expected: u64,
        /// Bytes available
        actual: u64,
    },

    /// Magic signature mismatch
    #[error("Invalid container magic: expected {expected:02x?}, got {actual:02x?}")]
    InvalidMagic {
        /// Expected signature
        expected: [u8; 4],
        /// Signature found in the stream
        actual: [u8; 4],
    },

    /// Compression method tag not known to this implementation
    #[error("Unsupported compression method: {0}")]
    UnsupportedMethod(u32),

    /// Header or table of contents is inconsistent
    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    /// A TOC record violates the offset invariants
    #[error("Invalid record {index} ({name}): {reason}")]
    InvalidRecord {
        /// Position of the record in the TOC
        index: usize,
        /// Part name stored in the record
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Part name is not valid UTF-8
    #[error("Part name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),

    /// Stored creation timestamp could not be parsed or formatted
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Part added or container finalized after finalize
    #[error("Container already finalized")]
    Finalized,

    /// Value does not fit in its on-disk field
    #[error("{field} out of range: {value}")]
    ValueOutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
    },

    /// Extraction destination exists and overwrite was not requested
    #[error("File already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Part name would escape the extraction root
    #[error("Unsafe part name: {0:?}")]
    UnsafePath(String),

    /// Decompressed fewer bytes than the record declares (strict mode only)
    #[error("Truncated part {name}: expected {expected} bytes, got {actual}")]
    TruncatedPart {
        /// Part name
        name: String,
        /// Logical size from the TOC
        expected: u64,
        /// Bytes actually produced
        actual: u64,
    },

    /// Binary read/write error
    #[error("Binary format error: {0}")]
    BinRead(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ContainerError {
    /// Check if this error means the stream is not a valid container
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. }
                | Self::InvalidMagic { .. }
                | Self::UnsupportedMethod(_)
                | Self::InvalidFormat(_)
                | Self::InvalidRecord { .. }
                | Self::InvalidName(_)
                | Self::InvalidTimestamp(_)
                | Self::BinRead(_)
        )
    }

    /// Check if this error comes from using a finalized container
    pub fn is_state_error(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Check if this error is an extraction destination conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DestinationExists(_))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let magic = ContainerError::InvalidMagic {
            expected: [0x10, 0x01, 0x10, 0x01],
            actual: *b"PK\x03\x04",
        };
        assert!(magic.is_format_error());
        assert!(!magic.is_state_error());

        assert!(ContainerError::Finalized.is_state_error());
        assert!(!ContainerError::Finalized.is_format_error());

        let conflict = ContainerError::DestinationExists(PathBuf::from("out/a.txt"));
        assert!(conflict.is_conflict());
        assert!(!conflict.is_format_error());
    }

    #[test]
    fn test_error_messages() {
        let err = ContainerError::TruncatedPart {
            name: "a.txt".to_string(),
            expected: 10,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Truncated part a.txt: expected 10 bytes, got 4"
        );

        let err = ContainerError::DestinationExists(PathBuf::from("out/a.txt"));
        assert_eq!(err.to_string(), "File already exists: out/a.txt");
    }
}
