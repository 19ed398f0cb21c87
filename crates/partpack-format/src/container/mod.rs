//! Container engine for partpack files
//!
//! This module provides everything needed to build and read partpack
//! containers:
//!
//! - **Layout**: fixed header fields at known offsets ([`ContainerHeader`])
//! - **Part codec**: per-part streaming Deflate/GZip compression and a
//!   bounded decompressing copy ([`bounded_copy`])
//! - **Table of contents**: the ordered [`PartItem`] records written at
//!   finalize time
//! - **Extraction**: to a directory tree or through a caller-supplied handler
//!
//! # Lifecycle
//!
//! ```text
//! ContainerWriter::new ─► add_part ... add_part ─► finalize
//! ContainerReader::new ─► read_directory ─► extract_to_directory / extract_with_handler
//! ```
//!
//! # Building a container
//!
//! ```rust,no_run
//! use partpack_format::container::{CompressionMethod, ContainerWriter};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = ContainerWriter::create("assets.pak", CompressionMethod::GZip)?;
//! let created = chrono::Local::now().naive_local();
//! writer.add_bytes("config/settings.json", created, br#"{"volume": 7}"#)?;
//! writer.finalize()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Extracting a container
//!
//! ```rust,no_run
//! use partpack_format::container::{ContainerReader, ErrorPolicy, ExtractOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = ContainerReader::open("assets.pak")?;
//! let items = reader.read_directory()?;
//!
//! let options = ExtractOptions::new()
//!     .with_overwrite(true)
//!     .with_error_policy(ErrorPolicy::Continue);
//! let report = reader.extract_to_directory(&items, "out", &options)?;
//! println!("{} extracted, {} failed", report.extracted.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

mod codec;
mod error;
mod extract;
mod header;
mod method;
mod part;
mod reader;
mod timestamp;
mod toc;
mod writer;

pub use codec::{bounded_copy, compress_part};
pub use error::{ContainerError, ContainerResult};
pub use extract::{ErrorPolicy, ExtractFailure, ExtractOptions, ExtractReport};
pub use header::ContainerHeader;
pub use method::CompressionMethod;
pub use part::{Part, PartView};
pub use reader::ContainerReader;
pub use timestamp::{format_timestamp, parse_timestamp, truncate_to_seconds};
pub use toc::{PartItem, decode_toc, encode_toc};
pub use writer::{ContainerWriter, DEFAULT_COMPRESSION_LEVEL};

/// Container layout constants
pub mod constants {
    /// Magic signature at offset 0
    pub const CONTAINER_MAGIC: [u8; 4] = [0x10, 0x01, 0x10, 0x01];

    /// Offset of the TOC start pointer
    pub const TOC_START_OFFSET: u64 = 4;

    /// Offset of the TOC end pointer
    pub const TOC_END_OFFSET: u64 = 12;

    /// Offset of the compression method tag
    pub const METHOD_OFFSET: u64 = 20;

    /// Offset of the item count
    pub const ITEM_COUNT_OFFSET: u64 = 24;

    /// Size of the populated header fields (magic through item count)
    pub const HEADER_SIZE: u64 = 28;

    /// Offset where the first part's compressed bytes begin
    ///
    /// Bytes between `HEADER_SIZE` and this offset are reserved and zero.
    pub const CONTENT_START: u64 = 100;

    /// Width of the textual creation timestamp in a TOC record
    pub const TIMESTAMP_LEN: usize = 19;

    /// `strftime` pattern of the creation timestamp
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Chunk size used by the bounded decompressing copy (32 KiB)
    pub const COPY_BUFFER_SIZE: usize = 32 * 1024;

    /// Fixed bytes of one TOC record besides the name
    /// (name length + four u64 fields + timestamp)
    pub const RECORD_FIXED_SIZE: u64 = 4 + 4 * 8 + TIMESTAMP_LEN as u64;
}
