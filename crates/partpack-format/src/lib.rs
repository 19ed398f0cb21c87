//! Single-file container format for independently compressed named parts
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::needless_pass_by_value)] // Configuration types
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! A container is one seekable byte stream holding any number of named
//! parts. Every part is compressed on its own (raw Deflate or GZip), so a
//! reader can seek straight to one part and decompress it without touching
//! the others. A table of contents written after the last part records the
//! name, creation time, sizes and byte range of every part.
//!
//! # Layout
//!
//! ```text
//! 0    magic "10 01 10 01"
//! 4    TOC start offset (u64 LE)
//! 12   TOC end offset (u64 LE, also the container length)
//! 20   compression method (u32 LE)
//! 24   item count (u32 LE)
//! 28   reserved, zero filled
//! 100  part data, back to back
//! ...  TOC records
//! ```
//!
//! # Example
//!
//! ```rust
//! use partpack_format::container::{
//!     CompressionMethod, ContainerReader, ContainerWriter, Part,
//! };
//! use std::io::Cursor;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let created = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
//!     .and_then(|d| d.and_hms_opt(12, 30, 0))
//!     .ok_or("bad date")?;
//!
//! let mut buffer = Cursor::new(Vec::new());
//! let mut writer = ContainerWriter::new(&mut buffer, CompressionMethod::Deflate)?;
//! writer.add_part(Part::new("a.txt", 5, created, &b"hello"[..]))?;
//! writer.finalize()?;
//! drop(writer);
//!
//! let mut reader = ContainerReader::new(buffer)?;
//! let items = reader.read_directory()?;
//! assert_eq!(reader.read_part(&items[0])?, b"hello");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]

/// Container engine: layout, part codec, table of contents and extraction
///
/// See the [`container`] module for the writer and reader entry points.
pub mod container;

pub use container::{
    CompressionMethod, ContainerError, ContainerReader, ContainerResult, ContainerWriter,
    ErrorPolicy, ExtractOptions, ExtractReport, Part, PartItem, PartView,
};
