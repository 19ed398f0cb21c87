//! Container writer
//!
//! Parts are compressed straight into the underlying stream as they are
//! added. Nothing but the magic and a zeroed reserved region exists on disk
//! until [`ContainerWriter::finalize`] appends the TOC and back-patches the
//! header.

use crate::container::codec::compress_part;
use crate::container::constants::{CONTAINER_MAGIC, CONTENT_START};
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::header::ContainerHeader;
use crate::container::method::CompressionMethod;
use crate::container::part::Part;
use crate::container::timestamp::truncate_to_seconds;
use crate::container::toc::{PartItem, encode_toc};
use binrw::BinWriterExt;
use chrono::NaiveDateTime;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Default flate2 compression level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Builder for partpack containers
///
/// The writer has exclusive use of its stream. Pass `&mut S` to keep
/// ownership of a stream you opened yourself; it is never closed by the
/// writer and can be recovered with [`into_inner`](Self::into_inner).
pub struct ContainerWriter<W: Write + Seek> {
    /// Underlying stream, `None` once an owned file has been closed
    stream: Option<W>,
    /// Method recorded in the header, never `None`
    method: CompressionMethod,
    /// Compression level for every part
    level: Compression,
    /// Records in insertion order
    items: Vec<PartItem>,
    /// Write cursor, end of the last part
    position: u64,
    /// Whether the writer opened the stream itself
    owns_stream: bool,
    /// Set once the TOC has been written
    finalized: bool,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Start a new container on `stream`
    ///
    /// Writes the magic at offset 0 and zero-fills the reserved header
    /// region, leaving the stream at the content start. `CompressionMethod::None`
    /// is recorded as Deflate.
    pub fn new(stream: W, method: CompressionMethod) -> ContainerResult<Self> {
        Self::with_ownership(stream, method, false)
    }

    fn with_ownership(
        mut stream: W,
        method: CompressionMethod,
        owns_stream: bool,
    ) -> ContainerResult<Self> {
        let method = method.effective();

        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&CONTAINER_MAGIC)?;
        let reserved = CONTENT_START as usize - CONTAINER_MAGIC.len();
        stream.write_all(&vec![0u8; reserved])?;

        debug!("Created container with method {}", method);

        Ok(Self {
            stream: Some(stream),
            method,
            level: Compression::new(DEFAULT_COMPRESSION_LEVEL),
            items: Vec::new(),
            position: CONTENT_START,
            owns_stream,
            finalized: false,
        })
    }

    /// Set the compression level (0-9) for parts added from now on
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }

    /// Compress and append one part
    ///
    /// Returns the TOC record for the part. The timestamp is truncated to
    /// whole seconds, which is all the TOC can hold.
    pub fn add_part<R: Read>(&mut self, part: Part<R>) -> ContainerResult<PartItem> {
        let Part {
            name,
            size,
            created,
            mut source,
        } = part;

        if self.finalized {
            return Err(ContainerError::Finalized);
        }
        let stream = self.stream.as_mut().ok_or(ContainerError::Finalized)?;

        if u32::try_from(name.len()).is_err() {
            return Err(ContainerError::ValueOutOfRange {
                field: "name length",
                value: name.len() as u64,
            });
        }
        // Reject unrepresentable timestamps before any bytes are written
        crate::container::timestamp::format_timestamp(&created)?;

        let start_position = self.position;
        stream.seek(SeekFrom::Start(start_position))?;
        let copied = compress_part(stream, &mut source, self.method, self.level)?;
        let end_position = stream.stream_position()?;

        if copied != size {
            warn!(
                "Part {} declared {} bytes but its source produced {}",
                name, size, copied
            );
        }

        let item = PartItem {
            name,
            created: truncate_to_seconds(created),
            size,
            compressed_size: end_position - start_position,
            start_position,
            end_position,
        };

        debug!(
            "Added part {} ({} -> {} bytes at {})",
            item.name, item.size, item.compressed_size, item.start_position
        );

        self.position = end_position;
        self.items.push(item.clone());
        Ok(item)
    }

    /// Add an in-memory part
    pub fn add_bytes(
        &mut self,
        name: impl Into<String>,
        created: NaiveDateTime,
        data: &[u8],
    ) -> ContainerResult<PartItem> {
        self.add_part(Part::new(name, data.len() as u64, created, data))
    }

    /// Write the TOC and back-patch the header
    ///
    /// After this call the container is sealed: further `add_part` or
    /// `finalize` calls fail with [`ContainerError::Finalized`]. A file opened
    /// by [`ContainerWriter::create`] is closed here; a caller-supplied stream
    /// is flushed and left positioned at the end of the container.
    pub fn finalize(&mut self) -> ContainerResult<ContainerHeader> {
        if self.finalized {
            return Err(ContainerError::Finalized);
        }
        let stream = self.stream.as_mut().ok_or(ContainerError::Finalized)?;

        let item_count =
            u32::try_from(self.items.len()).map_err(|_| ContainerError::ValueOutOfRange {
                field: "item count",
                value: self.items.len() as u64,
            })?;

        let toc_start = self.position;
        let toc = encode_toc(&self.items)?;
        stream.seek(SeekFrom::Start(toc_start))?;
        stream.write_all(&toc)?;
        let toc_end = stream.stream_position()?;

        let header = ContainerHeader::new(toc_start, toc_end, self.method, item_count);
        stream.seek(SeekFrom::Start(0))?;
        stream.write_le(&header)?;
        stream.seek(SeekFrom::Start(toc_end))?;
        stream.flush()?;

        self.finalized = true;
        info!(
            "Finalized container: {} parts, TOC {}..{}",
            item_count, toc_start, toc_end
        );

        if self.owns_stream {
            self.stream = None;
        }

        Ok(header)
    }

    /// Compression method recorded in the header
    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// Records added so far
    pub fn items(&self) -> &[PartItem] {
        &self.items
    }

    /// Current write position, the end of the last part
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of parts added
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no parts have been added
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if the container has been finalized
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Recover the underlying stream
    ///
    /// Returns `None` when the writer owned the stream and already closed it.
    pub fn into_inner(self) -> Option<W> {
        self.stream
    }
}

impl ContainerWriter<File> {
    /// Create a new container file
    ///
    /// Fails if `path` already exists. The file is closed by
    /// [`finalize`](Self::finalize).
    pub fn create<P: AsRef<Path>>(path: P, method: CompressionMethod) -> ContainerResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        Self::with_ownership(file, method, true)
    }
}
