//! Transient part values passed across the API boundary

use crate::container::toc::PartItem;
use chrono::NaiveDateTime;
use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};

/// A part waiting to be added to a container
///
/// `size` is recorded in the TOC as given; it is not measured from `source`.
#[derive(Debug)]
pub struct Part<R: Read> {
    /// Name stored in the TOC
    pub name: String,
    /// Logical size in bytes
    pub size: u64,
    /// Creation time
    pub created: NaiveDateTime,
    /// Source of the uncompressed bytes
    pub source: R,
}

impl<R: Read> Part<R> {
    /// Create a new part
    pub fn new(name: impl Into<String>, size: u64, created: NaiveDateTime, source: R) -> Self {
        Self {
            name: name.into(),
            size,
            created,
            source,
        }
    }
}

impl<'a> Part<&'a [u8]> {
    /// Create a part from an in-memory buffer, taking the size from it
    pub fn from_bytes(name: impl Into<String>, created: NaiveDateTime, data: &'a [u8]) -> Self {
        Self::new(name, data.len() as u64, created, data)
    }
}

/// Decompressed part handed to an extraction handler
///
/// The buffer is positioned at its start. The view only lives for the
/// duration of the handler call unless the caller takes the bytes out with
/// [`PartView::into_data`].
#[derive(Debug)]
pub struct PartView<'a> {
    item: &'a PartItem,
    data: Cursor<Vec<u8>>,
}

impl<'a> PartView<'a> {
    pub(crate) fn new(item: &'a PartItem, data: Vec<u8>) -> Self {
        Self {
            item,
            data: Cursor::new(data),
        }
    }

    /// Part name
    pub fn name(&self) -> &str {
        &self.item.name
    }

    /// Creation time
    pub fn created(&self) -> NaiveDateTime {
        self.item.created
    }

    /// Logical size from the TOC
    pub fn size(&self) -> u64 {
        self.item.size
    }

    /// TOC record this view was produced from
    pub fn item(&self) -> &PartItem {
        self.item
    }

    /// Decompressed bytes
    ///
    /// Shorter than [`size`](Self::size) only when the part was truncated and
    /// strict mode was off.
    pub fn bytes(&self) -> &[u8] {
        self.data.get_ref()
    }

    /// Take ownership of the decompressed bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl Read for PartView<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl BufRead for PartView<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.data.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.data.consume(amt);
    }
}

impl Seek for PartView<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}
