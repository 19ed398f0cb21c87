//! Fixed container header
//!
//! The header occupies the first 28 bytes of the stream. Only the magic is
//! written when a container is created; the remaining fields are back-patched
//! by finalize once the TOC position and item count are known.

use crate::container::constants::{
    CONTAINER_MAGIC, CONTENT_START, HEADER_SIZE, ITEM_COUNT_OFFSET, METHOD_OFFSET,
    TOC_END_OFFSET, TOC_START_OFFSET,
};
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::method::CompressionMethod;
use binrw::{BinRead, BinWrite};
use std::io::{ErrorKind, Read};

// Named offsets must follow the field order and widths of `ContainerHeader`
const _: () = {
    assert!(TOC_START_OFFSET == CONTAINER_MAGIC.len() as u64);
    assert!(TOC_END_OFFSET == TOC_START_OFFSET + size_of::<u64>() as u64);
    assert!(METHOD_OFFSET == TOC_END_OFFSET + size_of::<u64>() as u64);
    assert!(ITEM_COUNT_OFFSET == METHOD_OFFSET + size_of::<u32>() as u64);
    assert!(HEADER_SIZE == ITEM_COUNT_OFFSET + size_of::<u32>() as u64);
    assert!(HEADER_SIZE <= CONTENT_START);
};

/// Container header (28 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct ContainerHeader {
    /// Signature, must equal [`CONTAINER_MAGIC`]
    pub magic: [u8; 4],

    /// Absolute offset of the first TOC byte
    pub toc_start: u64,

    /// Absolute offset just past the TOC, the container length
    pub toc_end: u64,

    /// Compression method tag
    pub method: u32,

    /// Number of TOC records
    pub item_count: u32,
}

impl ContainerHeader {
    /// Create a header for a finalized container
    pub fn new(toc_start: u64, toc_end: u64, method: CompressionMethod, item_count: u32) -> Self {
        Self {
            magic: CONTAINER_MAGIC,
            toc_start,
            toc_end,
            method: method.as_tag(),
            item_count,
        }
    }

    /// Decoded compression method
    pub fn compression_method(&self) -> ContainerResult<CompressionMethod> {
        CompressionMethod::from_tag(self.method)
    }

    /// Length of the TOC run in bytes
    pub fn toc_len(&self) -> u64 {
        self.toc_end.saturating_sub(self.toc_start)
    }

    /// Check the header against itself and the stream length
    pub fn validate(&self, stream_len: u64) -> ContainerResult<()> {
        if self.magic != CONTAINER_MAGIC {
            return Err(ContainerError::InvalidMagic {
                expected: CONTAINER_MAGIC,
                actual: self.magic,
            });
        }

        self.compression_method()?;

        if self.toc_start < CONTENT_START {
            return Err(ContainerError::InvalidFormat(format!(
                "TOC start {} lies inside the header region (content starts at {})",
                self.toc_start, CONTENT_START
            )));
        }

        if self.toc_end < self.toc_start {
            return Err(ContainerError::InvalidFormat(format!(
                "TOC end {} precedes TOC start {}",
                self.toc_end, self.toc_start
            )));
        }

        if self.toc_end > stream_len {
            return Err(ContainerError::InvalidFormat(format!(
                "TOC end {} is past the end of the stream ({} bytes)",
                self.toc_end, stream_len
            )));
        }

        Ok(())
    }
}

/// Read and check the magic signature from the current stream position
pub(crate) fn read_magic<R: Read>(reader: &mut R) -> ContainerResult<()> {
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match reader.read(&mut magic[filled..]) {
            Ok(0) => {
                return Err(ContainerError::TruncatedHeader {
                    expected: magic.len() as u64,
                    actual: filled as u64,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    if magic != CONTAINER_MAGIC {
        return Err(ContainerError::InvalidMagic {
            expected: CONTAINER_MAGIC,
            actual: magic,
        });
    }

    Ok(())
}

/// Check that a stream is long enough to hold the populated header fields
pub(crate) fn ensure_header_fits(stream_len: u64) -> ContainerResult<()> {
    if stream_len < HEADER_SIZE {
        return Err(ContainerError::TruncatedHeader {
            expected: HEADER_SIZE,
            actual: stream_len,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::{BinReaderExt, BinWriterExt};
    use std::io::Cursor;

    #[test]
    fn test_header_serialization() {
        let header = ContainerHeader::new(150, 200, CompressionMethod::GZip, 3);

        let mut buffer = Vec::new();
        Cursor::new(&mut buffer).write_le(&header).unwrap();

        assert_eq!(buffer.len() as u64, HEADER_SIZE);
        assert_eq!(&buffer[0..4], &CONTAINER_MAGIC);
        assert_eq!(&buffer[4..12], &150u64.to_le_bytes());
        assert_eq!(&buffer[12..20], &200u64.to_le_bytes());
        assert_eq!(&buffer[20..24], &2u32.to_le_bytes());
        assert_eq!(&buffer[24..28], &3u32.to_le_bytes());
    }

    #[test]
    fn test_fields_land_at_named_offsets() {
        let header = ContainerHeader::new(0x1122, 0x3344, CompressionMethod::Deflate, 0x55);

        let mut buffer = Vec::new();
        Cursor::new(&mut buffer).write_le(&header).unwrap();

        let at = |offset: u64, width: usize| {
            let start = offset as usize;
            buffer[start..start + width].to_vec()
        };
        assert_eq!(at(TOC_START_OFFSET, 8), 0x1122u64.to_le_bytes());
        assert_eq!(at(TOC_END_OFFSET, 8), 0x3344u64.to_le_bytes());
        assert_eq!(at(METHOD_OFFSET, 4), 1u32.to_le_bytes());
        assert_eq!(at(ITEM_COUNT_OFFSET, 4), 0x55u32.to_le_bytes());
    }

    #[test]
    fn test_header_deserialization() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&CONTAINER_MAGIC);
        buffer.extend_from_slice(&100u64.to_le_bytes());
        buffer.extend_from_slice(&100u64.to_le_bytes());
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());

        let header: ContainerHeader = Cursor::new(&buffer).read_le().unwrap();
        assert_eq!(header.toc_start, 100);
        assert_eq!(header.toc_len(), 0);
        assert_eq!(
            header.compression_method().unwrap(),
            CompressionMethod::Deflate
        );
        assert!(header.validate(100).is_ok());
    }

    #[test]
    fn test_header_validation() {
        let inside_header = ContainerHeader::new(50, 120, CompressionMethod::Deflate, 1);
        assert!(matches!(
            inside_header.validate(1000),
            Err(ContainerError::InvalidFormat(_))
        ));

        let reversed = ContainerHeader::new(300, 200, CompressionMethod::Deflate, 1);
        assert!(reversed.validate(1000).is_err());

        let past_end = ContainerHeader::new(200, 2000, CompressionMethod::Deflate, 1);
        assert!(past_end.validate(1000).is_err());

        let mut bad_method = ContainerHeader::new(200, 300, CompressionMethod::Deflate, 1);
        bad_method.method = 9;
        assert!(matches!(
            bad_method.validate(1000),
            Err(ContainerError::UnsupportedMethod(9))
        ));
    }

    #[test]
    fn test_read_magic() {
        assert!(read_magic(&mut &CONTAINER_MAGIC[..]).is_ok());

        assert!(matches!(
            read_magic(&mut &b"PK\x03\x04"[..]),
            Err(ContainerError::InvalidMagic { .. })
        ));

        assert!(matches!(
            read_magic(&mut &[0x10u8, 0x01][..]),
            Err(ContainerError::TruncatedHeader {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_ensure_header_fits() {
        assert!(ensure_header_fits(HEADER_SIZE).is_ok());
        assert!(matches!(
            ensure_header_fits(10),
            Err(ContainerError::TruncatedHeader { .. })
        ));
    }
}
