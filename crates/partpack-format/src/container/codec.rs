//! Per-part compression and bounded decompression

use crate::container::constants::COPY_BUFFER_SIZE;
use crate::container::error::ContainerResult;
use crate::container::method::CompressionMethod;
use crate::container::toc::PartItem;
use flate2::Compression;
use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

/// Compress `source` into `writer` as one self-contained stream
///
/// The encoder borrows `writer` and is finished before returning, so the
/// underlying stream stays open and positioned just past the compressed
/// bytes. Returns the number of bytes read from `source`.
pub fn compress_part<W: Write, R: Read>(
    writer: &mut W,
    source: &mut R,
    method: CompressionMethod,
    level: Compression,
) -> ContainerResult<u64> {
    let copied = match method.effective() {
        CompressionMethod::GZip => {
            let mut encoder = GzEncoder::new(writer, level);
            let copied = io::copy(source, &mut encoder)?;
            encoder.finish()?;
            copied
        }
        _ => {
            let mut encoder = DeflateEncoder::new(writer, level);
            let copied = io::copy(source, &mut encoder)?;
            encoder.finish()?;
            copied
        }
    };
    Ok(copied)
}

/// Streaming decompressor for one part
pub(crate) enum PartDecoder<R: Read> {
    Deflate(DeflateDecoder<R>),
    GZip(GzDecoder<R>),
}

impl<R: Read> PartDecoder<R> {
    pub(crate) fn new(reader: R, method: CompressionMethod) -> Self {
        match method.effective() {
            CompressionMethod::GZip => Self::GZip(GzDecoder::new(reader)),
            _ => Self::Deflate(DeflateDecoder::new(reader)),
        }
    }
}

impl<R: Read> Read for PartDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Deflate(decoder) => decoder.read(buf),
            Self::GZip(decoder) => decoder.read(buf),
        }
    }
}

/// Copy at most `size` bytes from `reader` to `writer`
///
/// Copies in 32 KiB chunks and stops once `size` bytes have been written or
/// the reader is exhausted, whichever comes first. A short copy is not an
/// error here; the returned count lets the caller decide.
pub fn bounded_copy<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    size: u64,
) -> ContainerResult<u64> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
        let read = match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buffer[..read])?;
        remaining -= read as u64;
    }

    Ok(size - remaining)
}

/// Seek to a part's compressed range and decompress its logical bytes
///
/// The decoder only sees the record's compressed range, so it can never
/// consume bytes that belong to the next part. Returns the number of logical
/// bytes written.
pub(crate) fn decompress_part<S: Read + Seek, W: Write>(
    stream: &mut S,
    item: &PartItem,
    method: CompressionMethod,
    writer: &mut W,
) -> ContainerResult<u64> {
    stream.seek(SeekFrom::Start(item.start_position))?;
    let range = stream.take(item.compressed_size);
    let mut decoder = PartDecoder::new(range, method);
    bounded_copy(&mut decoder, writer, item.size)
}
