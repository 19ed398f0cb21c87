//! Container reader and extraction driver

use crate::container::codec::decompress_part;
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::extract::{ExtractOptions, ExtractReport, destination_path};
use crate::container::header::{ContainerHeader, ensure_header_fits, read_magic};
use crate::container::method::CompressionMethod;
use crate::container::part::PartView;
use crate::container::toc::{PartItem, decode_toc};
use binrw::BinReaderExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reader for finalized partpack containers
///
/// Opening only checks the magic. The header fields and TOC are read on the
/// first call to [`read_directory`](Self::read_directory) or an extraction.
pub struct ContainerReader<R: Read + Seek> {
    /// Underlying stream
    stream: R,
    /// Header, loaded lazily
    header: Option<ContainerHeader>,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Open a container on `stream`, validating the magic signature
    pub fn new(mut stream: R) -> ContainerResult<Self> {
        stream.seek(SeekFrom::Start(0))?;
        read_magic(&mut stream)?;
        Ok(Self {
            stream,
            header: None,
        })
    }

    /// Fixed header fields, read on first use
    pub fn header(&mut self) -> ContainerResult<ContainerHeader> {
        if let Some(header) = self.header {
            return Ok(header);
        }

        let stream_len = self.stream.seek(SeekFrom::End(0))?;
        ensure_header_fits(stream_len)?;
        self.stream.seek(SeekFrom::Start(0))?;
        let header: ContainerHeader = self.stream.read_le()?;
        header.validate(stream_len)?;

        debug!(
            "Read container header: {} parts, method {}, TOC {}..{}",
            header.item_count, header.method, header.toc_start, header.toc_end
        );

        self.header = Some(header);
        Ok(header)
    }

    /// Compression method from the header
    pub fn method(&mut self) -> ContainerResult<CompressionMethod> {
        self.header()?.compression_method()
    }

    /// Read the table of contents
    ///
    /// Records come back in the order they were written. Calling this again
    /// re-reads the same bytes and yields the same records.
    pub fn read_directory(&mut self) -> ContainerResult<Vec<PartItem>> {
        let header = self.header()?;
        let toc_len = usize::try_from(header.toc_len()).map_err(|_| {
            ContainerError::ValueOutOfRange {
                field: "TOC length",
                value: header.toc_len(),
            }
        })?;

        self.stream.seek(SeekFrom::Start(header.toc_start))?;
        let mut toc = vec![0u8; toc_len];
        self.stream.read_exact(&mut toc)?;

        let items = decode_toc(&toc, header.item_count, header.toc_start)?;
        debug!("Decoded {} TOC records", items.len());
        Ok(items)
    }

    /// Find a record by exact name
    pub fn find(&mut self, name: &str) -> ContainerResult<Option<PartItem>> {
        Ok(self
            .read_directory()?
            .into_iter()
            .find(|item| item.name == name))
    }

    /// Decompress one part into memory
    ///
    /// Lenient: a truncated part yields fewer than `size` bytes.
    pub fn read_part(&mut self, item: &PartItem) -> ContainerResult<Vec<u8>> {
        self.read_part_checked(item, false)
    }

    fn read_part_checked(&mut self, item: &PartItem, strict: bool) -> ContainerResult<Vec<u8>> {
        let method = self.method()?;
        let capacity = usize::try_from(item.size).unwrap_or(0).min(1 << 24);
        let mut data = Vec::with_capacity(capacity);
        let copied = decompress_part(&mut self.stream, item, method, &mut data)?;
        check_length(item, copied, strict)?;
        Ok(data)
    }

    /// Extract parts into a directory tree
    ///
    /// Each part lands at `root` joined with its name. Missing directories
    /// are created. An existing file is replaced only when
    /// `options.overwrite` is set; otherwise that part fails before anything
    /// is written. How a failing part affects the rest of the batch follows
    /// `options.on_error`.
    pub fn extract_to_directory<P: AsRef<Path>>(
        &mut self,
        items: &[PartItem],
        root: P,
        options: &ExtractOptions,
    ) -> ContainerResult<ExtractReport> {
        let root = root.as_ref();
        let method = self.method()?;
        let mut report = ExtractReport::default();

        for item in items {
            let result = self.extract_file(item, root, method, options);
            report.record(&item.name, result, options.on_error)?;
        }

        info!(
            "Extracted {} parts to {} ({} failed)",
            report.extracted.len(),
            root.display(),
            report.failures.len()
        );
        Ok(report)
    }

    fn extract_file(
        &mut self,
        item: &PartItem,
        root: &Path,
        method: CompressionMethod,
        options: &ExtractOptions,
    ) -> ContainerResult<()> {
        let target = destination_path(root, &item.name)?;

        // symlink_metadata so a dangling link still counts as present
        if fs::symlink_metadata(&target).is_ok() {
            if options.overwrite {
                fs::remove_file(&target)?;
            } else {
                return Err(ContainerError::DestinationExists(target));
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)?;
        let mut writer = BufWriter::new(file);
        let written = decompress_part(&mut self.stream, item, method, &mut writer)
            .and_then(|copied| {
                writer.flush()?;
                check_length(item, copied, options.strict)
            });

        if let Err(e) = written {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(&target) {
                warn!(
                    "Could not remove partial file {}: {}",
                    target.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        debug!("Extracted {} -> {}", item.name, target.display());
        Ok(())
    }

    /// Extract parts through a handler
    ///
    /// Each part is decompressed into memory and passed to `handler` as a
    /// [`PartView`]. Handler errors are treated like extraction errors and
    /// follow `options.on_error`.
    pub fn extract_with_handler<F>(
        &mut self,
        items: &[PartItem],
        options: &ExtractOptions,
        mut handler: F,
    ) -> ContainerResult<ExtractReport>
    where
        F: FnMut(PartView<'_>) -> ContainerResult<()>,
    {
        let mut report = ExtractReport::default();

        for item in items {
            let result = self
                .read_part_checked(item, options.strict)
                .and_then(|data| handler(PartView::new(item, data)));
            report.record(&item.name, result, options.on_error)?;
        }

        debug!(
            "Handled {} parts ({} failed)",
            report.extracted.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Recover the underlying stream
    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl ContainerReader<File> {
    /// Open a container file
    pub fn open<P: AsRef<Path>>(path: P) -> ContainerResult<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

fn check_length(item: &PartItem, copied: u64, strict: bool) -> ContainerResult<()> {
    if strict && copied != item.size {
        return Err(ContainerError::TruncatedPart {
            name: item.name.clone(),
            expected: item.size,
            actual: copied,
        });
    }
    Ok(())
}
