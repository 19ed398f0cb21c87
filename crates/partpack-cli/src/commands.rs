//! Subcommand implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use partpack_format::container::{
    CompressionMethod, ContainerHeader, ContainerReader, ContainerWriter, ExtractOptions,
    ExtractReport, Part, PartItem,
};
use std::fs::{self, File, Metadata};
use std::io::{BufReader, Write};
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Pack every regular file under `source` into a new container at `archive`.
///
/// Parts are named by their path relative to `source`, with `/` separators,
/// and are added in sorted walk order.
///
/// # Errors
///
/// Returns an error if the archive cannot be created or a source file
/// cannot be read.
pub fn create(
    archive: &Path,
    source: &Path,
    method: CompressionMethod,
    level: u32,
) -> Result<ContainerHeader> {
    let mut writer = ContainerWriter::create(archive, method)
        .with_context(|| format!("creating {}", archive.display()))?
        .with_compression_level(level);

    let packed = pack_tree(&mut writer, archive, source)
        .and_then(|()| writer.finalize().map_err(Into::into));
    let header = match packed {
        Ok(header) => header,
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(archive) {
                warn!(
                    "Could not remove incomplete archive {}: {}",
                    archive.display(),
                    cleanup
                );
            }
            return Err(e);
        }
    };

    info!(
        "Created {} with {} parts ({} bytes)",
        archive.display(),
        header.item_count,
        header.toc_end
    );
    Ok(header)
}

fn pack_tree(writer: &mut ContainerWriter<File>, archive: &Path, source: &Path) -> Result<()> {
    let archive_path = archive.canonicalize()?;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().canonicalize()? == archive_path {
            continue;
        }

        let relative = entry.path().strip_prefix(source)?;
        let name = part_name(relative);
        let metadata = entry.metadata()?;
        let file = File::open(entry.path())
            .with_context(|| format!("opening {}", entry.path().display()))?;

        let item = writer.add_part(Part::new(
            name,
            metadata.len(),
            created_time(&metadata),
            BufReader::new(file),
        ))?;
        debug!(
            "Packed {} ({} -> {} bytes)",
            item.name, item.size, item.compressed_size
        );
    }
    Ok(())
}

/// Print the table of contents of `archive` to `out`.
///
/// # Errors
///
/// Returns an error if the container cannot be read.
pub fn list<O: Write>(archive: &Path, json: bool, out: &mut O) -> Result<()> {
    let mut reader = ContainerReader::open(archive)
        .with_context(|| format!("opening {}", archive.display()))?;
    let items = reader.read_directory()?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &items)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<19}  {:>12}  {:>12}  {:>6}  NAME",
        "CREATED", "SIZE", "COMPRESSED", "RATIO"
    )?;
    for item in &items {
        writeln!(
            out,
            "{}  {:>12}  {:>12}  {:>5.1}%  {}",
            item.created.format("%Y-%m-%d %H:%M:%S"),
            item.size,
            item.compressed_size,
            item.ratio() * 100.0,
            item.name
        )?;
    }
    writeln!(out, "{} parts, method {}", items.len(), reader.method()?)?;
    Ok(())
}

/// Extract parts of `archive` under `destination`.
///
/// With an empty `names` every part is extracted. Otherwise only the named
/// parts are, in the order given; a name with no matching part is an error.
///
/// # Errors
///
/// Returns an error if the container cannot be read, a requested name is
/// missing, or extraction aborts under [`ErrorPolicy::Abort`].
///
/// [`ErrorPolicy::Abort`]: partpack_format::ErrorPolicy::Abort
pub fn extract(
    archive: &Path,
    destination: &Path,
    names: &[String],
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut reader = ContainerReader::open(archive)
        .with_context(|| format!("opening {}", archive.display()))?;
    let items = reader.read_directory()?;
    let selected = select(&items, names)?;

    let report = reader.extract_to_directory(&selected, destination, options)?;
    Ok(report)
}

fn select(items: &[PartItem], names: &[String]) -> Result<Vec<PartItem>> {
    if names.is_empty() {
        return Ok(items.to_vec());
    }

    names
        .iter()
        .map(|name| {
            items
                .iter()
                .find(|item| &item.name == name)
                .cloned()
                .with_context(|| format!("no part named {name:?}"))
        })
        .collect()
}

/// Join the normal components of a relative path with `/`
fn part_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// File creation time in local time, falling back to the modification time
fn created_time(metadata: &Metadata) -> NaiveDateTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_or_else(
            |_| Local::now().naive_local(),
            |time| DateTime::<Local>::from(time).naive_local(),
        )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn item(name: &str) -> PartItem {
        PartItem {
            name: name.to_string(),
            created: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            size: 0,
            compressed_size: 0,
            start_position: 100,
            end_position: 100,
        }
    }

    #[test]
    fn test_part_name_uses_forward_slashes() {
        let relative: std::path::PathBuf = ["dir", "sub", "file.txt"].iter().collect();
        assert_eq!(part_name(&relative), "dir/sub/file.txt");
        assert_eq!(part_name(Path::new("./a.txt")), "a.txt");
    }

    #[test]
    fn test_select_all_when_no_names() {
        let items = vec![item("a"), item("b")];
        let selected = select(&items, &[]).unwrap();
        assert_eq!(selected, items);
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let items = vec![item("a"), item("b"), item("c")];
        let selected = select(&items, &["c".to_string(), "a".to_string()]).unwrap();
        let names: Vec<_> = selected.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn test_select_unknown_name() {
        let items = vec![item("a")];
        let err = select(&items, &["missing".to_string()]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
