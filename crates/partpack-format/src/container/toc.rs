//! Table of contents records
//!
//! The TOC is a flat run of variable-length records, one per part, in the
//! order the parts were added:
//!
//! ```text
//! u32   name length
//! [u8]  name (UTF-8, no terminator)
//! u64   logical size
//! u64   compressed size
//! u64   start position
//! u64   end position
//! [u8]  created, "YYYY-MM-DD HH:MM:SS" (19 ASCII bytes)
//! ```
//!
//! The record count lives in the fixed header, not in the run itself.

use crate::container::constants::{CONTENT_START, RECORD_FIXED_SIZE, TIMESTAMP_LEN};
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::timestamp::{format_timestamp, parse_timestamp};
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::io::Cursor;
use tracing::warn;

/// One TOC record describing a stored part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartItem {
    /// Part name, usually a relative path
    pub name: String,
    /// Creation time, second precision
    pub created: NaiveDateTime,
    /// Logical (uncompressed) size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Absolute offset of the first compressed byte
    pub start_position: u64,
    /// Absolute offset just past the last compressed byte
    pub end_position: u64,
}

impl PartItem {
    /// Compression ratio (compressed / logical), 0 for empty parts
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.compressed_size as f64 / self.size as f64
        }
    }

    /// Encoded length of this record in the TOC run
    pub fn encoded_len(&self) -> u64 {
        RECORD_FIXED_SIZE + self.name.len() as u64
    }
}

/// On-disk form of a TOC record
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
struct RawPartRecord {
    name_len: u32,
    #[br(count = name_len)]
    name: Vec<u8>,
    size: u64,
    compressed_size: u64,
    start_position: u64,
    end_position: u64,
    created: [u8; TIMESTAMP_LEN],
}

impl RawPartRecord {
    fn from_item(item: &PartItem) -> ContainerResult<Self> {
        let name_len =
            u32::try_from(item.name.len()).map_err(|_| ContainerError::ValueOutOfRange {
                field: "name length",
                value: item.name.len() as u64,
            })?;

        Ok(Self {
            name_len,
            name: item.name.as_bytes().to_vec(),
            size: item.size,
            compressed_size: item.compressed_size,
            start_position: item.start_position,
            end_position: item.end_position,
            created: format_timestamp(&item.created)?,
        })
    }

    fn into_item(self) -> ContainerResult<PartItem> {
        Ok(PartItem {
            name: String::from_utf8(self.name)?,
            created: parse_timestamp(&self.created)?,
            size: self.size,
            compressed_size: self.compressed_size,
            start_position: self.start_position,
            end_position: self.end_position,
        })
    }
}

/// Serialize records into one contiguous TOC run
pub fn encode_toc(items: &[PartItem]) -> ContainerResult<Vec<u8>> {
    let capacity: u64 = items.iter().map(PartItem::encoded_len).sum();
    let mut buffer = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
    let mut cursor = Cursor::new(&mut buffer);

    for item in items {
        cursor.write_le(&RawPartRecord::from_item(item)?)?;
    }

    Ok(buffer)
}

/// Decode `count` records from a TOC run
///
/// `toc_start` is the absolute offset the run was read from; every record's
/// byte range must lie between the content start and the TOC.
pub fn decode_toc(data: &[u8], count: u32, toc_start: u64) -> ContainerResult<Vec<PartItem>> {
    let mut cursor = Cursor::new(data);
    // Cap preallocation by what the run could possibly hold
    let max_records = data.len() as u64 / RECORD_FIXED_SIZE;
    let mut items = Vec::with_capacity(u64::from(count).min(max_records) as usize);
    let mut previous_end = CONTENT_START;

    for index in 0..count as usize {
        let raw: RawPartRecord = cursor.read_le().map_err(|e| {
            if e.is_eof() {
                ContainerError::InvalidFormat(format!(
                    "TOC ends after {index} of {count} records"
                ))
            } else {
                e.into()
            }
        })?;
        let item = raw.into_item()?;
        validate_record(index, &item, previous_end, toc_start)?;
        previous_end = item.end_position;
        items.push(item);
    }

    let trailing = data.len() as u64 - cursor.position();
    if trailing > 0 {
        warn!("Ignoring {} trailing bytes after the last TOC record", trailing);
    }

    Ok(items)
}

fn validate_record(
    index: usize,
    item: &PartItem,
    previous_end: u64,
    toc_start: u64,
) -> ContainerResult<()> {
    let invalid = |reason: String| ContainerError::InvalidRecord {
        index,
        name: item.name.clone(),
        reason,
    };

    if item.end_position < item.start_position {
        return Err(invalid(format!(
            "end {} precedes start {}",
            item.end_position, item.start_position
        )));
    }

    if item.end_position - item.start_position != item.compressed_size {
        return Err(invalid(format!(
            "range {}..{} does not match compressed size {}",
            item.start_position, item.end_position, item.compressed_size
        )));
    }

    if item.start_position < previous_end {
        return Err(invalid(format!(
            "start {} overlaps the previous part ending at {}",
            item.start_position, previous_end
        )));
    }

    if item.end_position > toc_start {
        return Err(invalid(format!(
            "end {} runs into the TOC at {}",
            item.end_position, toc_start
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 45, 12)
            .unwrap()
    }

    fn item(name: &str, start: u64, compressed: u64, size: u64) -> PartItem {
        PartItem {
            name: name.to_string(),
            created: created(),
            size,
            compressed_size: compressed,
            start_position: start,
            end_position: start + compressed,
        }
    }

    #[test]
    fn test_item_serializes_for_listing() {
        let value = serde_json::to_value(item("docs/a.txt", 100, 7, 5)).unwrap();

        assert_eq!(value["name"], "docs/a.txt");
        assert_eq!(value["created"], "2024-03-15T08:45:12");
        assert_eq!(value["size"], 5);
        assert_eq!(value["compressed_size"], 7);
        assert_eq!(value["end_position"], 107);
    }

    #[test]
    fn test_record_layout() {
        let encoded = encode_toc(&[item("ab", 100, 7, 5)]).unwrap();

        assert_eq!(encoded.len() as u64, RECORD_FIXED_SIZE + 2);
        assert_eq!(&encoded[0..4], &2u32.to_le_bytes());
        assert_eq!(&encoded[4..6], b"ab");
        assert_eq!(&encoded[6..14], &5u64.to_le_bytes());
        assert_eq!(&encoded[14..22], &7u64.to_le_bytes());
        assert_eq!(&encoded[22..30], &100u64.to_le_bytes());
        assert_eq!(&encoded[30..38], &107u64.to_le_bytes());
        assert_eq!(&encoded[38..57], b"2024-03-15 08:45:12");
    }

    #[test]
    fn test_decode_preserves_order() {
        let items = vec![
            item("z.bin", 100, 10, 40),
            item("a.bin", 110, 3, 0),
            item("m/ü.txt", 113, 20, 64),
        ];
        let encoded = encode_toc(&items).unwrap();
        let decoded = decode_toc(&encoded, 3, 133).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_toc(&[], 0, CONTENT_START).unwrap().is_empty());
    }

    #[test]
    fn test_decode_short_run() {
        let encoded = encode_toc(&[item("a", 100, 5, 5)]).unwrap();
        let result = decode_toc(&encoded, 2, 105);
        assert!(matches!(result, Err(ContainerError::InvalidFormat(_))));
    }

    #[test]
    fn test_decode_record_cut_mid_field() {
        // Name and half of the size field, nothing after
        let data = [1, 0, 0, 0, b'a', 5, 0, 0, 0, 0, 0, 0, 0];
        let result = decode_toc(&data, 1, 200);
        assert!(matches!(
            result,
            Err(ContainerError::InvalidFormat(ref msg)) if msg.contains("0 of 1")
        ));
    }

    #[test]
    fn test_decode_rejects_inconsistent_size() {
        let mut bad = item("a", 100, 5, 5);
        bad.compressed_size = 6;
        let encoded = encode_toc(&[bad]).unwrap();
        assert!(matches!(
            decode_toc(&encoded, 1, 200),
            Err(ContainerError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_overlap() {
        let items = vec![item("a", 100, 10, 5), item("b", 105, 10, 5)];
        let encoded = encode_toc(&items).unwrap();
        assert!(matches!(
            decode_toc(&encoded, 2, 200),
            Err(ContainerError::InvalidRecord { index: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_range_inside_header() {
        let encoded = encode_toc(&[item("a", 20, 5, 5)]).unwrap();
        assert!(decode_toc(&encoded, 1, 200).is_err());
    }

    #[test]
    fn test_decode_rejects_range_past_toc() {
        let encoded = encode_toc(&[item("a", 100, 50, 5)]).unwrap();
        assert!(decode_toc(&encoded, 1, 120).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let mut encoded = encode_toc(&[item("ab", 100, 5, 5)]).unwrap();
        encoded[4] = 0xFF;
        assert!(matches!(
            decode_toc(&encoded, 1, 200),
            Err(ContainerError::InvalidName(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let mut encoded = encode_toc(&[item("a", 100, 5, 5)]).unwrap();
        encoded.extend_from_slice(&[0u8; 3]);
        assert_eq!(decode_toc(&encoded, 1, 200).unwrap().len(), 1);
    }

    #[test]
    fn test_ratio() {
        assert!((item("a", 100, 50, 100).ratio() - 0.5).abs() < f64::EPSILON);
        assert!(item("a", 100, 2, 0).ratio().abs() < f64::EPSILON);
    }
}
