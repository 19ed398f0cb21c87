//! Fixed-width textual creation timestamps
//!
//! TOC records store the creation time as 19 ASCII bytes,
//! `YYYY-MM-DD HH:MM:SS`, with no time zone and second precision.

use crate::container::constants::{TIMESTAMP_FORMAT, TIMESTAMP_LEN};
use crate::container::error::{ContainerError, ContainerResult};
use chrono::{NaiveDateTime, Timelike};

/// Format a timestamp into its 19-byte on-disk form
///
/// Sub-second precision is dropped. Years outside `0..=9999` do not fit the
/// fixed width and are rejected.
pub fn format_timestamp(value: &NaiveDateTime) -> ContainerResult<[u8; TIMESTAMP_LEN]> {
    let text = value.format(TIMESTAMP_FORMAT).to_string();
    text.as_bytes().try_into().map_err(|_| {
        ContainerError::InvalidTimestamp(format!(
            "{text:?} does not fit in {TIMESTAMP_LEN} bytes"
        ))
    })
}

/// Parse a 19-byte on-disk timestamp
pub fn parse_timestamp(bytes: &[u8; TIMESTAMP_LEN]) -> ContainerResult<NaiveDateTime> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ContainerError::InvalidTimestamp(format!("non-ASCII bytes {bytes:02x?}")))?;
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|e| ContainerError::InvalidTimestamp(format!("{text:?}: {e}")))
}

/// Drop sub-second precision, matching what a TOC round trip preserves
pub fn truncate_to_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}
