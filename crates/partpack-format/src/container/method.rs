//! Compression method tag

use crate::container::error::{ContainerError, ContainerResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Compression applied to every part of a container
///
/// The discriminants are the on-disk tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum CompressionMethod {
    /// No method chosen; treated as Deflate
    None = 0,
    /// Raw Deflate stream (RFC 1951)
    #[default]
    Deflate = 1,
    /// GZip member (RFC 1952)
    GZip = 2,
}

impl CompressionMethod {
    /// On-disk tag value
    pub fn as_tag(self) -> u32 {
        self as u32
    }

    /// Parse an on-disk tag value
    pub fn from_tag(tag: u32) -> ContainerResult<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Deflate),
            2 => Ok(Self::GZip),
            other => Err(ContainerError::UnsupportedMethod(other)),
        }
    }

    /// Method actually used for encoding and decoding
    ///
    /// `None` has no codec of its own and always maps to Deflate.
    pub fn effective(self) -> Self {
        match self {
            Self::None => Self::Deflate,
            other => other,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::GZip => "gzip",
        };
        f.write_str(name)
    }
}

impl FromStr for CompressionMethod {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "deflate" => Ok(Self::Deflate),
            "gzip" | "gz" => Ok(Self::GZip),
            other => Err(ContainerError::InvalidFormat(format!(
                "unknown compression method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values_are_stable() {
        assert_eq!(CompressionMethod::None.as_tag(), 0);
        assert_eq!(CompressionMethod::Deflate.as_tag(), 1);
        assert_eq!(CompressionMethod::GZip.as_tag(), 2);

        for method in [
            CompressionMethod::None,
            CompressionMethod::Deflate,
            CompressionMethod::GZip,
        ] {
            assert_eq!(CompressionMethod::from_tag(method.as_tag()).unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!(matches!(
            CompressionMethod::from_tag(7),
            Err(ContainerError::UnsupportedMethod(7))
        ));
    }

    #[test]
    fn test_none_coerces_to_deflate() {
        assert_eq!(
            CompressionMethod::None.effective(),
            CompressionMethod::Deflate
        );
        assert_eq!(CompressionMethod::GZip.effective(), CompressionMethod::GZip);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "GZip".parse::<CompressionMethod>().unwrap(),
            CompressionMethod::GZip
        );
        assert_eq!(
            "deflate".parse::<CompressionMethod>().unwrap(),
            CompressionMethod::Deflate
        );
        assert!("lz4".parse::<CompressionMethod>().is_err());
    }
}
