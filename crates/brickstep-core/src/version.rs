//! Dotted-integer step identifiers (e.g. `2.10.3`)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Step identifier is empty")]
    Empty,
    #[error("Invalid segment '{segment}' in step identifier '{input}'")]
    InvalidSegment { segment: String, input: String },
}

/// Step identifier as an ordered sequence of non-negative integers
///
/// Ordering is lexicographic over the segments. When one identifier is a
/// prefix of the other the shorter one sorts first, so `2.1 < 2.1.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId(Vec<u32>);

impl VersionId {
    /// Build an identifier from raw segments
    pub fn new(segments: Vec<u32>) -> Self {
        Self(segments)
    }

    /// Parse a dotted string such as `"1.5"`
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        trimmed
            .split('.')
            .map(|segment| {
                parse_segment(segment).ok_or_else(|| ParseError::InvalidSegment {
                    segment: segment.to_string(),
                    input: s.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Last segment, if any
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

/// Parse a single non-negative integer segment (digits only, no sign)
pub(crate) fn parse_segment(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl FromStr for VersionId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl From<Vec<u32>> for VersionId {
    fn from(segments: Vec<u32>) -> Self {
        Self(segments)
    }
}

impl Serialize for VersionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
