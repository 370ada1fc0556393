//! History item identifiers: snapshot ordinal or stable GUID.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Addresses a single clipboard history entry.
///
/// `ByIndex` is only meaningful against the snapshot it is resolved in;
/// `ById` survives across fetches for as long as the entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    ByIndex(i32),
    ById(Uuid),
}

/// Text that is neither an `i32` nor a GUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier '{0}': expected an index or a GUID")]
pub struct IdentifierParseError(pub String);

impl Identifier {
    /// Parse `text` as an index first, then as a GUID.
    ///
    /// Negative indexes parse successfully; bounds are checked against
    /// the snapshot at resolution time. GUIDs are accepted hyphenated,
    /// braced, or as 32 bare hex digits.
    pub fn parse(text: &str) -> Result<Self, IdentifierParseError> {
        if let Ok(index) = text.parse::<i32>() {
            return Ok(Self::ByIndex(index));
        }
        Uuid::parse_str(text)
            .map(Self::ById)
            .map_err(|_| IdentifierParseError(text.to_string()))
    }
}

impl FromStr for Identifier {
    type Err = IdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByIndex(index) => write!(f, "{index}"),
            Self::ById(id) => write!(f, "{id}"),
        }
    }
}

/// Canonical textual form of a history item id.
///
/// Native surfaces and the pinned side-channel spell GUIDs differently
/// (braces, upper case). Anything that parses as a GUID is rendered
/// lowercase hyphenated; other ids pass through unchanged.
pub fn normalize_id(raw: &str) -> String {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => id.to_string(),
        Err(_) => raw.to_string(),
    }
}
