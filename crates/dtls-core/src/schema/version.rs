//! DTCG schema versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Canonical URL of the draft schema.
pub const DRAFT_SCHEMA_URL: &str = "https://www.designtokens.org/schemas/draft.json";

/// Canonical URL of the 2025.10 schema.
pub const V2025_10_SCHEMA_URL: &str = "https://www.designtokens.org/schemas/2025.10.json";

/// A DTCG schema version.
///
/// `as_str`/[`FromStr`] and [`url`](SchemaVersion::url)/[`from_url`](SchemaVersion::from_url)
/// round-trip for every known version.
///
/// ```rust
/// use dtls_core::SchemaVersion;
///
/// let v = SchemaVersion::from_url("https://www.designtokens.org/schemas/2025.10.json").unwrap();
/// assert_eq!(v, SchemaVersion::V2025_10);
/// assert_eq!(v.as_str().parse::<SchemaVersion>().unwrap(), v);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SchemaVersion {
    #[default]
    Unknown,
    Draft,
    V2025_10,
}

impl SchemaVersion {
    /// Every version that maps to a real schema.
    pub const KNOWN: [SchemaVersion; 2] = [SchemaVersion::Draft, SchemaVersion::V2025_10];

    /// Stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::Unknown => "unknown",
            SchemaVersion::Draft => "draft",
            SchemaVersion::V2025_10 => "v2025_10",
        }
    }

    /// Canonical schema URL. Empty for [`SchemaVersion::Unknown`].
    pub fn url(&self) -> &'static str {
        match self {
            SchemaVersion::Unknown => "",
            SchemaVersion::Draft => DRAFT_SCHEMA_URL,
            SchemaVersion::V2025_10 => V2025_10_SCHEMA_URL,
        }
    }

    /// Looks up a version by its exact canonical URL.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        Self::KNOWN
            .into_iter()
            .find(|v| v.url() == url)
            .ok_or_else(|| Error::invalid_schema("", url, "unrecognized schema URL"))
    }

    /// Accepts either a string identifier or a canonical URL.
    pub fn from_identifier(s: &str) -> Result<Self, Error> {
        s.parse().or_else(|_| Self::from_url(s))
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::invalid_schema("", s, "unrecognized schema version"))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == SchemaVersion::Unknown.as_str() {
            return Ok(SchemaVersion::Unknown);
        }
        Self::from_identifier(&s)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.as_str().to_string()
    }
}
