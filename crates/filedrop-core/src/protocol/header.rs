//! Frame header: the JSON metadata that precedes every file payload.
//!
//! On the wire the header looks like this (key order is fixed):
//!
//! ```json
//! {"name":"report.pdf","lastModified":"2024-03-01T12:30:00.250Z","mimeType":"application/pdf"}
//! ```
//!
//! `lastModified` is an RFC 3339 timestamp in UTC with exactly three
//! fractional digits and a `Z` suffix, the same text a browser produces for a
//! `Date`.  Because the wire format carries milliseconds, [`FrameHeader::new`]
//! truncates the timestamp to millisecond precision so a header always
//! survives an encode/decode round trip unchanged.

use std::time::SystemTime;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one file inside a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameHeader {
    /// Display name of the file (no directory components expected).
    pub name: String,
    /// Last-modified instant of the file.
    #[serde(with = "rfc3339_millis")]
    pub last_modified: DateTime<Utc>,
    /// Declared media type; empty when unknown.
    pub mime_type: String,
}

impl FrameHeader {
    /// Builds a header, truncating `last_modified` to whole milliseconds.
    pub fn new(
        name: impl Into<String>,
        last_modified: DateTime<Utc>,
        mime_type: impl Into<String>,
    ) -> Self {
        let last_modified = last_modified
            .duration_trunc(TimeDelta::milliseconds(1))
            .unwrap_or(last_modified);
        Self {
            name: name.into(),
            last_modified,
            mime_type: mime_type.into(),
        }
    }

    /// Builds a header from a file-system timestamp.
    pub fn from_system_time(
        name: impl Into<String>,
        last_modified: SystemTime,
        mime_type: impl Into<String>,
    ) -> Self {
        Self::new(name, DateTime::<Utc>::from(last_modified), mime_type)
    }
}

/// Serde adapter writing `DateTime<Utc>` as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
