//! Normalized document timestamps.
//!
//! The hosted store delivers timestamps in two shapes: RFC 3339 strings
//! (written by clients as `new Date().toISOString()` equivalents) and server
//! timestamp objects carrying `seconds`/`nanos` fields. Both normalize into a
//! single [`Timestamp`] at ingest so the rest of the crate never sees the
//! duality. Serialization always emits the RFC 3339 string form.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_admin::timestamp::Timestamp;
//!
//! let iso: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00.000Z\"").unwrap();
//! let obj: Timestamp = serde_json::from_str("{\"seconds\":1705314600,\"nanos\":0}").unwrap();
//! assert_eq!(iso, obj);
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A point in time, normalized to UTC.
///
/// Wraps a [`chrono::DateTime<Utc>`]; ordering, equality and hashing follow
/// the instant. The default value is the Unix epoch, used when a document
/// omits a timestamp field entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parses an RFC 3339 string (`2024-01-15T10:30:00.000Z`).
    pub fn from_rfc3339(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|_| Error::validation(format!("invalid timestamp: {s}")))
    }

    /// Builds a timestamp from a server `seconds`/`nanos` pair.
    ///
    /// Out-of-range values clamp to the epoch rather than failing; the store
    /// never produces them in practice.
    pub fn from_server(seconds: i64, nanos: u32) -> Self {
        match Utc.timestamp_opt(seconds, nanos).single() {
            Some(dt) => Self(dt),
            None => Self(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    /// Renders the RFC 3339 string form with millisecond precision, matching
    /// the shape clients write (`2024-01-15T10:30:00.000Z`).
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Milliseconds since the Unix epoch. Used for unique storage path
    /// prefixes.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The wrapped instant.
    pub fn date_time(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// Inbound wire forms. The export spelling (`_seconds`/`_nanoseconds`) shows
/// up in JSON dumps of the same store.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Iso(String),
    Server {
        seconds: i64,
        #[serde(default, alias = "nanoseconds")]
        nanos: u32,
    },
    Export {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(default, rename = "_nanoseconds")]
        nanos: u32,
    },
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Iso(s) => Self::from_rfc3339(&s).map_err(serde::de::Error::custom),
            RawTimestamp::Server { seconds, nanos } | RawTimestamp::Export { seconds, nanos } => {
                Ok(Self::from_server(seconds, nanos))
            }
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

/// Lenient deserializer for optional timestamp fields that may hold
/// placeholder strings (`"N/A"`) or locale-formatted dates from older
/// documents. Anything unparseable becomes `None`.
pub fn lenient_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Timestamp>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Ts(Timestamp),
        Other(IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Ts(ts)) => Some(ts),
        _ => None,
    })
}
