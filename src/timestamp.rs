//! ISO-8601 timestamp parsing and formatting
//!
//! The backend stores every advertisement timestamp as an ISO-8601 string
//! with an explicit UTC offset. The same pure functions are used to decode
//! backend documents, to encode the public feed, to write range boundaries
//! into outbound queries and to read token expiry dates.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

/// Error returned when a string is not a usable timestamp
#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{value}' is not an ISO-8601 timestamp with offset")]
pub struct TimestampError {
    pub value: String,
}

/// Parses an ISO-8601 / RFC 3339 timestamp, keeping its original offset
///
/// # Example
///
/// ```
/// # use public_feed::timestamp::parse_timestamp;
/// let ts = parse_timestamp("2018-03-01T12:30:00+01:00").unwrap();
/// assert_eq!(ts.offset().local_minus_utc(), 3600);
/// ```
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|_| TimestampError {
        value: value.to_string(),
    })
}

/// Parses either a full timestamp or a plain `YYYY-MM-DD` date
///
/// A plain date is read as midnight UTC at the start of that day.
pub fn parse_boundary(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let trimmed = value.trim();
    if let Ok(ts) = parse_timestamp(trimmed) {
        return Ok(ts);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| TimestampError {
            value: value.to_string(),
        })
}

/// Formats a timestamp as RFC 3339, preserving its offset
///
/// Sub-second precision is only written when present.
pub fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// serde adapter: `#[serde(deserialize_with = "timestamp::deserialize")]`
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// serde adapter: `#[serde(serialize_with = "timestamp::serialize")]`
pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}
