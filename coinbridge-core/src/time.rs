//! Clock and date formatting helpers.
//!
//! Timestamps are milliseconds since the Unix epoch throughout the crate.

use crate::error::{ParseError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Current time in milliseconds.
#[inline]
pub fn milliseconds() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time in whole seconds.
#[inline]
pub fn seconds() -> i64 {
    Utc::now().timestamp()
}

fn to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    if timestamp < 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(timestamp)
}

/// Formats a timestamp as `2024-01-01T12:00:00.000Z`.
///
/// Returns `None` for negative or out-of-range input.
///
/// ```rust
/// use coinbridge_core::time::iso8601;
///
/// assert_eq!(iso8601(1704110400000).as_deref(), Some("2024-01-01T12:00:00.000Z"));
/// assert_eq!(iso8601(-1), None);
/// ```
pub fn iso8601(timestamp: i64) -> Option<String> {
    to_datetime(timestamp).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Parses an ISO 8601 date into milliseconds.
///
/// Accepts RFC 3339 with any offset and the naive `T`/space separated forms
/// (interpreted as UTC). Returns `None` when nothing matches.
pub fn parse8601(datetime: &str) -> Option<i64> {
    let datetime = datetime.trim();
    if datetime.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime) {
        return Some(dt.timestamp_millis());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(datetime.trim_end_matches('Z'), format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
    })
}

/// Formats the date part of a timestamp, e.g. `2024-01-01` or `20240101`.
pub fn yyyymmdd(timestamp: i64, separator: &str) -> Result<String> {
    let dt = to_datetime(timestamp)
        .ok_or_else(|| ParseError::timestamp(format!("invalid timestamp {timestamp}")))?;
    Ok(dt
        .format(&format!("%Y{separator}%m{separator}%d"))
        .to_string())
}
