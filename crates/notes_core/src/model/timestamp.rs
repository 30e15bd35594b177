//! Lossless timestamp text encoding shared by the store and the cache.
//!
//! Timestamps are RFC 3339 in UTC with nanosecond precision and a `Z`
//! suffix, e.g. `2024-03-01T10:20:30.123456789Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp so that `parse_timestamp` returns it unchanged.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
