//! Timestamp normalisation.
//!
//! Stored timestamps come in several shapes: ISO-8601 strings, Unix seconds,
//! Unix milliseconds, and the "reduced" integers of the pipe-delimited format
//! (seconds since [`COMPACT_EPOCH_SECS`]). Integers are told apart by
//! magnitude:
//!
//! | value              | interpretation                      |
//! |--------------------|-------------------------------------|
//! | `<= 0`             | invalid, normalised to `now`        |
//! | `< 10^9`           | seconds since 2024-01-01T00:00:00Z  |
//! | `< 10^12`          | Unix seconds                        |
//! | otherwise          | Unix milliseconds                   |
//!
//! Anything unparseable normalises to `now`; a bad timestamp never fails a
//! read.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// 2024-01-01T00:00:00Z, the origin of reduced timestamps.
pub const COMPACT_EPOCH_SECS: i64 = 1_704_067_200;

pub(crate) const UNIX_SECONDS_FLOOR: i64 = 1_000_000_000;
pub(crate) const UNIX_MILLIS_FLOOR: i64 = 1_000_000_000_000;

/// Interpret an integer timestamp of unknown scale.
pub fn normalize_integer(value: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = if value <= 0 {
        None
    } else if value < UNIX_SECONDS_FLOOR {
        DateTime::from_timestamp(COMPACT_EPOCH_SECS + value, 0)
    } else if value < UNIX_MILLIS_FLOOR {
        DateTime::from_timestamp(value, 0)
    } else {
        DateTime::from_timestamp_millis(value)
    };
    parsed.unwrap_or(now)
}

/// Interpret a textual timestamp: RFC 3339, a bare date, or an integer.
pub fn normalize_text(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }
    match text.parse::<i64>() {
        Ok(value) => normalize_integer(value, now),
        Err(_) => now,
    }
}

/// Interpret a JSON timestamp field of any shape.
pub fn normalize_json(value: &Value, now: DateTime<Utc>) -> DateTime<Utc> {
    match value {
        Value::String(text) => normalize_text(text, now),
        Value::Number(n) => match n.as_i64() {
            Some(i) => normalize_integer(i, now),
            None => match n.as_f64() {
                Some(f) if f.is_finite() && f > 0.0 && f < i64::MAX as f64 => {
                    normalize_integer(f as i64, now)
                }
                _ => now,
            },
        },
        _ => now,
    }
}

/// Seconds since [`COMPACT_EPOCH_SECS`], as the pipe-delimited format stores them.
pub fn reduced_timestamp(ts: DateTime<Utc>) -> i64 {
    ts.timestamp() - COMPACT_EPOCH_SECS
}
