//! Capture-time text encoding
//!
//! Capture times are stored as fixed-width UTC text with microsecond
//! precision so that lexical comparison in SQL matches time order.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::constants::CAPTURED_AT_FORMAT;

/// Render a capture time, e.g. `2024-01-02 09:30:00.000000`
pub fn format_captured_at(at: &DateTime<Utc>) -> String {
    at.format(CAPTURED_AT_FORMAT).to_string()
}

/// Parse a stored capture time
///
/// Also accepts a missing fractional part or an ISO `T` separator, which
/// rows written by other tools may use.
pub fn parse_captured_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc)))
}

/// Drop sub-microsecond precision the text encoding cannot carry
pub fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}
