//! Date and time utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Current UTC calendar date
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a date as the `YYYY-MM-DD` prefix used by provider timestamps
pub fn day_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a provider `played_at` timestamp
///
/// Accepts RFC 3339 (`2024-06-01T10:00:00.123Z`, with or without offset) and
/// naive `2024-06-01T10:00:00[.fff]`, which is taken to be UTC.
pub fn parse_played_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
