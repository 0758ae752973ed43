//! Timestamp and duration parsing for the formats observed across the
//! upstream sources. Formats are tried in a fixed priority order and the
//! first success wins; total failure is a typed error, never a guessed
//! instant.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("unrecognized timestamp format: {0:?}")]
    UnrecognizedTimestamp(String),
    #[error("unrecognized duration format: {0:?}")]
    UnrecognizedDuration(String),
}

// Zoneless formats, assumed UTC. Tried after the offset-carrying ones.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d %b %Y, %H:%M",
];

static MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([AP])\.?M\.?$").unwrap());
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:starts\s+in\s+|in\s+)?(\d+)\s*(day|hour|minute|min)s?$").unwrap()
});
static HOURS_MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3}):(\d{2})$").unwrap());
static DURATION_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*(hour|hr|h|minute|min|m)s?$").unwrap());

/// Parses one timestamp string against every known source format.
///
/// `now` anchors the relative forms (12-hour clock times and phrases like
/// "starts in 2 days") and is injected so tests stay deterministic.
pub fn parse_instant(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TimeParseError::UnrecognizedTimestamp(text.to_string()));
    }

    // 1. ISO-8601 / RFC 3339 with an explicit offset or trailing Z.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // 2. Space-separated datetime with a compact offset ("+0900"), as seen
    //    on AtCoder's contest table.
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    // 3. Zoneless variants, interpreted as UTC.
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&parsed));
        }
    }
    // 4. Epoch seconds.
    if text.chars().all(|c| c.is_ascii_digit()) {
        if let Some(parsed) = text
            .parse::<i64>()
            .ok()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
        {
            return Ok(parsed);
        }
    }
    // 5. 12-hour clock time, resolved to its next occurrence after `now`.
    if let Some(captures) = MERIDIEM.captures(text) {
        let hour: u32 = captures[1]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedTimestamp(text.to_string()))?;
        let minute: u32 = captures[2]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedTimestamp(text.to_string()))?;
        if hour >= 1 && hour <= 12 && minute < 60 {
            let hour24 = match (captures[3].to_uppercase().as_str(), hour) {
                ("A", 12) => 0,
                ("A", h) => h,
                ("P", 12) => 12,
                (_, h) => h + 12,
            };
            let candidate = now
                .date_naive()
                .and_hms_opt(hour24, minute, 0)
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or_else(|| TimeParseError::UnrecognizedTimestamp(text.to_string()))?;
            return Ok(if candidate > now {
                candidate
            } else {
                candidate + Duration::days(1)
            });
        }
    }
    // 6. Relative phrases: "starts in 2 days", "in 3 hours", "90 minutes".
    //    Absurd amounts overflow the offset arithmetic; that is a rejection,
    //    not a panic.
    if let Some(captures) = RELATIVE.captures(text) {
        let amount: i64 = captures[1]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedTimestamp(text.to_string()))?;
        let offset = match captures[2].to_lowercase().as_str() {
            "day" => Duration::try_days(amount),
            "hour" => Duration::try_hours(amount),
            _ => Duration::try_minutes(amount),
        };
        return offset
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| TimeParseError::UnrecognizedTimestamp(text.to_string()));
    }

    Err(TimeParseError::UnrecognizedTimestamp(text.to_string()))
}

/// Parses a duration string into whole minutes. Accepts "2 hours",
/// "120 minutes", "90 min", "01:40" (hours:minutes) and bare integers
/// (minutes). Same fail-fast contract as [`parse_instant`].
pub fn parse_duration_minutes(text: &str) -> Result<i64, TimeParseError> {
    let text = text.trim();

    if let Some(captures) = HOURS_MINUTES.captures(text) {
        let hours: i64 = captures[1]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedDuration(text.to_string()))?;
        let minutes: i64 = captures[2]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedDuration(text.to_string()))?;
        if minutes < 60 {
            return Ok(hours * 60 + minutes);
        }
    }
    if let Some(captures) = DURATION_UNIT.captures(text) {
        let amount: i64 = captures[1]
            .parse()
            .map_err(|_| TimeParseError::UnrecognizedDuration(text.to_string()))?;
        let minutes = match captures[2].to_lowercase().chars().next() {
            Some('h') => amount.checked_mul(60),
            _ => Some(amount),
        };
        return minutes.ok_or_else(|| TimeParseError::UnrecognizedDuration(text.to_string()));
    }
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(minutes) = text.parse::<i64>() {
            return Ok(minutes);
        }
    }

    Err(TimeParseError::UnrecognizedDuration(text.to_string()))
}
