//! Conversion of raw source records into canonical contests. Normalization
//! is pure: a record either passes every validation rule or is returned as a
//! [`Rejection`], and the caller decides what to count or log.

use crate::platform::{display_name_for_resource, Platform};
use crate::timeparse::{self, TimeParseError};
use crate::types::{Contest, RawRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 10_080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("required field {0:?} is missing or empty")]
    MissingField(&'static str),
    #[error("field {field:?} has an unparseable timestamp: {source}")]
    UnparseableTime {
        field: &'static str,
        source: TimeParseError,
    },
    #[error("start time is not before end time")]
    StartNotBeforeEnd,
    #[error("duration of {0} minutes is outside the accepted range")]
    DurationOutOfRange(i64),
    #[error("contest does not start in the future")]
    NotInFuture,
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, Rejection> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(Rejection::MissingField(field)),
    }
}

/// Validates one raw record and produces a canonical [`Contest`].
///
/// Rules are applied in order: required fields, parseable times, start
/// before end, duration within bounds, start strictly in the future. A past
/// or ongoing contest is dropped here, not archived.
pub fn normalize(
    raw: &RawRecord,
    platform: Platform,
    now: DateTime<Utc>,
) -> Result<Contest, Rejection> {
    let name = required(&raw.name, "name")?;
    let url = required(&raw.url, "url")?;
    let start_text = required(&raw.start, "start")?;
    let end_text = required(&raw.end, "end")?;

    let start_time = timeparse::parse_instant(start_text, now)
        .map_err(|source| Rejection::UnparseableTime { field: "start", source })?;
    let end_time = timeparse::parse_instant(end_text, now)
        .map_err(|source| Rejection::UnparseableTime { field: "end", source })?;

    if start_time >= end_time {
        return Err(Rejection::StartNotBeforeEnd);
    }

    let duration_minutes = (end_time - start_time).num_minutes();
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(Rejection::DurationOutOfRange(duration_minutes));
    }

    if start_time <= now {
        return Err(Rejection::NotInFuture);
    }

    // Cross-check the upstream resource identifier against the platform this
    // record was fetched for; a mismatch is worth a warning but not a drop.
    if let Some(resource) = raw.resource.as_deref() {
        let resolved = display_name_for_resource(resource);
        if resolved != platform.as_str() {
            tracing::warn!(
                platform = platform.as_str(),
                resource,
                "record resource does not match the platform it was fetched for"
            );
        }
    }

    Ok(Contest {
        name: name.to_string(),
        platform,
        url: url.to_string(),
        start_time,
        end_time,
        duration_minutes,
        description: raw
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from),
        fetched_at: now,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2029, 12, 1, 0, 0, 0).unwrap()
    }

    fn sample_record() -> RawRecord {
        RawRecord {
            name: Some(String::from("Div 2 Round")),
            url: Some(String::from("/c/1")),
            start: Some(String::from("2030-01-01T10:00:00")),
            end: Some(String::from("2030-01-01T12:00:00")),
            resource: Some(String::from("codeforces.com")),
            description: None,
        }
    }

    #[test]
    fn test_valid_record_normalizes() {
        let contest = normalize(&sample_record(), Platform::Codeforces, fixed_now()).unwrap();
        assert_eq!(contest.name, "Div 2 Round");
        assert_eq!(contest.platform, Platform::Codeforces);
        assert_eq!(
            contest.start_time,
            Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            contest.end_time,
            Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(contest.duration_minutes, 120);
        assert_eq!(contest.fetched_at, fixed_now());
    }

    #[test]
    fn test_missing_and_empty_fields_are_rejected() {
        let mut raw = sample_record();
        raw.name = None;
        assert_eq!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::MissingField("name")
        );

        let mut raw = sample_record();
        raw.url = Some(String::from("   "));
        assert_eq!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::MissingField("url")
        );
    }

    #[test]
    fn test_unparseable_time_is_rejected() {
        let mut raw = sample_record();
        raw.start = Some(String::from("whenever"));
        assert!(matches!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::UnparseableTime { field: "start", .. }
        ));
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut raw = sample_record();
        raw.start = Some(String::from("2030-01-01T12:00:00"));
        raw.end = Some(String::from("2030-01-01T10:00:00"));
        assert_eq!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::StartNotBeforeEnd
        );
    }

    #[test]
    fn test_duration_bounds() {
        let mut raw = sample_record();
        raw.end = Some(String::from("2030-01-01T10:05:00"));
        assert_eq!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::DurationOutOfRange(5)
        );

        let mut raw = sample_record();
        raw.end = Some(String::from("2030-01-20T10:00:00"));
        assert!(matches!(
            normalize(&raw, Platform::Codeforces, fixed_now()).unwrap_err(),
            Rejection::DurationOutOfRange(_)
        ));
    }

    #[test]
    fn test_past_contest_is_dropped() {
        let raw = sample_record();
        let late_now = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            normalize(&raw, Platform::Codeforces, late_now).unwrap_err(),
            Rejection::NotInFuture
        );
    }

    #[test]
    fn test_blank_description_becomes_none() {
        let mut raw = sample_record();
        raw.description = Some(String::from("  "));
        let contest = normalize(&raw, Platform::Codeforces, fixed_now()).unwrap();
        assert_eq!(contest.description, None);
    }
}
