//! Normalization of each source's time representation to UTC instants.

use crate::constants::DELIVERY_TIME_FORMAT;
use crate::error::{Result, RouteError};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Offset-qualified layouts tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
];

/// Layouts without any offset; read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Character window of a sniffers `time_zone` value holding the UTC offset,
/// e.g. `"UTC+01:00"` -> `"01:00"`, `"GMT+0100"` -> `"0100"`.
const ZONE_OFFSET_START: usize = 4;
const ZONE_OFFSET_LEN: usize = 5;

/// Parse a free-form date-time carrying its own offset (sentinels `time`).
pub fn parse_free_form(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(trimmed, format) {
            return Ok(t.with_timezone(&Utc));
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(RouteError::parse(
        "date-time",
        format!("unrecognised date-time '{value}'"),
    ))
}

/// Parse a strict ISO-8601 offset-qualified instant (loopholes times).
pub fn parse_iso8601(value: &str) -> Result<DateTime<Utc>> {
    parse_offset_instant(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RouteError::parse("ISO-8601 time", format!("'{value}': {e}")))
}

/// Extract the offset substring from a sniffers `time_zone` value.
///
/// Takes the characters at positions 4..=8, clipped to the value's length.
/// The caller is responsible for the value having that fixed layout.
pub fn zone_offset_window(time_zone: &str) -> &str {
    let mut indices = time_zone
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(time_zone.len()));
    let start = indices.nth(ZONE_OFFSET_START).unwrap_or(time_zone.len());
    let end = indices.nth(ZONE_OFFSET_LEN - 1).unwrap_or(time_zone.len());
    &time_zone[start..end]
}

/// Combine a local ISO-8601 timestamp with the offset carried in a
/// `time_zone` code (sniffers `time` + `time_zone`).
///
/// The offset is always joined with a literal `+`; zones west of UTC are not
/// representable by this layout.
pub fn parse_local_with_zone(timestamp: &str, time_zone: &str) -> Result<DateTime<Utc>> {
    let window = zone_offset_window(time_zone);
    let digits: String = window.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RouteError::parse(
            "time zone",
            format!("'{time_zone}' has no HHMM offset at characters 4..8"),
        ));
    }

    let joined = format!("{}+{}:{}", timestamp.trim(), &digits[..2], &digits[2..]);
    parse_offset_instant(&joined)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RouteError::parse("local time with zone", format!("'{joined}': {e}")))
}

/// Parse a millisecond duration field
pub fn parse_duration_ms(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| RouteError::parse("duration in milliseconds", format!("'{value}': {e}")))
}

/// `start` plus `duration_ms / 1000` seconds, exact to the millisecond.
pub fn end_after_duration(start: DateTime<Utc>, duration_ms: i64) -> Result<DateTime<Utc>> {
    Duration::try_milliseconds(duration_ms)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| {
            RouteError::parse(
                "duration in milliseconds",
                format!("{duration_ms}ms after {start} is out of range"),
            )
        })
}

/// Render an instant in the collector's UTC wire format
pub fn format_utc(t: &DateTime<Utc>) -> String {
    t.format(DELIVERY_TIME_FORMAT).to_string()
}

fn parse_offset_instant(value: &str) -> std::result::Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
}
