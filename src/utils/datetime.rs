use chrono::{DateTime, NaiveDate, NaiveDateTime, ParseError};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 hire timestamp. Offsets are normalized to UTC and
/// dropped; a bare date means midnight.
pub fn parse_hire_datetime(value: &str) -> Result<NaiveDateTime, ParseError> {
    let value = value.trim();

    let mut last_err = match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => return Ok(parsed.naive_utc()),
        Err(err) => err,
    };

    for format in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(value, format) {
            Ok(parsed) => return Ok(parsed),
            Err(err) => last_err = err,
        }
    }

    if let Some(parsed) = parse_hour_only(value) {
        return Ok(parsed);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| last_err)?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// `YYYY-MM-DDTHH` or `YYYY-MM-DD HH`.
fn parse_hour_only(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 13 || !matches!(value.as_bytes()[10], b'T' | b' ') {
        return None;
    }
    let date = NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()?;
    let hour = value.get(11..)?;
    if !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    date.and_hms_opt(hour.parse().ok()?, 0, 0)
}
