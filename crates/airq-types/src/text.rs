//! Parsing of textual wire values.
//!
//! The agency publishes every leaf value as text. These helpers turn that text
//! into numbers and timestamps and recognise the "no reading" convention.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::error::{ParseError, ParseResult};
use crate::zone::SourceZone;

/// Parse a measured value.
///
/// Empty text and the literal `null` are the absence of a reading and map to
/// `Ok(None)`. A decimal comma is accepted. Non-finite numbers are rejected.
///
/// # Examples
///
/// ```
/// use airq_types::text::parse_value;
///
/// assert_eq!(parse_value("12.75"), Ok(Some(12.75)));
/// assert_eq!(parse_value(" 3,5 "), Ok(Some(3.5)));
/// assert_eq!(parse_value(""), Ok(None));
/// assert_eq!(parse_value("null"), Ok(None));
/// assert!(parse_value("n/a").is_err());
/// ```
pub fn parse_value(text: &str) -> ParseResult<Option<f64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    parse_number(trimmed).map(Some)
}

/// Parse a number that must be present.
pub fn parse_number(text: &str) -> ParseResult<f64> {
    let trimmed = text.trim();
    let normalized;
    let candidate = if trimmed.contains(',') && !trimmed.contains('.') {
        normalized = trimmed.replace(',', ".");
        normalized.as_str()
    } else {
        trimmed
    };

    match candidate.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber(text.to_string())),
    }
}

/// Parse an integer identifier.
pub fn parse_id(text: &str) -> ParseResult<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

/// Parse a wire timestamp.
///
/// RFC 3339 timestamps keep their own offset. Naive timestamps
/// (`YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM`,
/// `YYYY-MM-DD`) are wall-clock times in `zone`, the publisher's local time.
///
/// # Examples
///
/// ```
/// use airq_types::SourceZone;
/// use airq_types::text::parse_timestamp;
/// use time::macros::datetime;
///
/// let winter = parse_timestamp("2024-03-01 13:00:00", SourceZone::WARSAW).unwrap();
/// assert_eq!(winter, datetime!(2024-03-01 12:00 UTC));
///
/// let summer = parse_timestamp("2024-07-01 13:00:00", SourceZone::WARSAW).unwrap();
/// assert_eq!(summer, datetime!(2024-07-01 11:00 UTC));
/// ```
pub fn parse_timestamp(text: &str, zone: SourceZone) -> ParseResult<OffsetDateTime> {
    let trimmed = text.trim();

    if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(ts);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(naive) = PrimitiveDateTime::parse(trimmed, format) {
            return zone.assume(naive);
        }
    }

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return zone.assume(date.midnight());
    }

    Err(ParseError::InvalidTimestamp(text.to_string()))
}
