//! The publisher's local time zone.
//!
//! GIOŚ stamps readings with naive Warsaw wall-clock times, which are
//! `+01:00` in winter and `+02:00` in summer. [`SourceZone`] turns such
//! times into instants and instants back into local time using the zone's
//! daylight-saving rules.

use std::fmt;
use std::str::FromStr;

use chrono::{LocalResult, NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{ParseError, ParseResult};

/// Zone used to read naive wire timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceZone {
    /// An IANA zone with its daylight-saving transitions.
    Named(Tz),
    /// The same offset all year.
    Fixed(UtcOffset),
}

impl SourceZone {
    /// `Europe/Warsaw`, where the agency publishes from.
    pub const WARSAW: Self = Self::Named(chrono_tz::Europe::Warsaw);

    /// Offset in effect at `instant`.
    #[must_use]
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Fixed(offset) => *offset,
            Self::Named(tz) => chrono::DateTime::from_timestamp(instant.unix_timestamp(), 0)
                .map(|utc| tz.offset_from_utc_datetime(&utc.naive_utc()).fix())
                .and_then(|fixed| UtcOffset::from_whole_seconds(fixed.local_minus_utc()).ok())
                .unwrap_or(UtcOffset::UTC),
        }
    }

    /// `instant` expressed at the local offset.
    #[must_use]
    pub fn localize(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// Read a local wall-clock time as an instant.
    ///
    /// A time repeated when clocks go back resolves to the first occurrence.
    /// A time skipped when clocks go forward takes the offset after the jump.
    pub fn assume(&self, local: PrimitiveDateTime) -> ParseResult<OffsetDateTime> {
        let tz = match self {
            Self::Fixed(offset) => return Ok(local.assume_offset(*offset)),
            Self::Named(tz) => tz,
        };

        let naive = NaiveDate::from_ymd_opt(
            local.year(),
            u32::from(u8::from(local.month())),
            u32::from(local.day()),
        )
        .and_then(|date| {
            date.and_hms_opt(
                u32::from(local.hour()),
                u32::from(local.minute()),
                u32::from(local.second()),
            )
        })
        .ok_or_else(|| ParseError::InvalidTimestamp(local.to_string()))?;

        let seconds = match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.offset().fix().local_minus_utc(),
            LocalResult::Ambiguous(first, _) => first.offset().fix().local_minus_utc(),
            LocalResult::None => tz.offset_from_utc_datetime(&naive).fix().local_minus_utc(),
        };
        let offset = UtcOffset::from_whole_seconds(seconds)
            .map_err(|_| ParseError::InvalidTimestamp(local.to_string()))?;

        Ok(local.assume_offset(offset))
    }
}

impl Default for SourceZone {
    fn default() -> Self {
        Self::WARSAW
    }
}

impl From<UtcOffset> for SourceZone {
    fn from(offset: UtcOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl FromStr for SourceZone {
    type Err = ParseError;

    /// Accepts an IANA name (`Europe/Warsaw`) or a fixed offset (`+01:00`).
    fn from_str(s: &str) -> ParseResult<Self> {
        let trimmed = s.trim();
        if let Ok(tz) = trimmed.parse::<Tz>() {
            return Ok(Self::Named(tz));
        }
        UtcOffset::parse(
            trimmed,
            format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        )
        .map(Self::Fixed)
        .map_err(|_| ParseError::InvalidZone(s.to_string()))
    }
}

impl fmt::Display for SourceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(tz) => write!(f, "{}", tz.name()),
            Self::Fixed(offset) => {
                let (h, m, _) = offset.as_hms();
                let sign = if offset.is_negative() { '-' } else { '+' };
                write!(f, "{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
            }
        }
    }
}
