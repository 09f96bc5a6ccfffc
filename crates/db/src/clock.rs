//! Evaluation-time calendar date
//!
//! "Overdue" compares due dates against today's date in the server's
//! configured time zone (`UTC`, `local`, a fixed `±HH:MM` offset or an IANA
//! name such as `Europe/Paris`). The zone is configuration; the date is computed at
//! the request boundary and passed into the filtering code explicitly.

use chrono::{FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Time zone used to determine the current calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    /// Coordinated Universal Time
    #[default]
    Utc,
    /// The host's local time zone
    Local,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
    /// An IANA zone, following its daylight saving rules
    Named(Tz),
}

impl TimeZone {
    /// The current calendar date in this zone
    pub fn today(&self) -> NaiveDate {
        match self {
            TimeZone::Utc => Utc::now().date_naive(),
            TimeZone::Local => Local::now().date_naive(),
            TimeZone::Fixed(offset) => Utc::now().with_timezone(offset).date_naive(),
            TimeZone::Named(tz) => Utc::now().with_timezone(tz).date_naive(),
        }
    }
}

/// Error returned when a time zone setting cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid time zone '{0}'. Valid values: UTC, local, an offset like +02:00, or an IANA name like Europe/Paris"
)]
pub struct ParseTimeZoneError(String);

impl FromStr for TimeZone {
    type Err = ParseTimeZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" => return Ok(TimeZone::Utc),
            "local" => return Ok(TimeZone::Local),
            _ => {}
        }
        if let Some(offset) = parse_offset(trimmed) {
            return Ok(TimeZone::Fixed(offset));
        }
        trimmed
            .parse::<Tz>()
            .map(TimeZone::Named)
            .map_err(|_| ParseTimeZoneError(s.to_string()))
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZone::Utc => write!(f, "UTC"),
            TimeZone::Local => write!(f, "local"),
            TimeZone::Fixed(offset) => write!(f, "{}", offset),
            TimeZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
