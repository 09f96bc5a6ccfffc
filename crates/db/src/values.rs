//! Boolean and date spellings accepted from users
//!
//! Query strings, form posts, API bodies and command-line flags all go
//! through these functions.

use chrono::NaiveDate;

/// Format of every user-supplied date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a boolean-like value.
///
/// Case-insensitive, surrounding whitespace ignored: `true`, `1`, `yes`,
/// `on` are true; `false`, `0`, `no`, `off` are false; anything else is
/// `None`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Interpret a submitted checkbox.
///
/// Absent, blank or a false spelling is unchecked; any other value is
/// checked.
pub fn parse_checkbox(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") => false,
        Some(value) => parse_bool(value).unwrap_or(true),
    }
}
