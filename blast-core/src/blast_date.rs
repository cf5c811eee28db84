//! Date normalization for the two upstream record feeds.
//!
//! The uploaded CSV exports write dates as `MM/DD/YYYY`, the JSON feed as
//! `DD-MM-YYYY`. Each form has its own parse path so a malformed value fails
//! the same way regardless of which feed it came from.

use chrono::{Datelike, NaiveDate};

/// Date format used by uploaded CSV exports: "MM/DD/YYYY"
pub const SLASH_DATE_FORMAT: &str = "%m/%d/%Y";

/// Date format used by the JSON feed: "DD-MM-YYYY"
pub const HYPHEN_DATE_FORMAT: &str = "%d-%m-%Y";

/// Normalize a raw date string from either feed.
///
/// The separator decides the parse path: `/` means `MM/DD/YYYY`, `-` means
/// `DD-MM-YYYY`. Anything else, or a value that fails its path, is `None`.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('/') {
        parse_slash_date(raw)
    } else if raw.contains('-') {
        parse_hyphen_date(raw)
    } else {
        None
    }
}

/// Parse `MM/DD/YYYY`.
pub fn parse_slash_date(raw: &str) -> Option<NaiveDate> {
    parse_with(raw, '/', SLASH_DATE_FORMAT)
}

/// Parse `DD-MM-YYYY`.
pub fn parse_hyphen_date(raw: &str) -> Option<NaiveDate> {
    parse_with(raw, '-', HYPHEN_DATE_FORMAT)
}

fn parse_with(raw: &str, separator: char, format: &str) -> Option<NaiveDate> {
    let components: Vec<&str> = raw.split(separator).collect();
    if components.len() != 3 {
        return None;
    }
    // chrono tolerates signs and padding; the feeds never carry either, and a
    // zero component is how both of them spell "unknown".
    for component in &components {
        if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if component.chars().all(|c| c == '0') {
            return None;
        }
    }
    let date = NaiveDate::parse_from_str(raw, format).ok()?;
    if date.year() <= 0 {
        return None;
    }
    Some(date)
}
