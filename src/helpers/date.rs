//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a front-matter date string into a calendar date
///
/// Accepts the usual front-matter spellings (`2024-01-15`, `2024/01/15`,
/// `2024-01-15 10:30:00`, RFC 3339). Any time of day is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 keeps the author's local calendar day
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    None
}

/// Format a date using a Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date(date: &NaiveDate, format: &str) -> String {
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format date in full format (like "January 15, 2024")
pub fn full_date(date: &NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each field
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
