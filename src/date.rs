//! Inspection date formatting.
//!
//! Upstream records carry dates as epoch seconds, epoch milliseconds, ISO
//! timestamps or a handful of human formats. Everything is rendered as
//! `"March 05, 2024"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DISPLAY_FORMAT: &str = "%B %d, %Y";

/// Epoch values with more digits than this are milliseconds.
const SECONDS_DIGITS: usize = 10;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Format a raw date value for display, or `None` if it cannot be parsed.
pub fn format_date(raw: &str) -> Option<String> {
    parse_date(raw.trim()).map(|d| d.format(DISPLAY_FORMAT).to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    if let Some(date) = parse_epoch(raw) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        })
}

fn parse_epoch(raw: &str) -> Option<NaiveDate> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let value: i64 = whole.parse().ok()?;
    let dt = if whole.len() > SECONDS_DIGITS {
        DateTime::from_timestamp_millis(value)?
    } else {
        DateTime::from_timestamp(value, 0)?
    };
    Some(dt.date_naive())
}
