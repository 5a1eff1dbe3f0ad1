//! Display formatting for durations, dates, money and slugs.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::types::Timestamp;

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Placeholder shown for missing values.
pub const MISSING: &str = "-";

/// `m:ss`; zero or missing renders as `-`.
pub fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        None | Some(0) => MISSING.to_string(),
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
    }
}

/// Lowercase, runs of non-alphanumerics collapsed to `-`, no leading or
/// trailing dash.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// USD from integer cents, e.g. `$19.00`.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Parse a PocketBase timestamp (`2024-05-01 10:00:00.123Z`) or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `May 1, 2024`, or `-` when unparseable.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|ts| ts.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Coarse relative time: seconds, minutes, hours, then days.
pub fn format_relative(ts: Timestamp, now: Timestamp) -> String {
    let diff = (ts - now).num_seconds();
    let abs = diff.unsigned_abs();
    let (value, unit) = if abs < 60 {
        (abs, "second")
    } else if abs < 3_600 {
        ((abs + 30) / 60, "minute")
    } else if abs < 86_400 {
        ((abs + 1_800) / 3_600, "hour")
    } else {
        ((abs + 43_200) / 86_400, "day")
    };
    if value == 0 {
        return "now".to_string();
    }
    let plural = if value == 1 { "" } else { "s" };
    if diff < 0 {
        format!("{value} {unit}{plural} ago")
    } else {
        format!("in {value} {unit}{plural}")
    }
}
