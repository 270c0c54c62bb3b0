//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use regex::Regex;

/// Number of pages needed to show `total` items, `limit` at a time
pub fn page_count(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit)) as u32
}

/// Calculate pagination offset
pub fn calculate_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(email))
}

/// Validate phone number format: digits, spaces and `+-()`
pub fn is_valid_phone(phone: &str) -> bool {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^\+?[\d\s\-()]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(phone))
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First day of each of the last `months` months, newest first, current month included
pub fn trailing_months(now: DateTime<Utc>, months: u32) -> Vec<NaiveDate> {
    let current = now.date_naive().with_day(1).unwrap_or_else(|| now.date_naive());
    (0..months)
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

/// Bucket timestamps into the trailing monthly window keyed `YYYY-MM-01`.
/// Timestamps outside the window are ignored.
pub fn monthly_histogram(
    now: DateTime<Utc>,
    months: u32,
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
) -> Vec<(String, u64)> {
    let window = trailing_months(now, months);
    let mut counts = vec![0u64; window.len()];
    for timestamp in timestamps {
        let day = timestamp.date_naive();
        if let Some(month) = day.with_day(1) {
            if let Some(index) = window.iter().position(|m| *m == month) {
                counts[index] += 1;
            }
        }
    }
    window
        .into_iter()
        .zip(counts)
        .map(|(month, count)| (month.format("%Y-%m-%d").to_string(), count))
        .collect()
}
