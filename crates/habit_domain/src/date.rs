use chrono::{Datelike, Days, NaiveDate};

/// Storage and lookup format for every date-keyed map in the crate.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Formats a local calendar date as `YYYY-MM-DD`.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` key. A trailing time component (`2025-03-01T08:00:00`)
/// is ignored so older timestamp-style values still resolve to their day.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let trimmed = key.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_KEY_FORMAT).ok()
}

/// Weekday index with Sunday as 0.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn days_before(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
}
