//! Timestamp interpretation and human-readable formatting

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Which wall clock a timestamp is read on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// The offset written in the timestamp itself (UTC for `Z`)
    #[default]
    Recorded,
    /// The machine's local time zone
    Local,
}

/// Interpret an ISO-8601 timestamp as a wall-clock date and time
pub fn wall_clock(timestamp: &str, basis: TimeBasis) -> Option<NaiveDateTime> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(match basis {
            TimeBasis::Recorded => dt.naive_local(),
            TimeBasis::Local => dt.with_timezone(&Local).naive_local(),
        });
    }

    // Offset-less timestamps are taken as already being wall-clock time
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Today's date on the same clock that timestamps are read on
pub fn today(basis: TimeBasis) -> NaiveDate {
    match basis {
        TimeBasis::Recorded => Utc::now().date_naive(),
        TimeBasis::Local => Local::now().date_naive(),
    }
}

/// Minutes since midnight
pub fn minutes_of_day(dt: &NaiveDateTime) -> u32 {
    dt.hour() * 60 + dt.minute()
}

/// Calendar date of a timestamp
pub fn date_of(timestamp: &str, basis: TimeBasis) -> Option<NaiveDate> {
    wall_clock(timestamp, basis).map(|dt| dt.date())
}

/// Format as e.g. `2:30 pm`
pub fn format_time(timestamp: &str, basis: TimeBasis) -> String {
    wall_clock(timestamp, basis)
        .map(|dt| dt.format("%-I:%M %p").to_string().to_lowercase())
        .unwrap_or_default()
}

/// Format as e.g. `Jan 05, 2026 at 2:30 PM`
pub fn format_date(timestamp: &str, basis: TimeBasis) -> String {
    wall_clock(timestamp, basis)
        .map(|dt| dt.format("%b %d, %Y at %-I:%M %p").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

/// Format as e.g. `Jan 5`
pub fn format_short_date(timestamp: &str, basis: TimeBasis) -> String {
    date_of(timestamp, basis).map(format_day).unwrap_or_default()
}

/// Format a calendar date as e.g. `Jan 5`
pub fn format_day(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
