//! Parsing of clock-time expressions such as `2pm`, `14:30` or `jan 5 2:30pm`

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// A target time of day, optionally pinned to a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeQuery {
    pub hour: u32,
    pub minute: u32,
    pub date: Option<NaiveDate>,
}

impl TimeQuery {
    /// Minutes since midnight
    pub fn minutes(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn around_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"^around\s+")
}

fn month_day() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(
        &RE,
        r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})\b",
    )
}

fn numeric_date() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"\b(\d{1,2})/(\d{1,2})\b")
}

fn twelve_hour() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"^(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\.?$")
}

fn twenty_four_hour() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"^(\d{1,2}):(\d{2})$")
}

/// Parse a time expression with an optional date
///
/// Relative dates (`today`, `yesterday`) resolve against `today`; explicit
/// dates (`jan 5`, `january 5`, `1/5`) take the year of `today`.
pub fn parse_time_query(input: &str, today: NaiveDate) -> Option<TimeQuery> {
    let lowered = input.trim().to_lowercase().replace(',', " ");
    let mut text = around_prefix()?.replace(&lowered, "").into_owned();
    let mut date = None;

    if text.contains("yesterday") {
        date = today.pred_opt();
        text = text.replacen("yesterday", " ", 1);
    } else if text.contains("today") {
        date = Some(today);
        text = text.replacen("today", " ", 1);
    }

    if let Some((explicit, range)) = find_explicit_date(&text, today.year()) {
        date = Some(explicit);
        text.replace_range(range, " ");
    }

    let rest = text
        .split_whitespace()
        .filter(|word| *word != "at" && *word != "on")
        .collect::<Vec<_>>()
        .join(" ");

    let (hour, minute) = parse_clock_time(&rest)?;
    Some(TimeQuery { hour, minute, date })
}

/// Find a month-name or numeric date, returning it with its byte range
fn find_explicit_date(text: &str, year: i32) -> Option<(NaiveDate, std::ops::Range<usize>)> {
    if let Some(caps) = month_day()?.captures(text) {
        let whole = caps.get(0)?;
        // "jan 14:30" is a time after a month, not a day
        if !text[whole.end()..].starts_with(':') {
            let month = MONTHS.iter().position(|m| *m == &caps[1])? as u32 + 1;
            let day: u32 = caps[2].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some((date, whole.range()));
            }
        }
    }

    let caps = numeric_date()?.captures(text)?;
    let whole = caps.get(0)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|date| (date, whole.range()))
}

/// Parse a bare clock time in 12h (`2pm`, `2:30 pm`) or 24h (`14:30`) form
pub fn parse_clock_time(text: &str) -> Option<(u32, u32)> {
    let text = text.trim();

    if let Some(caps) = twelve_hour()?.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let hour = match (&caps[3], hour) {
            ("a", 12) => 0,
            ("a", h) => h,
            ("p", 12) => 12,
            (_, h) => h + 12,
        };
        return Some((hour, minute));
    }

    let caps = twenty_four_hour()?.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn parse(input: &str) -> Option<TimeQuery> {
        parse_time_query(input, today())
    }

    #[test]
    fn test_twelve_hour_forms() {
        assert_eq!(parse_clock_time("2pm"), Some((14, 0)));
        assert_eq!(parse_clock_time("2 pm"), Some((14, 0)));
        assert_eq!(parse_clock_time("2:30pm"), Some((14, 30)));
        assert_eq!(parse_clock_time("2:30 pm"), Some((14, 30)));
        assert_eq!(parse_clock_time("12am"), Some((0, 0)));
        assert_eq!(parse_clock_time("12pm"), Some((12, 0)));
        assert_eq!(parse_clock_time("9 a.m."), Some((9, 0)));
    }

    #[test]
    fn test_twenty_four_hour_form() {
        assert_eq!(parse_clock_time("14:30"), Some((14, 30)));
        assert_eq!(parse_clock_time("0:05"), Some((0, 5)));
    }

    #[test]
    fn test_invalid_clock_times() {
        assert_eq!(parse_clock_time("invalid"), None);
        assert_eq!(parse_clock_time("25:00"), None);
        assert_eq!(parse_clock_time("13pm"), None);
        assert_eq!(parse_clock_time("2"), None);
        assert_eq!(parse_clock_time(""), None);
    }

    #[test]
    fn test_around_prefix() {
        let q = parse("around 3pm").unwrap();
        assert_eq!((q.hour, q.minute, q.date), (15, 0, None));
    }

    #[test]
    fn test_time_only() {
        let q = parse("2:30pm").unwrap();
        assert_eq!(q.minutes(), 14 * 60 + 30);
        assert!(q.date.is_none());
    }

    #[test]
    fn test_month_name_date() {
        let q = parse("jan 5 2pm").unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(q.hour, 14);

        let q = parse("January 5 at 2pm").unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2026, 1, 5));
    }

    #[test]
    fn test_numeric_date() {
        let q = parse("1/5 14:30").unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!((q.hour, q.minute), (14, 30));
    }

    #[test]
    fn test_relative_dates() {
        let q = parse("2pm yesterday").unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2026, 3, 9));

        let q = parse("2pm, today").unwrap();
        assert_eq!(q.date, Some(today()));
    }

    #[test]
    fn test_month_followed_by_clock() {
        let q = parse("14:30").unwrap();
        assert!(q.date.is_none());
        assert!(parse("jan 14:30").is_none());
    }

    #[test]
    fn test_unparseable() {
        assert!(parse("teatime").is_none());
        assert!(parse("yesterday").is_none());
        assert!(parse("feb 30 2pm").is_none());
    }
}
