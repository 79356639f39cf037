use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Draws happen every Saturday evening.
pub const DRAW_WEEKDAY: Weekday = Weekday::Sat;

pub fn parse_draw_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid draw date '{}'", raw))
}

/// Splits user input on commas and whitespace: "1, 2 3,4" -> [1, 2, 3, 4].
pub fn parse_numbers(input: &str) -> Result<Vec<i64>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("'{}' is not a number", s))
        })
        .collect()
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The draw after `latest`, if its date has been reached.
pub fn next_draw(
    latest_no: u32,
    latest_date: NaiveDate,
    today: NaiveDate,
) -> Option<(u32, NaiveDate)> {
    let next_date = latest_date + Duration::days(7);
    if today >= next_date {
        Some((latest_no + 1, next_date))
    } else {
        None
    }
}

/// First `weekday` at `hour`:00 strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, weekday: Weekday, hour: u32) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let days_ahead = (7 + weekday.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let candidate = (now.date() + Duration::days(days_ahead as i64)).and_time(at);
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}
