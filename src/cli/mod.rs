//! CLI adapters: argument parsing helpers and interactive prompt collection.
//!
//! Everything here builds a [`ScanCriteria`](crate::scanner::criteria::ScanCriteria)
//! and hands it to the core; the scan itself never touches a terminal.

pub mod prompt;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

/// Parse a `YYYY-MM-DD` date into the inclusive start or end of that day,
/// in local time.
pub fn parse_day_bound(input: &str, end_of_day: bool) -> Result<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("invalid date `{}` (expected YYYY-MM-DD): {}", input, e))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59).expect("valid time")
    } else {
        NaiveTime::from_hms_opt(0, 0, 0).expect("valid time")
    };
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| anyhow!("date `{}` does not exist in the local timezone", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn start_of_day_is_midnight() {
        let bound = parse_day_bound("2024-01-15", false).unwrap();
        assert_eq!((bound.hour(), bound.minute(), bound.second()), (0, 0, 0));
    }

    #[test]
    fn end_of_day_is_last_second() {
        let bound = parse_day_bound("2024-01-15", true).unwrap();
        assert_eq!((bound.hour(), bound.minute(), bound.second()), (23, 59, 59));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert!(parse_day_bound(" 2024-01-15 ", false).is_ok());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(parse_day_bound("15/01/2024", false).is_err());
        assert!(parse_day_bound("2024-13-40", false).is_err());
        assert!(parse_day_bound("", false).is_err());
    }
}
