//! Timestamp and calendar-day utilities
//!
//! Streak records are keyed by UTC calendar day. Everything that needs to
//! truncate a timestamp or reason about month boundaries goes through here.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC calendar day
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Whole days from `earlier` to `later` (negative if `later` is before `earlier`)
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// First and last day of a calendar month (`month` is 1-based)
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidInput("Invalid month".to_string()));
    }

    let first_day = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidInput("Invalid date".to_string()))?;

    let first_day_next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last_day = first_day_next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| Error::InvalidInput("Invalid date".to_string()))?;

    Ok((first_day, last_day))
}

/// (year, month) of the current UTC day
pub fn current_year_month() -> (i32, u32) {
    let day = today();
    (day.year(), day.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_between() {
        let a = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(days_between(b, a), 3);
        assert_eq!(days_between(a, b), -3);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn test_month_bounds_regular_month() {
        let (first, last) = month_bounds(2026, 4).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 4, 30).unwrap());
    }

    #[test]
    fn test_month_bounds_december_rolls_year() {
        let (_, last) = month_bounds(2025, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_month_bounds_leap_february() {
        let (_, last) = month_bounds(2028, 2).unwrap();
        assert_eq!(last.day(), 29);
    }

    #[test]
    fn test_month_bounds_rejects_invalid_month() {
        assert!(month_bounds(2026, 0).is_err());
        assert!(month_bounds(2026, 13).is_err());
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }
}
