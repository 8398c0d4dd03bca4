use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(anyhow!("Period start {} is after end {}", start, end));
        }
        Ok(Self { start, end })
    }

    /// First to last day of a calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("Invalid month: {}-{:02}", year, month))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| anyhow!("Invalid month: {}-{:02}", year, month))?;
        let end = next
            .pred_opt()
            .ok_or_else(|| anyhow!("Invalid month end: {}-{:02}", year, month))?;
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM`.
    pub fn parse_month(value: &str) -> Result<Self> {
        let (year, month) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected YYYY-MM, got '{}'", value))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow!("Invalid year in '{}'", value))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow!("Invalid month in '{}'", value))?;
        Self::month(year, month)
    }

    /// Month containing today, local time.
    pub fn current_month() -> Result<Self> {
        let today = Local::now().date_naive();
        Self::month(today.year(), today.month())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.contains(instant.date_naive())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole_month = self.start.day() == 1
            && self.start.year() == self.end.year()
            && self.start.month() == self.end.month()
            && self.end.succ_opt().map_or(true, |next| next.day() == 1);
        if whole_month {
            write!(f, "{}", self.start.format("%Y-%m"))
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let feb = Period::month(2024, 2).unwrap();
        assert_eq!(feb.start, d(2024, 2, 1));
        assert_eq!(feb.end, d(2024, 2, 29));

        let dec = Period::month(2023, 12).unwrap();
        assert_eq!(dec.end, d(2023, 12, 31));

        assert!(Period::month(2024, 13).is_err());
        assert!(Period::month(2024, 0).is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(
            Period::parse_month("2024-03").unwrap(),
            Period::month(2024, 3).unwrap()
        );
        assert!(Period::parse_month("2024").is_err());
        assert!(Period::parse_month("abcd-01").is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let p = Period::month(2024, 1).unwrap();
        assert!(p.contains(d(2024, 1, 1)));
        assert!(p.contains(d(2024, 1, 31)));
        assert!(!p.contains(d(2024, 2, 1)));
        assert!(!p.contains(d(2023, 12, 31)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::month(2024, 3).unwrap().to_string(), "2024-03");
        let custom = Period::new(d(2024, 1, 5), d(2024, 1, 9)).unwrap();
        assert_eq!(custom.to_string(), "2024-01-05 to 2024-01-09");
        assert!(Period::new(d(2024, 1, 9), d(2024, 1, 5)).is_err());
    }
}
