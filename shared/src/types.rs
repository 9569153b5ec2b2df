//! Common calendar types for weekly planning

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Monday-to-Sunday calendar week bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Errors for explicitly supplied week boundaries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekBoundsError {
    #[error("week start {0} is not a Monday")]
    StartNotMonday(NaiveDate),

    #[error("week end {end} is not six days after start {start}")]
    EndMismatch { start: NaiveDate, end: NaiveDate },
}

impl WeekBounds {
    /// The ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let week = date.week(Weekday::Mon);
        Self {
            start: week.first_day(),
            end: week.last_day(),
        }
    }

    /// Validate explicitly supplied boundaries as a well-formed bucket.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, WeekBoundsError> {
        if start.weekday() != Weekday::Mon {
            return Err(WeekBoundsError::StartNotMonday(start));
        }
        if end != start + Duration::days(6) {
            return Err(WeekBoundsError::EndMismatch { start, end });
        }
        Ok(Self { start, end })
    }

    /// The week immediately before this one.
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::days(7),
            end: self.end - Duration::days(7),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_containing_a_midweek_date() {
        // 2024-01-03 is a Wednesday
        let week = WeekBounds::containing(date(2024, 1, 3));
        assert_eq!(week.start, date(2024, 1, 1));
        assert_eq!(week.end, date(2024, 1, 7));
    }

    #[test]
    fn week_bucket_covers_its_own_boundaries() {
        let week = WeekBounds::containing(date(2024, 1, 1));
        assert!(week.contains(week.start));
        assert!(week.contains(week.end));
        assert!(!week.contains(date(2024, 1, 8)));
    }

    #[test]
    fn previous_week_shifts_by_seven_days() {
        let week = WeekBounds::containing(date(2024, 1, 10));
        let previous = week.previous();
        assert_eq!(previous.start, date(2024, 1, 1));
        assert_eq!(previous.end, date(2024, 1, 7));
    }

    #[test]
    fn explicit_bounds_must_be_monday_to_sunday() {
        assert!(WeekBounds::from_dates(date(2024, 1, 1), date(2024, 1, 7)).is_ok());
        assert_eq!(
            WeekBounds::from_dates(date(2024, 1, 2), date(2024, 1, 8)),
            Err(WeekBoundsError::StartNotMonday(date(2024, 1, 2)))
        );
        assert_eq!(
            WeekBounds::from_dates(date(2024, 1, 1), date(2024, 1, 8)),
            Err(WeekBoundsError::EndMismatch {
                start: date(2024, 1, 1),
                end: date(2024, 1, 8),
            })
        );
    }
}
