use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// An ISO-8601 calendar week: weeks run Monday to Sunday and week 1 is the
/// week containing the year's first Thursday.
///
/// The `year` is the ISO week-year, which differs from the calendar year for
/// a few days around New Year (2016-01-01 falls in week 53 of 2015).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub week: u32,
    pub year: i32,
}

impl WeekKey {
    pub fn new(week: u32, year: i32) -> Self {
        Self { week, year }
    }

    /// Week of the calendar date the timestamp carries in its own offset.
    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self::of_date(timestamp.date_naive())
    }

    pub fn of_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            week: iso.week(),
            year: iso.year(),
        }
    }
}

impl Ord for WeekKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.week).cmp(&(other.year, other.week))
    }
}

impl PartialOrd for WeekKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.week, self.year)
    }
}
