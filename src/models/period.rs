//! Payroll period and declaration quarter models.
//!
//! A [`Period`] is one calendar month of payroll. Its canonical text form is
//! `YYYY-MM`; the legacy day-28 anchor date is still available through
//! [`Period::date`] for display and file naming.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PayrollError;

/// Day of month historically used to represent a payroll period as a date.
pub const PERIOD_ANCHOR_DAY: u32 = 28;

/// A payroll month.
///
/// # Example
///
/// ```
/// use paie_engine::models::Period;
///
/// let period: Period = "2026-03".parse().unwrap();
/// assert_eq!(period.previous().to_string(), "2026-02");
/// assert_eq!(period.next().to_string(), "2026-04");
/// assert_eq!(period.date().to_string(), "2026-03-28");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, returning `None` when the month is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, PERIOD_ANCHOR_DAY).map(|_| Self { year, month })
    }

    /// The period containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year of the period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month of the period (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The day-28 anchor date of the period.
    pub fn date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, PERIOD_ANCHOR_DAY)
            .unwrap_or(NaiveDate::MIN)
    }

    /// First calendar day of the period.
    pub fn first_day(&self) -> NaiveDate {
        self.date().with_day(1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the period.
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// The period before this one.
    pub fn previous(&self) -> Self {
        Self::from_date(self.date() - Months::new(1))
    }

    /// The period after this one.
    pub fn next(&self) -> Self {
        Self::from_date(self.date() + Months::new(1))
    }

    /// The declaration quarter this period belongs to.
    pub fn quarter(&self) -> Quarter {
        Quarter {
            year: self.year,
            quarter: (self.month - 1) / 3 + 1,
        }
    }

    /// Compact form used in file names (`YYYYMM`).
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Checks if a date falls within this period.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PayrollError;

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date, whatever its day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || PayrollError::InvalidPeriod {
            value: s.to_string(),
        };

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }

        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Period {
    type Error = PayrollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// A declaration quarter (three consecutive periods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    /// Calendar year.
    pub year: i32,
    /// Quarter number, 1 to 4.
    pub quarter: u32,
}

impl Quarter {
    /// Creates a quarter, returning `None` when the number is not 1-4.
    pub fn new(year: i32, quarter: u32) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    /// The three periods of the quarter, in order.
    pub fn periods(&self) -> [Period; 3] {
        let first = (self.quarter - 1) * 3 + 1;
        [first, first + 1, first + 2].map(|month| Period {
            year: self.year,
            month,
        })
    }

    /// Position (0-2) of a period inside this quarter.
    pub fn month_index(&self, period: Period) -> Option<usize> {
        self.periods().iter().position(|p| *p == period)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-T{}", self.year, self.quarter)
    }
}
