//! Request types of the payroll API.
//!
//! `POST /payroll/run` takes a [`PayrollRunRequest`](crate::payroll::PayrollRunRequest)
//! body directly; the types here cover query strings and path parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PayrollError;
use crate::models::{Period, Quarter};

/// Query of `POST /period/close` and `POST /period/cancel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClosingQuery {
    /// Date checked against the license, defaults to today (UTC).
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Query of the declaration endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationQuery {
    /// Also write the nominative list as CSV.
    #[serde(default)]
    pub write: bool,
}

/// Parses a `YYYY-MM` path segment.
pub(crate) fn parse_period(value: &str) -> Result<Period, PayrollError> {
    value.parse()
}

/// Validates `year` / `quarter` path segments.
pub(crate) fn parse_quarter(year: i32, quarter: u32) -> Result<Quarter, PayrollError> {
    Quarter::new(year, quarter).ok_or_else(|| PayrollError::InvalidPeriod {
        value: format!("{}-T{}", year, quarter),
    })
}
