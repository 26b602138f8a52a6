//! Process-wide payroll settings (`Paramgen`) and the period state machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PayrollError, PayrollResult};

use super::Period;

/// The singleton settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// The open payroll period.
    pub current_period: Period,
    /// Last day the license is valid.
    pub license_expiry: NaiveDate,
}

impl GeneralSettings {
    /// The period that opens once the current one is closed.
    pub fn next_period(&self) -> Period {
        self.current_period.next()
    }

    /// Fails with [`PayrollError::LicenseExpired`] when `today` is past expiry.
    ///
    /// # Example
    ///
    /// ```
    /// use paie_engine::models::GeneralSettings;
    /// use chrono::NaiveDate;
    ///
    /// let settings = GeneralSettings {
    ///     current_period: "2026-03".parse().unwrap(),
    ///     license_expiry: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    /// };
    /// assert!(settings.ensure_license(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()).is_ok());
    /// assert!(settings.ensure_license(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).is_err());
    /// ```
    pub fn ensure_license(&self, today: NaiveDate) -> PayrollResult<()> {
        if today > self.license_expiry {
            return Err(PayrollError::LicenseExpired {
                expired_on: self.license_expiry,
            });
        }
        Ok(())
    }
}

/// A past closure, kept so the last one can be cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// The period that was closed.
    pub period: Period,
    /// When it was closed.
    pub closed_at: DateTime<Utc>,
}

/// Lifecycle of the payroll period as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "period", rename_all = "snake_case")]
pub enum PeriodState {
    /// The period accepts payroll runs, leave and timesheets.
    Open(Period),
    /// A closure of the period is in progress.
    Closing(Period),
}

impl PeriodState {
    /// The period the state refers to.
    pub fn period(&self) -> Period {
        match self {
            PeriodState::Open(p) | PeriodState::Closing(p) => *p,
        }
    }
}
