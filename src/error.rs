//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while computing, closing,
//! declaring or exporting a payroll period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use paie_engine::error::PayrollError;
///
/// let error = PayrollError::ConfigNotFound {
///     path: "/missing/rates.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/rates.yaml");
/// ```
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The license stored in the general settings has expired.
    #[error("License expired on {expired_on}")]
    LicenseExpired {
        /// The last valid day of the license.
        expired_on: NaiveDate,
    },

    /// A period string could not be interpreted.
    #[error("Invalid period '{value}'")]
    InvalidPeriod {
        /// The rejected input.
        value: String,
    },

    /// The requested period is not the open one.
    #[error("Period {requested} is not open (current period is {current})")]
    PeriodNotOpen {
        /// The period the caller asked to work on.
        requested: String,
        /// The period currently open.
        current: String,
    },

    /// There is no recorded closure to roll back.
    #[error("No closure of period {period} to cancel")]
    NoClosureToCancel {
        /// The period whose closure was expected.
        period: String,
    },

    /// No payslip exists for the period.
    #[error("No payslips found for period {period}")]
    NoPayslips {
        /// The period that has no payslips.
        period: String,
    },

    /// A payslip of a closed period cannot be recomputed.
    #[error("Payslip for employee {employee_id} in {period} is closed")]
    PayslipClosed {
        /// The employee whose payslip is closed.
        employee_id: i64,
        /// The closed period.
        period: String,
    },

    /// Employee was not found in the store.
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// The missing employee id.
        id: i64,
    },

    /// Motif code was not found in the store.
    #[error("Motif not found: {code}")]
    MotifNotFound {
        /// The missing motif code.
        code: String,
    },

    /// Rubrique code was not found in the configuration.
    #[error("Rubrique not found: {code}")]
    RubriqueNotFound {
        /// The missing rubrique code.
        code: String,
    },

    /// Bank code was not found in the configuration.
    #[error("Bank not found: {code}")]
    BankNotFound {
        /// The missing bank code.
        code: String,
    },

    /// A generated journal entry does not balance.
    #[error("Unbalanced journal entry: debit {debit} != credit {credit}")]
    UnbalancedJournal {
        /// Sum of the debit lines.
        debit: Decimal,
        /// Sum of the credit lines.
        credit: Decimal,
    },

    /// A report or export file could not be written.
    #[error("Failed to write '{path}': {message}")]
    Export {
        /// The destination path.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },

    /// The store lock was poisoned by a panicking request.
    #[error("Payroll store unavailable")]
    StoreUnavailable,

    /// The underlying database reported an error.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl PayrollError {
    /// Builds an [`PayrollError::Export`] from any displayable failure.
    pub fn export(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        PayrollError::Export {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for Results that return PayrollError.
pub type PayrollResult<T> = Result<T, PayrollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = PayrollError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_license_expired_displays_date() {
        let error = PayrollError::LicenseExpired {
            expired_on: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };
        assert_eq!(error.to_string(), "License expired on 2025-12-31");
    }

    #[test]
    fn test_period_not_open_displays_both_periods() {
        let error = PayrollError::PeriodNotOpen {
            requested: "2026-02".to_string(),
            current: "2026-03".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Period 2026-02 is not open (current period is 2026-03)"
        );
    }

    #[test]
    fn test_unbalanced_journal_displays_amounts() {
        let error = PayrollError::UnbalancedJournal {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(9999, 2),
        };
        assert_eq!(
            error.to_string(),
            "Unbalanced journal entry: debit 100.00 != credit 99.99"
        );
    }

    #[test]
    fn test_storage_error_converts_from_rusqlite() {
        fn fails() -> PayrollResult<()> {
            Err::<(), _>(rusqlite::Error::QueryReturnedNoRows)?;
            Ok(())
        }
        match fails() {
            Err(PayrollError::Storage(rusqlite::Error::QueryReturnedNoRows)) => {}
            other => panic!("Expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_export_helper_keeps_path() {
        let error = PayrollError::export(std::path::Path::new("/tmp/out.unl"), "disk full");
        assert_eq!(error.to_string(), "Failed to write '/tmp/out.unl': disk full");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<PayrollError>();
    }
}
