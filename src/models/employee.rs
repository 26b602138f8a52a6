//! Employee model.
//!
//! This module defines the [`Employee`] record consumed by payroll runs,
//! declarations and bank transfer files.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// Represents an employee on the payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: i64,
    /// Personnel number printed on payslips and declarations.
    pub matricule: String,
    /// Family and given names.
    pub full_name: String,
    /// National identity number.
    #[serde(default)]
    pub national_id: Option<String>,
    /// Social security (CNSS) registration number.
    #[serde(default)]
    pub cnss_number: Option<String>,
    /// Health insurance (CNAM) registration number.
    #[serde(default)]
    pub cnam_number: Option<String>,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
    /// The date the contract ended, if it has.
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
    /// Monthly base salary for a full period.
    pub base_salary: Decimal,
    /// Bank code used for salary transfers; `None` means paid in cash.
    #[serde(default)]
    pub bank_code: Option<String>,
    /// Bank account number for salary transfers.
    #[serde(default)]
    pub bank_account: Option<String>,
    /// Whether CNSS contributions apply to this employee.
    #[serde(default = "default_true")]
    pub subject_to_cnss: bool,
    /// Whether CNAM contributions apply to this employee.
    #[serde(default = "default_true")]
    pub subject_to_cnam: bool,
    /// Whether ITS is withheld for this employee.
    #[serde(default = "default_true")]
    pub subject_to_its: bool,
}

fn default_true() -> bool {
    true
}

impl Employee {
    /// Returns true if the employee is under contract at some point of the period.
    ///
    /// # Examples
    ///
    /// ```
    /// use paie_engine::models::{Employee, Period};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: 1,
    ///     matricule: "M001".to_string(),
    ///     full_name: "Ahmed Salem".to_string(),
    ///     national_id: None,
    ///     cnss_number: None,
    ///     cnam_number: None,
    ///     hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
    ///     termination_date: None,
    ///     base_salary: Decimal::new(30000, 0),
    ///     bank_code: None,
    ///     bank_account: None,
    ///     subject_to_cnss: true,
    ///     subject_to_cnam: true,
    ///     subject_to_its: true,
    /// };
    /// assert!(employee.is_active_in("2026-03".parse::<Period>().unwrap()));
    /// assert!(!employee.is_active_in("2023-05".parse::<Period>().unwrap()));
    /// ```
    pub fn is_active_in(&self, period: Period) -> bool {
        if self.hire_date > period.last_day() {
            return false;
        }
        match self.termination_date {
            Some(end) => end >= period.first_day(),
            None => true,
        }
    }

    /// Returns true if salary is paid by bank transfer.
    pub fn paid_by_transfer(&self) -> bool {
        self.bank_code.is_some() && self.bank_account.is_some()
    }
}
