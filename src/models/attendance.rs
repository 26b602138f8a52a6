//! Leave, timesheet and paid-days records.
//!
//! These are the per-period rows that a period cancellation removes
//! together with the payslips (`Conges`, `Jour`, `Weekot`, `Njtsalarie`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// Kind of leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// Paid annual leave, drawn from the accrued balance.
    Annual,
    /// Sick leave.
    Sick,
    /// Unpaid absence.
    Unpaid,
    /// Days credited by the monthly accrual at closing.
    Accrual,
}

impl LeaveKind {
    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveKind::Annual => "annual",
            LeaveKind::Sick => "sick",
            LeaveKind::Unpaid => "unpaid",
            LeaveKind::Accrual => "accrual",
        }
    }

    /// Parses the storage form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "annual" => Some(LeaveKind::Annual),
            "sick" => Some(LeaveKind::Sick),
            "unpaid" => Some(LeaveKind::Unpaid),
            "accrual" => Some(LeaveKind::Accrual),
            _ => None,
        }
    }
}

/// A leave record (`Conges`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    /// Storage identifier (0 until persisted).
    pub id: i64,
    /// The employee on leave.
    pub employee_id: i64,
    /// The period the record is booked in.
    pub period: Period,
    /// Kind of leave.
    pub kind: LeaveKind,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Number of days, accrued or taken depending on the kind.
    pub days: Decimal,
}

/// A single timesheet day (`Jour`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedDay {
    /// The employee.
    pub employee_id: i64,
    /// The period the day is booked in.
    pub period: Period,
    /// The calendar day.
    pub date: NaiveDate,
    /// Hours worked on that day.
    pub hours: Decimal,
}

/// Weekly overtime hours (`Weekot`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyOvertime {
    /// The employee.
    pub employee_id: i64,
    /// The period the week is booked in.
    pub period: Period,
    /// Monday of the week.
    pub week_start: NaiveDate,
    /// Overtime hours in the week.
    pub hours: Decimal,
}

/// Paid days for an employee, motif and period (`Njtsalarie`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedDays {
    /// The employee.
    pub employee_id: i64,
    /// The payroll run reason.
    pub motif_id: i64,
    /// The period.
    pub period: Period,
    /// Number of paid days.
    pub days: Decimal,
}
