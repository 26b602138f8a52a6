//! Payslip (`Paie`) and payslip line (`Rubriquepaie`) models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// Whether a wage code adds to or withholds from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubriqueKind {
    /// Salary, allowances, overtime, bonuses.
    Gain,
    /// Advances, loan installments and other withholdings.
    Deduction,
}

impl RubriqueKind {
    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RubriqueKind::Gain => "gain",
            RubriqueKind::Deduction => "deduction",
        }
    }

    /// Parses the storage form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gain" => Some(RubriqueKind::Gain),
            "deduction" => Some(RubriqueKind::Deduction),
            _ => None,
        }
    }
}

/// A single line item of a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLine {
    /// Wage code of the line.
    pub rubrique_code: String,
    /// Label printed on the payslip.
    pub label: String,
    /// Gain or deduction.
    pub kind: RubriqueKind,
    /// The amount the rate applies to (days, hours or money).
    pub base: Decimal,
    /// Rate applied to the base, when the line is a product.
    pub rate: Option<Decimal>,
    /// The signed-by-kind amount of the line (always positive).
    pub amount: Decimal,
}

/// A computed payslip for one employee, motif and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// Storage identifier (0 until persisted).
    pub id: i64,
    /// The employee paid.
    pub employee_id: i64,
    /// The payroll run reason.
    pub motif_id: i64,
    /// The payroll month.
    pub period: Period,
    /// Number of paid days (NJT).
    pub worked_days: Decimal,
    /// Sum of all gain lines.
    pub gross: Decimal,
    /// Capped base of CNSS contributions.
    pub cnss_base: Decimal,
    /// Employee CNSS withholding.
    pub cnss_employee: Decimal,
    /// Base of CNAM contributions.
    pub cnam_base: Decimal,
    /// Employee CNAM withholding.
    pub cnam_employee: Decimal,
    /// Taxable income after social withholdings and abatement.
    pub taxable_base: Decimal,
    /// Income tax withheld.
    pub its: Decimal,
    /// Sum of deduction lines (installments, advances).
    pub other_deductions: Decimal,
    /// Net amount paid to the employee.
    pub net: Decimal,
    /// Whether the period of this payslip has been closed.
    pub closed: bool,
}

impl Payslip {
    /// Total withheld from gross pay.
    pub fn total_withholdings(&self) -> Decimal {
        self.cnss_employee + self.cnam_employee + self.its + self.other_deductions
    }
}
