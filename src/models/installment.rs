//! Installment deductions (`Retenuesaecheances`) and their monthly tranches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// A loan or advance repaid through monthly payslip deductions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Storage identifier (0 until persisted).
    pub id: i64,
    /// The employee who repays.
    pub employee_id: i64,
    /// Deduction wage code the tranches are booked under.
    pub rubrique_code: String,
    /// Total amount granted.
    pub total_amount: Decimal,
    /// Amount deducted each period.
    pub monthly_amount: Decimal,
    /// Amount still to be repaid after settled tranches.
    pub outstanding: Decimal,
    /// First period a tranche may be deducted in.
    pub first_period: Period,
    /// False once fully repaid.
    pub active: bool,
}

impl Installment {
    /// Amount to deduct in the next tranche: the monthly amount, capped by
    /// what remains outstanding.
    ///
    /// # Example
    ///
    /// ```
    /// use paie_engine::models::Installment;
    /// use rust_decimal::Decimal;
    ///
    /// let loan = Installment {
    ///     id: 1,
    ///     employee_id: 1,
    ///     rubrique_code: "PRET".to_string(),
    ///     total_amount: Decimal::new(10000, 0),
    ///     monthly_amount: Decimal::new(3000, 0),
    ///     outstanding: Decimal::new(1000, 0),
    ///     first_period: "2026-01".parse().unwrap(),
    ///     active: true,
    /// };
    /// assert_eq!(loan.next_tranche(), Decimal::new(1000, 0));
    /// ```
    pub fn next_tranche(&self) -> Decimal {
        if !self.active || self.outstanding <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.monthly_amount.min(self.outstanding)
    }

    /// Returns true if a tranche is due in the given period.
    pub fn is_due_in(&self, period: Period) -> bool {
        self.active && period >= self.first_period && self.outstanding > Decimal::ZERO
    }

    /// The installment as seen by another payslip of a period in which
    /// `deducted` was already withheld: both the balance and this month's
    /// tranche shrink by that amount.
    pub fn net_of(&self, deducted: Decimal) -> Installment {
        Installment {
            outstanding: (self.outstanding - deducted).max(Decimal::ZERO),
            monthly_amount: (self.monthly_amount - deducted).max(Decimal::ZERO),
            ..self.clone()
        }
    }
}

/// A tranche deducted on a payslip (`Tranchesretenuesaecheances`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentTranche {
    /// Storage identifier (0 until persisted).
    pub id: i64,
    /// The installment repaid.
    pub installment_id: i64,
    /// The employee who repays.
    pub employee_id: i64,
    /// The payroll run reason of the payslip carrying the tranche.
    pub motif_id: i64,
    /// The period of the payslip.
    pub period: Period,
    /// Amount deducted.
    pub amount: Decimal,
    /// True once the period is closed and the balance decremented.
    pub settled: bool,
    /// Amount taken off the balance at settlement; restored on cancel.
    pub applied: Option<Decimal>,
}
