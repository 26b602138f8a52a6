//! Calculation logic for the payroll engine.
//!
//! This module contains the payslip computations: paid-days proration,
//! CNSS and CNAM contributions, the progressive ITS scale, payslip
//! assembly with installment deductions, and the gross-from-net search.

mod cnam;
mod cnss;
mod gross_up;
mod its;
mod payslip;
mod proration;

pub use cnam::{CnamResult, calculate_cnam, employer_share_from_employee};
pub use cnss::{CnssResult, calculate_cnss};
pub use gross_up::{GrossUpResult, gross_from_net};
pub use its::{ItsResult, calculate_its};
pub use payslip::{
    EmployerCharges, PayslipComputation, PayslipInput, TrancheDeduction, VariableLine,
    compute_payslip,
};
pub use proration::{ProrationResult, prorate, round_amount};
