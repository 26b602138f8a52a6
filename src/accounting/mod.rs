//! Payroll accounting.
//!
//! [`generate_journal`] turns the payslips of a period into one balanced
//! journal entry and stores it; [`write_unl`] renders that entry in the
//! pipe-delimited `.unl` batch format of the general ledger.

mod journal;
mod unl;

pub use journal::generate_journal;
pub use unl::{FIELDS, UnlField, unl_path, unl_record, write_unl};
