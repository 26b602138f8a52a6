//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod employee;
mod installment;
mod journal;
mod motif;
mod payslip;
mod period;
mod settings;

pub use attendance::{LeaveKind, LeaveRecord, WeeklyOvertime, WorkedDay, WorkedDays};
pub use audit::{AuditStep, AuditTrace};
pub use employee::Employee;
pub use installment::{Installment, InstallmentTranche};
pub use journal::{JournalEntry, JournalLine};
pub use motif::{Motif, MotifKind};
pub use payslip::{PayLine, Payslip, RubriqueKind};
pub use period::{PERIOD_ANCHOR_DAY, Period, Quarter};
pub use settings::{ClosureRecord, GeneralSettings, PeriodState};
