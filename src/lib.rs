//! Payroll back office engine.
//!
//! Computes payslips, moves the payroll period through its closing and
//! cancellation transitions, builds the ITS, CNSS and CNAM declarations,
//! generates the accounting journal with its `.unl` batch export, and writes
//! bank transfer files and the payroll register. [`service::PayrollService`]
//! ties these together and [`api`] exposes them over HTTP.

#![warn(missing_docs)]

pub mod accounting;
pub mod api;
pub mod batch;
pub mod calculation;
pub mod closing;
pub mod config;
pub mod declarations;
pub mod error;
pub mod export;
pub mod models;
pub mod payroll;
pub mod service;
pub mod store;
