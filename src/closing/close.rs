use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ConfigLoader;
use crate::error::{PayrollError, PayrollResult};
use crate::export::write_engagements;
use crate::models::{ClosureRecord, LeaveKind, LeaveRecord, Period};
use crate::store::{PayrollStore, employees, installments, payslips, settings, timesheets};

/// What a closing did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosureOutcome {
    /// The period closed.
    pub closed_period: Period,
    /// The period now open.
    pub opened_period: Period,
    /// Payslips marked closed.
    pub payslips_closed: usize,
    /// Installment tranches settled.
    pub tranches_settled: usize,
    /// Employees credited with leave.
    pub leave_accrued: usize,
    /// The engagement snapshot written before closing.
    pub engagements_file: PathBuf,
}

/// Closes the open period and opens the next one.
///
/// The engagement snapshot is written first; the closing writes then run
/// in one transaction, so a failure leaves the period open and untouched.
/// The snapshot is removed again when the transaction fails.
///
/// # Errors
///
/// - [`PayrollError::LicenseExpired`] when `today` is past the license
/// - [`PayrollError::NoPayslips`] when the period has no payslip
pub fn close_period(
    store: &mut PayrollStore,
    config: &ConfigLoader,
    today: NaiveDate,
    report_dir: &Path,
) -> PayrollResult<ClosureOutcome> {
    let conn = store.connection();
    let current = settings::load_settings(conn)?;
    current.ensure_license(today)?;
    let period = current.current_period;

    if payslips::count_payslips(conn, period)? == 0 {
        return Err(PayrollError::NoPayslips {
            period: period.to_string(),
        });
    }

    info!(period = %period, "Period closing started");
    let engagements_file = write_engagements(conn, period, report_dir)?;
    let leave_days = config.config().rates().leave_days_per_month;

    let closed = store.transaction(|tx| {
        let payslips_closed = payslips::set_closed(tx, period, true)?;
        let tranches_settled = installments::settle_tranches(tx, period)?;

        let mut leave_accrued = 0;
        if leave_days > Decimal::ZERO {
            for employee in employees::list_employees(tx)? {
                if !employee.is_active_in(period) {
                    continue;
                }
                timesheets::insert_leave(
                    tx,
                    &LeaveRecord {
                        id: 0,
                        employee_id: employee.id,
                        period,
                        kind: LeaveKind::Accrual,
                        start_date: period.first_day(),
                        end_date: period.last_day(),
                        days: leave_days,
                    },
                )?;
                leave_accrued += 1;
            }
        }

        settings::record_closure(
            tx,
            &ClosureRecord {
                period,
                closed_at: Utc::now(),
            },
        )?;
        settings::set_current_period(tx, period.next())?;

        Ok(ClosureOutcome {
            closed_period: period,
            opened_period: period.next(),
            payslips_closed,
            tranches_settled,
            leave_accrued,
            engagements_file: engagements_file.clone(),
        })
    });
    let outcome = match closed {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Err(io) = fs::remove_file(&engagements_file) {
                warn!(
                    path = %engagements_file.display(),
                    error = %io,
                    "Engagement snapshot of a failed closing left behind"
                );
            }
            return Err(err);
        }
    };

    info!(
        period = %outcome.closed_period,
        next = %outcome.opened_period,
        payslips = outcome.payslips_closed,
        tranches = outcome.tranches_settled,
        leave_accrued = outcome.leave_accrued,
        "Period closed"
    );
    Ok(outcome)
}
