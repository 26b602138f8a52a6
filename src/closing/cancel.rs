use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PayrollError, PayrollResult};
use crate::models::Period;
use crate::store::{PayrollStore, installments, journal, payslips, settings, timesheets};

/// Rows removed from each table by a cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionCounts {
    /// `conges` rows of the discarded period.
    pub leave: usize,
    /// `jour` rows.
    pub worked_days: usize,
    /// `weekot` rows.
    pub weekly_overtime: usize,
    /// `paie` rows.
    pub payslips: usize,
    /// `rubriquepaie` rows.
    pub payslip_lines: usize,
    /// `njtsalarie` rows.
    pub paid_days: usize,
    /// `tranchesretenuesaecheances` rows.
    pub tranches: usize,
    /// `detailpiece` rows of the discarded period's journal.
    pub journal_lines: usize,
    /// Leave accruals of the reopened period.
    pub accruals: usize,
}

/// What a cancellation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationOutcome {
    /// The period whose data was discarded.
    pub discarded_period: Period,
    /// The period open again.
    pub reopened_period: Period,
    /// Rows deleted per table.
    pub deleted: DeletionCounts,
    /// Payslips of the reopened period marked open.
    pub payslips_reopened: usize,
    /// Tranches whose balances were restored.
    pub tranches_restored: usize,
}

/// Cancels the last closure.
///
/// Every row of the open period is deleted, the previous period is
/// reopened with its installment balances restored, and the open period
/// steps back, all in one transaction. Callers reload their state from the
/// returned outcome.
///
/// # Errors
///
/// - [`PayrollError::LicenseExpired`] when `today` is past the license
/// - [`PayrollError::NoClosureToCancel`] when the previous period was
///   never closed
pub fn cancel_last_closure(
    store: &mut PayrollStore,
    today: NaiveDate,
) -> PayrollResult<CancellationOutcome> {
    let conn = store.connection();
    let current = settings::load_settings(conn)?;
    current.ensure_license(today)?;
    let discarded = current.current_period;
    let reopened = discarded.previous();

    if settings::find_closure(conn, reopened)?.is_none() {
        warn!(period = %reopened, "No closure to cancel");
        return Err(PayrollError::NoClosureToCancel {
            period: reopened.to_string(),
        });
    }

    info!(discarded = %discarded, reopened = %reopened, "Closure cancellation started");
    let outcome = store.transaction(|tx| {
        let timesheet = timesheets::delete_period(tx, discarded)?;
        let journal_lines = journal::delete_entry(tx, discarded)?;
        let payslip_lines = payslips::delete_period_lines(tx, discarded)?;
        let deleted_payslips = payslips::delete_period_payslips(tx, discarded)?;
        let tranches = installments::delete_period_tranches(tx, discarded)?;

        let payslips_reopened = payslips::set_closed(tx, reopened, false)?;
        let tranches_restored = installments::unsettle_tranches(tx, reopened)?;
        let accruals = timesheets::delete_accruals(tx, reopened)?;
        settings::delete_closure(tx, reopened)?;
        settings::set_current_period(tx, reopened)?;

        Ok(CancellationOutcome {
            discarded_period: discarded,
            reopened_period: reopened,
            deleted: DeletionCounts {
                leave: timesheet.leave,
                worked_days: timesheet.worked_days,
                weekly_overtime: timesheet.weekly_overtime,
                payslips: deleted_payslips,
                payslip_lines,
                paid_days: timesheet.paid_days,
                tranches,
                journal_lines,
                accruals,
            },
            payslips_reopened,
            tranches_restored,
        })
    })?;

    info!(
        reopened = %outcome.reopened_period,
        payslips_deleted = outcome.deleted.payslips,
        payslips_reopened = outcome.payslips_reopened,
        tranches_restored = outcome.tranches_restored,
        "Closure cancelled"
    );
    Ok(outcome)
}
