//! Payroll runs.
//!
//! A run computes and stores the payslips of the selected employees for one
//! motif in the open period. Each employee is a batch row; a failing
//! employee does not stop the others.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batch::{BatchEvent, BatchReport, run_batch};
use crate::calculation::{PayslipInput, VariableLine, compute_payslip};
use crate::config::ConfigLoader;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{Employee, Installment, Motif, Period};
use crate::store::{PayrollStore, employees, installments, payslips, settings, timesheets};

/// A request to pay a selection of employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRunRequest {
    /// The period to pay; must be the open period.
    pub period: Period,
    /// Code of the payroll run reason.
    pub motif_code: String,
    /// The selected employees.
    pub employee_ids: Vec<i64>,
    /// Variable lines keyed by employee id.
    #[serde(default)]
    pub variable_lines: HashMap<i64, Vec<VariableLine>>,
}

/// Paid days when none were recorded: the reference days, reduced for a
/// contract starting or ending inside the period.
pub fn default_paid_days(employee: &Employee, period: Period, reference_days: Decimal) -> Decimal {
    let start = employee.hire_date.max(period.first_day());
    let end = match employee.termination_date {
        Some(termination) => termination.min(period.last_day()),
        None => period.last_day(),
    };
    if start == period.first_day() && end == period.last_day() {
        return reference_days;
    }
    if end < start {
        return Decimal::ZERO;
    }
    Decimal::from((end - start).num_days() + 1).min(reference_days)
}

fn ensure_open(conn: &Connection, period: Period) -> PayrollResult<()> {
    let current = settings::load_settings(conn)?.current_period;
    if period != current {
        return Err(PayrollError::PeriodNotOpen {
            requested: period.to_string(),
            current: current.to_string(),
        });
    }
    Ok(())
}

/// Checks that a run may start: the period is open and the motif exists.
pub fn prepare_run(store: &PayrollStore, request: &PayrollRunRequest) -> PayrollResult<Motif> {
    let conn = store.connection();
    ensure_open(conn, request.period)?;
    employees::get_motif_by_code(conn, &request.motif_code)
}

/// Computes and stores the payslip of one employee.
///
/// Installments are seen net of the tranches already withheld on the
/// employee's other payslips of the period. On a CNSS-declared motif the
/// monthly ceiling is reduced by the base of the other declared payslips. The period is checked again when the payslip is stored,
/// so a row reached after the period was closed fails instead of writing
/// into it.
///
/// Returns the payslip id.
pub fn pay_employee(
    store: &mut PayrollStore,
    config: &ConfigLoader,
    motif: &Motif,
    period: Period,
    employee_id: i64,
    variable_lines: &[VariableLine],
) -> PayrollResult<i64> {
    let conn = store.connection();
    let employee = employees::get_employee(conn, employee_id)?;
    if !employee.is_active_in(period) {
        return Err(PayrollError::CalculationError {
            message: format!("employee {} is not under contract in {}", employee_id, period),
        });
    }
    let worked_days = match timesheets::paid_days(conn, employee_id, motif.id, period)? {
        Some(days) => days,
        None => default_paid_days(&employee, period, config.config().rates().reference_days),
    };
    let deducted = installments::open_deductions(conn, employee_id, period, motif.id)?;
    let installments: Vec<Installment> = installments::active_installments(conn, employee_id)?
        .into_iter()
        .map(|i| match deducted.get(&i.id) {
            Some(amount) => i.net_of(*amount),
            None => i,
        })
        .collect();
    let cnss_base_used = if motif.declared_cnss {
        payslips::cnss_base_used(conn, employee_id, period, motif.id)?
    } else {
        Decimal::ZERO
    };

    let computation = compute_payslip(
        PayslipInput {
            employee: &employee,
            motif,
            period,
            worked_days,
            variable_lines,
            installments: &installments,
            cnss_base_used,
        },
        config,
    )?;

    let id = store.transaction(|tx| {
        ensure_open(tx, period)?;
        payslips::replace_payslip(tx, &computation)
    })?;
    debug!(
        employee_id,
        period = %period,
        gross = %computation.payslip.gross,
        net = %computation.payslip.net,
        "Payslip stored"
    );
    Ok(id)
}

/// Pays the selected employees, reporting progress to `sink`.
///
/// # Errors
///
/// The run itself fails only when it cannot start (period not open,
/// unknown motif). Per-employee failures are collected in the report.
pub fn run_payroll<S>(
    store: &mut PayrollStore,
    config: &ConfigLoader,
    request: &PayrollRunRequest,
    cancel: &CancellationToken,
    sink: S,
) -> PayrollResult<BatchReport>
where
    S: FnMut(BatchEvent),
{
    let motif = prepare_run(store, request)?;
    info!(
        period = %request.period,
        motif = %motif.code,
        employees = request.employee_ids.len(),
        "Payroll run started"
    );

    let report = run_batch(
        &request.employee_ids,
        cancel,
        |id| {
            let lines = request
                .variable_lines
                .get(&id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            pay_employee(store, config, &motif, request.period, id, lines).map(|_| ())
        },
        sink,
    );

    info!(
        period = %request.period,
        motif = %motif.code,
        summary = %report.summary(),
        "Payroll run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closing;
    use crate::models::{MotifKind, WorkedDays};
    use crate::store::test_support::{employee, motif, period, store};
    use chrono::NaiveDate;

    fn config() -> ConfigLoader {
        ConfigLoader::load("./config/default").unwrap()
    }

    fn seeded() -> PayrollStore {
        let store = store("2026-03");
        for id in 1..=3 {
            employees::insert_employee(store.connection(), &employee(id, 30000, Some("BMCI")))
                .unwrap();
        }
        store
    }

    fn request(ids: Vec<i64>) -> PayrollRunRequest {
        PayrollRunRequest {
            period: period("2026-03"),
            motif_code: "NORMAL".to_string(),
            employee_ids: ids,
            variable_lines: HashMap::new(),
        }
    }

    fn run(store: &mut PayrollStore, request: &PayrollRunRequest) -> BatchReport {
        run_payroll(store, &config(), request, &CancellationToken::new(), |_| {}).unwrap()
    }

    #[test]
    fn test_pays_only_selected_employees() {
        let mut store = seeded();
        let report = run(&mut store, &request(vec![1, 3]));
        assert_eq!(report.succeeded, vec![1, 3]);
        let paid: Vec<i64> = payslips::list_payslips(store.connection(), period("2026-03"))
            .unwrap()
            .iter()
            .map(|p| p.employee_id)
            .collect();
        assert_eq!(paid, vec![1, 3]);
    }

    #[test]
    fn test_unknown_employee_is_reported_not_fatal() {
        let mut store = seeded();
        let report = run(&mut store, &request(vec![1, 99]));
        assert_eq!(report.succeeded, vec![1]);
        assert_eq!(report.failed[0].id, 99);
    }

    #[test]
    fn test_rerun_keeps_one_payslip_per_employee() {
        let mut store = seeded();
        run(&mut store, &request(vec![1]));
        run(&mut store, &request(vec![1]));
        assert_eq!(payslips::count_payslips(store.connection(), period("2026-03")).unwrap(), 1);
    }

    #[test]
    fn test_closed_period_cannot_be_run() {
        let mut store = seeded();
        let mut old = request(vec![1]);
        old.period = period("2026-02");
        let result = run_payroll(&mut store, &config(), &old, &CancellationToken::new(), |_| {});
        assert!(matches!(result, Err(PayrollError::PeriodNotOpen { .. })));
    }

    #[test]
    fn test_unknown_motif() {
        let mut store = seeded();
        let mut bad = request(vec![1]);
        bad.motif_code = "NOPE".to_string();
        let result = run_payroll(&mut store, &config(), &bad, &CancellationToken::new(), |_| {});
        assert!(matches!(result, Err(PayrollError::MotifNotFound { .. })));
    }

    #[test]
    fn test_recorded_paid_days_are_used() {
        let mut store = seeded();
        timesheets::upsert_paid_days(
            store.connection(),
            &WorkedDays {
                employee_id: 1,
                motif_id: 1,
                period: period("2026-03"),
                days: Decimal::from(10),
            },
        )
        .unwrap();
        run(&mut store, &request(vec![1]));
        let payslip = payslips::find_payslip(store.connection(), 1, 1, period("2026-03"))
            .unwrap()
            .unwrap();
        assert_eq!(payslip.gross, Decimal::from(10000));
    }

    #[test]
    fn test_variable_lines_are_applied() {
        let mut store = seeded();
        let mut req = request(vec![2]);
        req.variable_lines.insert(
            2,
            vec![VariableLine {
                rubrique_code: "PRIMANC".to_string(),
                base: Decimal::from(1500),
                rate: None,
            }],
        );
        run(&mut store, &req);
        let payslip = payslips::find_payslip(store.connection(), 2, 1, period("2026-03"))
            .unwrap()
            .unwrap();
        assert_eq!(payslip.gross, Decimal::from(31500));
    }

    #[test]
    fn test_installment_tranche_recorded() {
        let mut store = seeded();
        installments::insert_installment(
            store.connection(),
            &Installment {
                id: 0,
                employee_id: 1,
                rubrique_code: "PRET".to_string(),
                total_amount: Decimal::from(6000),
                monthly_amount: Decimal::from(2000),
                outstanding: Decimal::from(6000),
                first_period: period("2026-03"),
                active: true,
            },
        )
        .unwrap();
        run(&mut store, &request(vec![1]));
        let tranches = installments::list_tranches(store.connection(), period("2026-03")).unwrap();
        assert_eq!(tranches.len(), 1);
        assert!(!tranches[0].settled);
    }

    fn loan(total: i64, monthly: i64) -> Installment {
        Installment {
            id: 0,
            employee_id: 1,
            rubrique_code: "PRET".to_string(),
            total_amount: Decimal::from(total),
            monthly_amount: Decimal::from(monthly),
            outstanding: Decimal::from(total),
            first_period: period("2026-03"),
            active: true,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
    }

    #[test]
    fn test_rows_after_closing_are_refused() {
        let mut store = seeded();
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let motif = prepare_run(&store, &request(vec![1, 2])).unwrap();

        pay_employee(&mut store, &config, &motif, period("2026-03"), 1, &[]).unwrap();
        closing::close_period(&mut store, &config, today(), dir.path()).unwrap();
        let late = pay_employee(&mut store, &config, &motif, period("2026-03"), 2, &[]);

        assert!(matches!(late, Err(PayrollError::PeriodNotOpen { .. })));
        let march = payslips::list_payslips(store.connection(), period("2026-03")).unwrap();
        assert_eq!(march.len(), 1);
        assert!(march.iter().all(|p| p.closed));
    }

    #[test]
    fn test_second_motif_sees_tranche_already_withheld() {
        let mut store = seeded();
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        employees::upsert_motif(store.connection(), &motif(2, "STC", MotifKind::Termination))
            .unwrap();
        let loan_id = installments::insert_installment(store.connection(), &loan(9000, 3000)).unwrap();

        run(&mut store, &request(vec![1]));
        let mut stc = request(vec![1]);
        stc.motif_code = "STC".to_string();
        run(&mut store, &stc);

        let tranches = installments::list_tranches(store.connection(), period("2026-03")).unwrap();
        let amounts: Vec<Decimal> = tranches.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![Decimal::from(3000), Decimal::from(6000)]);

        closing::close_period(&mut store, &config, today(), dir.path()).unwrap();
        assert!(installments::active_installments(store.connection(), 1).unwrap().is_empty());

        closing::cancel_last_closure(&mut store, today()).unwrap();
        let restored = installments::active_installments(store.connection(), 1).unwrap();
        assert_eq!(restored[0].id, loan_id);
        assert_eq!(restored[0].outstanding, Decimal::from(9000));
    }

    #[test]
    fn test_second_regular_motif_takes_only_rest_of_monthly_tranche() {
        let mut store = seeded();
        employees::upsert_motif(store.connection(), &motif(2, "RAPPEL", MotifKind::Regular))
            .unwrap();
        installments::insert_installment(store.connection(), &loan(9000, 3000)).unwrap();

        run(&mut store, &request(vec![1]));
        let mut recall = request(vec![1]);
        recall.motif_code = "RAPPEL".to_string();
        run(&mut store, &recall);

        let tranches = installments::list_tranches(store.connection(), period("2026-03")).unwrap();
        assert_eq!(tranches.len(), 1);
        assert_eq!(tranches[0].motif_id, 1);
    }

    #[test]
    fn test_cnss_ceiling_spans_payslips_of_the_month() {
        let mut store = seeded();
        employees::upsert_motif(store.connection(), &motif(2, "STC", MotifKind::Termination))
            .unwrap();

        run(&mut store, &request(vec![1]));
        let mut stc = request(vec![1]);
        stc.motif_code = "STC".to_string();
        run(&mut store, &stc);

        let normal = payslips::find_payslip(store.connection(), 1, 1, period("2026-03"))
            .unwrap()
            .unwrap();
        let termination = payslips::find_payslip(store.connection(), 1, 2, period("2026-03"))
            .unwrap()
            .unwrap();
        assert_eq!(normal.cnss_base, Decimal::from(7000));
        assert_eq!(termination.cnss_base, Decimal::ZERO);
        assert_eq!(termination.cnss_employee, Decimal::ZERO);
        assert_eq!(termination.cnam_base, Decimal::from(30000));
    }

    #[test]
    fn test_default_paid_days_for_mid_month_hire() {
        let mut hired = employee(1, 30000, None);
        hired.hire_date = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        // 17..=31 March
        assert_eq!(
            default_paid_days(&hired, period("2026-03"), Decimal::from(30)),
            Decimal::from(15)
        );
    }

    #[test]
    fn test_default_paid_days_full_month() {
        let full = employee(1, 30000, None);
        assert_eq!(
            default_paid_days(&full, period("2026-02"), Decimal::from(30)),
            Decimal::from(30)
        );
    }
}
