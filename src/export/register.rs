//! Payroll register (`PAIE_<period>.csv`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::{PayrollError, PayrollResult};
use crate::models::Period;
use crate::store::{PayrollStore, employees, payslips};

use super::{report_path, write_csv};

const HEADERS: [&str; 11] = [
    "matricule",
    "full_name",
    "motif",
    "worked_days",
    "gross",
    "cnss",
    "cnam",
    "its",
    "other_deductions",
    "net",
    "closed",
];

/// One payslip of the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRow {
    /// Personnel number, or `TOTAL` on the last row.
    pub matricule: String,
    /// Employee name.
    pub full_name: String,
    /// Motif code.
    pub motif: String,
    /// Paid days.
    pub worked_days: Decimal,
    /// Gross pay.
    pub gross: Decimal,
    /// CNSS withheld.
    pub cnss: Decimal,
    /// CNAM withheld.
    pub cnam: Decimal,
    /// ITS withheld.
    pub its: Decimal,
    /// Installments and manual deductions.
    pub other_deductions: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// Whether the payslip is closed.
    pub closed: bool,
}

/// Writes the register of a period, one row per payslip plus a total row.
///
/// # Errors
///
/// - [`PayrollError::NoPayslips`] when the period has no payslip
pub fn write_payroll_register(
    store: &PayrollStore,
    period: Period,
    dir: &Path,
) -> PayrollResult<PathBuf> {
    let conn = store.connection();
    let payslips = payslips::list_payslips(conn, period)?;
    if payslips.is_empty() {
        return Err(PayrollError::NoPayslips {
            period: period.to_string(),
        });
    }
    let employees: HashMap<i64, _> = employees::list_employees(conn)?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let motifs: HashMap<i64, String> = employees::list_motifs(conn)?
        .into_iter()
        .map(|m| (m.id, m.code))
        .collect();

    let mut rows: Vec<RegisterRow> = payslips
        .iter()
        .map(|p| {
            let employee = employees.get(&p.employee_id);
            RegisterRow {
                matricule: employee.map(|e| e.matricule.clone()).unwrap_or_default(),
                full_name: employee.map(|e| e.full_name.clone()).unwrap_or_default(),
                motif: motifs.get(&p.motif_id).cloned().unwrap_or_default(),
                worked_days: p.worked_days,
                gross: p.gross,
                cnss: p.cnss_employee,
                cnam: p.cnam_employee,
                its: p.its,
                other_deductions: p.other_deductions,
                net: p.net,
                closed: p.closed,
            }
        })
        .collect();

    let total = RegisterRow {
        matricule: "TOTAL".to_string(),
        full_name: String::new(),
        motif: String::new(),
        worked_days: Decimal::ZERO,
        gross: rows.iter().map(|r| r.gross).sum(),
        cnss: rows.iter().map(|r| r.cnss).sum(),
        cnam: rows.iter().map(|r| r.cnam).sum(),
        its: rows.iter().map(|r| r.its).sum(),
        other_deductions: rows.iter().map(|r| r.other_deductions).sum(),
        net: rows.iter().map(|r| r.net).sum(),
        closed: rows.iter().all(|r| r.closed),
    };
    rows.push(total);

    let path = report_path(dir, "PAIE", period, "csv");
    write_csv(&path, &HEADERS, &rows)?;
    info!(period = %period, payslips = payslips.len(), path = %path.display(), "Payroll register written");
    Ok(path)
}
