//! Quarterly CNAM declaration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::calculation::employer_share_from_employee;
use crate::config::ConfigLoader;
use crate::error::PayrollResult;
use crate::export::write_csv;
use crate::models::Quarter;
use crate::store::PayrollStore;

use super::{declared_payslips, employee_index};

/// One employee of the CNAM list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CnamLine {
    /// Personnel number.
    pub matricule: String,
    /// Employee name.
    pub full_name: String,
    /// CNAM registration number.
    pub cnam_number: String,
    /// Quarter contribution base.
    pub base: Decimal,
    /// Employee share withheld over the quarter.
    pub employee_share: Decimal,
}

/// The CNAM declaration of a quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CnamDeclaration {
    /// The declared quarter.
    pub quarter: Quarter,
    /// Employer registration number.
    pub employer_number: String,
    /// One line per employee.
    pub lines: Vec<CnamLine>,
    /// Sum of bases.
    pub total_base: Decimal,
    /// Sum of employee shares.
    pub employee_total: Decimal,
    /// Employer share, derived from the employee total.
    pub employer_total: Decimal,
}

impl CnamDeclaration {
    /// Writes the list as `CNAM_<year>-T<q>.csv`.
    pub fn write_csv(&self, dir: &Path) -> PayrollResult<PathBuf> {
        let path = dir.join(format!("CNAM_{}.csv", self.quarter));
        write_csv(
            &path,
            &["matricule", "full_name", "cnam_number", "base", "employee_share"],
            &self.lines,
        )?;
        Ok(path)
    }
}

/// Builds the CNAM declaration of a quarter from payslips of CNAM-declared
/// motifs.
pub fn cnam_declaration(
    store: &PayrollStore,
    config: &ConfigLoader,
    quarter: Quarter,
) -> PayrollResult<CnamDeclaration> {
    let conn = store.connection();
    let employees = employee_index(conn)?;

    let mut per_employee: BTreeMap<i64, (Decimal, Decimal)> = BTreeMap::new();
    for period in quarter.periods() {
        for payslip in declared_payslips(conn, period, |m| m.declared_cnam)? {
            let entry = per_employee.entry(payslip.employee_id).or_default();
            entry.0 += payslip.cnam_base;
            entry.1 += payslip.cnam_employee;
        }
    }

    let lines: Vec<CnamLine> = per_employee
        .into_iter()
        .map(|(id, (base, employee_share))| {
            let employee = employees.get(&id);
            CnamLine {
                matricule: employee.map(|e| e.matricule.clone()).unwrap_or_default(),
                full_name: employee.map(|e| e.full_name.clone()).unwrap_or_default(),
                cnam_number: employee
                    .and_then(|e| e.cnam_number.clone())
                    .unwrap_or_default(),
                base,
                employee_share,
            }
        })
        .collect();

    let employee_total: Decimal = lines.iter().map(|l| l.employee_share).sum();
    let declaration = CnamDeclaration {
        quarter,
        employer_number: config.config().company().cnam_employer_number.clone(),
        total_base: lines.iter().map(|l| l.base).sum(),
        employer_total: employer_share_from_employee(employee_total, &config.config().rates().cnam),
        employee_total,
        lines,
    };
    info!(
        quarter = %quarter,
        employees = declaration.lines.len(),
        employee_total = %declaration.employee_total,
        "CNAM declaration built"
    );
    Ok(declaration)
}
