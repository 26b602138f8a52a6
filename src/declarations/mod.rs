//! Statutory declarations.
//!
//! Declarations are read-only aggregations of stored payslips: ITS per
//! month, CNSS and CNAM per quarter. Only payslips whose motif carries the
//! matching declaration flag are counted. Each declaration serializes to
//! JSON for the report renderer and can be written as a CSV list.

mod cnam;
mod cnss;
mod its;

use std::collections::HashMap;

use rusqlite::Connection;

use crate::error::PayrollResult;
use crate::models::{Employee, Motif, Payslip, Period};
use crate::store::{employees, payslips};

pub use cnam::{CnamDeclaration, CnamLine, cnam_declaration};
pub use cnss::{CnssContribution, CnssDeclaration, CnssLine, cnss_declaration};
pub use its::{ItsDeclaration, ItsLine, its_declaration};

/// Payslips of a period whose motif passes `declared`.
fn declared_payslips(
    conn: &Connection,
    period: Period,
    declared: fn(&Motif) -> bool,
) -> PayrollResult<Vec<Payslip>> {
    let motifs: HashMap<i64, Motif> = employees::list_motifs(conn)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    Ok(payslips::list_payslips(conn, period)?
        .into_iter()
        .filter(|p| motifs.get(&p.motif_id).is_some_and(declared))
        .collect())
}

fn employee_index(conn: &Connection) -> PayrollResult<HashMap<i64, Employee>> {
    Ok(employees::list_employees(conn)?
        .into_iter()
        .map(|e| (e.id, e))
        .collect())
}
