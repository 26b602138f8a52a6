//! Payslip (`paie`) and payslip line (`rubriquepaie`) repositories.

use rust_decimal::Decimal;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::calculation::PayslipComputation;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{PayLine, Payslip, Period, RubriqueKind};

use super::codec::{decimal, optional_decimal, parsed};
use super::installments;

const PAYSLIP_COLUMNS: &str = "id, employee_id, motif_id, period, worked_days, gross, cnss_base, \
     cnss_employee, cnam_base, cnam_employee, taxable_base, its, other_deductions, net, closed";

fn payslip_from_row(row: &Row<'_>) -> rusqlite::Result<Payslip> {
    Ok(Payslip {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        motif_id: row.get("motif_id")?,
        period: row.get("period")?,
        worked_days: decimal(row, "worked_days")?,
        gross: decimal(row, "gross")?,
        cnss_base: decimal(row, "cnss_base")?,
        cnss_employee: decimal(row, "cnss_employee")?,
        cnam_base: decimal(row, "cnam_base")?,
        cnam_employee: decimal(row, "cnam_employee")?,
        taxable_base: decimal(row, "taxable_base")?,
        its: decimal(row, "its")?,
        other_deductions: decimal(row, "other_deductions")?,
        net: decimal(row, "net")?,
        closed: row.get("closed")?,
    })
}

fn line_from_row(row: &Row<'_>) -> rusqlite::Result<PayLine> {
    Ok(PayLine {
        rubrique_code: row.get("rubrique_code")?,
        label: row.get("label")?,
        kind: parsed(row, "kind", RubriqueKind::parse)?,
        base: decimal(row, "base")?,
        rate: optional_decimal(row, "rate")?,
        amount: decimal(row, "amount")?,
    })
}

/// Finds the payslip of an (employee, motif, period).
pub fn find_payslip(
    conn: &Connection,
    employee_id: i64,
    motif_id: i64,
    period: Period,
) -> PayrollResult<Option<Payslip>> {
    let payslip = conn
        .query_row(
            &format!(
                "SELECT {} FROM paie WHERE employee_id = ?1 AND motif_id = ?2 AND period = ?3",
                PAYSLIP_COLUMNS
            ),
            params![employee_id, motif_id, period],
            payslip_from_row,
        )
        .optional()?;
    Ok(payslip)
}

/// Stores a computed payslip with its lines and tranches, replacing any
/// previous computation of the same (employee, motif, period).
///
/// Run it inside a transaction: the replacement spans three tables.
///
/// Returns the new payslip id.
///
/// # Errors
///
/// - [`PayrollError::PayslipClosed`] when the existing payslip is closed
pub fn replace_payslip(conn: &Connection, computation: &PayslipComputation) -> PayrollResult<i64> {
    let p = &computation.payslip;
    if let Some(existing) = find_payslip(conn, p.employee_id, p.motif_id, p.period)? {
        if existing.closed {
            return Err(PayrollError::PayslipClosed {
                employee_id: p.employee_id,
                period: p.period.to_string(),
            });
        }
        conn.execute("DELETE FROM rubriquepaie WHERE paie_id = ?1", [existing.id])?;
        conn.execute("DELETE FROM paie WHERE id = ?1", [existing.id])?;
    }
    installments::delete_open_tranches(conn, p.employee_id, p.motif_id, p.period)?;

    conn.execute(
        "INSERT INTO paie (employee_id, motif_id, period, worked_days, gross, cnss_base,
             cnss_employee, cnam_base, cnam_employee, taxable_base, its, other_deductions, net, closed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)",
        params![
            p.employee_id,
            p.motif_id,
            p.period,
            p.worked_days.to_string(),
            p.gross.to_string(),
            p.cnss_base.to_string(),
            p.cnss_employee.to_string(),
            p.cnam_base.to_string(),
            p.cnam_employee.to_string(),
            p.taxable_base.to_string(),
            p.its.to_string(),
            p.other_deductions.to_string(),
            p.net.to_string(),
        ],
    )?;
    let paie_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "INSERT INTO rubriquepaie (paie_id, period, line_number, rubrique_code, label, kind, base, rate, amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (index, line) in computation.lines.iter().enumerate() {
        stmt.execute(params![
            paie_id,
            p.period,
            index as i64 + 1,
            line.rubrique_code,
            line.label,
            line.kind.as_str(),
            line.base.to_string(),
            line.rate.map(|r| r.to_string()),
            line.amount.to_string(),
        ])?;
    }

    for tranche in &computation.tranches {
        installments::insert_tranche(
            conn,
            tranche.installment_id,
            p.employee_id,
            p.motif_id,
            p.period,
            tranche.amount,
        )?;
    }

    Ok(paie_id)
}

/// Payslips of a period, ordered by employee then motif.
pub fn list_payslips(conn: &Connection, period: Period) -> PayrollResult<Vec<Payslip>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM paie WHERE period = ?1 ORDER BY employee_id, motif_id",
        PAYSLIP_COLUMNS
    ))?;
    let payslips = stmt
        .query_map([period], payslip_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(payslips)
}

/// Lines of one payslip, in order.
pub fn payslip_lines(conn: &Connection, paie_id: i64) -> PayrollResult<Vec<PayLine>> {
    let mut stmt = conn.prepare(
        "SELECT rubrique_code, label, kind, base, rate, amount
         FROM rubriquepaie WHERE paie_id = ?1 ORDER BY line_number",
    )?;
    let lines = stmt
        .query_map([paie_id], line_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

/// Every payslip line of a period.
pub fn period_lines(conn: &Connection, period: Period) -> PayrollResult<Vec<PayLine>> {
    let mut stmt = conn.prepare(
        "SELECT rubrique_code, label, kind, base, rate, amount
         FROM rubriquepaie WHERE period = ?1 ORDER BY paie_id, line_number",
    )?;
    let lines = stmt
        .query_map([period], line_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

/// CNSS base of an employee's payslips of a period on CNSS-declared motifs,
/// other than `excluding_motif`.
pub fn cnss_base_used(
    conn: &Connection,
    employee_id: i64,
    period: Period,
    excluding_motif: i64,
) -> PayrollResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT p.cnss_base AS cnss_base FROM paie p JOIN motif m ON m.id = p.motif_id
         WHERE p.employee_id = ?1 AND p.period = ?2 AND p.motif_id <> ?3 AND m.declared_cnss = 1",
    )?;
    let bases = stmt
        .query_map(params![employee_id, period, excluding_motif], |row| {
            decimal(row, "cnss_base")
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bases.into_iter().sum())
}

/// Number of payslips of a period.
pub fn count_payslips(conn: &Connection, period: Period) -> PayrollResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM paie WHERE period = ?1",
        [period],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Sets the closed flag of every payslip of a period. Returns the rows changed.
pub fn set_closed(conn: &Connection, period: Period, closed: bool) -> PayrollResult<usize> {
    let changed = conn.execute(
        "UPDATE paie SET closed = ?1 WHERE period = ?2",
        params![closed, period],
    )?;
    Ok(changed)
}

/// Deletes the payslip lines of a period. Returns the rows deleted.
pub fn delete_period_lines(conn: &Connection, period: Period) -> PayrollResult<usize> {
    Ok(conn.execute("DELETE FROM rubriquepaie WHERE period = ?1", [period])?)
}

/// Deletes the payslips of a period. Lines must be deleted first.
pub fn delete_period_payslips(conn: &Connection, period: Period) -> PayrollResult<usize> {
    Ok(conn.execute("DELETE FROM paie WHERE period = ?1", [period])?)
}
