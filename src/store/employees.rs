//! Employee and motif repositories.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{PayrollError, PayrollResult};
use crate::models::{Employee, Motif, MotifKind};

use super::codec::{decimal, parsed};

const EMPLOYEE_COLUMNS: &str = "id, matricule, full_name, national_id, cnss_number, cnam_number, \
     hire_date, termination_date, base_salary, bank_code, bank_account, \
     subject_to_cnss, subject_to_cnam, subject_to_its";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        matricule: row.get("matricule")?,
        full_name: row.get("full_name")?,
        national_id: row.get("national_id")?,
        cnss_number: row.get("cnss_number")?,
        cnam_number: row.get("cnam_number")?,
        hire_date: row.get("hire_date")?,
        termination_date: row.get("termination_date")?,
        base_salary: decimal(row, "base_salary")?,
        bank_code: row.get("bank_code")?,
        bank_account: row.get("bank_account")?,
        subject_to_cnss: row.get("subject_to_cnss")?,
        subject_to_cnam: row.get("subject_to_cnam")?,
        subject_to_its: row.get("subject_to_its")?,
    })
}

/// Inserts an employee with its given id.
pub fn insert_employee(conn: &Connection, employee: &Employee) -> PayrollResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO employe ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            EMPLOYEE_COLUMNS
        ),
        params![
            employee.id,
            employee.matricule,
            employee.full_name,
            employee.national_id,
            employee.cnss_number,
            employee.cnam_number,
            employee.hire_date,
            employee.termination_date,
            employee.base_salary.to_string(),
            employee.bank_code,
            employee.bank_account,
            employee.subject_to_cnss,
            employee.subject_to_cnam,
            employee.subject_to_its,
        ],
    )?;
    Ok(())
}

/// Loads one employee.
pub fn get_employee(conn: &Connection, id: i64) -> PayrollResult<Employee> {
    conn.query_row(
        &format!("SELECT {} FROM employe WHERE id = ?1", EMPLOYEE_COLUMNS),
        [id],
        employee_from_row,
    )
    .optional()?
    .ok_or(PayrollError::EmployeeNotFound { id })
}

/// All employees ordered by id.
pub fn list_employees(conn: &Connection) -> PayrollResult<Vec<Employee>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM employe ORDER BY id",
        EMPLOYEE_COLUMNS
    ))?;
    let employees = stmt
        .query_map([], employee_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(employees)
}

fn motif_from_row(row: &Row<'_>) -> rusqlite::Result<Motif> {
    Ok(Motif {
        id: row.get("id")?,
        code: row.get("code")?,
        label: row.get("label")?,
        kind: parsed(row, "kind", MotifKind::parse)?,
        declared_cnss: row.get("declared_cnss")?,
        declared_cnam: row.get("declared_cnam")?,
        declared_its: row.get("declared_its")?,
    })
}

/// Inserts a motif, or updates the one with the same code.
///
/// Returns the motif id.
pub fn upsert_motif(conn: &Connection, motif: &Motif) -> PayrollResult<i64> {
    let id = conn.query_row(
        "INSERT INTO motif (id, code, label, kind, declared_cnss, declared_cnam, declared_its)
         VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(code) DO UPDATE SET
             label = excluded.label,
             kind = excluded.kind,
             declared_cnss = excluded.declared_cnss,
             declared_cnam = excluded.declared_cnam,
             declared_its = excluded.declared_its
         RETURNING id",
        params![
            motif.id,
            motif.code,
            motif.label,
            motif.kind.as_str(),
            motif.declared_cnss,
            motif.declared_cnam,
            motif.declared_its,
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Loads a motif by code.
pub fn get_motif_by_code(conn: &Connection, code: &str) -> PayrollResult<Motif> {
    conn.query_row(
        "SELECT id, code, label, kind, declared_cnss, declared_cnam, declared_its
         FROM motif WHERE code = ?1",
        [code],
        motif_from_row,
    )
    .optional()?
    .ok_or_else(|| PayrollError::MotifNotFound {
        code: code.to_string(),
    })
}

/// All motifs ordered by id.
pub fn list_motifs(conn: &Connection) -> PayrollResult<Vec<Motif>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, label, kind, declared_cnss, declared_cnam, declared_its
         FROM motif ORDER BY id",
    )?;
    let motifs = stmt
        .query_map([], motif_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(motifs)
}
