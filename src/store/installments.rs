//! Installment (`retenuesaecheances`) and tranche
//! (`tranchesretenuesaecheances`) repositories.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rusqlite::{Connection, Row, params};
use tracing::warn;

use crate::error::PayrollResult;
use crate::models::{Installment, InstallmentTranche, Period};

use super::codec::{decimal, optional_decimal};

fn installment_from_row(row: &Row<'_>) -> rusqlite::Result<Installment> {
    Ok(Installment {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        rubrique_code: row.get("rubrique_code")?,
        total_amount: decimal(row, "total_amount")?,
        monthly_amount: decimal(row, "monthly_amount")?,
        outstanding: decimal(row, "outstanding")?,
        first_period: row.get("first_period")?,
        active: row.get("active")?,
    })
}

fn tranche_from_row(row: &Row<'_>) -> rusqlite::Result<InstallmentTranche> {
    Ok(InstallmentTranche {
        id: row.get("id")?,
        installment_id: row.get("installment_id")?,
        employee_id: row.get("employee_id")?,
        motif_id: row.get("motif_id")?,
        period: row.get("period")?,
        amount: decimal(row, "amount")?,
        settled: row.get("settled")?,
        applied: optional_decimal(row, "applied")?,
    })
}

/// Inserts an installment. Returns its id.
pub fn insert_installment(conn: &Connection, installment: &Installment) -> PayrollResult<i64> {
    conn.execute(
        "INSERT INTO retenuesaecheances
             (employee_id, rubrique_code, total_amount, monthly_amount, outstanding, first_period, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            installment.employee_id,
            installment.rubrique_code,
            installment.total_amount.to_string(),
            installment.monthly_amount.to_string(),
            installment.outstanding.to_string(),
            installment.first_period,
            installment.active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const INSTALLMENT_QUERY: &str = "SELECT id, employee_id, rubrique_code, total_amount, \
     monthly_amount, outstanding, first_period, active FROM retenuesaecheances";

/// Active installments of one employee.
pub fn active_installments(conn: &Connection, employee_id: i64) -> PayrollResult<Vec<Installment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE employee_id = ?1 AND active = 1 ORDER BY id",
        INSTALLMENT_QUERY
    ))?;
    let installments = stmt
        .query_map([employee_id], installment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(installments)
}

/// Every active installment with an outstanding balance.
pub fn outstanding_installments(conn: &Connection) -> PayrollResult<Vec<Installment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE active = 1 ORDER BY employee_id, id",
        INSTALLMENT_QUERY
    ))?;
    let installments = stmt
        .query_map([], installment_from_row)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|i| i.outstanding > Decimal::ZERO)
        .collect();
    Ok(installments)
}

fn get_installment(conn: &Connection, id: i64) -> PayrollResult<Installment> {
    Ok(conn.query_row(
        &format!("{} WHERE id = ?1", INSTALLMENT_QUERY),
        [id],
        installment_from_row,
    )?)
}

fn update_balance(conn: &Connection, id: i64, outstanding: Decimal) -> PayrollResult<()> {
    conn.execute(
        "UPDATE retenuesaecheances SET outstanding = ?1, active = ?2 WHERE id = ?3",
        params![outstanding.to_string(), outstanding > Decimal::ZERO, id],
    )?;
    Ok(())
}

/// Records a tranche deducted on a payslip.
pub fn insert_tranche(
    conn: &Connection,
    installment_id: i64,
    employee_id: i64,
    motif_id: i64,
    period: Period,
    amount: Decimal,
) -> PayrollResult<i64> {
    conn.execute(
        "INSERT INTO tranchesretenuesaecheances (installment_id, employee_id, motif_id, period, amount, settled)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![installment_id, employee_id, motif_id, period, amount.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes the unsettled tranches of one payslip.
pub fn delete_open_tranches(
    conn: &Connection,
    employee_id: i64,
    motif_id: i64,
    period: Period,
) -> PayrollResult<usize> {
    Ok(conn.execute(
        "DELETE FROM tranchesretenuesaecheances
         WHERE employee_id = ?1 AND motif_id = ?2 AND period = ?3 AND settled = 0",
        params![employee_id, motif_id, period],
    )?)
}

/// Amounts already withheld per installment on the other payslips of an
/// employee in a period, not yet settled.
pub fn open_deductions(
    conn: &Connection,
    employee_id: i64,
    period: Period,
    excluding_motif: i64,
) -> PayrollResult<HashMap<i64, Decimal>> {
    let mut deducted: HashMap<i64, Decimal> = HashMap::new();
    for tranche in list_tranches(conn, period)? {
        if tranche.employee_id == employee_id
            && tranche.motif_id != excluding_motif
            && !tranche.settled
        {
            *deducted.entry(tranche.installment_id).or_default() += tranche.amount;
        }
    }
    Ok(deducted)
}

/// Tranches of a period, ordered by id.
pub fn list_tranches(conn: &Connection, period: Period) -> PayrollResult<Vec<InstallmentTranche>> {
    let mut stmt = conn.prepare(
        "SELECT id, installment_id, employee_id, motif_id, period, amount, settled, applied
         FROM tranchesretenuesaecheances WHERE period = ?1 ORDER BY id",
    )?;
    let tranches = stmt
        .query_map([period], tranche_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tranches)
}

/// Settles the open tranches of a period: each decrements its installment's
/// outstanding balance, and a fully repaid installment is deactivated.
///
/// The amount taken off the balance never exceeds it and is recorded on the
/// tranche, so [`unsettle_tranches`] restores exactly that amount.
///
/// Returns the number of tranches settled.
pub fn settle_tranches(conn: &Connection, period: Period) -> PayrollResult<usize> {
    let open: Vec<InstallmentTranche> = list_tranches(conn, period)?
        .into_iter()
        .filter(|t| !t.settled)
        .collect();
    for tranche in &open {
        let installment = get_installment(conn, tranche.installment_id)?;
        let applied = tranche
            .amount
            .min(installment.outstanding)
            .max(Decimal::ZERO);
        if applied < tranche.amount {
            warn!(
                installment_id = installment.id,
                deducted = %tranche.amount,
                applied = %applied,
                "Tranche exceeds outstanding balance"
            );
        }
        update_balance(conn, installment.id, installment.outstanding - applied)?;
        conn.execute(
            "UPDATE tranchesretenuesaecheances SET settled = 1, applied = ?1 WHERE id = ?2",
            params![applied.to_string(), tranche.id],
        )?;
    }
    Ok(open.len())
}

/// Reverses [`settle_tranches`] for a period: balances are restored and the
/// installments reactivated.
///
/// Returns the number of tranches unsettled.
pub fn unsettle_tranches(conn: &Connection, period: Period) -> PayrollResult<usize> {
    let settled: Vec<InstallmentTranche> = list_tranches(conn, period)?
        .into_iter()
        .filter(|t| t.settled)
        .collect();
    for tranche in &settled {
        let installment = get_installment(conn, tranche.installment_id)?;
        let applied = tranche.applied.unwrap_or(tranche.amount);
        update_balance(conn, installment.id, installment.outstanding + applied)?;
        conn.execute(
            "UPDATE tranchesretenuesaecheances SET settled = 0, applied = NULL WHERE id = ?1",
            [tranche.id],
        )?;
    }
    Ok(settled.len())
}

/// Deletes every tranche of a period. Returns the rows deleted.
pub fn delete_period_tranches(conn: &Connection, period: Period) -> PayrollResult<usize> {
    Ok(conn.execute(
        "DELETE FROM tranchesretenuesaecheances WHERE period = ?1",
        [period],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MotifKind;
    use crate::store::employees;
    use crate::store::test_support::{employee, motif, period, store};

    fn loan(outstanding: i64) -> Installment {
        Installment {
            id: 0,
            employee_id: 1,
            rubrique_code: "PRET".to_string(),
            total_amount: Decimal::from(9000),
            monthly_amount: Decimal::from(3000),
            outstanding: Decimal::from(outstanding),
            first_period: period("2026-01"),
            active: true,
        }
    }

    fn seeded() -> crate::store::PayrollStore {
        let store = store("2026-03");
        employees::insert_employee(store.connection(), &employee(1, 30000, None)).unwrap();
        store
    }

    #[test]
    fn test_settle_decrements_and_deactivates() {
        let store = seeded();
        let conn = store.connection();
        let id = insert_installment(conn, &loan(3000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();

        assert_eq!(settle_tranches(conn, period("2026-03")).unwrap(), 1);
        assert!(active_installments(conn, 1).unwrap().is_empty());
        assert!(outstanding_installments(conn).unwrap().is_empty());
        assert!(list_tranches(conn, period("2026-03")).unwrap()[0].settled);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let store = seeded();
        let conn = store.connection();
        let id = insert_installment(conn, &loan(9000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();

        settle_tranches(conn, period("2026-03")).unwrap();
        assert_eq!(settle_tranches(conn, period("2026-03")).unwrap(), 0);
        assert_eq!(active_installments(conn, 1).unwrap()[0].outstanding, Decimal::from(6000));
    }

    #[test]
    fn test_unsettle_restores_balance() {
        let store = seeded();
        let conn = store.connection();
        let id = insert_installment(conn, &loan(3000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();
        settle_tranches(conn, period("2026-03")).unwrap();

        assert_eq!(unsettle_tranches(conn, period("2026-03")).unwrap(), 1);
        let restored = active_installments(conn, 1).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].outstanding, Decimal::from(3000));
        assert!(!list_tranches(conn, period("2026-03")).unwrap()[0].settled);
    }

    #[test]
    fn test_delete_open_tranches_keeps_settled() {
        let store = seeded();
        let conn = store.connection();
        let id = insert_installment(conn, &loan(9000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();
        settle_tranches(conn, period("2026-03")).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(100)).unwrap();

        assert_eq!(delete_open_tranches(conn, 1, 1, period("2026-03")).unwrap(), 1);
        assert_eq!(list_tranches(conn, period("2026-03")).unwrap().len(), 1);
        assert_eq!(delete_period_tranches(conn, period("2026-03")).unwrap(), 1);
    }

    #[test]
    fn test_open_deductions_skip_own_motif_and_settled() {
        let store = seeded();
        let conn = store.connection();
        employees::upsert_motif(conn, &motif(2, "STC", MotifKind::Termination)).unwrap();
        let id = insert_installment(conn, &loan(9000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();
        insert_tranche(conn, id, 1, 2, period("2026-03"), Decimal::from(500)).unwrap();

        let seen_by_stc = open_deductions(conn, 1, period("2026-03"), 2).unwrap();
        assert_eq!(seen_by_stc.get(&id), Some(&Decimal::from(3000)));

        settle_tranches(conn, period("2026-03")).unwrap();
        assert!(open_deductions(conn, 1, period("2026-03"), 2).unwrap().is_empty());
    }

    #[test]
    fn test_settle_and_unsettle_mirror_over_deduction() {
        let store = seeded();
        let conn = store.connection();
        employees::upsert_motif(conn, &motif(2, "STC", MotifKind::Termination)).unwrap();
        let id = insert_installment(conn, &loan(4000)).unwrap();
        insert_tranche(conn, id, 1, 1, period("2026-03"), Decimal::from(3000)).unwrap();
        insert_tranche(conn, id, 1, 2, period("2026-03"), Decimal::from(3000)).unwrap();

        settle_tranches(conn, period("2026-03")).unwrap();
        let applied: Vec<_> = list_tranches(conn, period("2026-03"))
            .unwrap()
            .into_iter()
            .map(|t| t.applied)
            .collect();
        assert_eq!(applied, vec![Some(Decimal::from(3000)), Some(Decimal::from(1000))]);
        assert!(active_installments(conn, 1).unwrap().is_empty());

        unsettle_tranches(conn, period("2026-03")).unwrap();
        let restored = active_installments(conn, 1).unwrap();
        assert_eq!(restored[0].outstanding, Decimal::from(4000));
        assert!(list_tranches(conn, period("2026-03")).unwrap()[0].applied.is_none());
    }
}
