//! Engagement snapshot (`ENGAGEMENTS_<period>.csv`): the installments still
//! outstanding when a period is closed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::error::PayrollResult;
use crate::models::Period;
use crate::store::{employees, installments};

use super::{report_path, write_csv};

const HEADERS: [&str; 8] = [
    "matricule",
    "full_name",
    "rubrique",
    "total_amount",
    "monthly_amount",
    "outstanding",
    "first_period",
    "due_this_period",
];

/// One outstanding installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementRow {
    /// Personnel number.
    pub matricule: String,
    /// Employee name.
    pub full_name: String,
    /// Deduction wage code.
    pub rubrique: String,
    /// Amount granted.
    pub total_amount: Decimal,
    /// Monthly tranche.
    pub monthly_amount: Decimal,
    /// Balance before the period's tranches are settled.
    pub outstanding: Decimal,
    /// First period of repayment.
    pub first_period: Period,
    /// Tranche due in the snapshot period.
    pub due_this_period: Decimal,
}

/// Writes the engagement snapshot of a period.
///
/// Takes a plain connection so closing can call it before its transaction.
pub fn write_engagements(conn: &Connection, period: Period, dir: &Path) -> PayrollResult<PathBuf> {
    let names: HashMap<i64, (String, String)> = employees::list_employees(conn)?
        .into_iter()
        .map(|e| (e.id, (e.matricule, e.full_name)))
        .collect();

    let rows: Vec<EngagementRow> = installments::outstanding_installments(conn)?
        .into_iter()
        .map(|i| {
            let (matricule, full_name) = names.get(&i.employee_id).cloned().unwrap_or_default();
            let due_this_period = if i.is_due_in(period) {
                i.next_tranche()
            } else {
                Decimal::ZERO
            };
            EngagementRow {
                matricule,
                full_name,
                rubrique: i.rubrique_code,
                total_amount: i.total_amount,
                monthly_amount: i.monthly_amount,
                outstanding: i.outstanding,
                first_period: i.first_period,
                due_this_period,
            }
        })
        .collect();

    let path = report_path(dir, "ENGAGEMENTS", period, "csv");
    write_csv(&path, &HEADERS, &rows)?;
    info!(period = %period, engagements = rows.len(), path = %path.display(), "Engagement snapshot written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Installment;
    use crate::store::test_support::{employee, period, store};

    #[test]
    fn test_snapshot_lists_outstanding_installments() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 30000, None)).unwrap();
        let loan = |outstanding: i64, first: &str| Installment {
            id: 0,
            employee_id: 1,
            rubrique_code: "PRET".to_string(),
            total_amount: Decimal::from(9000),
            monthly_amount: Decimal::from(3000),
            outstanding: Decimal::from(outstanding),
            first_period: period(first),
            active: outstanding > 0,
        };
        installments::insert_installment(conn, &loan(6000, "2026-01")).unwrap();
        installments::insert_installment(conn, &loan(9000, "2026-06")).unwrap();
        installments::insert_installment(conn, &loan(0, "2025-01")).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_engagements(conn, period("2026-03"), dir.path()).unwrap();
        assert!(path.ends_with("ENGAGEMENTS_2026-03.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "M001");
        assert_eq!(&records[0][5], "6000");
        assert_eq!(&records[0][7], "3000");
        assert_eq!(&records[1][6], "2026-06");
        assert_eq!(&records[1][7], "0");
    }

    #[test]
    fn test_empty_snapshot_has_header() {
        let store = store("2026-03");
        let dir = tempfile::tempdir().unwrap();
        let path = write_engagements(store.connection(), period("2026-03"), dir.path()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
