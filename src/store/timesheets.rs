//! Leave (`conges`), timesheet (`jour`, `weekot`) and paid-days
//! (`njtsalarie`) repositories.

use rust_decimal::Decimal;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::PayrollResult;
use crate::models::{LeaveKind, LeaveRecord, Period, WeeklyOvertime, WorkedDay, WorkedDays};

use super::codec::{decimal, parsed};

fn leave_from_row(row: &Row<'_>) -> rusqlite::Result<LeaveRecord> {
    Ok(LeaveRecord {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        period: row.get("period")?,
        kind: parsed(row, "kind", LeaveKind::parse)?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        days: decimal(row, "days")?,
    })
}

/// Inserts a leave record. Returns its id.
pub fn insert_leave(conn: &Connection, leave: &LeaveRecord) -> PayrollResult<i64> {
    conn.execute(
        "INSERT INTO conges (employee_id, period, kind, start_date, end_date, days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            leave.employee_id,
            leave.period,
            leave.kind.as_str(),
            leave.start_date,
            leave.end_date,
            leave.days.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Leave records of a period.
pub fn list_leave(conn: &Connection, period: Period) -> PayrollResult<Vec<LeaveRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, period, kind, start_date, end_date, days
         FROM conges WHERE period = ?1 ORDER BY employee_id, id",
    )?;
    let records = stmt
        .query_map([period], leave_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Leave balance of an employee: accrued days less annual leave taken.
pub fn leave_balance(conn: &Connection, employee_id: i64) -> PayrollResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, period, kind, start_date, end_date, days
         FROM conges WHERE employee_id = ?1",
    )?;
    let mut balance = Decimal::ZERO;
    for record in stmt.query_map([employee_id], leave_from_row)? {
        let record = record?;
        match record.kind {
            LeaveKind::Accrual => balance += record.days,
            LeaveKind::Annual => balance -= record.days,
            LeaveKind::Sick | LeaveKind::Unpaid => {}
        }
    }
    Ok(balance)
}

/// Deletes the accrual records booked in a period. Returns the rows deleted.
pub fn delete_accruals(conn: &Connection, period: Period) -> PayrollResult<usize> {
    Ok(conn.execute(
        "DELETE FROM conges WHERE period = ?1 AND kind = ?2",
        params![period, LeaveKind::Accrual.as_str()],
    )?)
}

/// Records a timesheet day, replacing an earlier entry for the same date.
pub fn upsert_worked_day(conn: &Connection, day: &WorkedDay) -> PayrollResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO jour (employee_id, period, date, hours) VALUES (?1, ?2, ?3, ?4)",
        params![day.employee_id, day.period, day.date, day.hours.to_string()],
    )?;
    Ok(())
}

/// Timesheet days of a period.
pub fn list_worked_days(conn: &Connection, period: Period) -> PayrollResult<Vec<WorkedDay>> {
    let mut stmt = conn.prepare(
        "SELECT employee_id, period, date, hours FROM jour WHERE period = ?1 ORDER BY employee_id, date",
    )?;
    let days = stmt
        .query_map([period], |row| {
            Ok(WorkedDay {
                employee_id: row.get("employee_id")?,
                period: row.get("period")?,
                date: row.get("date")?,
                hours: decimal(row, "hours")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(days)
}

/// Records weekly overtime, replacing an earlier entry for the same week.
pub fn upsert_weekly_overtime(conn: &Connection, week: &WeeklyOvertime) -> PayrollResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO weekot (employee_id, period, week_start, hours) VALUES (?1, ?2, ?3, ?4)",
        params![week.employee_id, week.period, week.week_start, week.hours.to_string()],
    )?;
    Ok(())
}

/// Weekly overtime of a period.
pub fn list_weekly_overtime(conn: &Connection, period: Period) -> PayrollResult<Vec<WeeklyOvertime>> {
    let mut stmt = conn.prepare(
        "SELECT employee_id, period, week_start, hours FROM weekot
         WHERE period = ?1 ORDER BY employee_id, week_start",
    )?;
    let weeks = stmt
        .query_map([period], |row| {
            Ok(WeeklyOvertime {
                employee_id: row.get("employee_id")?,
                period: row.get("period")?,
                week_start: row.get("week_start")?,
                hours: decimal(row, "hours")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(weeks)
}

/// Records the paid days of an (employee, motif, period).
pub fn upsert_paid_days(conn: &Connection, days: &WorkedDays) -> PayrollResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO njtsalarie (employee_id, motif_id, period, days) VALUES (?1, ?2, ?3, ?4)",
        params![days.employee_id, days.motif_id, days.period, days.days.to_string()],
    )?;
    Ok(())
}

/// Paid days recorded for an (employee, motif, period).
pub fn paid_days(
    conn: &Connection,
    employee_id: i64,
    motif_id: i64,
    period: Period,
) -> PayrollResult<Option<Decimal>> {
    let days = conn
        .query_row(
            "SELECT days FROM njtsalarie WHERE employee_id = ?1 AND motif_id = ?2 AND period = ?3",
            params![employee_id, motif_id, period],
            |row| decimal(row, "days"),
        )
        .optional()?;
    Ok(days)
}

/// Per-table row counts removed by [`delete_period`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimesheetDeletion {
    /// Leave records.
    pub leave: usize,
    /// Timesheet days.
    pub worked_days: usize,
    /// Weekly overtime rows.
    pub weekly_overtime: usize,
    /// Paid-days rows.
    pub paid_days: usize,
}

/// Deletes the leave, timesheet and paid-days rows of a period.
pub fn delete_period(conn: &Connection, period: Period) -> PayrollResult<TimesheetDeletion> {
    Ok(TimesheetDeletion {
        leave: conn.execute("DELETE FROM conges WHERE period = ?1", [period])?,
        worked_days: conn.execute("DELETE FROM jour WHERE period = ?1", [period])?,
        weekly_overtime: conn.execute("DELETE FROM weekot WHERE period = ?1", [period])?,
        paid_days: conn.execute("DELETE FROM njtsalarie WHERE period = ?1", [period])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::employees;
    use crate::store::test_support::{employee, period, store};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leave(kind: LeaveKind, p: &str, days: i64) -> LeaveRecord {
        let period = period(p);
        LeaveRecord {
            id: 0,
            employee_id: 1,
            period,
            kind,
            start_date: period.first_day(),
            end_date: period.last_day(),
            days: Decimal::from(days),
        }
    }

    #[test]
    fn test_leave_balance() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 1000, None)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Accrual, "2026-01", 5)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Annual, "2026-02", 3)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Sick, "2026-02", 2)).unwrap();
        assert_eq!(leave_balance(conn, 1).unwrap(), Decimal::from(2));
        assert_eq!(list_leave(conn, period("2026-02")).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_accruals_keeps_leave_taken() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 1000, None)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Accrual, "2026-02", 5)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Annual, "2026-02", 1)).unwrap();
        assert_eq!(delete_accruals(conn, period("2026-02")).unwrap(), 1);
        assert_eq!(leave_balance(conn, 1).unwrap(), Decimal::from(-1));
    }

    #[test]
    fn test_worked_day_upsert_replaces_same_date() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 1000, None)).unwrap();
        let mut day = WorkedDay {
            employee_id: 1,
            period: period("2026-03"),
            date: date(2026, 3, 2),
            hours: Decimal::from(8),
        };
        upsert_worked_day(conn, &day).unwrap();
        day.hours = Decimal::from(10);
        upsert_worked_day(conn, &day).unwrap();
        let days = list_worked_days(conn, period("2026-03")).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].hours, Decimal::from(10));
    }

    #[test]
    fn test_paid_days_lookup() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 1000, None)).unwrap();
        upsert_paid_days(
            conn,
            &WorkedDays {
                employee_id: 1,
                motif_id: 1,
                period: period("2026-03"),
                days: Decimal::from(22),
            },
        )
        .unwrap();
        assert_eq!(paid_days(conn, 1, 1, period("2026-03")).unwrap(), Some(Decimal::from(22)));
        assert_eq!(paid_days(conn, 1, 1, period("2026-04")).unwrap(), None);
    }

    #[test]
    fn test_delete_period_counts_each_table() {
        let store = store("2026-03");
        let conn = store.connection();
        employees::insert_employee(conn, &employee(1, 1000, None)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Annual, "2026-03", 2)).unwrap();
        insert_leave(conn, &leave(LeaveKind::Annual, "2026-02", 2)).unwrap();
        upsert_worked_day(
            conn,
            &WorkedDay {
                employee_id: 1,
                period: period("2026-03"),
                date: date(2026, 3, 3),
                hours: Decimal::from(8),
            },
        )
        .unwrap();
        upsert_weekly_overtime(
            conn,
            &WeeklyOvertime {
                employee_id: 1,
                period: period("2026-03"),
                week_start: date(2026, 3, 2),
                hours: Decimal::from(4),
            },
        )
        .unwrap();

        let deleted = delete_period(conn, period("2026-03")).unwrap();
        assert_eq!(
            deleted,
            TimesheetDeletion {
                leave: 1,
                worked_days: 1,
                weekly_overtime: 1,
                paid_days: 0,
            }
        );
        assert_eq!(list_leave(conn, period("2026-02")).unwrap().len(), 1);
        assert!(list_weekly_overtime(conn, period("2026-03")).unwrap().is_empty());
    }
}
