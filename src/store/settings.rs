//! Settings (`paramgen`) and closure history repositories.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{PayrollError, PayrollResult};
use crate::models::{ClosureRecord, GeneralSettings, Period};

/// Writes the settings row unless one already exists.
///
/// Returns true when the row was created.
pub fn init_settings(conn: &Connection, settings: &GeneralSettings) -> PayrollResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO paramgen (id, current_period, license_expiry) VALUES (1, ?1, ?2)",
        params![settings.current_period, settings.license_expiry],
    )?;
    Ok(inserted == 1)
}

/// Loads the settings row.
///
/// # Errors
///
/// - [`PayrollError::CalculationError`] when the store was never initialised
pub fn load_settings(conn: &Connection) -> PayrollResult<GeneralSettings> {
    conn.query_row(
        "SELECT current_period, license_expiry FROM paramgen WHERE id = 1",
        [],
        |row| {
            Ok(GeneralSettings {
                current_period: row.get("current_period")?,
                license_expiry: row.get("license_expiry")?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| PayrollError::CalculationError {
        message: "payroll settings are not initialised".to_string(),
    })
}

/// Moves the current period. Only the closing transitions call this.
pub(crate) fn set_current_period(conn: &Connection, period: Period) -> PayrollResult<()> {
    conn.execute(
        "UPDATE paramgen SET current_period = ?1 WHERE id = 1",
        [period],
    )?;
    Ok(())
}

/// Records the closure of a period.
pub fn record_closure(conn: &Connection, record: &ClosureRecord) -> PayrollResult<()> {
    conn.execute(
        "INSERT INTO closure_history (period, closed_at) VALUES (?1, ?2)",
        params![record.period, record.closed_at],
    )?;
    Ok(())
}

/// The closure of a period, if it was closed.
pub fn find_closure(conn: &Connection, period: Period) -> PayrollResult<Option<ClosureRecord>> {
    let record = conn
        .query_row(
            "SELECT period, closed_at FROM closure_history WHERE period = ?1",
            [period],
            |row| {
                Ok(ClosureRecord {
                    period: row.get("period")?,
                    closed_at: row.get::<_, DateTime<Utc>>("closed_at")?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Every recorded closure, most recent period first.
pub fn list_closures(conn: &Connection) -> PayrollResult<Vec<ClosureRecord>> {
    let mut stmt =
        conn.prepare("SELECT period, closed_at FROM closure_history ORDER BY period DESC")?;
    let records = stmt
        .query_map([], |row| {
            Ok(ClosureRecord {
                period: row.get("period")?,
                closed_at: row.get("closed_at")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Removes the closure record of a period.
pub fn delete_closure(conn: &Connection, period: Period) -> PayrollResult<usize> {
    Ok(conn.execute(
        "DELETE FROM closure_history WHERE period = ?1",
        [period],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PayrollStore;
    use crate::store::test_support::{period, store};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_init_settings_only_once() {
        let store = store("2026-03");
        let again = GeneralSettings {
            current_period: period("2020-01"),
            license_expiry: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        assert!(!init_settings(store.connection(), &again).unwrap());
        assert_eq!(
            load_settings(store.connection()).unwrap().current_period,
            period("2026-03")
        );
    }

    #[test]
    fn test_uninitialised_settings() {
        let store = PayrollStore::open_in_memory().unwrap();
        assert!(load_settings(store.connection()).is_err());
    }

    #[test]
    fn test_set_current_period() {
        let store = store("2026-03");
        set_current_period(store.connection(), period("2026-04")).unwrap();
        assert_eq!(
            load_settings(store.connection()).unwrap().current_period,
            period("2026-04")
        );
    }

    #[test]
    fn test_closure_history() {
        let store = store("2026-03");
        let conn = store.connection();
        let closed_at = Utc.with_ymd_and_hms(2026, 3, 31, 18, 0, 0).unwrap();
        for p in ["2026-01", "2026-02"] {
            record_closure(conn, &ClosureRecord { period: period(p), closed_at }).unwrap();
        }

        let found = find_closure(conn, period("2026-02")).unwrap().unwrap();
        assert_eq!(found.closed_at, closed_at);
        assert_eq!(list_closures(conn).unwrap()[0].period, period("2026-02"));

        assert_eq!(delete_closure(conn, period("2026-02")).unwrap(), 1);
        assert!(find_closure(conn, period("2026-02")).unwrap().is_none());
    }

    #[test]
    fn test_period_closed_twice_is_rejected() {
        let store = store("2026-03");
        let record = ClosureRecord {
            period: period("2026-02"),
            closed_at: Utc::now(),
        };
        record_closure(store.connection(), &record).unwrap();
        assert!(record_closure(store.connection(), &record).is_err());
    }
}
