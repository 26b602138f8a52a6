//! Database schema.

use rusqlite::Connection;
use tracing::debug;

use crate::error::PayrollResult;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS employe (
    id               INTEGER PRIMARY KEY,
    matricule        TEXT NOT NULL UNIQUE,
    full_name        TEXT NOT NULL,
    national_id      TEXT,
    cnss_number      TEXT,
    cnam_number      TEXT,
    hire_date        TEXT NOT NULL,
    termination_date TEXT,
    base_salary      TEXT NOT NULL,
    bank_code        TEXT,
    bank_account     TEXT,
    subject_to_cnss  INTEGER NOT NULL DEFAULT 1,
    subject_to_cnam  INTEGER NOT NULL DEFAULT 1,
    subject_to_its   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS motif (
    id            INTEGER PRIMARY KEY,
    code          TEXT NOT NULL UNIQUE,
    label         TEXT NOT NULL,
    kind          TEXT NOT NULL,
    declared_cnss INTEGER NOT NULL,
    declared_cnam INTEGER NOT NULL,
    declared_its  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS paramgen (
    id             INTEGER PRIMARY KEY CHECK (id = 1),
    current_period TEXT NOT NULL,
    license_expiry TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS closure_history (
    period    TEXT PRIMARY KEY,
    closed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS paie (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id      INTEGER NOT NULL REFERENCES employe(id),
    motif_id         INTEGER NOT NULL REFERENCES motif(id),
    period           TEXT NOT NULL,
    worked_days      TEXT NOT NULL,
    gross            TEXT NOT NULL,
    cnss_base        TEXT NOT NULL,
    cnss_employee    TEXT NOT NULL,
    cnam_base        TEXT NOT NULL,
    cnam_employee    TEXT NOT NULL,
    taxable_base     TEXT NOT NULL,
    its              TEXT NOT NULL,
    other_deductions TEXT NOT NULL,
    net              TEXT NOT NULL,
    closed           INTEGER NOT NULL DEFAULT 0,
    UNIQUE (employee_id, motif_id, period)
);
CREATE INDEX IF NOT EXISTS idx_paie_period ON paie(period);

CREATE TABLE IF NOT EXISTS rubriquepaie (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    paie_id       INTEGER NOT NULL REFERENCES paie(id),
    period        TEXT NOT NULL,
    line_number   INTEGER NOT NULL,
    rubrique_code TEXT NOT NULL,
    label         TEXT NOT NULL,
    kind          TEXT NOT NULL,
    base          TEXT NOT NULL,
    rate          TEXT,
    amount        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_rubriquepaie_paie ON rubriquepaie(paie_id);
CREATE INDEX IF NOT EXISTS idx_rubriquepaie_period ON rubriquepaie(period);

CREATE TABLE IF NOT EXISTS conges (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id INTEGER NOT NULL REFERENCES employe(id),
    period      TEXT NOT NULL,
    kind        TEXT NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    days        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jour (
    employee_id INTEGER NOT NULL REFERENCES employe(id),
    period      TEXT NOT NULL,
    date        TEXT NOT NULL,
    hours       TEXT NOT NULL,
    PRIMARY KEY (employee_id, date)
);

CREATE TABLE IF NOT EXISTS weekot (
    employee_id INTEGER NOT NULL REFERENCES employe(id),
    period      TEXT NOT NULL,
    week_start  TEXT NOT NULL,
    hours       TEXT NOT NULL,
    PRIMARY KEY (employee_id, week_start)
);

CREATE TABLE IF NOT EXISTS njtsalarie (
    employee_id INTEGER NOT NULL REFERENCES employe(id),
    motif_id    INTEGER NOT NULL REFERENCES motif(id),
    period      TEXT NOT NULL,
    days        TEXT NOT NULL,
    PRIMARY KEY (employee_id, motif_id, period)
);

CREATE TABLE IF NOT EXISTS retenuesaecheances (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id    INTEGER NOT NULL REFERENCES employe(id),
    rubrique_code  TEXT NOT NULL,
    total_amount   TEXT NOT NULL,
    monthly_amount TEXT NOT NULL,
    outstanding    TEXT NOT NULL,
    first_period   TEXT NOT NULL,
    active         INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS tranchesretenuesaecheances (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    installment_id INTEGER NOT NULL REFERENCES retenuesaecheances(id),
    employee_id    INTEGER NOT NULL REFERENCES employe(id),
    motif_id       INTEGER NOT NULL REFERENCES motif(id),
    period         TEXT NOT NULL,
    amount         TEXT NOT NULL,
    settled        INTEGER NOT NULL DEFAULT 0,
    applied        TEXT
);
CREATE INDEX IF NOT EXISTS idx_tranches_period ON tranchesretenuesaecheances(period);

CREATE TABLE IF NOT EXISTS masterpiece (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    period       TEXT NOT NULL UNIQUE,
    journal_code TEXT NOT NULL,
    piece_number TEXT NOT NULL,
    entry_date   TEXT NOT NULL,
    label        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS detailpiece (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    piece_id    INTEGER NOT NULL REFERENCES masterpiece(id),
    line_number INTEGER NOT NULL,
    account     TEXT NOT NULL,
    auxiliary   TEXT,
    label       TEXT NOT NULL,
    debit       TEXT NOT NULL,
    credit      TEXT NOT NULL
);
"#;

/// Brings the schema up to [`SCHEMA_VERSION`].
pub fn migrate(conn: &Connection) -> PayrollResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!(from = version, to = SCHEMA_VERSION, "Schema migrated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_migrate_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(table_count(&conn), 14);
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(table_count(&conn), 14);
    }
}
