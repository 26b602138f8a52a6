//! SQLite persistence.
//!
//! [`PayrollStore`] owns the connection. Repository functions in the
//! submodules take a plain `&Connection` so they can run either directly
//! or inside [`PayrollStore::transaction`].

mod codec;
pub mod employees;
pub mod installments;
pub mod journal;
pub mod payslips;
mod schema;
pub mod settings;
pub mod timesheets;

use std::path::Path;

use rusqlite::{Connection, Transaction};
use tracing::info;

use crate::error::PayrollResult;

pub use schema::{SCHEMA_VERSION, migrate};

/// Owns the database connection of the payroll back office.
#[derive(Debug)]
pub struct PayrollStore {
    conn: Connection,
}

impl PayrollStore {
    /// Opens (or creates) a database file and migrates it.
    pub fn open<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "Payroll store opened");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> PayrollResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> PayrollResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    /// The underlying connection, for reads.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside a transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`; nothing `f` wrote is visible after a failure.
    pub fn transaction<T, F>(&mut self, f: F) -> PayrollResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> PayrollResult<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{Employee, Motif, MotifKind, Period};

    pub fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    pub fn employee(id: i64, salary: i64, bank: Option<&str>) -> Employee {
        Employee {
            id,
            matricule: format!("M{:03}", id),
            full_name: format!("Salarie {}", id),
            national_id: None,
            cnss_number: Some(format!("CNSS-{}", id)),
            cnam_number: Some(format!("CNAM-{}", id)),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
            base_salary: Decimal::from(salary),
            bank_code: bank.map(str::to_string),
            bank_account: bank.map(|_| format!("ACC{:06}", id)),
            subject_to_cnss: true,
            subject_to_cnam: true,
            subject_to_its: true,
        }
    }

    pub fn motif(id: i64, code: &str, kind: MotifKind) -> Motif {
        Motif {
            id,
            code: code.to_string(),
            label: code.to_string(),
            kind,
            declared_cnss: kind != MotifKind::Special,
            declared_cnam: kind != MotifKind::Special,
            declared_its: true,
        }
    }

    /// An in-memory store with a regular motif (id 1) and settings open on `current`.
    pub fn store(current: &str) -> PayrollStore {
        let store = PayrollStore::open_in_memory().unwrap();
        super::employees::upsert_motif(store.connection(), &motif(1, "NORMAL", MotifKind::Regular))
            .unwrap();
        super::settings::init_settings(
            store.connection(),
            &crate::models::GeneralSettings {
                current_period: period(current),
                license_expiry: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
            },
        )
        .unwrap();
        store
    }

    /// First quarter of 2026 paid and left open on March: employee 1 earns
    /// 30000 (bank BMCI), employee 2 earns 5000 (cash), and employee 1 gets
    /// a 10000 GRAT bonus (motif 2, ITS-declared only) in February.
    pub fn quarter_store() -> PayrollStore {
        use crate::calculation::VariableLine;
        use crate::config::ConfigLoader;
        use crate::payroll::{PayrollRunRequest, run_payroll};
        use tokio_util::sync::CancellationToken;

        let mut store = store("2026-01");
        employees::insert_employee(store.connection(), &employee(1, 30000, Some("BMCI"))).unwrap();
        employees::insert_employee(store.connection(), &employee(2, 5000, None)).unwrap();
        employees::upsert_motif(store.connection(), &motif(2, "GRAT", MotifKind::Special)).unwrap();
        let config = ConfigLoader::load("./config/default").unwrap();

        let run = |store: &mut PayrollStore, request: PayrollRunRequest| {
            let report =
                run_payroll(store, &config, &request, &CancellationToken::new(), |_| {}).unwrap();
            assert!(report.is_success(), "{}", report.summary());
        };
        for p in ["2026-01", "2026-02", "2026-03"] {
            settings::set_current_period(store.connection(), period(p)).unwrap();
            run(
                &mut store,
                PayrollRunRequest {
                    period: period(p),
                    motif_code: "NORMAL".to_string(),
                    employee_ids: vec![1, 2],
                    variable_lines: Default::default(),
                },
            );
            if p == "2026-02" {
                run(
                    &mut store,
                    PayrollRunRequest {
                        period: period(p),
                        motif_code: "GRAT".to_string(),
                        employee_ids: vec![1],
                        variable_lines: [(
                            1,
                            vec![VariableLine {
                                rubrique_code: "PRIMANC".to_string(),
                                base: Decimal::from(10000),
                                rate: None,
                            }],
                        )]
                        .into_iter()
                        .collect(),
                    },
                );
            }
        }
        store
    }

    /// [`quarter_store`] where employee 1 also leaves in March: a STC
    /// payslip (motif 3, CNSS and CNAM declared) next to the NORMAL one.
    pub fn quarter_store_with_termination() -> PayrollStore {
        use crate::config::ConfigLoader;
        use crate::payroll::{PayrollRunRequest, run_payroll};
        use tokio_util::sync::CancellationToken;

        let mut store = quarter_store();
        employees::upsert_motif(store.connection(), &motif(3, "STC", MotifKind::Termination))
            .unwrap();
        let config = ConfigLoader::load("./config/default").unwrap();
        let request = PayrollRunRequest {
            period: period("2026-03"),
            motif_code: "STC".to_string(),
            employee_ids: vec![1],
            variable_lines: Default::default(),
        };
        let report =
            run_payroll(&mut store, &config, &request, &CancellationToken::new(), |_| {}).unwrap();
        assert!(report.is_success(), "{}", report.summary());
        store
    }
}
