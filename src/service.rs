//! The payroll service shared by the HTTP handlers.
//!
//! Owns the store behind a mutex together with the configuration and the
//! report directory. Every method is blocking; async callers run them on
//! `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::accounting::{generate_journal, write_unl};
use crate::batch::{BatchEvent, BatchReport, spawn_batch};
use crate::closing::{self, CancellationOutcome, ClosureOutcome};
use crate::config::ConfigLoader;
use crate::declarations::{
    CnamDeclaration, CnssDeclaration, ItsDeclaration, cnam_declaration, cnss_declaration,
    its_declaration,
};
use crate::error::{PayrollError, PayrollResult};
use crate::export::{BankFileSummary, write_bank_files, write_payroll_register};
use crate::models::{GeneralSettings, JournalEntry, Motif, Period, PeriodState, Quarter};
use crate::payroll::{PayrollRunRequest, pay_employee, prepare_run};
use crate::store::{PayrollStore, employees, journal, settings};

/// A payroll run started in the background.
pub type PayrollRun = (JoinHandle<BatchReport>, mpsc::UnboundedReceiver<BatchEvent>);

/// Store, configuration and report directory of one company.
#[derive(Debug)]
pub struct PayrollService {
    store: Mutex<PayrollStore>,
    config: Arc<ConfigLoader>,
    closing: Mutex<Option<Period>>,
    report_dir: PathBuf,
}

impl PayrollService {
    /// Wraps an opened store.
    ///
    /// Motifs from the configuration are upserted, and `initial` becomes the
    /// settings row when the store has none yet.
    pub fn new(
        store: PayrollStore,
        config: ConfigLoader,
        initial: GeneralSettings,
        report_dir: impl Into<PathBuf>,
    ) -> PayrollResult<Self> {
        for definition in config.config().motifs() {
            employees::upsert_motif(store.connection(), &Motif::from(definition))?;
        }
        if settings::init_settings(store.connection(), &initial)? {
            info!(period = %initial.current_period, "Payroll settings initialised");
        }
        Ok(Self {
            store: Mutex::new(store),
            config: Arc::new(config),
            closing: Mutex::new(None),
            report_dir: report_dir.into(),
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Where report files are written.
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    fn lock(&self) -> PayrollResult<MutexGuard<'_, PayrollStore>> {
        self.store.lock().map_err(|_| {
            warn!("Payroll store lock poisoned");
            PayrollError::StoreUnavailable
        })
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with_store<T, F>(&self, f: F) -> PayrollResult<T>
    where
        F: FnOnce(&mut PayrollStore) -> PayrollResult<T>,
    {
        let mut store = self.lock()?;
        f(&mut store)
    }

    fn set_closing(&self, period: Option<Period>) -> PayrollResult<()> {
        *self
            .closing
            .lock()
            .map_err(|_| PayrollError::StoreUnavailable)? = period;
        Ok(())
    }

    /// `Closing(p)` while a closure runs, `Open(p)` otherwise.
    pub fn period_state(&self) -> PayrollResult<PeriodState> {
        let closing = *self
            .closing
            .lock()
            .map_err(|_| PayrollError::StoreUnavailable)?;
        match closing {
            Some(period) => Ok(PeriodState::Closing(period)),
            None => self.with_store(|store| closing::period_state(store.connection())),
        }
    }

    /// Starts a payroll run on the blocking pool.
    ///
    /// The run is validated before anything is spawned; each employee then
    /// takes the store lock for its own payslip only.
    pub fn start_payroll(
        self: &Arc<Self>,
        request: PayrollRunRequest,
        cancel: CancellationToken,
    ) -> PayrollResult<PayrollRun> {
        let motif = self.with_store(|store| prepare_run(store, &request))?;
        info!(
            period = %request.period,
            motif = %motif.code,
            employees = request.employee_ids.len(),
            "Payroll run started"
        );
        let service = Arc::clone(self);
        let ids = request.employee_ids.clone();
        Ok(spawn_batch(ids, cancel, move |id| {
            let lines = request
                .variable_lines
                .get(&id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            service.with_store(|store| {
                pay_employee(store, &service.config, &motif, request.period, id, lines).map(|_| ())
            })
        }))
    }

    /// Closes the open period.
    pub fn close_period(&self, today: NaiveDate) -> PayrollResult<ClosureOutcome> {
        self.with_store(|store| {
            let current = settings::load_settings(store.connection())?.current_period;
            self.set_closing(Some(current))?;
            let outcome = closing::close_period(store, &self.config, today, &self.report_dir);
            self.set_closing(None)?;
            outcome
        })
    }

    /// Cancels the most recent closure.
    pub fn cancel_last_closure(&self, today: NaiveDate) -> PayrollResult<CancellationOutcome> {
        self.with_store(|store| closing::cancel_last_closure(store, today))
    }

    /// ITS declaration of a month.
    pub fn its_declaration(&self, period: Period) -> PayrollResult<ItsDeclaration> {
        self.with_store(|store| its_declaration(store, period))
    }

    /// CNSS declaration of a quarter.
    pub fn cnss_declaration(&self, quarter: Quarter) -> PayrollResult<CnssDeclaration> {
        self.with_store(|store| cnss_declaration(store, &self.config, quarter))
    }

    /// CNAM declaration of a quarter.
    pub fn cnam_declaration(&self, quarter: Quarter) -> PayrollResult<CnamDeclaration> {
        self.with_store(|store| cnam_declaration(store, &self.config, quarter))
    }

    /// Generates (or regenerates) the journal entry of a period.
    pub fn generate_journal(&self, period: Period) -> PayrollResult<JournalEntry> {
        self.with_store(|store| generate_journal(store, &self.config, period))
    }

    /// Writes the `.unl` file of a period, generating the journal entry
    /// first when none is stored.
    pub fn write_unl(&self, period: Period) -> PayrollResult<PathBuf> {
        self.with_store(|store| {
            let entry = match journal::get_entry(store.connection(), period)? {
                Some(entry) => entry,
                None => generate_journal(store, &self.config, period)?,
            };
            write_unl(&entry, &self.config, &self.report_dir)
        })
    }

    /// Writes the bank transfer files of a period.
    pub fn write_bank_files(&self, period: Period) -> PayrollResult<Vec<BankFileSummary>> {
        self.with_store(|store| write_bank_files(store, &self.config, period, &self.report_dir))
    }

    /// Writes the payroll register of a period.
    pub fn write_payroll_register(&self, period: Period) -> PayrollResult<PathBuf> {
        self.with_store(|store| write_payroll_register(store, period, &self.report_dir))
    }

    /// Writes the CSV lists of the three declarations covering `period`.
    pub fn write_declaration_lists(&self, period: Period) -> PayrollResult<Vec<PathBuf>> {
        let quarter = period.quarter();
        Ok(vec![
            self.its_declaration(period)?.write_csv(&self.report_dir)?,
            self.cnss_declaration(quarter)?.write_csv(&self.report_dir)?,
            self.cnam_declaration(quarter)?.write_csv(&self.report_dir)?,
        ])
    }
}
