//! Salary transfer files (`VIREMENT_<bank>_<period>.txt`).
//!
//! One fixed-width file per bank, 80 characters per record:
//!
//! | record  | layout                                                                  |
//! |---------|-------------------------------------------------------------------------|
//! | header  | `H`, bank code (5), company account (20), company name (30), period `YYYYMM` (6), filler (18) |
//! | detail  | `D`, matricule (10), name (30), account (24), net in cents (15, zero-padded) |
//! | trailer | `T`, transfer count (6, zero-padded), total in cents (18, zero-padded), filler (55) |

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::config::ConfigLoader;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{Employee, Period};
use crate::store::{PayrollStore, employees, payslips};

use super::{Align, cents, fit, write_atomic};

/// Width of every record.
pub const RECORD_WIDTH: usize = 80;

/// What was written for one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankFileSummary {
    /// Bank code.
    pub bank_code: String,
    /// The file written.
    pub path: PathBuf,
    /// Number of transfers.
    pub transfers: usize,
    /// Sum of the transfers.
    pub total: Decimal,
}

fn header(bank: &str, company_account: &str, company: &str, period: Period) -> String {
    [
        "H".to_string(),
        fit(bank, 5, Align::Left),
        fit(company_account, 20, Align::Left),
        fit(company, 30, Align::Left),
        period.compact(),
        fit("", 18, Align::Left),
    ]
    .concat()
}

fn detail(employee: &Employee, net: Decimal) -> String {
    [
        "D".to_string(),
        fit(&employee.matricule, 10, Align::Left),
        fit(&employee.full_name, 30, Align::Left),
        fit(employee.bank_account.as_deref().unwrap_or_default(), 24, Align::Left),
        fit(&cents(net), 15, Align::Zero),
    ]
    .concat()
}

fn trailer(count: usize, total: Decimal) -> String {
    [
        "T".to_string(),
        fit(&count.to_string(), 6, Align::Zero),
        fit(&cents(total), 18, Align::Zero),
        fit("", 55, Align::Left),
    ]
    .concat()
}

/// Writes one transfer file per bank for the net pay of a period.
///
/// Nets of the same employee under several motifs are summed. Employees
/// paid in cash and zero nets are left out.
///
/// # Errors
///
/// - [`PayrollError::NoPayslips`] when the period has no payslip
/// - [`PayrollError::BankNotFound`] when an employee's bank is not configured
pub fn write_bank_files(
    store: &PayrollStore,
    config: &ConfigLoader,
    period: Period,
    dir: &Path,
) -> PayrollResult<Vec<BankFileSummary>> {
    let conn = store.connection();
    let payslips = payslips::list_payslips(conn, period)?;
    if payslips.is_empty() {
        return Err(PayrollError::NoPayslips {
            period: period.to_string(),
        });
    }

    let mut nets: BTreeMap<i64, Decimal> = BTreeMap::new();
    for payslip in &payslips {
        *nets.entry(payslip.employee_id).or_default() += payslip.net;
    }

    let mut by_bank: BTreeMap<String, Vec<(Employee, Decimal)>> = BTreeMap::new();
    for employee in employees::list_employees(conn)? {
        let Some(net) = nets.get(&employee.id).copied() else {
            continue;
        };
        if net <= Decimal::ZERO || !employee.paid_by_transfer() {
            continue;
        }
        if let Some(code) = employee.bank_code.clone() {
            by_bank.entry(code).or_default().push((employee, net));
        }
    }

    let company = config.config().company();
    let mut summaries = Vec::new();
    for (code, mut transfers) in by_bank {
        let bank = config.get_bank(&code)?;
        transfers.sort_by(|a, b| a.0.matricule.cmp(&b.0.matricule));
        let total: Decimal = transfers.iter().map(|(_, net)| *net).sum();

        let mut records = vec![header(&bank.code, &bank.company_account, &company.name, period)];
        records.extend(transfers.iter().map(|(e, net)| detail(e, *net)));
        records.push(trailer(transfers.len(), total));

        let path = dir.join(format!("VIREMENT_{}_{}.txt", bank.code, period));
        write_atomic(&path, |file| {
            for record in &records {
                writeln!(file, "{}", record)?;
            }
            Ok(())
        })?;
        info!(
            period = %period,
            bank = %bank.code,
            transfers = transfers.len(),
            total = %total,
            "Bank transfer file written"
        );
        summaries.push(BankFileSummary {
            bank_code: bank.code.clone(),
            path,
            transfers: transfers.len(),
            total,
        });
    }
    Ok(summaries)
}
