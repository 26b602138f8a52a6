//! `.unl` batch export of a journal entry.
//!
//! One record per journal line: 58 fixed-width fields, each followed by a
//! `|`. Amounts are in cents and zero-padded, dates are `DDMMYYYY`. Fields
//! the payroll does not feed are written blank (or zeros when numeric) so
//! that every record has the same width.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ConfigLoader;
use crate::error::PayrollResult;
use crate::export::{Align, cents, fit, write_atomic};
use crate::models::{JournalEntry, JournalLine};

/// Position, width and padding of one `.unl` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlField {
    /// Field name.
    pub name: &'static str,
    /// Width in characters.
    pub width: usize,
    /// Padding rule.
    pub align: Align,
}

const fn text(name: &'static str, width: usize) -> UnlField {
    UnlField {
        name,
        width,
        align: Align::Left,
    }
}

const fn number(name: &'static str, width: usize) -> UnlField {
    UnlField {
        name,
        width,
        align: Align::Zero,
    }
}

/// The record layout, in order.
pub const FIELDS: [UnlField; 58] = [
    text("company_code", 5),
    text("journal_code", 4),
    text("piece_number", 10),
    number("line_number", 5),
    text("entry_date", 8),
    text("fiscal_period", 6),
    text("account", 12),
    text("auxiliary", 12),
    text("label", 40),
    number("debit", 15),
    number("credit", 15),
    text("direction", 1),
    text("currency", 3),
    number("exchange_rate", 10),
    number("currency_debit", 15),
    number("currency_credit", 15),
    text("due_date", 8),
    text("document_ref", 12),
    text("document_date", 8),
    text("payment_mode", 3),
    text("bank_code", 5),
    text("value_date", 8),
    text("lettering_code", 6),
    text("lettering_date", 8),
    text("analytic_axis_1", 10),
    text("analytic_axis_2", 10),
    text("analytic_axis_3", 10),
    text("analytic_axis_4", 10),
    text("analytic_axis_5", 10),
    number("analytic_amount", 15),
    number("quantity", 12),
    text("unit", 4),
    text("tax_code", 5),
    number("tax_rate", 6),
    number("tax_base", 15),
    number("tax_amount", 15),
    text("third_party_type", 1),
    text("third_party_name", 30),
    text("third_party_tax_id", 15),
    text("budget_code", 10),
    text("project_code", 10),
    text("cost_center", 10),
    text("reconciliation_ref", 12),
    text("reconciliation_date", 8),
    text("reversal_flag", 1),
    text("reversal_date", 8),
    text("origin", 8),
    text("batch_number", 10),
    text("status", 1),
    text("created_by", 10),
    text("creation_date", 8),
    text("validated_by", 10),
    text("validation_date", 8),
    text("reserved_1", 10),
    text("reserved_2", 10),
    text("reserved_3", 10),
    text("reserved_4", 10),
    text("reserved_5", 10),
];

const DATE_FORMAT: &str = "%d%m%Y";

fn value(field: &str, entry: &JournalEntry, line: &JournalLine, config: &ConfigLoader) -> String {
    let accounts = config.config().accounts();
    let date = entry.entry_date.format(DATE_FORMAT).to_string();
    match field {
        "company_code" => accounts.company_code.clone(),
        "journal_code" => entry.journal_code.clone(),
        "piece_number" | "document_ref" | "batch_number" => entry.piece_number.clone(),
        "line_number" => line.line_number.to_string(),
        "entry_date" | "document_date" | "creation_date" => date,
        "fiscal_period" => entry.period.compact(),
        "account" => line.account.clone(),
        "auxiliary" | "bank_code" => line.auxiliary.clone().unwrap_or_default(),
        "label" => line.label.clone(),
        "debit" | "currency_debit" => cents(line.debit),
        "credit" | "currency_credit" => cents(line.credit),
        "direction" => if line.debit.is_zero() { "C" } else { "D" }.to_string(),
        "currency" => config.config().company().currency.clone(),
        "exchange_rate" => "1000000".to_string(),
        "origin" => "PAIE".to_string(),
        "status" => "V".to_string(),
        "created_by" => "PAIE".to_string(),
        _ => String::new(),
    }
}

/// Renders one journal line as a `.unl` record, without line terminator.
pub fn unl_record(entry: &JournalEntry, line: &JournalLine, config: &ConfigLoader) -> String {
    let mut record = String::new();
    for field in &FIELDS {
        record.push_str(&fit(
            &value(field.name, entry, line, config),
            field.width,
            field.align,
        ));
        record.push('|');
    }
    record
}

/// `<report_dir>/Fichier_compta_Paie_<period>/compta_paie_<period>.unl`
pub fn unl_path(entry: &JournalEntry, report_dir: &Path) -> PathBuf {
    report_dir
        .join(format!("Fichier_compta_Paie_{}", entry.period))
        .join(format!("compta_paie_{}.unl", entry.period))
}

/// Writes the `.unl` file of a journal entry atomically.
pub fn write_unl(
    entry: &JournalEntry,
    config: &ConfigLoader,
    report_dir: &Path,
) -> PayrollResult<PathBuf> {
    let path = unl_path(entry, report_dir);
    write_atomic(&path, |file| {
        for line in &entry.lines {
            writeln!(file, "{}", unl_record(entry, line, config))?;
        }
        Ok(())
    })?;
    info!(
        period = %entry.period,
        records = entry.lines.len(),
        path = %path.display(),
        "Accounting batch file written"
    );
    Ok(path)
}
