//! Report files.
//!
//! Every file is written to a temporary file next to its destination and
//! renamed into place, so a failed export never leaves a truncated report.
//! Names follow `<TYPE>_<PERIOD>.<ext>` under the report directory.

mod bank_file;
mod engagements;
mod register;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{PayrollError, PayrollResult};
use crate::models::Period;

pub use bank_file::{BankFileSummary, write_bank_files};
pub use engagements::{EngagementRow, write_engagements};
pub use register::{RegisterRow, write_payroll_register};

/// Alignment of a fixed-width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Pad on the right with spaces.
    Left,
    /// Pad on the left with spaces.
    Right,
    /// Pad on the left with zeros (numeric fields).
    Zero,
}

/// Folds a character to ASCII: accented Latin letters lose their accent,
/// anything else outside ASCII becomes `?`.
fn ascii_char(c: char) -> char {
    match c {
        c if c.is_ascii() => c,
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ÿ' | 'ý' => 'y',
        'Ÿ' | 'Ý' => 'Y',
        '\u{2019}' | '\u{2018}' => '\'',
        _ => '?',
    }
}

/// Fits a value into exactly `width` bytes, truncating on the right.
///
/// Fixed-width records are byte-oriented, so the value is folded to ASCII
/// first.
///
/// # Example
///
/// ```
/// use paie_engine::export::{Align, fit};
///
/// assert_eq!(fit("AB", 4, Align::Left), "AB  ");
/// assert_eq!(fit("AB", 4, Align::Right), "  AB");
/// assert_eq!(fit("42", 5, Align::Zero), "00042");
/// assert_eq!(fit("ABCDEF", 3, Align::Left), "ABC");
/// assert_eq!(fit("Prime d'ancienneté", 20, Align::Left), "Prime d'anciennete  ");
/// ```
pub fn fit(value: &str, width: usize, align: Align) -> String {
    let truncated: String = value.chars().map(ascii_char).take(width).collect();
    match align {
        Align::Left => format!("{:<width$}", truncated, width = width),
        Align::Right => format!("{:>width$}", truncated, width = width),
        Align::Zero => format!("{:0>width$}", truncated, width = width),
    }
}

/// An amount in cents, as used by fixed-width banking formats.
pub fn cents(amount: rust_decimal::Decimal) -> String {
    (crate::calculation::round_amount(amount) * rust_decimal::Decimal::ONE_HUNDRED)
        .trunc()
        .to_string()
}

/// Path of a report: `<dir>/<kind>_<period>.<extension>`.
///
/// # Example
///
/// ```
/// use paie_engine::export::report_path;
/// use std::path::Path;
///
/// let path = report_path(Path::new("repport"), "PAIE", "2026-03".parse().unwrap(), "csv");
/// assert_eq!(path, Path::new("repport/PAIE_2026-03.csv"));
/// ```
pub fn report_path(dir: &Path, kind: &str, period: Period, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", kind, period, extension))
}

/// Writes a file atomically, creating its directory if needed.
pub fn write_atomic<F>(path: &Path, write: F) -> PayrollResult<()>
where
    F: FnOnce(&mut NamedTempFile) -> std::io::Result<()>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| PayrollError::export(path, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PayrollError::export(path, e))?;
    write(&mut tmp).map_err(|e| PayrollError::export(path, e))?;
    tmp.flush().map_err(|e| PayrollError::export(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| PayrollError::export(path, e))?;
    tmp.persist(path).map_err(|e| PayrollError::export(path, e))?;
    Ok(())
}

/// Writes rows as CSV with an explicit header, so an empty report still
/// carries its columns.
pub fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> PayrollResult<()> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buffer);
        writer
            .write_record(headers)
            .map_err(|e| PayrollError::export(path, e))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| PayrollError::export(path, e))?;
        }
        writer.flush().map_err(|e| PayrollError::export(path, e))?;
    }
    write_atomic(path, |file| file.write_all(&buffer))
}
