//! Accounting journal models (`Masterpiece` / `Detailpiece`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// One debit or credit line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Position of the line in the entry, starting at 1.
    pub line_number: u32,
    /// General ledger account.
    pub account: String,
    /// Auxiliary (third party) account, when the line is per employee or bank.
    #[serde(default)]
    pub auxiliary: Option<String>,
    /// Line label.
    pub label: String,
    /// Debit amount (zero on credit lines).
    pub debit: Decimal,
    /// Credit amount (zero on debit lines).
    pub credit: Decimal,
}

/// A payroll journal entry for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Storage identifier (0 until persisted).
    pub id: i64,
    /// The payroll month.
    pub period: Period,
    /// Journal code from the accounting configuration.
    pub journal_code: String,
    /// Piece number within the journal.
    pub piece_number: String,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Entry label.
    pub label: String,
    /// The lines, in posting order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Sum of the debit column.
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of the credit column.
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Returns true if debits equal credits.
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: u32, debit: i64, credit: i64) -> JournalLine {
        JournalLine {
            line_number: n,
            account: "661000".to_string(),
            auxiliary: None,
            label: "Salaires".to_string(),
            debit: Decimal::new(debit, 0),
            credit: Decimal::new(credit, 0),
        }
    }

    #[test]
    fn test_balanced_entry() {
        let entry = JournalEntry {
            id: 0,
            period: "2026-03".parse().unwrap(),
            journal_code: "PA".to_string(),
            piece_number: "202603".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            label: "Paie mars".to_string(),
            lines: vec![line(1, 100, 0), line(2, 0, 60), line(3, 0, 40)],
        };
        assert_eq!(entry.total_debit(), Decimal::new(100, 0));
        assert_eq!(entry.total_credit(), Decimal::new(100, 0));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_unbalanced_entry() {
        let entry = JournalEntry {
            id: 0,
            period: "2026-03".parse().unwrap(),
            journal_code: "PA".to_string(),
            piece_number: "202603".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            label: "Paie mars".to_string(),
            lines: vec![line(1, 100, 0), line(2, 0, 60)],
        };
        assert!(!entry.is_balanced());
    }
}
