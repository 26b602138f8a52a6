//! Journal entry (`masterpiece`) and line (`detailpiece`) repository.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::PayrollResult;
use crate::models::{JournalEntry, JournalLine, Period};

use super::codec::decimal;

/// Stores the journal entry of a period, replacing any earlier one.
///
/// Run it inside a transaction. Returns the new entry id.
pub fn replace_entry(conn: &Connection, entry: &JournalEntry) -> PayrollResult<i64> {
    delete_entry(conn, entry.period)?;
    conn.execute(
        "INSERT INTO masterpiece (period, journal_code, piece_number, entry_date, label)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.period,
            entry.journal_code,
            entry.piece_number,
            entry.entry_date,
            entry.label,
        ],
    )?;
    let piece_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "INSERT INTO detailpiece (piece_id, line_number, account, auxiliary, label, debit, credit)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for line in &entry.lines {
        stmt.execute(params![
            piece_id,
            line.line_number,
            line.account,
            line.auxiliary,
            line.label,
            line.debit.to_string(),
            line.credit.to_string(),
        ])?;
    }
    Ok(piece_id)
}

/// Deletes the journal entry of a period. Returns the lines deleted.
pub fn delete_entry(conn: &Connection, period: Period) -> PayrollResult<usize> {
    let lines = conn.execute(
        "DELETE FROM detailpiece WHERE piece_id IN (SELECT id FROM masterpiece WHERE period = ?1)",
        [period],
    )?;
    conn.execute("DELETE FROM masterpiece WHERE period = ?1", [period])?;
    Ok(lines)
}

/// Loads the journal entry of a period.
pub fn get_entry(conn: &Connection, period: Period) -> PayrollResult<Option<JournalEntry>> {
    let header = conn
        .query_row(
            "SELECT id, period, journal_code, piece_number, entry_date, label
             FROM masterpiece WHERE period = ?1",
            [period],
            |row| {
                Ok(JournalEntry {
                    id: row.get("id")?,
                    period: row.get("period")?,
                    journal_code: row.get("journal_code")?,
                    piece_number: row.get("piece_number")?,
                    entry_date: row.get("entry_date")?,
                    label: row.get("label")?,
                    lines: Vec::new(),
                })
            },
        )
        .optional()?;
    let Some(mut entry) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT line_number, account, auxiliary, label, debit, credit
         FROM detailpiece WHERE piece_id = ?1 ORDER BY line_number",
    )?;
    entry.lines = stmt
        .query_map([entry.id], |row| {
            Ok(JournalLine {
                line_number: row.get("line_number")?,
                account: row.get("account")?,
                auxiliary: row.get("auxiliary")?,
                label: row.get("label")?,
                debit: decimal(row, "debit")?,
                credit: decimal(row, "credit")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(entry))
}
