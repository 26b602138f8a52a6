//! Journal entry generation for a payroll period.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::calculation::{calculate_cnss, employer_share_from_employee};
use crate::config::ConfigLoader;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{JournalEntry, JournalLine, Period, RubriqueKind};
use crate::store::{PayrollStore, employees, journal, payslips};

/// Accumulates amounts per (account, auxiliary, label) in posting order.
#[derive(Default)]
struct Postings {
    debits: BTreeMap<(String, Option<String>), (String, Decimal)>,
    credits: BTreeMap<(String, Option<String>), (String, Decimal)>,
}

impl Postings {
    fn debit(&mut self, account: &str, auxiliary: Option<&str>, label: &str, amount: Decimal) {
        add(&mut self.debits, account, auxiliary, label, amount);
    }

    fn credit(&mut self, account: &str, auxiliary: Option<&str>, label: &str, amount: Decimal) {
        add(&mut self.credits, account, auxiliary, label, amount);
    }

    /// Debits first, then credits; zero amounts are dropped.
    fn into_lines(self) -> Vec<JournalLine> {
        let debits = self
            .debits
            .into_iter()
            .map(|(key, (label, amount))| (key, label, amount, Decimal::ZERO));
        let credits = self
            .credits
            .into_iter()
            .map(|(key, (label, amount))| (key, label, Decimal::ZERO, amount));
        debits
            .chain(credits)
            .filter(|(_, _, debit, credit)| !debit.is_zero() || !credit.is_zero())
            .enumerate()
            .map(|(index, ((account, auxiliary), label, debit, credit))| JournalLine {
                line_number: index as u32 + 1,
                account,
                auxiliary,
                label,
                debit,
                credit,
            })
            .collect()
    }
}

fn add(
    map: &mut BTreeMap<(String, Option<String>), (String, Decimal)>,
    account: &str,
    auxiliary: Option<&str>,
    label: &str,
    amount: Decimal,
) {
    map.entry((account.to_string(), auxiliary.map(str::to_string)))
        .or_insert_with(|| (label.to_string(), Decimal::ZERO))
        .1 += amount;
}

/// Builds and stores the journal entry of a period.
///
/// Gains are debited to their rubrique account and deductions credited to
/// theirs. Employer CNSS and CNAM charges are debited to the expense
/// accounts; employee and employer shares are credited to the payables
/// together with ITS. Net pay is credited per bank, or to the net pay
/// account for employees paid in cash. A previous entry of the period is
/// replaced in the same transaction.
///
/// # Errors
///
/// - [`PayrollError::NoPayslips`] when the period has no payslips
/// - [`PayrollError::RubriqueNotFound`] / [`PayrollError::BankNotFound`]
///   when a line or employee references unknown configuration
/// - [`PayrollError::UnbalancedJournal`] when debits differ from credits
pub fn generate_journal(
    store: &mut PayrollStore,
    config: &ConfigLoader,
    period: Period,
) -> PayrollResult<JournalEntry> {
    let conn = store.connection();
    let slips = payslips::list_payslips(conn, period)?;
    if slips.is_empty() {
        return Err(PayrollError::NoPayslips {
            period: period.to_string(),
        });
    }

    let rates = config.config().rates();
    let accounts = &config.config().accounts().accounts;
    let mut postings = Postings::default();

    for line in payslips::period_lines(conn, period)? {
        let account = &config.get_rubrique(&line.rubrique_code)?.account;
        match line.kind {
            RubriqueKind::Gain => postings.debit(account, None, &line.label, line.amount),
            RubriqueKind::Deduction => postings.credit(account, None, &line.label, line.amount),
        }
    }

    let mut cnss_employee = Decimal::ZERO;
    let mut cnss_employer = Decimal::ZERO;
    let mut cnam_employee = Decimal::ZERO;
    let mut cnam_employer = Decimal::ZERO;
    let mut its = Decimal::ZERO;
    let mut nets: BTreeMap<Option<String>, Decimal> = BTreeMap::new();

    for slip in &slips {
        let employee = employees::get_employee(conn, slip.employee_id)?;
        let cnss = calculate_cnss(slip.cnss_base, &rates.cnss, 1);
        cnss_employee += slip.cnss_employee;
        cnss_employer += cnss.employer_share + cnss.medical_share;
        cnam_employee += slip.cnam_employee;
        cnam_employer += employer_share_from_employee(slip.cnam_employee, &rates.cnam);
        its += slip.its;
        let bank = employee
            .paid_by_transfer()
            .then(|| employee.bank_code.clone())
            .flatten();
        *nets.entry(bank).or_default() += slip.net;
    }

    postings.debit(&accounts.cnss_expense, None, "Charges patronales CNSS", cnss_employer);
    postings.debit(&accounts.cnam_expense, None, "Charges patronales CNAM", cnam_employer);
    postings.credit(
        &accounts.cnss_payable,
        None,
        "CNSS a payer",
        cnss_employee + cnss_employer,
    );
    postings.credit(
        &accounts.cnam_payable,
        None,
        "CNAM a payer",
        cnam_employee + cnam_employer,
    );
    postings.credit(&accounts.its_payable, None, "ITS a payer", its);
    for (bank, net) in &nets {
        match bank {
            Some(code) => {
                let bank = config.get_bank(code)?;
                let label = format!("Virement {}", bank.name);
                postings.credit(&bank.account, Some(&bank.code), &label, *net);
            }
            None => postings.credit(&accounts.net_payable, None, "Salaires nets a payer", *net),
        }
    }

    let mut entry = JournalEntry {
        id: 0,
        period,
        journal_code: config.config().accounts().journal_code.clone(),
        piece_number: period.compact(),
        entry_date: period.last_day(),
        label: format!("Paie {}", period),
        lines: postings.into_lines(),
    };
    if !entry.is_balanced() {
        return Err(PayrollError::UnbalancedJournal {
            debit: entry.total_debit(),
            credit: entry.total_credit(),
        });
    }
    debug!(period = %period, lines = entry.lines.len(), "Journal entry built");

    entry.id = store.transaction(|tx| journal::replace_entry(tx, &entry))?;
    info!(
        period = %period,
        piece = %entry.piece_number,
        total = %entry.total_debit(),
        "Journal entry stored"
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{period, quarter_store, store};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn config() -> ConfigLoader {
        ConfigLoader::load("./config/default").unwrap()
    }

    fn amount(entry: &JournalEntry, account: &str) -> (Decimal, Decimal) {
        entry
            .lines
            .iter()
            .filter(|l| l.account == account)
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), l| (d + l.debit, c + l.credit))
    }

    #[test]
    fn test_entry_is_balanced_and_stored() {
        let mut store = quarter_store();
        let entry = generate_journal(&mut store, &config(), period("2026-01")).unwrap();
        assert!(entry.is_balanced());
        assert!(entry.id > 0);
        assert_eq!(entry.piece_number, "202601");
        assert_eq!(entry.journal_code, "PA");

        let stored = journal::get_entry(store.connection(), period("2026-01"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.lines, entry.lines);
    }

    #[test]
    fn test_statutory_accounts() {
        let mut store = quarter_store();
        let entry = generate_journal(&mut store, &config(), period("2026-01")).unwrap();
        // Gross 30000 + 5000 on the base salary account.
        assert_eq!(amount(&entry, "661100"), (dec("35000"), Decimal::ZERO));
        // Employer CNSS: (7000 + 5000) x 15%.
        assert_eq!(amount(&entry, "664100"), (dec("1800"), Decimal::ZERO));
        // Employer CNAM: 1500 + 250.
        assert_eq!(amount(&entry, "664200"), (dec("1750"), Decimal::ZERO));
        // CNSS payable: 70 + 50 employee, 1800 employer.
        assert_eq!(amount(&entry, "431100"), (Decimal::ZERO, dec("1920")));
        assert_eq!(amount(&entry, "431200"), (Decimal::ZERO, dec("3150")));
        assert_eq!(amount(&entry, "447100"), (Decimal::ZERO, dec("5042")));
    }

    #[test]
    fn test_net_split_between_bank_and_cash() {
        let mut store = quarter_store();
        let entry = generate_journal(&mut store, &config(), period("2026-01")).unwrap();
        let bank = entry.lines.iter().find(|l| l.account == "521100").unwrap();
        assert_eq!(bank.auxiliary.as_deref(), Some("BMCI"));
        assert_eq!(bank.credit, dec("23688"));
        assert_eq!(amount(&entry, "422000"), (Decimal::ZERO, dec("4750")));
    }

    #[test]
    fn test_all_motifs_are_posted() {
        let mut store = quarter_store();
        let entry = generate_journal(&mut store, &config(), period("2026-02")).unwrap();
        assert!(entry.is_balanced());
        assert!(entry.lines.iter().any(|l| l.label == "Prime d'anciennet\u{e9}"));
    }

    #[test]
    fn test_regenerate_replaces_entry() {
        let mut store = quarter_store();
        let config = config();
        let first = generate_journal(&mut store, &config, period("2026-01")).unwrap();
        let second = generate_journal(&mut store, &config, period("2026-01")).unwrap();
        assert_ne!(first.id, second.id);
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM masterpiece", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_empty_period_is_rejected() {
        let mut store = store("2026-03");
        let result = generate_journal(&mut store, &config(), period("2026-03"));
        assert!(matches!(result, Err(PayrollError::NoPayslips { .. })));
    }

    #[test]
    fn test_line_numbers_are_sequential() {
        let mut store = quarter_store();
        let entry = generate_journal(&mut store, &config(), period("2026-03")).unwrap();
        for (index, line) in entry.lines.iter().enumerate() {
            assert_eq!(line.line_number as usize, index + 1);
        }
        let first_credit = entry.lines.iter().position(|l| !l.credit.is_zero()).unwrap();
        assert!(entry.lines[..first_credit].iter().all(|l| !l.debit.is_zero()));
    }
}
