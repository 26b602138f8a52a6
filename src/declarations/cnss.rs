//! Quarterly CNSS declaration (`Listenominativecnss`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::calculation::round_amount;
use crate::config::{CnssRates, ConfigLoader};
use crate::error::PayrollResult;
use crate::export::write_csv;
use crate::models::{Payslip, Quarter, RubriqueKind};
use crate::store::{PayrollStore, payslips};

use super::{declared_payslips, employee_index};

/// One employee of the nominative list: the capped base of each month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CnssLine {
    /// Personnel number.
    pub matricule: String,
    /// Employee name.
    pub full_name: String,
    /// CNSS registration number.
    pub cnss_number: String,
    /// Base of the first month.
    pub m1: Decimal,
    /// Base of the second month.
    pub m2: Decimal,
    /// Base of the third month.
    pub m3: Decimal,
    /// Quarter base.
    pub total_base: Decimal,
}

/// Contributions due on the quarter base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CnssContribution {
    /// Employee share.
    pub employee: Decimal,
    /// Occupational medicine share.
    pub medical: Decimal,
    /// Employer pension share.
    pub employer: Decimal,
    /// Sum of the three shares.
    pub total: Decimal,
}

impl CnssContribution {
    /// Splits the contribution on `base` by the configured rates.
    pub fn on_base(base: Decimal, rates: &CnssRates) -> Self {
        let employee = round_amount(base * rates.employee_rate);
        let medical = round_amount(base * rates.medical_rate);
        let employer = round_amount(base * rates.employer_rate);
        Self {
            employee,
            medical,
            employer,
            total: employee + medical + employer,
        }
    }
}

/// The CNSS declaration of a quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CnssDeclaration {
    /// The declared quarter.
    pub quarter: Quarter,
    /// Employer registration number.
    pub employer_number: String,
    /// One line per employee.
    pub lines: Vec<CnssLine>,
    /// Sum of the quarter bases.
    pub total_base: Decimal,
    /// Contributions due.
    pub contribution: CnssContribution,
}

impl CnssDeclaration {
    /// Writes the nominative list as `CNSS_<year>-T<q>.csv`.
    pub fn write_csv(&self, dir: &Path) -> PayrollResult<PathBuf> {
        let path = dir.join(format!("CNSS_{}.csv", self.quarter));
        write_csv(
            &path,
            &["matricule", "full_name", "cnss_number", "m1", "m2", "m3", "total_base"],
            &self.lines,
        )?;
        Ok(path)
    }
}

/// CNSS-subject gains of a payslip, before the ceiling.
fn subject_amount(
    conn: &Connection,
    config: &ConfigLoader,
    payslip: &Payslip,
) -> PayrollResult<Decimal> {
    let mut subject = Decimal::ZERO;
    for line in payslips::payslip_lines(conn, payslip.id)? {
        if line.kind == RubriqueKind::Gain && config.get_rubrique(&line.rubrique_code)?.cnss {
            subject += line.amount;
        }
    }
    Ok(subject)
}

/// Builds the CNSS declaration of a quarter from payslips of CNSS-declared
/// motifs.
///
/// The monthly ceiling applies to the sum of an employee's payslips of the
/// month, not to each payslip.
pub fn cnss_declaration(
    store: &PayrollStore,
    config: &ConfigLoader,
    quarter: Quarter,
) -> PayrollResult<CnssDeclaration> {
    let conn = store.connection();
    let employees = employee_index(conn)?;
    let rates = &config.config().rates().cnss;

    let mut bases: BTreeMap<i64, [Decimal; 3]> = BTreeMap::new();
    for (index, period) in quarter.periods().into_iter().enumerate() {
        for payslip in declared_payslips(conn, period, |m| m.declared_cnss)? {
            let subject = match employees.get(&payslip.employee_id) {
                Some(employee) if !employee.subject_to_cnss => Decimal::ZERO,
                _ => subject_amount(conn, config, &payslip)?,
            };
            bases.entry(payslip.employee_id).or_default()[index] += subject;
        }
    }
    for months in bases.values_mut() {
        for base in months.iter_mut() {
            *base = (*base).min(rates.monthly_ceiling);
        }
    }

    let lines: Vec<CnssLine> = bases
        .into_iter()
        .map(|(id, [m1, m2, m3])| {
            let employee = employees.get(&id);
            CnssLine {
                matricule: employee.map(|e| e.matricule.clone()).unwrap_or_default(),
                full_name: employee.map(|e| e.full_name.clone()).unwrap_or_default(),
                cnss_number: employee
                    .and_then(|e| e.cnss_number.clone())
                    .unwrap_or_default(),
                m1,
                m2,
                m3,
                total_base: m1 + m2 + m3,
            }
        })
        .collect();

    let total_base: Decimal = lines.iter().map(|l| l.total_base).sum();
    let declaration = CnssDeclaration {
        quarter,
        employer_number: config.config().company().cnss_employer_number.clone(),
        contribution: CnssContribution::on_base(total_base, rates),
        total_base,
        lines,
    };
    info!(
        quarter = %quarter,
        employees = declaration.lines.len(),
        total = %declaration.contribution.total,
        "CNSS declaration built"
    );
    Ok(declaration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{quarter_store, quarter_store_with_termination};
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn config() -> ConfigLoader {
        ConfigLoader::load("./config/default").unwrap()
    }

    fn q1() -> Quarter {
        Quarter::new(2026, 1).unwrap()
    }

    #[test]
    fn test_monthly_bases_per_employee() {
        let declaration = cnss_declaration(&quarter_store(), &config(), q1()).unwrap();
        assert_eq!(declaration.lines.len(), 2);
        let first = &declaration.lines[0];
        assert_eq!((first.m1, first.m2, first.m3), (dec("7000"), dec("7000"), dec("7000")));
        assert_eq!(first.total_base, dec("21000"));
        assert_eq!(declaration.lines[1].total_base, dec("15000"));
        assert_eq!(declaration.employer_number, "0012345");
    }

    #[test]
    fn test_bonus_motif_not_declared() {
        let declaration = cnss_declaration(&quarter_store(), &config(), q1()).unwrap();
        // The February GRAT payslip has a CNSS base but its motif is not declared.
        assert_eq!(declaration.lines[0].m2, dec("7000"));
    }

    #[test]
    fn test_contribution_is_sixteen_percent_split() {
        let declaration = cnss_declaration(&quarter_store(), &config(), q1()).unwrap();
        assert_eq!(declaration.total_base, dec("36000"));
        let c = &declaration.contribution;
        assert_eq!(c.employee, dec("360"));
        assert_eq!(c.medical, dec("720"));
        assert_eq!(c.employer, dec("4680"));
        assert_eq!(c.total, dec("5760"));
    }

    #[test]
    fn test_ceiling_applies_to_month_not_payslip() {
        let declaration =
            cnss_declaration(&quarter_store_with_termination(), &config(), q1()).unwrap();
        let first = &declaration.lines[0];
        assert_eq!(first.m3, dec("7000"));
        assert_eq!(first.total_base, dec("21000"));
        assert_eq!(declaration.total_base, dec("36000"));
    }

    #[test]
    fn test_declared_base_comes_from_subject_lines() {
        let store = quarter_store_with_termination();
        // Stored per-payslip bases do not feed the declaration.
        store
            .connection()
            .execute(
                "UPDATE paie SET cnss_base = '7000' WHERE employee_id = 1 AND period = '2026-03'",
                [],
            )
            .unwrap();
        let declaration = cnss_declaration(&store, &config(), q1()).unwrap();
        assert_eq!(declaration.lines[0].m3, dec("7000"));
    }

    #[test]
    fn test_other_quarter_is_empty() {
        let declaration =
            cnss_declaration(&quarter_store(), &config(), Quarter::new(2026, 2).unwrap()).unwrap();
        assert!(declaration.lines.is_empty());
        assert_eq!(declaration.contribution.total, Decimal::ZERO);
    }

    #[test]
    fn test_csv_list_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = cnss_declaration(&quarter_store(), &config(), q1())
            .unwrap()
            .write_csv(dir.path())
            .unwrap();
        assert!(path.ends_with("CNSS_2026-T1.csv"));
    }

    proptest! {
        #[test]
        fn prop_total_is_base_times_total_rate(base in 0i64..10_000_000) {
            let rates = config().config().rates().cnss.clone();
            let base = Decimal::from(base);
            let split = CnssContribution::on_base(base, &rates);
            prop_assert_eq!(split.total, round_amount(base * rates.total_rate()));
        }
    }
}
