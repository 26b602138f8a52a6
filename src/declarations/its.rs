//! Monthly ITS declaration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::PayrollResult;
use crate::export::{report_path, write_csv};
use crate::models::Period;
use crate::store::PayrollStore;

use super::{declared_payslips, employee_index};

/// One employee of the ITS declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItsLine {
    /// Personnel number.
    pub matricule: String,
    /// Employee name.
    pub full_name: String,
    /// National identity number.
    pub national_id: String,
    /// Gross pay of the month.
    pub gross: Decimal,
    /// Taxable base after abatement.
    pub taxable_base: Decimal,
    /// Tax withheld.
    pub its: Decimal,
}

/// The ITS declaration of a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItsDeclaration {
    /// The declared month.
    pub period: Period,
    /// One line per employee.
    pub lines: Vec<ItsLine>,
    /// Sum of taxable bases.
    pub total_taxable_base: Decimal,
    /// Sum of tax withheld.
    pub total_its: Decimal,
}

impl ItsDeclaration {
    /// Writes the nominative list as `ITS_<period>.csv`.
    pub fn write_csv(&self, dir: &Path) -> PayrollResult<PathBuf> {
        let path = report_path(dir, "ITS", self.period, "csv");
        write_csv(
            &path,
            &["matricule", "full_name", "national_id", "gross", "taxable_base", "its"],
            &self.lines,
        )?;
        Ok(path)
    }
}

/// Builds the ITS declaration of a month from payslips of ITS-declared motifs.
pub fn its_declaration(store: &PayrollStore, period: Period) -> PayrollResult<ItsDeclaration> {
    let conn = store.connection();
    let employees = employee_index(conn)?;

    let mut per_employee: BTreeMap<i64, (Decimal, Decimal, Decimal)> = BTreeMap::new();
    for payslip in declared_payslips(conn, period, |m| m.declared_its)? {
        let entry = per_employee.entry(payslip.employee_id).or_default();
        entry.0 += payslip.gross;
        entry.1 += payslip.taxable_base;
        entry.2 += payslip.its;
    }

    let lines: Vec<ItsLine> = per_employee
        .into_iter()
        .map(|(id, (gross, taxable_base, its))| {
            let employee = employees.get(&id);
            ItsLine {
                matricule: employee.map(|e| e.matricule.clone()).unwrap_or_default(),
                full_name: employee.map(|e| e.full_name.clone()).unwrap_or_default(),
                national_id: employee
                    .and_then(|e| e.national_id.clone())
                    .unwrap_or_default(),
                gross,
                taxable_base,
                its,
            }
        })
        .collect();

    let declaration = ItsDeclaration {
        period,
        total_taxable_base: lines.iter().map(|l| l.taxable_base).sum(),
        total_its: lines.iter().map(|l| l.its).sum(),
        lines,
    };
    info!(
        period = %period,
        employees = declaration.lines.len(),
        total_its = %declaration.total_its,
        "ITS declaration built"
    );
    Ok(declaration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{period, quarter_store};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_regular_month() {
        let store = quarter_store();
        let declaration = its_declaration(&store, period("2026-01")).unwrap();
        assert_eq!(declaration.lines.len(), 2);
        assert_eq!(declaration.lines[0].its, dec("5042"));
        assert_eq!(declaration.lines[1].its, Decimal::ZERO);
        assert_eq!(declaration.total_its, dec("5042"));
        assert_eq!(declaration.total_taxable_base, dec("22730"));
    }

    #[test]
    fn test_bonus_motif_is_declared_for_its() {
        let store = quarter_store();
        let declaration = its_declaration(&store, period("2026-02")).unwrap();
        // 10000 - 70 CNSS - 400 CNAM - 6000 abatement = 3530 at 15%
        assert_eq!(declaration.lines[0].gross, dec("40000"));
        assert_eq!(declaration.lines[0].its, dec("5571.50"));
    }

    #[test]
    fn test_empty_month() {
        let store = quarter_store();
        let declaration = its_declaration(&store, period("2026-06")).unwrap();
        assert!(declaration.lines.is_empty());
        assert_eq!(declaration.total_its, Decimal::ZERO);
    }

    #[test]
    fn test_json_shape() {
        let store = quarter_store();
        let declaration = its_declaration(&store, period("2026-01")).unwrap();
        let json = serde_json::to_value(&declaration).unwrap();
        assert_eq!(json["period"], "2026-01");
        assert_eq!(json["lines"][0]["matricule"], "M001");
    }

    #[test]
    fn test_csv_list() {
        let store = quarter_store();
        let dir = tempfile::tempdir().unwrap();
        let path = its_declaration(&store, period("2026-01"))
            .unwrap()
            .write_csv(dir.path())
            .unwrap();
        assert!(path.ends_with("ITS_2026-01.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 3);
    }
}
