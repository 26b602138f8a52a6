//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{Motif, MotifKind, RubriqueKind};

/// Company identity printed on declarations and exports.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyConfig {
    /// Legal name of the employer.
    pub name: String,
    /// Employer registration number at CNSS.
    pub cnss_employer_number: String,
    /// Employer registration number at CNAM.
    pub cnam_employer_number: String,
    /// Tax identification number.
    pub tax_id: String,
    /// Currency code of all amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Directory receiving report files.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

fn default_currency() -> String {
    "MRU".to_string()
}

fn default_report_dir() -> String {
    "repport".to_string()
}

/// CNSS (social security) rates.
#[derive(Debug, Clone, Deserialize)]
pub struct CnssRates {
    /// Employee share of the capped base.
    pub employee_rate: Decimal,
    /// Employer pension share of the capped base.
    pub employer_rate: Decimal,
    /// Employer occupational-medicine share of the capped base.
    pub medical_rate: Decimal,
    /// Monthly ceiling of the contribution base.
    pub monthly_ceiling: Decimal,
}

impl CnssRates {
    /// Total contribution rate (employee, medical and employer pension).
    pub fn total_rate(&self) -> Decimal {
        self.employee_rate + self.employer_rate + self.medical_rate
    }

    /// Employer charges rate (pension and medical).
    pub fn employer_total_rate(&self) -> Decimal {
        self.employer_rate + self.medical_rate
    }
}

/// CNAM (health insurance) rates.
#[derive(Debug, Clone, Deserialize)]
pub struct CnamRates {
    /// Employee share of the base.
    pub employee_rate: Decimal,
    /// Employer share of the base.
    pub employer_rate: Decimal,
}

/// One ITS bracket; the last bracket has no upper bound.
#[derive(Debug, Clone, Deserialize)]
pub struct ItsBracket {
    /// Upper bound of taxable income covered by this bracket.
    #[serde(default)]
    pub up_to: Option<Decimal>,
    /// Marginal rate of the bracket.
    pub rate: Decimal,
}

/// ITS (income tax on salaries) scale.
#[derive(Debug, Clone, Deserialize)]
pub struct ItsRates {
    /// Monthly amount exempt before the scale applies.
    pub monthly_abatement: Decimal,
    /// Progressive brackets, in increasing order.
    pub brackets: Vec<ItsBracket>,
}

/// Statutory rates from rates.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// CNSS rates.
    pub cnss: CnssRates,
    /// CNAM rates.
    pub cnam: CnamRates,
    /// ITS scale.
    pub its: ItsRates,
    /// Number of days of a full payroll month (NJT reference).
    pub reference_days: Decimal,
    /// Paid leave days accrued per closed period.
    pub leave_days_per_month: Decimal,
}

/// A wage code definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RubriqueDefinition {
    /// Wage code.
    pub code: String,
    /// Label printed on payslips.
    pub label: String,
    /// Gain or deduction.
    pub kind: RubriqueKind,
    /// Included in the CNSS base.
    #[serde(default)]
    pub cnss: bool,
    /// Included in the CNAM base.
    #[serde(default)]
    pub cnam: bool,
    /// Included in the ITS taxable income.
    #[serde(default)]
    pub its: bool,
    /// General ledger account the rubrique posts to.
    pub account: String,
}

/// Rubriques configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RubriquesConfig {
    /// Code of the prorated base salary line.
    pub base_salary_code: String,
    /// All wage codes.
    pub rubriques: Vec<RubriqueDefinition>,
}

/// A motif to seed into the store.
#[derive(Debug, Clone, Deserialize)]
pub struct MotifDefinition {
    /// Short code.
    pub code: String,
    /// Human readable label.
    pub label: String,
    /// Kind of run.
    pub kind: MotifKind,
    /// Declared to CNSS.
    pub declared_cnss: bool,
    /// Declared to CNAM.
    pub declared_cnam: bool,
    /// Declared for ITS.
    pub declared_its: bool,
}

impl From<&MotifDefinition> for Motif {
    /// A motif not yet stored (id 0).
    fn from(definition: &MotifDefinition) -> Self {
        Motif {
            id: 0,
            code: definition.code.clone(),
            label: definition.label.clone(),
            kind: definition.kind,
            declared_cnss: definition.declared_cnss,
            declared_cnam: definition.declared_cnam,
            declared_its: definition.declared_its,
        }
    }
}

/// Motifs configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct MotifsConfig {
    /// All motifs.
    pub motifs: Vec<MotifDefinition>,
}

/// Statutory ledger accounts used by the payroll journal.
#[derive(Debug, Clone, Deserialize)]
pub struct StatutoryAccounts {
    /// CNSS payable (employee and employer shares).
    pub cnss_payable: String,
    /// CNAM payable (employee and employer shares).
    pub cnam_payable: String,
    /// ITS payable.
    pub its_payable: String,
    /// Employer CNSS charges expense.
    pub cnss_expense: String,
    /// Employer CNAM charges expense.
    pub cnam_expense: String,
    /// Net salaries payable to employees paid in cash.
    pub net_payable: String,
}

/// A bank salaries are transferred through.
#[derive(Debug, Clone, Deserialize)]
pub struct BankDefinition {
    /// Bank code referenced by employees.
    pub code: String,
    /// Bank name.
    pub name: String,
    /// Ledger account of the company's account at this bank.
    pub account: String,
    /// Company account number at this bank, printed in transfer files.
    pub company_account: String,
}

/// Accounting configuration from accounts.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// Company code expected by the accounting system.
    pub company_code: String,
    /// Journal the payroll entry is posted in.
    pub journal_code: String,
    /// Statutory accounts.
    pub accounts: StatutoryAccounts,
    /// Banks.
    #[serde(default)]
    pub banks: Vec<BankDefinition>,
}

/// The complete payroll configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct PayrollConfig {
    company: CompanyConfig,
    rates: RatesConfig,
    rubriques: RubriquesConfig,
    motifs: Vec<MotifDefinition>,
    accounts: AccountsConfig,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    pub fn new(
        company: CompanyConfig,
        rates: RatesConfig,
        rubriques: RubriquesConfig,
        motifs: Vec<MotifDefinition>,
        accounts: AccountsConfig,
    ) -> Self {
        Self {
            company,
            rates,
            rubriques,
            motifs,
            accounts,
        }
    }

    /// Returns the company identity.
    pub fn company(&self) -> &CompanyConfig {
        &self.company
    }

    /// Returns the statutory rates.
    pub fn rates(&self) -> &RatesConfig {
        &self.rates
    }

    /// Returns the wage code configuration.
    pub fn rubriques(&self) -> &RubriquesConfig {
        &self.rubriques
    }

    /// Returns the motifs to seed.
    pub fn motifs(&self) -> &[MotifDefinition] {
        &self.motifs
    }

    /// Returns the accounting configuration.
    pub fn accounts(&self) -> &AccountsConfig {
        &self.accounts
    }
}
