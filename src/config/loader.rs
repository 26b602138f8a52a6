//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{PayrollError, PayrollResult};

use super::types::{
    AccountsConfig, BankDefinition, CompanyConfig, MotifsConfig, PayrollConfig, RatesConfig,
    RubriqueDefinition, RubriquesConfig,
};

/// Loads and provides access to payroll configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and provides methods to query rates, wage codes, accounts and banks.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/default/
/// ├── company.yaml     # Employer identity and report directory
/// ├── rates.yaml       # CNSS, CNAM and ITS rates
/// ├── rubriques.yaml   # Wage codes
/// ├── motifs.yaml      # Payroll run reasons
/// └── accounts.yaml    # Journal, statutory accounts and banks
/// ```
///
/// # Example
///
/// ```no_run
/// use paie_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let rubrique = loader.get_rubrique("SALBASE").unwrap();
/// println!("{} posts to {}", rubrique.label, rubrique.account);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The base salary code is not a defined rubrique
    pub fn load<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path = path.as_ref();

        let company = Self::load_yaml::<CompanyConfig>(&path.join("company.yaml"))?;
        let rates = Self::load_yaml::<RatesConfig>(&path.join("rates.yaml"))?;
        let rubriques_path = path.join("rubriques.yaml");
        let rubriques = Self::load_yaml::<RubriquesConfig>(&rubriques_path)?;
        let motifs = Self::load_yaml::<MotifsConfig>(&path.join("motifs.yaml"))?;
        let accounts = Self::load_yaml::<AccountsConfig>(&path.join("accounts.yaml"))?;

        if !rubriques
            .rubriques
            .iter()
            .any(|r| r.code == rubriques.base_salary_code)
        {
            return Err(PayrollError::ConfigParseError {
                path: rubriques_path.display().to_string(),
                message: format!(
                    "base salary code '{}' is not a defined rubrique",
                    rubriques.base_salary_code
                ),
            });
        }

        let config = PayrollConfig::new(company, rates, rubriques, motifs.motifs, accounts);
        Ok(Self { config })
    }

    /// Wraps an already assembled configuration.
    pub fn from_config(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> PayrollResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| PayrollError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| PayrollError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Gets a wage code definition by its code.
    pub fn get_rubrique(&self, code: &str) -> PayrollResult<&RubriqueDefinition> {
        self.config
            .rubriques()
            .rubriques
            .iter()
            .find(|r| r.code == code)
            .ok_or_else(|| PayrollError::RubriqueNotFound {
                code: code.to_string(),
            })
    }

    /// Gets the definition of the prorated base salary line.
    pub fn base_salary_rubrique(&self) -> PayrollResult<&RubriqueDefinition> {
        self.get_rubrique(&self.config.rubriques().base_salary_code)
    }

    /// Gets a bank by its code.
    pub fn get_bank(&self, code: &str) -> PayrollResult<&BankDefinition> {
        self.config
            .accounts()
            .banks
            .iter()
            .find(|b| b.code == code)
            .ok_or_else(|| PayrollError::BankNotFound {
                code: code.to_string(),
            })
    }
}
