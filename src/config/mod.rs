//! Configuration loading and management for the payroll engine.
//!
//! This module provides functionality to load the payroll configuration from
//! YAML files, including company identity, statutory rates, wage codes,
//! payroll motifs and accounting accounts.
//!
//! # Example
//!
//! ```no_run
//! use paie_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Employer: {}", config.config().company().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AccountsConfig, BankDefinition, CnamRates, CnssRates, CompanyConfig, ItsBracket, ItsRates,
    MotifDefinition, MotifsConfig, PayrollConfig, RatesConfig, RubriqueDefinition,
    RubriquesConfig, StatutoryAccounts,
};
