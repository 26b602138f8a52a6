//! Payroll run reasons.

use serde::{Deserialize, Serialize};

/// The kind of payroll run a motif stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifKind {
    /// The regular monthly payroll.
    Regular,
    /// Final settlement at the end of a contract.
    Termination,
    /// Bonuses, advances and other off-cycle runs.
    Special,
}

impl MotifKind {
    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MotifKind::Regular => "regular",
            MotifKind::Termination => "termination",
            MotifKind::Special => "special",
        }
    }

    /// Parses the storage form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "regular" => Some(MotifKind::Regular),
            "termination" => Some(MotifKind::Termination),
            "special" => Some(MotifKind::Special),
            _ => None,
        }
    }
}

/// The reason code of a payroll run, with its declaration flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motif {
    /// Unique identifier.
    pub id: i64,
    /// Short code (e.g. "NORMAL").
    pub code: String,
    /// Human readable label.
    pub label: String,
    /// The kind of run.
    pub kind: MotifKind,
    /// Payslips of this motif are declared to CNSS.
    pub declared_cnss: bool,
    /// Payslips of this motif are declared to CNAM.
    pub declared_cnam: bool,
    /// Payslips of this motif are declared for ITS.
    pub declared_its: bool,
}
