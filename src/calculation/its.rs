//! ITS (income tax on salaries) calculation.
//!
//! Taxable income is the sum of ITS-subject gains less the employee's
//! social withholdings. A monthly abatement is removed before the
//! progressive scale applies.

use rust_decimal::Decimal;

use crate::config::ItsRates;
use crate::models::AuditStep;

use super::round_amount;

/// The result of an ITS calculation.
#[derive(Debug, Clone)]
pub struct ItsResult {
    /// Taxable base after the abatement.
    pub taxable_base: Decimal,
    /// Tax withheld.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies the progressive ITS scale to a monthly taxable income.
///
/// # Examples
///
/// ```
/// use paie_engine::calculation::calculate_its;
/// use paie_engine::config::{ItsBracket, ItsRates};
/// use rust_decimal::Decimal;
///
/// let rates = ItsRates {
///     monthly_abatement: Decimal::new(6000, 0),
///     brackets: vec![
///         ItsBracket { up_to: Some(Decimal::new(9000, 0)), rate: Decimal::new(15, 2) },
///         ItsBracket { up_to: None, rate: Decimal::new(25, 2) },
///     ],
/// };
/// let result = calculate_its(Decimal::new(16000, 0), &rates, 1);
/// assert_eq!(result.taxable_base, Decimal::new(10000, 0));
/// assert_eq!(result.tax, Decimal::new(1600, 0));
/// ```
pub fn calculate_its(taxable_income: Decimal, rates: &ItsRates, step_number: u32) -> ItsResult {
    let taxable_base = (taxable_income - rates.monthly_abatement).max(Decimal::ZERO);

    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    let mut slices = Vec::new();
    for bracket in &rates.brackets {
        if taxable_base <= lower {
            break;
        }
        let upper = match bracket.up_to {
            Some(limit) => taxable_base.min(limit),
            None => taxable_base,
        };
        let slice = upper - lower;
        if slice > Decimal::ZERO {
            tax += slice * bracket.rate;
            slices.push(format!(
                "{} x {}",
                slice.normalize(),
                bracket.rate.normalize()
            ));
        }
        match bracket.up_to {
            Some(limit) => lower = limit,
            None => break,
        }
    }
    let tax = round_amount(tax);

    let audit_step = AuditStep {
        step_number,
        rule_id: "its".to_string(),
        rule_name: "ITS Withholding".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "monthly_abatement": rates.monthly_abatement.normalize().to_string(),
        }),
        output: serde_json::json!({
            "taxable_base": taxable_base.normalize().to_string(),
            "tax": tax.normalize().to_string(),
        }),
        reasoning: if slices.is_empty() {
            "Taxable income below abatement - no ITS withheld".to_string()
        } else {
            format!("{} = {}", slices.join(" + "), tax.normalize())
        },
    };

    ItsResult {
        taxable_base,
        tax,
        audit_step,
    }
}
