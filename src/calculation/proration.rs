//! Paid-days (NJT) proration and monetary rounding.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::AuditStep;

/// Rounds a monetary amount to the cent, halves away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The result of prorating a monthly amount by paid days.
#[derive(Debug, Clone)]
pub struct ProrationResult {
    /// The prorated amount, rounded to the cent.
    pub amount: Decimal,
    /// Paid days actually used (capped by the reference).
    pub days: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Prorates a monthly amount by the number of paid days.
///
/// Days are clamped to `0..=reference_days`, so a full month never pays
/// more than the monthly amount.
///
/// # Examples
///
/// ```
/// use paie_engine::calculation::prorate;
/// use rust_decimal::Decimal;
///
/// let result = prorate(Decimal::new(30000, 0), Decimal::new(15, 0), Decimal::new(30, 0), 1);
/// assert_eq!(result.amount, Decimal::new(15000, 0));
/// ```
pub fn prorate(
    monthly_amount: Decimal,
    worked_days: Decimal,
    reference_days: Decimal,
    step_number: u32,
) -> ProrationResult {
    let days = worked_days.max(Decimal::ZERO).min(reference_days);
    let amount = if reference_days.is_zero() {
        Decimal::ZERO
    } else {
        round_amount(monthly_amount * days / reference_days)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "njt_proration".to_string(),
        rule_name: "Paid Days Proration".to_string(),
        input: serde_json::json!({
            "monthly_amount": monthly_amount.normalize().to_string(),
            "worked_days": worked_days.normalize().to_string(),
            "reference_days": reference_days.normalize().to_string(),
        }),
        output: serde_json::json!({
            "days": days.normalize().to_string(),
            "amount": amount.normalize().to_string(),
        }),
        reasoning: format!(
            "{} x {} / {} = {}",
            monthly_amount.normalize(),
            days.normalize(),
            reference_days.normalize(),
            amount.normalize()
        ),
    };

    ProrationResult {
        amount,
        days,
        audit_step,
    }
}
