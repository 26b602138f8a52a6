//! CNSS (social security) contribution calculation.
//!
//! The contribution base is the sum of CNSS-subject gains capped at the
//! monthly ceiling. The total contribution is 16% of the base, split into
//! the employee share (1%), the occupational-medicine share (2%) and the
//! employer pension share (13%).

use rust_decimal::Decimal;

use crate::config::CnssRates;
use crate::models::AuditStep;

use super::round_amount;

/// The result of a CNSS calculation.
#[derive(Debug, Clone)]
pub struct CnssResult {
    /// Contribution base after the ceiling.
    pub base: Decimal,
    /// Share withheld from the employee.
    pub employee_share: Decimal,
    /// Employer pension share.
    pub employer_share: Decimal,
    /// Employer occupational-medicine share.
    pub medical_share: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

impl CnssResult {
    /// Sum of all three shares.
    pub fn total(&self) -> Decimal {
        self.employee_share + self.employer_share + self.medical_share
    }
}

/// Calculates CNSS shares for a monthly subject amount.
///
/// # Examples
///
/// ```
/// use paie_engine::calculation::calculate_cnss;
/// use paie_engine::config::CnssRates;
/// use rust_decimal::Decimal;
///
/// let rates = CnssRates {
///     employee_rate: Decimal::new(1, 2),
///     employer_rate: Decimal::new(13, 2),
///     medical_rate: Decimal::new(2, 2),
///     monthly_ceiling: Decimal::new(7000, 0),
/// };
/// let result = calculate_cnss(Decimal::new(30000, 0), &rates, 1);
/// assert_eq!(result.base, Decimal::new(7000, 0));
/// assert_eq!(result.employee_share, Decimal::new(70, 0));
/// ```
pub fn calculate_cnss(subject_amount: Decimal, rates: &CnssRates, step_number: u32) -> CnssResult {
    let base = subject_amount.max(Decimal::ZERO).min(rates.monthly_ceiling);
    let employee_share = round_amount(base * rates.employee_rate);
    let employer_share = round_amount(base * rates.employer_rate);
    let medical_share = round_amount(base * rates.medical_rate);
    let capped = subject_amount > rates.monthly_ceiling;

    let audit_step = AuditStep {
        step_number,
        rule_id: "cnss".to_string(),
        rule_name: "CNSS Contribution".to_string(),
        input: serde_json::json!({
            "subject_amount": subject_amount.normalize().to_string(),
            "monthly_ceiling": rates.monthly_ceiling.normalize().to_string(),
        }),
        output: serde_json::json!({
            "base": base.normalize().to_string(),
            "capped": capped,
            "employee_share": employee_share.normalize().to_string(),
            "employer_share": employer_share.normalize().to_string(),
            "medical_share": medical_share.normalize().to_string(),
        }),
        reasoning: format!(
            "Base {} x {} = {} withheld",
            base.normalize(),
            rates.employee_rate.normalize(),
            employee_share.normalize()
        ),
    };

    CnssResult {
        base,
        employee_share,
        employer_share,
        medical_share,
        audit_step,
    }
}
