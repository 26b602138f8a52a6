//! CNAM (health insurance) contribution calculation.

use rust_decimal::Decimal;

use crate::config::CnamRates;
use crate::models::AuditStep;

use super::round_amount;

/// The result of a CNAM calculation.
#[derive(Debug, Clone)]
pub struct CnamResult {
    /// Contribution base.
    pub base: Decimal,
    /// Share withheld from the employee.
    pub employee_share: Decimal,
    /// Employer share.
    pub employer_share: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates CNAM shares for a monthly subject amount. There is no ceiling.
pub fn calculate_cnam(subject_amount: Decimal, rates: &CnamRates, step_number: u32) -> CnamResult {
    let base = subject_amount.max(Decimal::ZERO);
    let employee_share = round_amount(base * rates.employee_rate);
    let employer_share = employer_share_from_employee(employee_share, rates);

    let audit_step = AuditStep {
        step_number,
        rule_id: "cnam".to_string(),
        rule_name: "CNAM Contribution".to_string(),
        input: serde_json::json!({
            "subject_amount": subject_amount.normalize().to_string(),
        }),
        output: serde_json::json!({
            "base": base.normalize().to_string(),
            "employee_share": employee_share.normalize().to_string(),
            "employer_share": employer_share.normalize().to_string(),
        }),
        reasoning: format!(
            "Base {} x {} = {} withheld",
            base.normalize(),
            rates.employee_rate.normalize(),
            employee_share.normalize()
        ),
    };

    CnamResult {
        base,
        employee_share,
        employer_share,
        audit_step,
    }
}

/// Derives the employer share from the employee share.
///
/// With the statutory 4% / 5% rates this is the employee amount x 5/4.
///
/// # Examples
///
/// ```
/// use paie_engine::calculation::employer_share_from_employee;
/// use paie_engine::config::CnamRates;
/// use rust_decimal::Decimal;
///
/// let rates = CnamRates {
///     employee_rate: Decimal::new(4, 2),
///     employer_rate: Decimal::new(5, 2),
/// };
/// assert_eq!(
///     employer_share_from_employee(Decimal::new(1200, 0), &rates),
///     Decimal::new(1500, 0)
/// );
/// ```
pub fn employer_share_from_employee(employee_share: Decimal, rates: &CnamRates) -> Decimal {
    if rates.employee_rate.is_zero() {
        return Decimal::ZERO;
    }
    round_amount(employee_share * rates.employer_rate / rates.employee_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rates() -> CnamRates {
        CnamRates {
            employee_rate: dec("0.04"),
            employer_rate: dec("0.05"),
        }
    }

    #[test]
    fn test_employee_share_is_4_percent() {
        let result = calculate_cnam(dec("30000"), &rates(), 1);
        assert_eq!(result.base, dec("30000"));
        assert_eq!(result.employee_share, dec("1200"));
    }

    #[test]
    fn test_employer_share_is_five_quarters_of_employee() {
        let result = calculate_cnam(dec("30000"), &rates(), 1);
        assert_eq!(result.employer_share, dec("1500"));
        assert_eq!(result.employer_share, result.employee_share * dec("5") / dec("4"));
    }

    #[test]
    fn test_no_ceiling() {
        let result = calculate_cnam(dec("250000"), &rates(), 1);
        assert_eq!(result.employee_share, dec("10000"));
    }

    #[test]
    fn test_zero_employee_rate_has_no_employer_share() {
        let rates = CnamRates {
            employee_rate: Decimal::ZERO,
            employer_rate: dec("0.05"),
        };
        assert_eq!(employer_share_from_employee(dec("100"), &rates), Decimal::ZERO);
    }
}
