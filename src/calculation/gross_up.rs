//! Gross-from-net search.
//!
//! Finds the monthly base salary whose full-month payslip pays a requested
//! net amount. Net pay grows with the base salary (every marginal rate is
//! below 100%), so a bisection converges; the result is then snapped to the
//! smallest cent that still reaches the target.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::debug;

use crate::config::ConfigLoader;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{Employee, Motif, MotifKind, Period};

use super::{PayslipComputation, PayslipInput, compute_payslip};

const MAX_BRACKET_DOUBLINGS: u32 = 40;
const MAX_BISECTIONS: u32 = 200;
const MAX_CENT_STEPS: u32 = 20;

/// The result of a gross-from-net search.
#[derive(Debug, Clone, Serialize)]
pub struct GrossUpResult {
    /// The monthly base salary found.
    pub base_salary: Decimal,
    /// The payslip computed with that base salary.
    pub computation: PayslipComputation,
    /// Number of payslip evaluations performed.
    pub evaluations: u32,
}

/// Finds the base salary that yields `target_net` on a full-month payslip
/// without variable lines or installments.
///
/// # Errors
///
/// - [`PayrollError::CalculationError`] when the target is not positive,
///   when the motif carries no base salary, or when no bracket is found
pub fn gross_from_net(
    target_net: Decimal,
    employee: &Employee,
    motif: &Motif,
    period: Period,
    config: &ConfigLoader,
) -> PayrollResult<GrossUpResult> {
    if target_net <= Decimal::ZERO {
        return Err(PayrollError::CalculationError {
            message: format!("target net must be positive, got {}", target_net),
        });
    }
    if motif.kind == MotifKind::Special {
        return Err(PayrollError::CalculationError {
            message: format!("motif {} carries no base salary", motif.code),
        });
    }

    let reference_days = config.config().rates().reference_days;
    let mut candidate = employee.clone();
    let mut evaluations = 0u32;
    let mut evaluate = |base: Decimal| -> PayrollResult<PayslipComputation> {
        evaluations += 1;
        candidate.base_salary = base;
        compute_payslip(
            PayslipInput {
                employee: &candidate,
                motif,
                period,
                worked_days: reference_days,
                variable_lines: &[],
                installments: &[],
                cnss_base_used: Decimal::ZERO,
            },
            config,
        )
    };

    let mut low = target_net;
    let mut high = target_net * Decimal::TWO;
    let mut doublings = 0;
    while evaluate(high)?.payslip.net < target_net {
        low = high;
        high *= Decimal::TWO;
        doublings += 1;
        if doublings > MAX_BRACKET_DOUBLINGS {
            return Err(PayrollError::CalculationError {
                message: format!("no base salary reaches net {}", target_net),
            });
        }
    }

    let precision = Decimal::new(1, 3);
    let mut bisections = 0;
    while high - low > precision && bisections < MAX_BISECTIONS {
        let mid = (low + high) / Decimal::TWO;
        if evaluate(mid)?.payslip.net >= target_net {
            high = mid;
        } else {
            low = mid;
        }
        bisections += 1;
    }

    let cent = Decimal::new(1, 2);
    let mut base = high.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity);
    let mut computation = evaluate(base)?;
    for _ in 0..MAX_CENT_STEPS {
        let lower = evaluate(base - cent)?;
        if lower.payslip.net < target_net {
            break;
        }
        base -= cent;
        computation = lower;
    }

    debug!(
        employee_id = employee.id,
        target_net = %target_net,
        base_salary = %base,
        evaluations,
        "Gross-from-net search converged"
    );

    Ok(GrossUpResult {
        base_salary: base,
        computation,
        evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn config() -> ConfigLoader {
        ConfigLoader::load("./config/default").unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: 1,
            matricule: "M001".to_string(),
            full_name: "Ahmed Salem".to_string(),
            national_id: None,
            cnss_number: None,
            cnam_number: None,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
            base_salary: Decimal::ZERO,
            bank_code: None,
            bank_account: None,
            subject_to_cnss: true,
            subject_to_cnam: true,
            subject_to_its: true,
        }
    }

    fn motif(kind: MotifKind) -> Motif {
        Motif {
            id: 1,
            code: "NORMAL".to_string(),
            label: "Paie mensuelle".to_string(),
            kind,
            declared_cnss: true,
            declared_cnam: true,
            declared_its: true,
        }
    }

    fn period() -> Period {
        "2026-03".parse().unwrap()
    }

    #[test]
    fn test_finds_known_base_salary() {
        // A 30000 base salary pays 23688 net.
        let result = gross_from_net(
            dec("23688"),
            &employee(),
            &motif(MotifKind::Regular),
            period(),
            &config(),
        )
        .unwrap();
        assert_eq!(result.base_salary, dec("30000"));
        assert_eq!(result.computation.payslip.net, dec("23688"));
    }

    #[test]
    fn test_net_reaches_target_within_a_few_cents() {
        let target = dec("41234.56");
        let result = gross_from_net(
            target,
            &employee(),
            &motif(MotifKind::Regular),
            period(),
            &config(),
        )
        .unwrap();
        let net = result.computation.payslip.net;
        assert!(net >= target, "net {} below target {}", net, target);
        assert!(net - target < dec("0.05"), "net {} overshoots {}", net, target);
    }

    #[test]
    fn test_low_salary_below_abatement() {
        let result = gross_from_net(
            dec("4750"),
            &employee(),
            &motif(MotifKind::Regular),
            period(),
            &config(),
        )
        .unwrap();
        // 5000 gross: 50 CNSS, 200 CNAM, no ITS.
        assert_eq!(result.base_salary, dec("5000"));
    }

    #[test]
    fn test_rejects_non_positive_target() {
        let result = gross_from_net(
            Decimal::ZERO,
            &employee(),
            &motif(MotifKind::Regular),
            period(),
            &config(),
        );
        assert!(matches!(result, Err(PayrollError::CalculationError { .. })));
    }

    #[test]
    fn test_rejects_special_motif() {
        let result = gross_from_net(
            dec("1000"),
            &employee(),
            &motif(MotifKind::Special),
            period(),
            &config(),
        );
        assert!(matches!(result, Err(PayrollError::CalculationError { .. })));
    }
}
