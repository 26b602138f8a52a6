//! Payslip assembly.
//!
//! Combines the prorated base salary, variable wage lines, statutory
//! withholdings and installment tranches into a [`Payslip`] and its lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CnssRates, ConfigLoader, RubriqueDefinition};
use crate::error::{PayrollError, PayrollResult};
use crate::models::{
    AuditStep, AuditTrace, Employee, Installment, Motif, MotifKind, PayLine, Payslip, Period,
    RubriqueKind,
};

use super::{calculate_cnam, calculate_cnss, calculate_its, prorate, round_amount};

/// A variable wage line entered for the period (overtime, bonus, advance).
///
/// The amount is `base x rate` when a rate is given, otherwise `base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableLine {
    /// Wage code.
    pub rubrique_code: String,
    /// Quantity or amount.
    pub base: Decimal,
    /// Optional unit rate.
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl VariableLine {
    fn amount(&self) -> Decimal {
        round_amount(match self.rate {
            Some(rate) => self.base * rate,
            None => self.base,
        })
    }
}

/// Everything needed to compute one payslip.
#[derive(Debug, Clone, Copy)]
pub struct PayslipInput<'a> {
    /// The employee paid.
    pub employee: &'a Employee,
    /// The payroll run reason.
    pub motif: &'a Motif,
    /// The payroll month.
    pub period: Period,
    /// Paid days (NJT).
    pub worked_days: Decimal,
    /// Variable lines entered for the period.
    pub variable_lines: &'a [VariableLine],
    /// The employee's installments; only those due are deducted.
    pub installments: &'a [Installment],
    /// CNSS base already declared on the employee's other payslips of the
    /// month; the monthly ceiling applies to their sum.
    pub cnss_base_used: Decimal,
}

/// An installment tranche deducted on the payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheDeduction {
    /// The installment repaid.
    pub installment_id: i64,
    /// Amount deducted.
    pub amount: Decimal,
}

/// Employer contributions that do not appear on the payslip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerCharges {
    /// CNSS employer pension share.
    pub cnss_employer: Decimal,
    /// CNSS occupational-medicine share.
    pub cnss_medical: Decimal,
    /// CNAM employer share.
    pub cnam_employer: Decimal,
}

/// The result of computing a payslip.
#[derive(Debug, Clone, Serialize)]
pub struct PayslipComputation {
    /// The payslip totals.
    pub payslip: Payslip,
    /// The gain and deduction lines.
    pub lines: Vec<PayLine>,
    /// Installment tranches deducted.
    pub tranches: Vec<TrancheDeduction>,
    /// Employer contributions.
    pub employer_charges: EmployerCharges,
    /// Audit trace of the computation.
    pub audit: AuditTrace,
}

fn line_from(
    definition: &RubriqueDefinition,
    base: Decimal,
    rate: Option<Decimal>,
    amount: Decimal,
) -> PayLine {
    PayLine {
        rubrique_code: definition.code.clone(),
        label: definition.label.clone(),
        kind: definition.kind,
        base,
        rate,
        amount,
    }
}

/// Computes a payslip.
///
/// # Errors
///
/// - [`PayrollError::RubriqueNotFound`] when a line uses an unknown wage code
/// - [`PayrollError::CalculationError`] when a line amount is negative or
///   manual deductions exceed the pay available after withholdings
pub fn compute_payslip(
    input: PayslipInput<'_>,
    config: &ConfigLoader,
) -> PayrollResult<PayslipComputation> {
    let rates = config.config().rates();
    let mut audit = AuditTrace::default();
    let mut lines: Vec<(&RubriqueDefinition, PayLine)> = Vec::new();

    if input.motif.kind != MotifKind::Special {
        let definition = config.base_salary_rubrique()?;
        let proration = prorate(
            input.employee.base_salary,
            input.worked_days,
            rates.reference_days,
            audit.next_step_number(),
        );
        audit.push(proration.audit_step);
        if proration.amount > Decimal::ZERO {
            lines.push((
                definition,
                line_from(definition, proration.days, None, proration.amount),
            ));
        }
    }

    for variable in input.variable_lines {
        let definition = config.get_rubrique(&variable.rubrique_code)?;
        let amount = variable.amount();
        if amount < Decimal::ZERO {
            return Err(PayrollError::CalculationError {
                message: format!(
                    "negative amount {} for rubrique {}",
                    amount, variable.rubrique_code
                ),
            });
        }
        if amount.is_zero() {
            continue;
        }
        lines.push((
            definition,
            line_from(definition, variable.base, variable.rate, amount),
        ));
    }

    let gains = || {
        lines
            .iter()
            .filter(|(d, _)| d.kind == RubriqueKind::Gain)
    };
    let gross: Decimal = gains().map(|(_, l)| l.amount).sum();
    let cnss_subject: Decimal = gains().filter(|(d, _)| d.cnss).map(|(_, l)| l.amount).sum();
    let cnam_subject: Decimal = gains().filter(|(d, _)| d.cnam).map(|(_, l)| l.amount).sum();
    let its_subject: Decimal = gains().filter(|(d, _)| d.its).map(|(_, l)| l.amount).sum();
    let manual_deductions: Decimal = lines
        .iter()
        .filter(|(d, _)| d.kind == RubriqueKind::Deduction)
        .map(|(_, l)| l.amount)
        .sum();

    let cnss_rates = CnssRates {
        monthly_ceiling: (rates.cnss.monthly_ceiling - input.cnss_base_used).max(Decimal::ZERO),
        ..rates.cnss.clone()
    };
    let cnss = calculate_cnss(
        if input.employee.subject_to_cnss { cnss_subject } else { Decimal::ZERO },
        &cnss_rates,
        audit.next_step_number(),
    );
    audit.push(cnss.audit_step.clone());

    let cnam = calculate_cnam(
        if input.employee.subject_to_cnam { cnam_subject } else { Decimal::ZERO },
        &rates.cnam,
        audit.next_step_number(),
    );
    audit.push(cnam.audit_step.clone());

    let its_income = if input.employee.subject_to_its {
        its_subject - cnss.employee_share - cnam.employee_share
    } else {
        Decimal::ZERO
    };
    let its = calculate_its(its_income, &rates.its, audit.next_step_number());
    audit.push(its.audit_step.clone());

    let available = gross - cnss.employee_share - cnam.employee_share - its.tax;
    if manual_deductions > available {
        return Err(PayrollError::CalculationError {
            message: format!(
                "deductions {} exceed pay available {} for employee {}",
                manual_deductions, available, input.employee.id
            ),
        });
    }

    let mut remaining = available - manual_deductions;
    let mut tranches = Vec::new();
    if input.motif.kind != MotifKind::Special {
        for installment in input
            .installments
            .iter()
            .filter(|i| i.employee_id == input.employee.id && i.is_due_in(input.period))
        {
            let wanted = match input.motif.kind {
                MotifKind::Termination => installment.outstanding,
                _ => installment.next_tranche(),
            };
            let amount = wanted.min(remaining);
            if amount <= Decimal::ZERO {
                continue;
            }
            let definition = config.get_rubrique(&installment.rubrique_code)?;
            remaining -= amount;
            lines.push((
                definition,
                line_from(definition, installment.outstanding, None, amount),
            ));
            tranches.push(TrancheDeduction {
                installment_id: installment.id,
                amount,
            });
        }
    }
    let tranche_total: Decimal = tranches.iter().map(|t| t.amount).sum();
    if !tranches.is_empty() {
        audit.push(AuditStep {
            step_number: audit.next_step_number(),
            rule_id: "installments".to_string(),
            rule_name: "Installment Deductions".to_string(),
            input: serde_json::json!({
                "available": (available - manual_deductions).normalize().to_string(),
                "due": tranches.len(),
            }),
            output: serde_json::json!({
                "deducted": tranche_total.normalize().to_string(),
            }),
            reasoning: format!(
                "{} tranche(s) deducted for {}",
                tranches.len(),
                tranche_total.normalize()
            ),
        });
    }

    let other_deductions = manual_deductions + tranche_total;
    let net = available - other_deductions;
    audit.push(AuditStep {
        step_number: audit.next_step_number(),
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross": gross.normalize().to_string(),
            "cnss": cnss.employee_share.normalize().to_string(),
            "cnam": cnam.employee_share.normalize().to_string(),
            "its": its.tax.normalize().to_string(),
            "other_deductions": other_deductions.normalize().to_string(),
        }),
        output: serde_json::json!({
            "net": net.normalize().to_string(),
        }),
        reasoning: format!(
            "{} - {} - {} - {} - {} = {}",
            gross.normalize(),
            cnss.employee_share.normalize(),
            cnam.employee_share.normalize(),
            its.tax.normalize(),
            other_deductions.normalize(),
            net.normalize()
        ),
    });

    let payslip = Payslip {
        id: 0,
        employee_id: input.employee.id,
        motif_id: input.motif.id,
        period: input.period,
        worked_days: input.worked_days,
        gross,
        cnss_base: cnss.base,
        cnss_employee: cnss.employee_share,
        cnam_base: cnam.base,
        cnam_employee: cnam.employee_share,
        taxable_base: its.taxable_base,
        its: its.tax,
        other_deductions,
        net,
        closed: false,
    };

    Ok(PayslipComputation {
        payslip,
        lines: lines.into_iter().map(|(_, l)| l).collect(),
        tranches,
        employer_charges: EmployerCharges {
            cnss_employer: cnss.employer_share,
            cnss_medical: cnss.medical_share,
            cnam_employer: cnam.employer_share,
        },
        audit,
    })
}
