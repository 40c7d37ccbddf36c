//! Pure template validation and line computation.

use blud_shared::types::{exceeds_amount_scale, percentage_of, within_tolerance};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::error::MappingError;
use super::types::{AmountBasis, ComputedLine, LineTemplate, MappingPreview, MappingRule, Side};

/// Allowed deviation of a percentage side from 100.
pub const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Stateless calculator for mapping rules.
pub struct MappingCalculator;

impl MappingCalculator {
    /// Validates one side's templates.
    ///
    /// Every template needs a positive amount and a percentage no greater than
    /// 100. Fixed amounts carry at most two decimal places, like journal lines. When every template on the side is percentage based, the
    /// percentages must total 100 within [`PERCENTAGE_TOLERANCE`].
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_side(side: Side, templates: &[LineTemplate]) -> Result<(), MappingError> {
        if templates.is_empty() {
            return Err(MappingError::EmptyTemplates(side));
        }

        let mut percentage_total = Decimal::ZERO;
        let mut all_percentage = true;

        for (index, template) in templates.iter().enumerate() {
            if template.account_code.trim().is_empty() {
                return Err(MappingError::InvalidTemplate {
                    side,
                    index,
                    reason: "account code is required",
                });
            }
            match template.basis {
                AmountBasis::Percentage(p) => {
                    if p <= Decimal::ZERO || p > Decimal::ONE_HUNDRED {
                        return Err(MappingError::InvalidTemplate {
                            side,
                            index,
                            reason: "percentage must be greater than 0 and at most 100",
                        });
                    }
                    percentage_total += p;
                }
                AmountBasis::FixedAmount(amount) => {
                    if amount <= Decimal::ZERO {
                        return Err(MappingError::InvalidTemplate {
                            side,
                            index,
                            reason: "fixed amount must be greater than zero",
                        });
                    }
                    if exceeds_amount_scale(amount) {
                        return Err(MappingError::InvalidTemplate {
                            side,
                            index,
                            reason: "fixed amount carries at most two decimal places",
                        });
                    }
                    all_percentage = false;
                }
            }
        }

        if all_percentage
            && (percentage_total - Decimal::ONE_HUNDRED).abs() > PERCENTAGE_TOLERANCE
        {
            return Err(MappingError::PercentageTotal {
                side,
                total: percentage_total,
            });
        }
        Ok(())
    }

    /// Amount a template contributes for a transaction of `amount`.
    #[must_use]
    pub fn template_amount(template: &LineTemplate, amount: Decimal) -> Decimal {
        match template.basis {
            AmountBasis::Percentage(p) => percentage_of(amount, p),
            AmountBasis::FixedAmount(fixed) => fixed,
        }
    }

    /// Applies a rule to an amount.
    ///
    /// Templates whose condition does not hold and templates that compute to
    /// zero produce no line.
    #[must_use]
    pub fn compute(
        rule: &MappingRule,
        amount: Decimal,
        details: &Map<String, Value>,
    ) -> MappingPreview {
        let debit_lines = Self::compute_side(Side::Debit, rule.templates(Side::Debit), amount, details);
        let credit_lines =
            Self::compute_side(Side::Credit, rule.templates(Side::Credit), amount, details);

        let total_debit: Decimal = debit_lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = credit_lines.iter().map(|l| l.credit).sum();

        MappingPreview {
            amount,
            debit_lines,
            credit_lines,
            total_debit,
            total_credit,
            is_balanced: within_tolerance(total_debit, total_credit),
        }
    }

    /// Administrative preview: [`Self::compute`] with no transaction details.
    ///
    /// # Errors
    ///
    /// Fails if `sample_amount` is not positive.
    pub fn preview(rule: &MappingRule, sample_amount: Decimal) -> Result<MappingPreview, MappingError> {
        if sample_amount <= Decimal::ZERO {
            return Err(MappingError::InvalidSampleAmount(sample_amount));
        }
        Ok(Self::compute(rule, sample_amount, &Map::new()))
    }

    fn compute_side(
        side: Side,
        templates: &[LineTemplate],
        amount: Decimal,
        details: &Map<String, Value>,
    ) -> Vec<ComputedLine> {
        templates
            .iter()
            .filter(|t| t.condition.as_ref().is_none_or(|c| c.is_satisfied(details)))
            .filter_map(|t| {
                let value = Self::template_amount(t, amount);
                if value.is_zero() {
                    return None;
                }
                let (debit, credit) = match side {
                    Side::Debit => (value, Decimal::ZERO),
                    Side::Credit => (Decimal::ZERO, value),
                };
                Some(ComputedLine {
                    account_code: t.account_code.clone(),
                    description: t.description.clone(),
                    debit,
                    credit,
                })
            })
            .collect()
    }
}
