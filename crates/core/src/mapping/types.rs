//! Mapping rule types.

use std::fmt;

use blud_shared::types::MappingRuleId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of the journal a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit lines.
    Debit,
    /// Credit lines.
    Credit,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        })
    }
}

/// How a template derives its amount from the transaction total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountBasis {
    /// Share of the transaction amount, in percent.
    Percentage(Decimal),
    /// Fixed amount regardless of the transaction amount.
    FixedAmount(Decimal),
}

/// Comparison operator of a template condition.
///
/// Unrecognised operators are kept so stored rules round-trip; they always
/// evaluate as satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// Anything else.
    Other(String),
}

impl From<String> for ConditionOperator {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "==" | "=" | "eq" => Self::Eq,
            "!=" | "<>" | "ne" => Self::Ne,
            ">" | "gt" => Self::Gt,
            "<" | "lt" => Self::Lt,
            _ => Self::Other(raw),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        match op {
            ConditionOperator::Eq => "==".to_string(),
            ConditionOperator::Ne => "!=".to_string(),
            ConditionOperator::Gt => ">".to_string(),
            ConditionOperator::Lt => "<".to_string(),
            ConditionOperator::Other(raw) => raw,
        }
    }
}

/// Predicate over the transaction details deciding whether a template applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Detail field name; dots address nested objects.
    pub field: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Value to compare against.
    pub value: Value,
}

/// One line template of a mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTemplate {
    /// Target account code.
    pub account_code: String,
    /// Line description.
    pub description: String,
    /// Amount derivation.
    pub basis: AmountBasis,
    /// Optional predicate; the template is skipped when it does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl LineTemplate {
    /// Percentage template without a condition.
    #[must_use]
    pub fn percentage(account_code: &str, description: &str, percentage: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            description: description.to_string(),
            basis: AmountBasis::Percentage(percentage),
            condition: None,
        }
    }

    /// Fixed-amount template without a condition.
    #[must_use]
    pub fn fixed(account_code: &str, description: &str, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            description: description.to_string(),
            basis: AmountBasis::FixedAmount(amount),
            condition: None,
        }
    }

    /// Returns the template guarded by `condition`.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Declarative mapping from a transaction source type to journal lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Unique identifier.
    pub id: MappingRuleId,
    /// Unique source type, e.g. `PENDAPATAN_JASA`.
    pub source_type: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Debit side templates, in order.
    pub debit_templates: Vec<LineTemplate>,
    /// Credit side templates, in order.
    pub credit_templates: Vec<LineTemplate>,
    /// Only active rules are used by auto-posting.
    pub is_active: bool,
    /// Higher wins when several active rules match.
    pub priority: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MappingRule {
    /// Templates of one side.
    #[must_use]
    pub fn templates(&self, side: Side) -> &[LineTemplate] {
        match side {
            Side::Debit => &self.debit_templates,
            Side::Credit => &self.credit_templates,
        }
    }
}

/// Input for creating or replacing a mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRuleInput {
    /// Source type the rule handles.
    pub source_type: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Debit side templates.
    pub debit_templates: Vec<LineTemplate>,
    /// Credit side templates.
    pub credit_templates: Vec<LineTemplate>,
    /// Whether the rule is active.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Rule priority.
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

/// A line computed from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLine {
    /// Target account code.
    pub account_code: String,
    /// Template description.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Result of applying a rule to an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingPreview {
    /// Amount the rule was applied to.
    pub amount: Decimal,
    /// Debit lines in template order.
    pub debit_lines: Vec<ComputedLine>,
    /// Credit lines in template order.
    pub credit_lines: Vec<ComputedLine>,
    /// Sum of debit lines.
    pub total_debit: Decimal,
    /// Sum of credit lines.
    pub total_credit: Decimal,
    /// Totals agree within tolerance.
    pub is_balanced: bool,
}

impl MappingPreview {
    /// Debit lines followed by credit lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<ComputedLine> {
        let mut lines = self.debit_lines;
        lines.extend(self.credit_lines);
        lines
    }
}
