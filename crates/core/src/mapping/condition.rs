//! Template condition evaluation against transaction details.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::types::{Condition, ConditionOperator};

impl Condition {
    /// Evaluates the condition against a transaction's detail map.
    ///
    /// Values compare numerically when both sides parse as decimals and as
    /// strings otherwise. `>` and `<` on non-numeric values never hold. A
    /// missing or null field only satisfies `!=`. Unknown operators always hold.
    #[must_use]
    pub fn is_satisfied(&self, details: &Map<String, Value>) -> bool {
        if let ConditionOperator::Other(op) = &self.operator {
            tracing::debug!(operator = %op, field = %self.field, "Unknown condition operator, treating as satisfied");
            return true;
        }

        let Some(actual) = lookup(details, &self.field).filter(|v| !v.is_null()) else {
            return self.operator == ConditionOperator::Ne;
        };

        let ordering = match (as_decimal(actual), as_decimal(&self.value)) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => None,
        };

        match (&self.operator, ordering) {
            (ConditionOperator::Eq, Some(ord)) => ord == Ordering::Equal,
            (ConditionOperator::Ne, Some(ord)) => ord != Ordering::Equal,
            (ConditionOperator::Gt, Some(ord)) => ord == Ordering::Greater,
            (ConditionOperator::Lt, Some(ord)) => ord == Ordering::Less,
            (ConditionOperator::Eq, None) => as_text(actual) == as_text(&self.value),
            (ConditionOperator::Ne, None) => as_text(actual) != as_text(&self.value),
            (ConditionOperator::Gt | ConditionOperator::Lt, None) => false,
            (ConditionOperator::Other(_), _) => true,
        }
    }
}

fn lookup<'a>(details: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    if let Some(value) = details.get(field) {
        return Some(value);
    }
    let mut parts = field.split('.');
    let mut current = details.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Reads a JSON number or numeric string as a decimal.
pub(crate) fn as_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .ok()
        .or_else(|| Decimal::from_scientific(&raw).ok())
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn details() -> Map<String, Value> {
        json!({
            "jumlah": 1_500_000,
            "metode": "TUNAI",
            "pajak": "110000.50",
            "unit": {"kode": "RSUD-01"},
            "catatan": null
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn cond(field: &str, op: &str, value: Value) -> Condition {
        Condition {
            field: field.into(),
            operator: ConditionOperator::from(op.to_string()),
            value,
        }
    }

    #[rstest]
    #[case(cond("metode", "==", json!("TUNAI")), true)]
    #[case(cond("metode", "!=", json!("TUNAI")), false)]
    #[case(cond("metode", "==", json!("TRANSFER")), false)]
    #[case(cond("jumlah", ">", json!(1_000_000)), true)]
    #[case(cond("jumlah", "<", json!("1000000")), false)]
    #[case(cond("jumlah", "==", json!("1500000.00")), true)]
    #[case(cond("pajak", ">", json!(110_000)), true)]
    #[case(cond("unit.kode", "==", json!("RSUD-01")), true)]
    #[case(cond("metode", ">", json!("A")), false)]
    #[case(cond("tidak_ada", "==", json!("x")), false)]
    #[case(cond("tidak_ada", "!=", json!("x")), true)]
    #[case(cond("catatan", "==", json!(null)), false)]
    #[case(cond("tidak_ada", "contains", json!("x")), true)]
    fn test_condition(#[case] condition: Condition, #[case] expected: bool) {
        assert_eq!(condition.is_satisfied(&details()), expected);
    }

    #[test]
    fn test_as_decimal_accepts_strings_and_scientific() {
        assert_eq!(as_decimal(&json!("1000")), Some(Decimal::from(1000)));
        assert_eq!(as_decimal(&json!(1e6)), Some(Decimal::from(1_000_000)));
        assert_eq!(as_decimal(&json!("abc")), None);
        assert_eq!(as_decimal(&json!(true)), None);
    }
}
