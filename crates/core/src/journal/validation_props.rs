//! Property-based tests for journal line validation.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::JournalLineInput;
use super::validation::JournalValidator;
use crate::account::{Account, AccountType};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn chart() -> HashMap<String, Account> {
    [
        Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
        Account::new("1.1.2", "Bank", AccountType::Asset, false).unwrap(),
        Account::new("4.1.1", "Pendapatan Jasa", AccountType::Revenue, false).unwrap(),
    ]
    .into_iter()
    .map(|a| (a.code.clone(), a))
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Debits split across any number of lines against one credit line of the
    /// same total are always accepted, and the totals match.
    #[test]
    fn prop_balanced_split_accepted(amounts in prop::collection::vec(positive_amount(), 1..8)) {
        let chart = chart();
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| JournalLineInput::debit(if i % 2 == 0 { "1.1.1" } else { "1.1.2" }, *a))
            .collect();
        lines.push(JournalLineInput::credit("4.1.1", total));

        let (resolved, totals) = JournalValidator::resolve_lines(&lines, |c| chart.get(c)).unwrap();
        prop_assert_eq!(resolved.len(), lines.len());
        prop_assert_eq!(totals.total_debit, total);
        prop_assert_eq!(totals.total_credit, total);
        prop_assert!(totals.is_balanced);
    }

    /// Any difference of a cent or more is rejected as unbalanced.
    #[test]
    fn prop_difference_of_a_cent_rejected(
        amount in positive_amount(),
        delta in positive_amount(),
    ) {
        let chart = chart();
        let lines = vec![
            JournalLineInput::debit("1.1.1", amount + delta),
            JournalLineInput::credit("4.1.1", amount),
        ];
        let result = JournalValidator::resolve_lines(&lines, |c| chart.get(c));
        prop_assert!(
            matches!(result, Err(JournalError::Unbalanced { .. })),
            "expected Unbalanced"
        );
    }

    /// Line numbers follow input order.
    #[test]
    fn prop_line_numbers_sequential(amount in positive_amount(), extra in 0usize..5) {
        let chart = chart();
        let mut lines = vec![JournalLineInput::credit("4.1.1", amount * Decimal::from(extra + 1))];
        for _ in 0..=extra {
            lines.push(JournalLineInput::debit("1.1.1", amount));
        }
        let (resolved, _) = JournalValidator::resolve_lines(&lines, |c| chart.get(c)).unwrap();
        for (i, line) in resolved.iter().enumerate() {
            prop_assert_eq!(line.line_number, i32::try_from(i + 1).unwrap());
        }
    }
}
