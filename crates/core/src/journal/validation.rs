//! Pure validation of journal lines.
//!
//! Account lookup is injected so the same rules run against any store and in
//! property tests.

use blud_shared::types::exceeds_amount_scale;
use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::{JournalLineInput, JournalTotals, NewJournalLine};
use crate::account::{Account, AccountError};

/// Stateless journal line validator.
pub struct JournalValidator;

impl JournalValidator {
    /// Validates caller-supplied lines and resolves their accounts.
    ///
    /// Checks, in order:
    /// 1. at least two lines
    /// 2. per line: no negative amount, exactly one of debit/credit non-zero,
    ///    at most two decimal places
    /// 3. per line: account exists, is active and is not a header
    /// 4. debit and credit totals agree within 0.01
    ///
    /// Line numbers are assigned 1-based in input order.
    pub fn resolve_lines<'a, F>(
        lines: &[JournalLineInput],
        lookup: F,
    ) -> Result<(Vec<NewJournalLine>, JournalTotals), JournalError>
    where
        F: Fn(&str) -> Option<&'a Account>,
    {
        if lines.len() < 2 {
            return Err(JournalError::InsufficientLines { count: lines.len() });
        }

        let mut resolved = Vec::with_capacity(lines.len());
        for (index, input) in lines.iter().enumerate() {
            Self::check_amounts(index + 1, input)?;

            let code = input.account_code.trim();
            let account = lookup(code).ok_or_else(|| AccountError::NotFound(code.to_string()))?;
            account.ensure_postable()?;

            resolved.push(NewJournalLine {
                line_number: i32::try_from(index + 1).unwrap_or(i32::MAX),
                account_id: account.id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                cost_center: input.cost_center.clone(),
                description: input.description.clone(),
                debit: input.debit,
                credit: input.credit,
            });
        }

        let totals = JournalTotals::from_amounts(resolved.iter().map(|l| (l.debit, l.credit)));
        if !totals.is_balanced {
            return Err(JournalError::Unbalanced {
                debit: totals.total_debit,
                credit: totals.total_credit,
            });
        }
        Ok((resolved, totals))
    }

    fn check_amounts(line: usize, input: &JournalLineInput) -> Result<(), JournalError> {
        let reason = if input.debit < Decimal::ZERO || input.credit < Decimal::ZERO {
            Some("amounts must not be negative")
        } else if !input.debit.is_zero() && !input.credit.is_zero() {
            Some("a line cannot carry both debit and credit")
        } else if input.debit.is_zero() && input.credit.is_zero() {
            Some("either debit or credit must be greater than zero")
        } else if exceeds_amount_scale(input.debit) || exceeds_amount_scale(input.credit) {
            Some("amounts carry at most two decimal places")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(JournalError::InvalidLineAmount { line, reason }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use rust_decimal_macros::dec;
    use rstest::rstest;
    use std::collections::HashMap;

    fn chart() -> HashMap<String, Account> {
        [
            Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
            Account::new("1.1.2", "Bank", AccountType::Asset, false).unwrap(),
            Account::new("4.1.1", "Pendapatan Jasa", AccountType::Revenue, false).unwrap(),
            Account::new("4.1", "Pendapatan", AccountType::Revenue, true).unwrap(),
            Account::new("5.1.1", "Beban", AccountType::Expense, false)
                .unwrap()
                .deactivated(),
        ]
        .into_iter()
        .map(|a| (a.code.clone(), a))
        .collect()
    }

    fn resolve(
        lines: &[JournalLineInput],
    ) -> Result<(Vec<NewJournalLine>, JournalTotals), JournalError> {
        let chart = chart();
        JournalValidator::resolve_lines(lines, |code| chart.get(code))
    }

    #[test]
    fn test_valid_split_lines() {
        let (lines, totals) = resolve(&[
            JournalLineInput::debit("1.1.1", dec!(600)),
            JournalLineInput::debit("1.1.2", dec!(400)),
            JournalLineInput::credit("4.1.1", dec!(1000)),
        ])
        .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].line_number, 3);
        assert_eq!(lines[1].account_name, "Bank");
        assert_eq!(totals.total_debit, dec!(1000));
        assert!(totals.is_balanced);
    }

    #[test]
    fn test_single_line_rejected() {
        let err = resolve(&[JournalLineInput::debit("1.1.1", dec!(10))]).unwrap_err();
        assert!(matches!(err, JournalError::InsufficientLines { count: 1 }));
    }

    #[test]
    fn test_unbalanced_rejected() {
        let err = resolve(&[
            JournalLineInput::debit("1.1.1", dec!(1000)),
            JournalLineInput::credit("4.1.1", dec!(900)),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "Journal not balanced. Debit: 1000, Credit: 900");
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        assert!(
            resolve(&[
                JournalLineInput::debit("1.1.1", dec!(100.5000)),
                JournalLineInput::credit("4.1.1", dec!(100.50)),
            ])
            .is_ok()
        );
    }

    #[rstest]
    #[case(dec!(-5), dec!(0))]
    #[case(dec!(5), dec!(5))]
    #[case(dec!(0), dec!(0))]
    #[case(dec!(5.004), dec!(0))]
    #[case(dec!(0.00001), dec!(0))]
    fn test_bad_line_amounts(#[case] debit: Decimal, #[case] credit: Decimal) {
        let mut bad = JournalLineInput::debit("1.1.1", debit);
        bad.credit = credit;
        let err = resolve(&[bad, JournalLineInput::credit("4.1.1", dec!(5))]).unwrap_err();
        assert!(matches!(err, JournalError::InvalidLineAmount { line: 1, .. }));
        assert_eq!(err.error_code(), "INVALID_LINE_AMOUNT");
    }

    #[rstest]
    #[case("9.9.9", "ACCOUNT_NOT_FOUND")]
    #[case("4.1", "ACCOUNT_NOT_POSTABLE")]
    #[case("5.1.1", "ACCOUNT_INACTIVE")]
    fn test_unusable_accounts(#[case] code: &str, #[case] error_code: &str) {
        let err = resolve(&[
            JournalLineInput::debit("1.1.1", dec!(10)),
            JournalLineInput::credit(code, dec!(10)),
        ])
        .unwrap_err();
        assert_eq!(err.error_code(), error_code);
        assert_eq!(err.http_status_code(), 400);
    }
}
