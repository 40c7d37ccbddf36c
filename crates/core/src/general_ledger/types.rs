//! General ledger balance types.

use blud_shared::types::{AccountId, JournalId, LedgerBalanceId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountType, NormalBalance};
use crate::fiscal::Period;

/// Running balance of one account in one period.
///
/// `closing_balance` is always a function of `opening_balance` and the
/// period totals under the account's normal-balance rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBalance {
    /// Unique identifier.
    pub id: LedgerBalanceId,
    /// Account.
    pub account_id: AccountId,
    /// Account code snapshot.
    pub account_code: String,
    /// Account name snapshot.
    pub account_name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Normal balance used for the closing computation.
    pub normal_balance: NormalBalance,
    /// Period.
    pub period: Period,
    /// Fiscal year.
    pub year: i32,
    /// Previous period's closing balance.
    pub opening_balance: Decimal,
    /// Sum of posted debits in the period.
    pub period_debit: Decimal,
    /// Sum of posted credits in the period.
    pub period_credit: Decimal,
    /// `period_debit - period_credit`.
    pub net_movement: Decimal,
    /// Balance at period end.
    pub closing_balance: Decimal,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl LedgerBalance {
    /// New row with no movement.
    #[must_use]
    pub fn open(account: &Account, period: Period, opening_balance: Decimal) -> Self {
        Self {
            id: LedgerBalanceId::new(),
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            account_type: account.account_type,
            normal_balance: account.normal_balance,
            period,
            year: period.year(),
            opening_balance,
            period_debit: Decimal::ZERO,
            period_credit: Decimal::ZERO,
            net_movement: Decimal::ZERO,
            closing_balance: opening_balance,
            updated_at: Utc::now(),
        }
    }

    /// Adds a movement and recomputes the derived figures.
    pub fn apply(&mut self, debit: Decimal, credit: Decimal) {
        self.period_debit += debit;
        self.period_credit += credit;
        self.recompute();
        self.updated_at = Utc::now();
    }

    /// Recomputes `net_movement` and `closing_balance`.
    pub fn recompute(&mut self) {
        self.net_movement = self.period_debit - self.period_credit;
        self.closing_balance = self.normal_balance.closing_balance(
            self.opening_balance,
            self.period_debit,
            self.period_credit,
        );
    }

    /// Row for the next `period`, opening at this row's closing balance.
    #[must_use]
    pub fn carry_forward(&self, period: Period) -> Self {
        let mut row = Self {
            id: LedgerBalanceId::new(),
            period,
            year: period.year(),
            opening_balance: self.closing_balance,
            period_debit: Decimal::ZERO,
            period_credit: Decimal::ZERO,
            updated_at: Utc::now(),
            ..self.clone()
        };
        row.recompute();
        row
    }

    /// Balance figures without identity or timestamps, for comparisons.
    #[must_use]
    pub fn figures(&self) -> BalanceFigures {
        BalanceFigures {
            account_id: self.account_id,
            period: self.period,
            opening_balance: self.opening_balance,
            period_debit: self.period_debit,
            period_credit: self.period_credit,
            closing_balance: self.closing_balance,
        }
    }
}

/// The reproducible part of a [`LedgerBalance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BalanceFigures {
    /// Account.
    pub account_id: AccountId,
    /// Period.
    pub period: Period,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Debit total.
    pub period_debit: Decimal,
    /// Credit total.
    pub period_credit: Decimal,
    /// Closing balance.
    pub closing_balance: Decimal,
}

/// One delta applied to a balance row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMovement {
    /// Account moved.
    pub account: Account,
    /// Period of the movement.
    pub period: Period,
    /// Debit delta.
    pub debit: Decimal,
    /// Credit delta.
    pub credit: Decimal,
}

/// Point-in-time balance of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalanceAsOf {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Date the balance is computed for.
    pub as_of: NaiveDate,
    /// Period containing `as_of`.
    pub period: Period,
    /// Opening balance of the period.
    pub opening_balance: Decimal,
    /// Debits from the start of the period through `as_of`.
    pub debit: Decimal,
    /// Credits from the start of the period through `as_of`.
    pub credit: Decimal,
    /// Balance at the end of `as_of`.
    pub balance: Decimal,
}

/// A posted line with the running balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLineDetail {
    /// Journal id.
    pub journal_id: JournalId,
    /// Journal number.
    pub journal_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Line description, falling back to the journal description.
    pub description: String,
    /// Debit.
    pub debit: Decimal,
    /// Credit.
    pub credit: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
}

/// Balance row of an account and period with its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralLedgerSummary {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Period.
    pub period: Period,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Period debits.
    pub period_debit: Decimal,
    /// Period credits.
    pub period_credit: Decimal,
    /// Closing balance.
    pub closing_balance: Decimal,
    /// Posted lines in date order.
    pub transactions: Vec<LedgerLineDetail>,
}

/// One period of an account in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    /// Period.
    pub period: Period,
    /// Opening balance.
    pub opening_balance: Decimal,
    /// Period debits.
    pub period_debit: Decimal,
    /// Period credits.
    pub period_credit: Decimal,
    /// Closing balance.
    pub closing_balance: Decimal,
}

/// One account of a multi-period report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAccount {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Periods in order.
    pub periods: Vec<ReportPeriod>,
    /// Debits across the range.
    pub total_debit: Decimal,
    /// Credits across the range.
    pub total_credit: Decimal,
}

/// Outcome of a rebuild or initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMaintenance {
    /// Period processed.
    pub period: Period,
    /// Rows written.
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_uses_normal_balance() {
        let kas = Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap();
        let period = Period::new(2025, 3).unwrap();
        let mut row = LedgerBalance::open(&kas, period, dec!(500));
        row.apply(dec!(1000), dec!(0));
        row.apply(dec!(0), dec!(300));
        assert_eq!(row.period_debit, dec!(1000));
        assert_eq!(row.period_credit, dec!(300));
        assert_eq!(row.net_movement, dec!(700));
        assert_eq!(row.closing_balance, dec!(1200));

        let revenue = Account::new("4.1.1", "Pendapatan", AccountType::Revenue, false).unwrap();
        let mut row = LedgerBalance::open(&revenue, period, dec!(0));
        row.apply(dec!(0), dec!(1000));
        assert_eq!(row.net_movement, dec!(-1000));
        assert_eq!(row.closing_balance, dec!(1000));
    }
}
