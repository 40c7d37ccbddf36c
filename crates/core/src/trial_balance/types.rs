//! Trial balance types.

use blud_shared::types::{AccountId, TrialBalanceRowId, within_tolerance};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{AccountType, NormalBalance};
use crate::fiscal::Period;
use crate::general_ledger::LedgerBalance;

/// Snapshot of one account's balance in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceRow {
    /// Unique identifier.
    pub id: TrialBalanceRowId,
    /// Period.
    pub period: Period,
    /// Fiscal year.
    pub year: i32,
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Classification, used for grouping.
    pub account_type: AccountType,
    /// Normal balance used for the column mapping.
    pub normal_balance: NormalBalance,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
    /// Accumulated debit adjustments.
    pub debit_adjustment: Decimal,
    /// Accumulated credit adjustments.
    pub credit_adjustment: Decimal,
    /// `debit + debit_adjustment`.
    pub debit_adjusted: Decimal,
    /// `credit + credit_adjustment`.
    pub credit_adjusted: Decimal,
    /// When the row was generated.
    pub generated_at: DateTime<Utc>,
}

impl TrialBalanceRow {
    /// Maps a ledger balance row into debit/credit columns.
    #[must_use]
    pub fn from_balance(balance: &LedgerBalance, generated_at: DateTime<Utc>) -> Self {
        let (debit, credit) = balance.normal_balance.to_columns(balance.closing_balance);
        Self {
            id: TrialBalanceRowId::new(),
            period: balance.period,
            year: balance.year,
            account_id: balance.account_id,
            account_code: balance.account_code.clone(),
            account_name: balance.account_name.clone(),
            account_type: balance.account_type,
            normal_balance: balance.normal_balance,
            debit,
            credit,
            debit_adjustment: Decimal::ZERO,
            credit_adjustment: Decimal::ZERO,
            debit_adjusted: debit,
            credit_adjusted: credit,
            generated_at,
        }
    }

    /// Adds an adjustment to the adjusted columns.
    pub fn adjust(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_adjustment += debit;
        self.credit_adjustment += credit;
        self.debit_adjusted = self.debit + self.debit_adjustment;
        self.credit_adjusted = self.credit + self.credit_adjustment;
    }

    /// Returns true if any adjustment has been recorded.
    #[must_use]
    pub fn has_adjustment(&self) -> bool {
        !self.debit_adjustment.is_zero() || !self.credit_adjustment.is_zero()
    }

    /// Unadjusted `debit - credit`.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Adjusted `debit - credit`.
    #[must_use]
    pub fn net_adjusted(&self) -> Decimal {
        self.debit_adjusted - self.credit_adjusted
    }
}

/// Column totals of a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceSummary {
    /// Sum of debit columns.
    pub total_debet: Decimal,
    /// Sum of credit columns.
    pub total_kredit: Decimal,
    /// Sum of adjusted debit columns.
    pub total_debet_adjusted: Decimal,
    /// Sum of adjusted credit columns.
    pub total_kredit_adjusted: Decimal,
    /// Unadjusted totals agree within 0.01.
    pub is_balanced: bool,
    /// `total_debet - total_kredit`.
    pub difference: Decimal,
}

impl TrialBalanceSummary {
    /// Totals over `rows`.
    #[must_use]
    pub fn of<'a>(rows: impl IntoIterator<Item = &'a TrialBalanceRow>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total_debet += row.debit;
            summary.total_kredit += row.credit;
            summary.total_debet_adjusted += row.debit_adjusted;
            summary.total_kredit_adjusted += row.credit_adjusted;
        }
        summary.difference = summary.total_debet - summary.total_kredit;
        summary.is_balanced = within_tolerance(summary.total_debet, summary.total_kredit);
        summary
    }
}

/// Trial balance of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceReport {
    /// Period.
    pub period: Period,
    /// Rows ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals.
    pub summary: TrialBalanceSummary,
}

/// Rows of one account classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceGroup {
    /// Classification.
    pub account_type: AccountType,
    /// Display label.
    pub label: String,
    /// Rows ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Group subtotal.
    pub subtotal: TrialBalanceSummary,
}

/// Trial balance of a period grouped by classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedTrialBalance {
    /// Period.
    pub period: Period,
    /// Non-empty groups in reporting order.
    pub groups: Vec<TrialBalanceGroup>,
    /// Grand totals.
    pub summary: TrialBalanceSummary,
}

/// Result of regenerating a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutcome {
    /// Period regenerated.
    pub period: Period,
    /// Rows written.
    pub rows_generated: usize,
    /// Previously adjusted rows whose adjustments were dropped.
    pub discarded_adjustments: usize,
    /// Totals of the new rows.
    pub summary: TrialBalanceSummary,
}

/// Change of one account between two periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountComparison {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Adjusted debit in the base period.
    pub base_debit: Decimal,
    /// Adjusted credit in the base period.
    pub base_credit: Decimal,
    /// Adjusted debit in the compared period.
    pub compare_debit: Decimal,
    /// Adjusted credit in the compared period.
    pub compare_credit: Decimal,
    /// Adjusted `debit - credit` in the base period.
    pub base_balance: Decimal,
    /// Adjusted `debit - credit` in the compared period.
    pub compare_balance: Decimal,
    /// `compare_balance - base_balance`.
    pub change: Decimal,
    /// Change relative to the base, in percent; zero when the base is zero.
    pub change_percentage: Decimal,
}

/// Comparison of two periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceComparison {
    /// Base period.
    pub base_period: Period,
    /// Compared period.
    pub compare_period: Period,
    /// Accounts present in either period, ordered by code.
    pub accounts: Vec<AccountComparison>,
}

/// Figures of one account in one period of a trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Period.
    pub period: Period,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
    /// Adjusted debit.
    pub debit_adjusted: Decimal,
    /// Adjusted credit.
    pub credit_adjusted: Decimal,
}

/// One account's figures across a range of periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrend {
    /// Account.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Periods with a row, in order.
    pub points: Vec<TrendPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use rust_decimal_macros::dec;

    fn balance(account: &Account, closing_movement: (Decimal, Decimal)) -> LedgerBalance {
        let mut row = LedgerBalance::open(account, Period::new(2025, 3).unwrap(), Decimal::ZERO);
        row.apply(closing_movement.0, closing_movement.1);
        row
    }

    #[test]
    fn test_contra_balance_reports_opposite_column() {
        let kas = Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap();
        let row = TrialBalanceRow::from_balance(&balance(&kas, (dec!(100), dec!(250))), Utc::now());
        assert_eq!(row.debit, dec!(0));
        assert_eq!(row.credit, dec!(150));
        assert_eq!(row.net(), dec!(-150));
    }

    #[test]
    fn test_adjustment_accumulates() {
        let kas = Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap();
        let mut row = TrialBalanceRow::from_balance(&balance(&kas, (dec!(1000), dec!(0))), Utc::now());
        assert!(!row.has_adjustment());
        assert_eq!(row.debit_adjusted, dec!(1000));

        row.adjust(dec!(50), dec!(0));
        row.adjust(dec!(0), dec!(20));
        assert!(row.has_adjustment());
        assert_eq!(row.debit_adjusted, dec!(1050));
        assert_eq!(row.credit_adjusted, dec!(20));
        assert_eq!(row.debit, dec!(1000));
    }

    #[test]
    fn test_summary_totals() {
        let kas = Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap();
        let pendapatan = Account::new("4.1.1", "Pendapatan", AccountType::Revenue, false).unwrap();
        let rows = vec![
            TrialBalanceRow::from_balance(&balance(&kas, (dec!(1000), dec!(0))), Utc::now()),
            TrialBalanceRow::from_balance(&balance(&pendapatan, (dec!(0), dec!(1000))), Utc::now()),
        ];
        let summary = TrialBalanceSummary::of(&rows);
        assert_eq!(summary.total_debet, dec!(1000));
        assert_eq!(summary.total_kredit, dec!(1000));
        assert!(summary.is_balanced);
        assert_eq!(summary.difference, dec!(0));

        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("totalDebet").is_some());
        assert!(json.get("totalKreditAdjusted").is_some());
    }
}
