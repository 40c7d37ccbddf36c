//! Trial balance materializer.
//!
//! Snapshots the general ledger of a period into debit/credit columns.
//! Rows are generated on demand and adjusted additively afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use blud_shared::types::{AccountId, exceeds_amount_scale, percentage_change};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::TrialBalanceError;
use super::export;
use super::types::{
    AccountComparison, AccountTrend, GenerateOutcome, GroupedTrialBalance, TrendPoint,
    TrialBalanceComparison, TrialBalanceGroup, TrialBalanceReport, TrialBalanceRow,
    TrialBalanceSummary,
};
use crate::account::AccountType;
use crate::fiscal::Period;
use crate::store::{LedgerBalanceStore, StoreError, TrialBalanceStore};

/// Builds and queries trial balances.
pub struct TrialBalanceMaterializer {
    balances: Arc<dyn LedgerBalanceStore>,
    rows: Arc<dyn TrialBalanceStore>,
}

impl TrialBalanceMaterializer {
    /// Creates the materializer.
    pub fn new(balances: Arc<dyn LedgerBalanceStore>, rows: Arc<dyn TrialBalanceStore>) -> Self {
        Self { balances, rows }
    }

    /// Regenerates every row of `period` from the ledger balances.
    ///
    /// Previously recorded adjustments are discarded; the outcome reports
    /// how many rows carried one.
    pub async fn generate(&self, period: Period) -> Result<GenerateOutcome, TrialBalanceError> {
        let (rows, discarded) = self.materialize(period).await?;
        Ok(GenerateOutcome {
            period,
            rows_generated: rows.len(),
            discarded_adjustments: discarded,
            summary: TrialBalanceSummary::of(&rows),
        })
    }

    /// Rows of `period` with totals, generating them first if none exist.
    pub async fn get(&self, period: Period) -> Result<TrialBalanceReport, TrialBalanceError> {
        let mut rows = self.rows.list_period(period).await?;
        if rows.is_empty() {
            info!(period = %period, "No trial balance yet, generating");
            rows = self.materialize(period).await?.0;
        }
        Ok(TrialBalanceReport {
            period,
            summary: TrialBalanceSummary::of(&rows),
            rows,
        })
    }

    /// [`Self::get`] bucketed by account classification.
    pub async fn get_grouped(
        &self,
        period: Period,
    ) -> Result<GroupedTrialBalance, TrialBalanceError> {
        let report = self.get(period).await?;
        Ok(group(report))
    }

    /// Adds an adjustment to an existing row.
    pub async fn record_adjustment(
        &self,
        period: Period,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<TrialBalanceRow, TrialBalanceError> {
        if let Some(amount) = [debit, credit].into_iter().find(|a| exceeds_amount_scale(*a)) {
            return Err(TrialBalanceError::ExcessPrecision(amount));
        }
        let row = self
            .rows
            .apply_adjustment(period, account_id, debit, credit)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => TrialBalanceError::RowNotFound { period, account_id },
                other => TrialBalanceError::Store(other),
            })?;
        info!(
            period = %period,
            account_code = %row.account_code,
            debit = %debit,
            credit = %credit,
            "Trial balance adjustment recorded"
        );
        Ok(row)
    }

    /// Per-account change from `base` to `compare`, on adjusted figures.
    pub async fn compare(
        &self,
        base: Period,
        compare: Period,
    ) -> Result<TrialBalanceComparison, TrialBalanceError> {
        let base_rows = self.get(base).await?.rows;
        let compare_rows = self.get(compare).await?.rows;

        let mut joined: BTreeMap<String, (Option<TrialBalanceRow>, Option<TrialBalanceRow>)> =
            BTreeMap::new();
        for row in base_rows {
            let code = row.account_code.clone();
            joined.entry(code).or_default().0 = Some(row);
        }
        for row in compare_rows {
            let code = row.account_code.clone();
            joined.entry(code).or_default().1 = Some(row);
        }

        let accounts = joined
            .into_values()
            .filter_map(|(before, after)| {
                let reference = before.as_ref().or(after.as_ref())?.clone();
                let (base_debit, base_credit) = adjusted(before.as_ref());
                let (compare_debit, compare_credit) = adjusted(after.as_ref());
                let base_balance = base_debit - base_credit;
                let compare_balance = compare_debit - compare_credit;
                Some(AccountComparison {
                    account_id: reference.account_id,
                    account_code: reference.account_code,
                    account_name: reference.account_name,
                    base_debit,
                    base_credit,
                    compare_debit,
                    compare_credit,
                    base_balance,
                    compare_balance,
                    change: compare_balance - base_balance,
                    change_percentage: percentage_change(base_balance, compare_balance),
                })
            })
            .collect();

        Ok(TrialBalanceComparison {
            base_period: base,
            compare_period: compare,
            accounts,
        })
    }

    /// Figures of each account across `from..=to`, optionally for some
    /// accounts. Only periods already generated contribute.
    pub async fn trend(
        &self,
        from: Period,
        to: Period,
        account_ids: Option<&[AccountId]>,
    ) -> Result<Vec<AccountTrend>, TrialBalanceError> {
        if from > to {
            return Err(TrialBalanceError::InvalidRange { from, to });
        }

        let mut trends: Vec<AccountTrend> = Vec::new();
        for row in self
            .rows
            .list_range(from, to)
            .await?
            .into_iter()
            .filter(|r| account_ids.is_none_or(|ids| ids.contains(&r.account_id)))
        {
            let point = TrendPoint {
                period: row.period,
                debit: row.debit,
                credit: row.credit,
                debit_adjusted: row.debit_adjusted,
                credit_adjusted: row.credit_adjusted,
            };
            match trends.last_mut() {
                Some(trend) if trend.account_id == row.account_id => trend.points.push(point),
                _ => trends.push(AccountTrend {
                    account_id: row.account_id,
                    account_code: row.account_code,
                    account_name: row.account_name,
                    points: vec![point],
                }),
            }
        }
        Ok(trends)
    }

    /// CSV of a period's trial balance, flat or grouped.
    pub async fn export_csv(
        &self,
        period: Period,
        grouped: bool,
    ) -> Result<String, TrialBalanceError> {
        let report = self.get(period).await?;
        if grouped {
            export::render_grouped(&group(report))
        } else {
            export::render(&report)
        }
    }

    async fn materialize(
        &self,
        period: Period,
    ) -> Result<(Vec<TrialBalanceRow>, usize), TrialBalanceError> {
        let discarded = self
            .rows
            .list_period(period)
            .await?
            .iter()
            .filter(|r| r.has_adjustment())
            .count();

        let generated_at = Utc::now();
        let rows: Vec<TrialBalanceRow> = self
            .balances
            .list_period(period)
            .await?
            .iter()
            .map(|b| TrialBalanceRow::from_balance(b, generated_at))
            .collect();

        self.rows.replace_period(period, rows.clone()).await?;

        if discarded > 0 {
            warn!(
                period = %period,
                discarded,
                "Trial balance regenerated, recorded adjustments were dropped"
            );
        }
        info!(period = %period, rows = rows.len(), "Trial balance generated");
        Ok((rows, discarded))
    }
}

fn adjusted(row: Option<&TrialBalanceRow>) -> (Decimal, Decimal) {
    row.map_or((Decimal::ZERO, Decimal::ZERO), |r| {
        (r.debit_adjusted, r.credit_adjusted)
    })
}

fn group(report: TrialBalanceReport) -> GroupedTrialBalance {
    let mut buckets: BTreeMap<usize, Vec<TrialBalanceRow>> = BTreeMap::new();
    for row in report.rows {
        let rank = AccountType::ALL
            .iter()
            .position(|t| *t == row.account_type)
            .unwrap_or(AccountType::ALL.len());
        buckets.entry(rank).or_default().push(row);
    }

    let groups = buckets
        .into_values()
        .filter_map(|rows| {
            let account_type = rows.first()?.account_type;
            Some(TrialBalanceGroup {
                account_type,
                label: account_type.label().to_string(),
                subtotal: TrialBalanceSummary::of(&rows),
                rows,
            })
        })
        .collect();

    GroupedTrialBalance {
        period: report.period,
        groups,
        summary: report.summary,
    }
}
