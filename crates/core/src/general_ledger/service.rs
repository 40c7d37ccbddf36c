//! General ledger accumulator.
//!
//! Keeps one running balance row per (account, period), fed by
//! `journal.posted`. Incremental updates share a read guard; rebuild and
//! initialization hold the write guard so they never interleave with them.
//!
//! A journal is counted at most once: the store records every journal it
//! has applied, and a rebuild records the journals it replayed. A
//! `journal.posted` that arrives after a rebuild already counted the journal
//! is a no-op.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use blud_shared::types::{AccountId, JournalId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::GeneralLedgerError;
use super::types::{
    AccountBalanceAsOf, BalanceMovement, GeneralLedgerSummary, LedgerBalance, LedgerLineDetail,
    PeriodMaintenance, ReportAccount, ReportPeriod,
};
use crate::account::Account;
use crate::events::{DomainEvent, HandlerError, Subscriber, Topic};
use crate::fiscal::Period;
use crate::journal::PostedLine;
use crate::store::{AccountStore, JournalStore, LedgerBalanceStore};

/// Running per-account, per-period balances.
pub struct GeneralLedgerAccumulator {
    balances: Arc<dyn LedgerBalanceStore>,
    journals: Arc<dyn JournalStore>,
    accounts: Arc<dyn AccountStore>,
    maintenance: RwLock<()>,
}

impl GeneralLedgerAccumulator {
    /// Creates the accumulator.
    pub fn new(
        balances: Arc<dyn LedgerBalanceStore>,
        journals: Arc<dyn JournalStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            balances,
            journals,
            accounts,
            maintenance: RwLock::new(()),
        }
    }

    /// Applies every line of a posted journal. Returns the number of lines
    /// applied, zero when the journal was already counted.
    pub async fn on_journal_posted(
        &self,
        journal_id: JournalId,
    ) -> Result<usize, GeneralLedgerError> {
        let journal = self
            .journals
            .find(journal_id)
            .await?
            .ok_or(GeneralLedgerError::JournalNotFound(journal_id))?;
        let lines = self.journals.find_lines(journal_id).await?;

        let mut chart: HashMap<AccountId, Account> = HashMap::new();
        let mut movements = Vec::with_capacity(lines.len());
        for line in &lines {
            let account = match chart.get(&line.account_id) {
                Some(account) => account.clone(),
                None => {
                    let account = self.account(line.account_id).await?;
                    chart.insert(line.account_id, account.clone());
                    account
                }
            };
            movements.push(BalanceMovement {
                account,
                period: journal.period,
                debit: line.debit,
                credit: line.credit,
            });
        }

        let _guard = self.maintenance.read().await;
        let applied = self
            .balances
            .apply_journal(journal_id, journal.period, movements)
            .await?;
        let Some(rows) = applied else {
            debug!(
                journal_id = %journal_id,
                journal_number = %journal.journal_number,
                "Journal already counted in the ledger, skipping"
            );
            return Ok(0);
        };
        debug!(
            journal_id = %journal_id,
            journal_number = %journal.journal_number,
            period = %journal.period,
            lines = lines.len(),
            rows = rows.len(),
            "Ledger balances updated"
        );
        Ok(lines.len())
    }

    /// Adds one movement to the (account, period) row.
    ///
    /// Each call is one delta; calling it twice counts twice.
    pub async fn update_gl_entry(
        &self,
        account_id: AccountId,
        period: Period,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<LedgerBalance, GeneralLedgerError> {
        let account = self.account(account_id).await?;
        let _guard = self.maintenance.read().await;
        self.apply(&account, period, debit, credit).await
    }

    /// Recomputes a period from its posted journals, replacing every row.
    pub async fn rebuild_for_period(
        &self,
        period: Period,
    ) -> Result<PeriodMaintenance, GeneralLedgerError> {
        let _guard = self.maintenance.write().await;

        let lines = self.journals.posted_lines_in_period(period).await?;
        let journals: BTreeSet<JournalId> = lines.iter().map(|l| l.journal_id).collect();
        let mut totals: BTreeMap<AccountId, (Decimal, Decimal)> = BTreeMap::new();
        for posted in &lines {
            let entry = totals
                .entry(posted.line.account_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += posted.line.debit;
            entry.1 += posted.line.credit;
        }

        let mut rows = Vec::with_capacity(totals.len());
        for (account_id, (debit, credit)) in totals {
            let account = self.account(account_id).await?;
            let opening = self.previous_closing(account_id, period).await?;
            let mut row = LedgerBalance::open(&account, period, opening);
            row.apply(debit, credit);
            rows.push(row);
        }

        let count = rows.len();
        let journal_count = journals.len();
        self.balances
            .replace_period(period, rows, journals.into_iter().collect())
            .await?;
        info!(
            period = %period,
            rows = count,
            journals = journal_count,
            lines = lines.len(),
            "Ledger period rebuilt"
        );
        Ok(PeriodMaintenance { period, rows: count })
    }

    /// Opens `period` for every account that had a row in the previous
    /// period. Existing rows are left untouched.
    pub async fn initialize_new_period(
        &self,
        period: Period,
    ) -> Result<PeriodMaintenance, GeneralLedgerError> {
        let _guard = self.maintenance.write().await;

        let previous = self.balances.list_period(period.previous()).await?;
        if previous.is_empty() {
            warn!(period = %period, previous = %period.previous(), "No balances to carry forward");
            return Ok(PeriodMaintenance { period, rows: 0 });
        }

        let rows = previous.iter().map(|r| r.carry_forward(period)).collect();
        let inserted = self.balances.insert_missing(rows).await?;
        info!(period = %period, rows = inserted, "Ledger period initialized");
        Ok(PeriodMaintenance {
            period,
            rows: inserted,
        })
    }

    /// Balance of an account at the end of `as_of`.
    ///
    /// On the last day of a month the period row's closing balance is used.
    /// Otherwise the opening balance plus the lines of the month's posted
    /// journals dated on or before `as_of`.
    pub async fn account_balance(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalanceAsOf, GeneralLedgerError> {
        let account = self.account(account_id).await?;
        self.balance_of(&account, as_of).await
    }

    /// [`Self::account_balance`] by account code.
    pub async fn account_balance_by_code(
        &self,
        code: &str,
        as_of: NaiveDate,
    ) -> Result<AccountBalanceAsOf, GeneralLedgerError> {
        let account = self
            .accounts
            .find_by_code(code)
            .await?
            .ok_or_else(|| GeneralLedgerError::AccountNotFound(code.to_string()))?;
        self.balance_of(&account, as_of).await
    }

    /// Rows of one account over a period range.
    pub async fn by_account(
        &self,
        account_id: AccountId,
        from: Period,
        to: Period,
    ) -> Result<Vec<LedgerBalance>, GeneralLedgerError> {
        check_range(from, to)?;
        self.account(account_id).await?;
        Ok(self.balances.list_account(account_id, from, to).await?)
    }

    /// Rows of every account in a period.
    pub async fn by_period(&self, period: Period) -> Result<Vec<LedgerBalance>, GeneralLedgerError> {
        Ok(self.balances.list_period(period).await?)
    }

    /// Balance row of an account and period with its posted lines and a
    /// running balance.
    pub async fn summary(
        &self,
        account_id: AccountId,
        period: Period,
    ) -> Result<GeneralLedgerSummary, GeneralLedgerError> {
        let account = self.account(account_id).await?;
        let row = match self.balances.find(account_id, period).await? {
            Some(row) => row,
            None => {
                let opening = self.previous_closing(account_id, period).await?;
                LedgerBalance::open(&account, period, opening)
            }
        };

        let lines: Vec<PostedLine> = self
            .journals
            .posted_lines_in_period(period)
            .await?
            .into_iter()
            .filter(|l| l.line.account_id == account_id)
            .collect();

        let mut running = row.opening_balance;
        let transactions = lines
            .into_iter()
            .map(|posted| {
                running = account
                    .normal_balance
                    .closing_balance(running, posted.line.debit, posted.line.credit);
                LedgerLineDetail {
                    journal_id: posted.journal_id,
                    journal_number: posted.journal_number,
                    entry_date: posted.entry_date,
                    description: posted
                        .line
                        .description
                        .unwrap_or(posted.journal_description),
                    debit: posted.line.debit,
                    credit: posted.line.credit,
                    running_balance: running,
                }
            })
            .collect();

        Ok(GeneralLedgerSummary {
            account_id,
            account_code: account.code,
            account_name: account.name,
            period,
            opening_balance: row.opening_balance,
            period_debit: row.period_debit,
            period_credit: row.period_credit,
            closing_balance: row.closing_balance,
            transactions,
        })
    }

    /// Multi-period report grouped by account, optionally for some accounts.
    pub async fn report(
        &self,
        from: Period,
        to: Period,
        account_ids: Option<&[AccountId]>,
    ) -> Result<Vec<ReportAccount>, GeneralLedgerError> {
        check_range(from, to)?;
        let rows = self.balances.list_range(from, to).await?;

        let mut report: Vec<ReportAccount> = Vec::new();
        for row in rows
            .into_iter()
            .filter(|r| account_ids.is_none_or(|ids| ids.contains(&r.account_id)))
        {
            let period = ReportPeriod {
                period: row.period,
                opening_balance: row.opening_balance,
                period_debit: row.period_debit,
                period_credit: row.period_credit,
                closing_balance: row.closing_balance,
            };
            match report.last_mut() {
                Some(account) if account.account_id == row.account_id => {
                    account.total_debit += row.period_debit;
                    account.total_credit += row.period_credit;
                    account.periods.push(period);
                }
                _ => report.push(ReportAccount {
                    account_id: row.account_id,
                    account_code: row.account_code,
                    account_name: row.account_name,
                    account_type: row.account_type,
                    total_debit: row.period_debit,
                    total_credit: row.period_credit,
                    periods: vec![period],
                }),
            }
        }
        Ok(report)
    }

    async fn apply(
        &self,
        account: &Account,
        period: Period,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<LedgerBalance, GeneralLedgerError> {
        Ok(self
            .balances
            .apply_movement(BalanceMovement {
                account: account.clone(),
                period,
                debit,
                credit,
            })
            .await?)
    }

    async fn balance_of(
        &self,
        account: &Account,
        as_of: NaiveDate,
    ) -> Result<AccountBalanceAsOf, GeneralLedgerError> {
        let period = Period::from_date(as_of);
        let row = self.balances.find(account.id, period).await?;

        let (opening, debit, credit) = match row {
            Some(row) if as_of == period.last_day() => {
                (row.opening_balance, row.period_debit, row.period_credit)
            }
            row => {
                let opening = match row {
                    Some(row) => row.opening_balance,
                    None => self.previous_closing(account.id, period).await?,
                };
                // Same journals as the period row: keyed by period, not date.
                let lines = self
                    .journals
                    .posted_lines_until(period, as_of, Some(account.id))
                    .await?;
                let debit = lines.iter().map(|l| l.line.debit).sum();
                let credit = lines.iter().map(|l| l.line.credit).sum();
                (opening, debit, credit)
            }
        };

        Ok(AccountBalanceAsOf {
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            as_of,
            period,
            opening_balance: opening,
            debit,
            credit,
            balance: account.normal_balance.closing_balance(opening, debit, credit),
        })
    }

    async fn previous_closing(
        &self,
        account_id: AccountId,
        period: Period,
    ) -> Result<Decimal, GeneralLedgerError> {
        Ok(self
            .balances
            .find(account_id, period.previous())
            .await?
            .map_or(Decimal::ZERO, |r| r.closing_balance))
    }

    async fn account(&self, account_id: AccountId) -> Result<Account, GeneralLedgerError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| GeneralLedgerError::AccountNotFound(account_id.to_string()))
    }
}

fn check_range(from: Period, to: Period) -> Result<(), GeneralLedgerError> {
    if from > to {
        return Err(GeneralLedgerError::InvalidRange { from, to });
    }
    Ok(())
}

#[async_trait]
impl Subscriber for GeneralLedgerAccumulator {
    fn name(&self) -> &'static str {
        "general-ledger"
    }

    fn topics(&self) -> &'static [Topic] {
        &[Topic::JournalPosted]
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        if let DomainEvent::JournalPosted { journal_id, .. } = event {
            self.on_journal_posted(*journal_id).await?;
        }
        Ok(())
    }
}
