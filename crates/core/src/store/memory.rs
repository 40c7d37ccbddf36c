//! Process-local implementation of every storage trait.
//!
//! Each table family sits behind one tokio lock, held for the whole of a
//! multi-step operation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use blud_shared::types::{AccountId, JournalId, MappingRuleId, PageRequest};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

use super::{
    AccountStore, JournalStore, LedgerBalanceStore, MappingRuleStore, StoreError, StoreResult,
    TrialBalanceStore,
};
use crate::account::Account;
use crate::fiscal::Period;
use crate::general_ledger::{BalanceMovement, LedgerBalance};
use crate::journal::{
    EntryType, JournalDraft, JournalEntry, JournalFilter, JournalLine, JournalNumber,
    JournalStatus, JournalTransition, PostedLine, ReversalStamp,
};
use crate::mapping::MappingRule;
use crate::trial_balance::TrialBalanceRow;

#[derive(Default)]
struct JournalTables {
    entries: HashMap<JournalId, JournalEntry>,
    lines: HashMap<JournalId, Vec<JournalLine>>,
    sequences: HashMap<Period, u32>,
}

impl JournalTables {
    fn allocate_number(&mut self, period: Period) -> StoreResult<String> {
        let sequence = self.sequences.entry(period).or_insert(0);
        *sequence += 1;
        let number = JournalNumber::format(period, *sequence);
        if self.entries.values().any(|e| e.journal_number == number) {
            return Err(StoreError::duplicate("Journal", number));
        }
        Ok(number)
    }

    fn store(&mut self, draft: JournalDraft) -> StoreResult<JournalEntry> {
        let number = self.allocate_number(draft.period)?;
        let (entry, lines) = draft.into_entry(JournalId::new(), number, Utc::now());
        self.lines.insert(entry.id, lines);
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn posted_lines(&self, include: impl Fn(&JournalEntry) -> bool) -> Vec<PostedLine> {
        let mut result: Vec<PostedLine> = self
            .entries
            .values()
            .filter(|e| e.is_posted && include(e))
            .flat_map(|entry| {
                self.lines
                    .get(&entry.id)
                    .into_iter()
                    .flatten()
                    .map(move |line| PostedLine {
                        journal_id: entry.id,
                        journal_number: entry.journal_number.clone(),
                        entry_date: entry.entry_date,
                        period: entry.period,
                        journal_description: entry.description.clone(),
                        line: line.clone(),
                    })
            })
            .collect();
        result.sort_by(|a, b| {
            (a.entry_date, &a.journal_number, a.line.line_number).cmp(&(
                b.entry_date,
                &b.journal_number,
                b.line.line_number,
            ))
        });
        result
    }
}

#[derive(Default)]
struct LedgerTables {
    rows: BTreeMap<(AccountId, Period), LedgerBalance>,
    applied: HashMap<JournalId, Period>,
}

impl LedgerTables {
    fn apply(&mut self, movement: &BalanceMovement) -> LedgerBalance {
        let opening = self
            .rows
            .get(&(movement.account.id, movement.period.previous()))
            .map_or(Decimal::ZERO, |prev| prev.closing_balance);
        let row = self
            .rows
            .entry((movement.account.id, movement.period))
            .or_insert_with(|| LedgerBalance::open(&movement.account, movement.period, opening));
        row.apply(movement.debit, movement.credit);
        row.clone()
    }
}

/// In-memory store for tests and the `memory` storage backend.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    rules: RwLock<BTreeMap<MappingRuleId, MappingRule>>,
    journals: Mutex<JournalTables>,
    balances: Mutex<LedgerTables>,
    trial_balances: Mutex<BTreeMap<(Period, AccountId), TrialBalanceRow>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_balances(rows: &mut [LedgerBalance]) {
    rows.sort_by(|a, b| (&a.account_code, a.period).cmp(&(&b.account_code, b.period)));
}

fn sort_trial_rows(rows: &mut [TrialBalanceRow]) {
    rows.sort_by(|a, b| (&a.account_code, a.period).cmp(&(&b.account_code, b.period)));
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list(&self, active_only: bool) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| !active_only || a.is_active)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn upsert(&self, mut account: Account) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().await;
        if let Some(existing) = accounts.values().find(|a| a.code == account.code) {
            account.id = existing.id;
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }
}

#[async_trait]
impl MappingRuleStore for MemoryStore {
    async fn insert(&self, rule: MappingRule) -> StoreResult<MappingRule> {
        let mut rules = self.rules.write().await;
        if rules.values().any(|r| r.source_type == rule.source_type) {
            return Err(StoreError::duplicate("MappingRule", &rule.source_type));
        }
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn update(&self, rule: MappingRule) -> StoreResult<MappingRule> {
        let mut rules = self.rules.write().await;
        if !rules.contains_key(&rule.id) {
            return Err(StoreError::not_found("MappingRule", rule.id));
        }
        if rules
            .values()
            .any(|r| r.id != rule.id && r.source_type == rule.source_type)
        {
            return Err(StoreError::duplicate("MappingRule", &rule.source_type));
        }
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete(&self, id: MappingRuleId) -> StoreResult<()> {
        self.rules
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("MappingRule", id))
    }

    async fn find_by_id(&self, id: MappingRuleId) -> StoreResult<Option<MappingRule>> {
        Ok(self.rules.read().await.get(&id).cloned())
    }

    async fn find_by_source_type(&self, source_type: &str) -> StoreResult<Option<MappingRule>> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .find(|r| r.source_type == source_type)
            .cloned())
    }

    async fn find_active_by_source_type(
        &self,
        source_type: &str,
    ) -> StoreResult<Option<MappingRule>> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.is_active && r.source_type == source_type)
            .max_by_key(|r| r.priority)
            .cloned())
    }

    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<MappingRule>> {
        let mut rules: Vec<MappingRule> = self
            .rules
            .read()
            .await
            .values()
            .filter(|r| active.is_none_or(|a| r.is_active == a))
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.source_type.cmp(&b.source_type));
        Ok(rules)
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert(&self, draft: JournalDraft) -> StoreResult<JournalEntry> {
        self.journals.lock().await.store(draft)
    }

    async fn replace_draft(&self, id: JournalId, draft: JournalDraft) -> StoreResult<JournalEntry> {
        let mut tables = self.journals.lock().await;
        let current = tables
            .entries
            .get(&id)
            .ok_or_else(|| StoreError::not_found("Journal", id))?;
        if current.status != JournalStatus::Draft {
            return Err(StoreError::concurrent("Journal", id));
        }

        let (mut entry, lines) =
            draft.into_entry(id, current.journal_number.clone(), Utc::now());
        entry.created_at = current.created_at;
        entry.created_by.clone_from(&current.created_by);

        tables.lines.insert(id, lines);
        tables.entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn delete_draft(&self, id: JournalId) -> StoreResult<()> {
        let mut tables = self.journals.lock().await;
        match tables.entries.get(&id) {
            None => return Err(StoreError::not_found("Journal", id)),
            Some(e) if e.status != JournalStatus::Draft => {
                return Err(StoreError::concurrent("Journal", id));
            }
            Some(_) => {}
        }
        tables.entries.remove(&id);
        tables.lines.remove(&id);
        Ok(())
    }

    async fn transition(
        &self,
        id: JournalId,
        expected: JournalStatus,
        change: JournalTransition,
    ) -> StoreResult<JournalEntry> {
        let mut tables = self.journals.lock().await;
        let entry = tables
            .entries
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Journal", id))?;
        if entry.status != expected || !change.precondition_holds(entry) {
            return Err(StoreError::concurrent("Journal", id));
        }
        change.apply(entry);
        Ok(entry.clone())
    }

    async fn insert_reversal(
        &self,
        original_id: JournalId,
        mirror: JournalDraft,
        stamp: ReversalStamp,
    ) -> StoreResult<(JournalEntry, JournalEntry)> {
        let mut tables = self.journals.lock().await;
        let original = tables
            .entries
            .get(&original_id)
            .ok_or_else(|| StoreError::not_found("Journal", original_id))?;
        if original.status != JournalStatus::Posted || original.is_reversed {
            return Err(StoreError::concurrent("Journal", original_id));
        }

        let mut mirror = tables.store(mirror)?;
        stamp.apply_to_mirror(&mut mirror);
        tables.entries.insert(mirror.id, mirror.clone());

        let original = tables
            .entries
            .get_mut(&original_id)
            .ok_or_else(|| StoreError::not_found("Journal", original_id))?;
        stamp.apply_to_original(original, mirror.id);
        Ok((original.clone(), mirror))
    }

    async fn find(&self, id: JournalId) -> StoreResult<Option<JournalEntry>> {
        Ok(self.journals.lock().await.entries.get(&id).cloned())
    }

    async fn find_lines(&self, id: JournalId) -> StoreResult<Vec<JournalLine>> {
        let mut lines = self
            .journals
            .lock()
            .await
            .lines
            .get(&id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|l| l.line_number);
        Ok(lines)
    }

    async fn list(
        &self,
        filter: &JournalFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<JournalEntry>, u64)> {
        let tables = self.journals.lock().await;
        let mut matched: Vec<&JournalEntry> =
            tables.entries.values().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| {
            (b.entry_date, &b.journal_number).cmp(&(a.entry_date, &a.journal_number))
        });
        let total = matched.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn find_active_by_source(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> StoreResult<Option<JournalEntry>> {
        Ok(self
            .journals
            .lock()
            .await
            .entries
            .values()
            .filter(|e| {
                e.source_type.as_deref() == Some(source_type)
                    && e.source_id.as_deref() == Some(source_id)
                    && !e.is_reversed
                    && e.status != JournalStatus::Cancelled
                    && e.entry_type != EntryType::Reversal
            })
            .max_by(|a, b| (a.created_at, &a.journal_number).cmp(&(b.created_at, &b.journal_number)))
            .cloned())
    }

    async fn posted_lines_until(
        &self,
        period: Period,
        as_of: NaiveDate,
        account_id: Option<AccountId>,
    ) -> StoreResult<Vec<PostedLine>> {
        let tables = self.journals.lock().await;
        let mut lines = tables.posted_lines(|e| e.period == period && e.entry_date <= as_of);
        if let Some(account_id) = account_id {
            lines.retain(|l| l.line.account_id == account_id);
        }
        Ok(lines)
    }

    async fn posted_lines_in_period(&self, period: Period) -> StoreResult<Vec<PostedLine>> {
        Ok(self.journals.lock().await.posted_lines(|e| e.period == period))
    }
}

#[async_trait]
impl LedgerBalanceStore for MemoryStore {
    async fn apply_movement(&self, movement: BalanceMovement) -> StoreResult<LedgerBalance> {
        Ok(self.balances.lock().await.apply(&movement))
    }

    async fn apply_journal(
        &self,
        journal_id: JournalId,
        period: Period,
        movements: Vec<BalanceMovement>,
    ) -> StoreResult<Option<Vec<LedgerBalance>>> {
        let mut tables = self.balances.lock().await;
        if tables.applied.contains_key(&journal_id) {
            return Ok(None);
        }
        let rows: Vec<LedgerBalance> = movements.iter().map(|m| tables.apply(m)).collect();
        tables.applied.insert(journal_id, period);
        Ok(Some(rows))
    }

    async fn find(
        &self,
        account_id: AccountId,
        period: Period,
    ) -> StoreResult<Option<LedgerBalance>> {
        Ok(self.balances.lock().await.rows.get(&(account_id, period)).cloned())
    }

    async fn list_period(&self, period: Period) -> StoreResult<Vec<LedgerBalance>> {
        let mut rows: Vec<LedgerBalance> = self
            .balances
            .lock()
            .await
            .rows
            .values()
            .filter(|b| b.period == period)
            .cloned()
            .collect();
        sort_balances(&mut rows);
        Ok(rows)
    }

    async fn list_account(
        &self,
        account_id: AccountId,
        from: Period,
        to: Period,
    ) -> StoreResult<Vec<LedgerBalance>> {
        let mut rows: Vec<LedgerBalance> = self
            .balances
            .lock()
            .await
            .rows
            .values()
            .filter(|b| b.account_id == account_id && b.period >= from && b.period <= to)
            .cloned()
            .collect();
        sort_balances(&mut rows);
        Ok(rows)
    }

    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<LedgerBalance>> {
        let mut rows: Vec<LedgerBalance> = self
            .balances
            .lock()
            .await
            .rows
            .values()
            .filter(|b| b.period >= from && b.period <= to)
            .cloned()
            .collect();
        sort_balances(&mut rows);
        Ok(rows)
    }

    async fn replace_period(
        &self,
        period: Period,
        rows: Vec<LedgerBalance>,
        journals: Vec<JournalId>,
    ) -> StoreResult<()> {
        let mut tables = self.balances.lock().await;
        tables.rows.retain(|(_, p), _| *p != period);
        for row in rows {
            tables.rows.insert((row.account_id, row.period), row);
        }
        tables.applied.retain(|_, p| *p != period);
        tables
            .applied
            .extend(journals.into_iter().map(|id| (id, period)));
        Ok(())
    }

    async fn insert_missing(&self, rows: Vec<LedgerBalance>) -> StoreResult<usize> {
        let mut tables = self.balances.lock().await;
        let mut inserted = 0;
        for row in rows {
            let key = (row.account_id, row.period);
            if !tables.rows.contains_key(&key) {
                tables.rows.insert(key, row);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl TrialBalanceStore for MemoryStore {
    async fn replace_period(&self, period: Period, rows: Vec<TrialBalanceRow>) -> StoreResult<()> {
        let mut table = self.trial_balances.lock().await;
        table.retain(|(p, _), _| *p != period);
        for row in rows {
            table.insert((row.period, row.account_id), row);
        }
        Ok(())
    }

    async fn list_period(&self, period: Period) -> StoreResult<Vec<TrialBalanceRow>> {
        let mut rows: Vec<TrialBalanceRow> = self
            .trial_balances
            .lock()
            .await
            .values()
            .filter(|r| r.period == period)
            .cloned()
            .collect();
        sort_trial_rows(&mut rows);
        Ok(rows)
    }

    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<TrialBalanceRow>> {
        let mut rows: Vec<TrialBalanceRow> = self
            .trial_balances
            .lock()
            .await
            .values()
            .filter(|r| r.period >= from && r.period <= to)
            .cloned()
            .collect();
        sort_trial_rows(&mut rows);
        Ok(rows)
    }

    async fn apply_adjustment(
        &self,
        period: Period,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
    ) -> StoreResult<TrialBalanceRow> {
        let mut table = self.trial_balances.lock().await;
        let row = table
            .get_mut(&(period, account_id))
            .ok_or_else(|| StoreError::not_found("TrialBalanceRow", format!("{period}/{account_id}")))?;
        row.adjust(debit, credit);
        Ok(row.clone())
    }
}
