//! Storage capabilities.
//!
//! Every component talks to persistence through these traits. Two
//! implementations exist: [`memory::MemoryStore`] in this crate and the
//! PostgreSQL stores in `blud-db`. Multi-step operations (`insert`,
//! `transition`, `insert_reversal`, `apply_movement`, `apply_journal`,
//! `replace_period`) must
//! be atomic in every implementation.

pub mod error;
pub mod memory;

use async_trait::async_trait;
use blud_shared::types::{AccountId, JournalId, MappingRuleId, PageRequest};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::account::Account;
use crate::fiscal::Period;
use crate::general_ledger::{BalanceMovement, LedgerBalance};
use crate::journal::{
    JournalDraft, JournalEntry, JournalFilter, JournalLine, JournalStatus, JournalTransition,
    PostedLine, ReversalStamp,
};
use crate::mapping::MappingRule;
use crate::trial_balance::TrialBalanceRow;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the chart of accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by id.
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Looks up an account by code.
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Account>>;

    /// Lists accounts ordered by code.
    async fn list(&self, active_only: bool) -> StoreResult<Vec<Account>>;

    /// Inserts or replaces an account by code. Used by seeding only.
    async fn upsert(&self, account: Account) -> StoreResult<Account>;
}

/// Persistence of mapping rules.
#[async_trait]
pub trait MappingRuleStore: Send + Sync {
    /// Inserts a rule; fails with `Duplicate` if the source type is taken.
    async fn insert(&self, rule: MappingRule) -> StoreResult<MappingRule>;

    /// Replaces a rule; fails with `Duplicate` if the new source type is taken
    /// by another rule.
    async fn update(&self, rule: MappingRule) -> StoreResult<MappingRule>;

    /// Deletes a rule.
    async fn delete(&self, id: MappingRuleId) -> StoreResult<()>;

    /// Looks up a rule by id.
    async fn find_by_id(&self, id: MappingRuleId) -> StoreResult<Option<MappingRule>>;

    /// Looks up a rule by source type regardless of activation.
    async fn find_by_source_type(&self, source_type: &str) -> StoreResult<Option<MappingRule>>;

    /// Highest-priority active rule for a source type.
    async fn find_active_by_source_type(
        &self,
        source_type: &str,
    ) -> StoreResult<Option<MappingRule>>;

    /// Lists rules ordered by source type, optionally filtered by activation.
    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<MappingRule>>;
}

/// Persistence of journals.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Allocates the next number for the draft's period and stores header and
    /// lines as one unit, in `DRAFT` status.
    async fn insert(&self, draft: JournalDraft) -> StoreResult<JournalEntry>;

    /// Replaces header fields and lines of a journal still in `DRAFT`.
    ///
    /// The journal number is kept even when the period changes.
    async fn replace_draft(&self, id: JournalId, draft: JournalDraft) -> StoreResult<JournalEntry>;

    /// Deletes a journal still in `DRAFT` together with its lines.
    async fn delete_draft(&self, id: JournalId) -> StoreResult<()>;

    /// Applies `change` only if the journal's status is still `expected`.
    ///
    /// Fails with `ConcurrentModification` when another writer got there first.
    async fn transition(
        &self,
        id: JournalId,
        expected: JournalStatus,
        change: JournalTransition,
    ) -> StoreResult<JournalEntry>;

    /// Inserts the posted mirror entry and cancels the original as one unit.
    ///
    /// The original must still be `POSTED` and not reversed. Returns the
    /// updated original and the mirror.
    async fn insert_reversal(
        &self,
        original_id: JournalId,
        mirror: JournalDraft,
        stamp: ReversalStamp,
    ) -> StoreResult<(JournalEntry, JournalEntry)>;

    /// Looks up a journal header.
    async fn find(&self, id: JournalId) -> StoreResult<Option<JournalEntry>>;

    /// Lines of a journal ordered by line number.
    async fn find_lines(&self, id: JournalId) -> StoreResult<Vec<JournalLine>>;

    /// Filtered page ordered by entry date then journal number, newest first,
    /// with the total match count.
    async fn list(
        &self,
        filter: &JournalFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<JournalEntry>, u64)>;

    /// Most recent journal for a source that is neither reversed, cancelled
    /// nor itself a reversal.
    async fn find_active_by_source(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Lines of posted journals belonging to `period` and dated on or before
    /// `as_of`, optionally for one account, ordered by entry date, journal
    /// number, line number.
    async fn posted_lines_until(
        &self,
        period: Period,
        as_of: NaiveDate,
        account_id: Option<AccountId>,
    ) -> StoreResult<Vec<PostedLine>>;

    /// Lines of posted journals belonging to `period`.
    async fn posted_lines_in_period(&self, period: Period) -> StoreResult<Vec<PostedLine>>;
}

/// Persistence of general ledger balance rows.
#[async_trait]
pub trait LedgerBalanceStore: Send + Sync {
    /// Adds a movement to the (account, period) row under a row lock, creating
    /// it with the previous period's closing balance as opening if needed.
    async fn apply_movement(&self, movement: BalanceMovement) -> StoreResult<LedgerBalance>;

    /// Applies every movement of a posted journal in one unit and records the
    /// journal as applied to `period`. Returns `None`, changing nothing, when
    /// the journal is already recorded.
    async fn apply_journal(
        &self,
        journal_id: JournalId,
        period: Period,
        movements: Vec<BalanceMovement>,
    ) -> StoreResult<Option<Vec<LedgerBalance>>>;

    /// Looks up one row.
    async fn find(&self, account_id: AccountId, period: Period)
    -> StoreResult<Option<LedgerBalance>>;

    /// Rows of a period ordered by account code.
    async fn list_period(&self, period: Period) -> StoreResult<Vec<LedgerBalance>>;

    /// Rows of an account in `from..=to` ordered by period.
    async fn list_account(
        &self,
        account_id: AccountId,
        from: Period,
        to: Period,
    ) -> StoreResult<Vec<LedgerBalance>>;

    /// Rows of all accounts in `from..=to` ordered by account code then period.
    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<LedgerBalance>>;

    /// Atomically deletes every row of `period` and inserts `rows`, replacing
    /// the period's applied journals with `journals`.
    async fn replace_period(
        &self,
        period: Period,
        rows: Vec<LedgerBalance>,
        journals: Vec<JournalId>,
    ) -> StoreResult<()>;

    /// Inserts rows whose (account, period) does not exist yet. Returns how
    /// many were inserted.
    async fn insert_missing(&self, rows: Vec<LedgerBalance>) -> StoreResult<usize>;
}

/// Persistence of trial balance rows.
#[async_trait]
pub trait TrialBalanceStore: Send + Sync {
    /// Atomically deletes every row of `period` and inserts `rows`.
    async fn replace_period(&self, period: Period, rows: Vec<TrialBalanceRow>) -> StoreResult<()>;

    /// Rows of a period ordered by account code.
    async fn list_period(&self, period: Period) -> StoreResult<Vec<TrialBalanceRow>>;

    /// Rows in `from..=to` ordered by account code then period.
    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<TrialBalanceRow>>;

    /// Adds an adjustment to an existing row.
    async fn apply_adjustment(
        &self,
        period: Period,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
    ) -> StoreResult<TrialBalanceRow>;
}
