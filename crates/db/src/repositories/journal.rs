//! Journal repository.
//!
//! Numbers come from `journal_sequences`, bumped with an upsert inside the
//! inserting transaction. Status changes are conditional updates on the
//! expected status; reversals lock the original row.

use std::collections::HashMap;

use async_trait::async_trait;
use blud_core::fiscal::Period;
use blud_core::journal::{
    EntryType, JournalDraft, JournalEntry, JournalFilter, JournalLine, JournalNumber,
    JournalStatus, JournalTransition, PostedLine, ReversalStamp,
};
use blud_core::store::{JournalStore, StoreError, StoreResult};
use blud_shared::types::{AccountId, JournalId, JournalLineId, PageRequest};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, Statement, TransactionTrait, Value,
};
use tracing::debug;
use uuid::Uuid;

use super::{backend, parse_period, parse_with, to_tz, to_utc, unique_or_backend};
use crate::entities::{journal_entries, journal_lines};

const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO journal_sequences (year, month, last_value)
VALUES ($1, $2, 1)
ON CONFLICT (year, month)
DO UPDATE SET last_value = journal_sequences.last_value + 1
RETURNING last_value
";

/// Stores journal headers and lines.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn posted_lines(
        &self,
        headers: Condition,
        account_id: Option<AccountId>,
    ) -> StoreResult<Vec<PostedLine>> {
        let entries: HashMap<Uuid, JournalEntry> = journal_entries::Entity::find()
            .filter(journal_entries::Column::IsPosted.eq(true))
            .filter(headers)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|m| to_entry(m).map(|e| (e.id.0, e)))
            .collect::<StoreResult<_>>()?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalId.is_in(entries.keys().copied()));
        if let Some(account_id) = account_id {
            query = query.filter(journal_lines::Column::AccountId.eq(account_id.0));
        }

        let mut lines: Vec<PostedLine> = query
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .filter_map(|model| {
                let entry = entries.get(&model.journal_id)?;
                Some(PostedLine {
                    journal_id: entry.id,
                    journal_number: entry.journal_number.clone(),
                    entry_date: entry.entry_date,
                    period: entry.period,
                    journal_description: entry.description.clone(),
                    line: to_line(model),
                })
            })
            .collect();
        lines.sort_by(|a, b| {
            (a.entry_date, &a.journal_number, a.line.line_number).cmp(&(
                b.entry_date,
                &b.journal_number,
                b.line.line_number,
            ))
        });
        Ok(lines)
    }
}

fn to_entry(m: journal_entries::Model) -> StoreResult<JournalEntry> {
    Ok(JournalEntry {
        id: JournalId(m.id),
        period: parse_period(&m.period)?,
        entry_type: parse_with("entry_type", &m.entry_type, EntryType::parse)?,
        status: parse_with("status", &m.status, JournalStatus::parse)?,
        journal_number: m.journal_number,
        entry_date: m.entry_date,
        year: m.year,
        source_type: m.source_type,
        source_id: m.source_id,
        description: m.description,
        total_debit: m.total_debit,
        total_credit: m.total_credit,
        is_balanced: m.is_balanced,
        is_posted: m.is_posted,
        is_approved: m.is_approved,
        is_reversed: m.is_reversed,
        reversal_journal_id: m.reversal_journal_id.map(JournalId),
        reversal_of: m.reversal_of.map(JournalId),
        reversal_reason: m.reversal_reason,
        created_by: m.created_by,
        created_at: to_utc(m.created_at),
        updated_at: to_utc(m.updated_at),
        posted_by: m.posted_by,
        posted_at: m.posted_at.map(to_utc),
        approved_by: m.approved_by,
        approved_at: m.approved_at.map(to_utc),
        reversed_by: m.reversed_by,
        reversed_at: m.reversed_at.map(to_utc),
    })
}

fn header_model(e: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(e.id.0),
        journal_number: Set(e.journal_number.clone()),
        entry_date: Set(e.entry_date),
        period: Set(e.period.to_string()),
        year: Set(e.year),
        entry_type: Set(e.entry_type.as_str().to_string()),
        source_type: Set(e.source_type.clone()),
        source_id: Set(e.source_id.clone()),
        description: Set(e.description.clone()),
        total_debit: Set(e.total_debit),
        total_credit: Set(e.total_credit),
        is_balanced: Set(e.is_balanced),
        status: Set(e.status.as_str().to_string()),
        is_posted: Set(e.is_posted),
        is_approved: Set(e.is_approved),
        is_reversed: Set(e.is_reversed),
        reversal_journal_id: Set(e.reversal_journal_id.map(|id| id.0)),
        reversal_of: Set(e.reversal_of.map(|id| id.0)),
        reversal_reason: Set(e.reversal_reason.clone()),
        created_by: Set(e.created_by.clone()),
        created_at: Set(to_tz(e.created_at)),
        updated_at: Set(to_tz(e.updated_at)),
        posted_by: Set(e.posted_by.clone()),
        posted_at: Set(e.posted_at.map(to_tz)),
        approved_by: Set(e.approved_by.clone()),
        approved_at: Set(e.approved_at.map(to_tz)),
        reversed_by: Set(e.reversed_by.clone()),
        reversed_at: Set(e.reversed_at.map(to_tz)),
    }
}

fn to_line(m: journal_lines::Model) -> JournalLine {
    JournalLine {
        id: JournalLineId(m.id),
        journal_id: JournalId(m.journal_id),
        line_number: m.line_number,
        account_id: AccountId(m.account_id),
        account_code: m.account_code,
        account_name: m.account_name,
        cost_center: m.cost_center,
        description: m.description,
        debit: m.debit,
        credit: m.credit,
    }
}

fn line_model(l: &JournalLine) -> journal_lines::ActiveModel {
    journal_lines::ActiveModel {
        id: Set(l.id.0),
        journal_id: Set(l.journal_id.0),
        line_number: Set(l.line_number),
        account_id: Set(l.account_id.0),
        account_code: Set(l.account_code.clone()),
        account_name: Set(l.account_name.clone()),
        cost_center: Set(l.cost_center.clone()),
        description: Set(l.description.clone()),
        debit: Set(l.debit),
        credit: Set(l.credit),
    }
}

fn contains_ci(column: journal_entries::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

fn filter_condition(filter: &JournalFilter) -> Condition {
    use journal_entries::Column;

    let mut cond = Condition::all();
    if let Some(number) = &filter.journal_number {
        cond = cond.add(contains_ci(Column::JournalNumber, number));
    }
    if let Some(from) = filter.date_from {
        cond = cond.add(Column::EntryDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        cond = cond.add(Column::EntryDate.lte(to));
    }
    if let Some(period) = filter.period {
        cond = cond.add(Column::Period.eq(period.to_string()));
    }
    if let Some(year) = filter.year {
        cond = cond.add(Column::Year.eq(year));
    }
    if let Some(entry_type) = filter.entry_type {
        cond = cond.add(Column::EntryType.eq(entry_type.as_str()));
    }
    if let Some(source_type) = &filter.source_type {
        cond = cond.add(Column::SourceType.eq(source_type.as_str()));
    }
    if let Some(source_id) = &filter.source_id {
        cond = cond.add(Column::SourceId.eq(source_id.as_str()));
    }
    if let Some(status) = filter.status {
        cond = cond.add(Column::Status.eq(status.as_str()));
    }
    if let Some(created_by) = &filter.created_by {
        cond = cond.add(Column::CreatedBy.eq(created_by.as_str()));
    }
    if let Some(description) = &filter.description {
        cond = cond.add(contains_ci(Column::Description, description));
    }
    cond
}

async fn next_number(txn: &DatabaseTransaction, period: Period) -> StoreResult<String> {
    let statement = Statement::from_sql_and_values(
        DbBackend::Postgres,
        NEXT_SEQUENCE_SQL,
        [
            Value::from(period.year()),
            Value::from(period.month().cast_signed()),
        ],
    );
    let row = txn
        .query_one(statement)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::Backend("Journal sequence returned no row".into()))?;
    let sequence: i32 = row.try_get("", "last_value").map_err(backend)?;
    Ok(JournalNumber::format(period, sequence.cast_unsigned()))
}

async fn lock_entry(txn: &DatabaseTransaction, id: JournalId) -> StoreResult<JournalEntry> {
    journal_entries::Entity::find_by_id(id.0)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(backend)?
        .map(to_entry)
        .transpose()?
        .ok_or_else(|| StoreError::not_found("Journal", id))
}

async fn insert_lines(txn: &DatabaseTransaction, lines: &[JournalLine]) -> StoreResult<()> {
    if lines.is_empty() {
        return Ok(());
    }
    journal_lines::Entity::insert_many(lines.iter().map(line_model))
        .exec(txn)
        .await
        .map_err(backend)?;
    Ok(())
}

/// Numbers and inserts a draft; a reversal stamp marks it posted on the way in.
async fn store_draft(
    txn: &DatabaseTransaction,
    draft: JournalDraft,
    stamp: Option<&ReversalStamp>,
) -> StoreResult<JournalEntry> {
    let number = next_number(txn, draft.period).await?;
    let (mut entry, lines) = draft.into_entry(JournalId::new(), number, Utc::now());
    if let Some(stamp) = stamp {
        stamp.apply_to_mirror(&mut entry);
    }

    header_model(&entry)
        .insert(txn)
        .await
        .map_err(unique_or_backend("Journal", &entry.journal_number))?;
    insert_lines(txn, &lines).await?;

    debug!(
        journal_id = %entry.id,
        journal_number = %entry.journal_number,
        lines = lines.len(),
        "Journal stored"
    );
    Ok(entry)
}

#[async_trait]
impl JournalStore for JournalRepository {
    async fn insert(&self, draft: JournalDraft) -> StoreResult<JournalEntry> {
        let txn = self.db.begin().await.map_err(backend)?;
        let entry = store_draft(&txn, draft, None).await?;
        txn.commit().await.map_err(backend)?;
        Ok(entry)
    }

    async fn replace_draft(&self, id: JournalId, draft: JournalDraft) -> StoreResult<JournalEntry> {
        let txn = self.db.begin().await.map_err(backend)?;
        let current = lock_entry(&txn, id).await?;
        if current.status != JournalStatus::Draft {
            return Err(StoreError::concurrent("Journal", id));
        }

        let (mut entry, lines) = draft.into_entry(id, current.journal_number, Utc::now());
        entry.created_at = current.created_at;
        entry.created_by = current.created_by;

        header_model(&entry).update(&txn).await.map_err(backend)?;
        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(backend)?;
        insert_lines(&txn, &lines).await?;

        txn.commit().await.map_err(backend)?;
        Ok(entry)
    }

    async fn delete_draft(&self, id: JournalId) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(backend)?;
        let current = lock_entry(&txn, id).await?;
        if current.status != JournalStatus::Draft {
            return Err(StoreError::concurrent("Journal", id));
        }
        journal_entries::Entity::delete_by_id(id.0)
            .exec(&txn)
            .await
            .map_err(backend)?;
        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn transition(
        &self,
        id: JournalId,
        expected: JournalStatus,
        change: JournalTransition,
    ) -> StoreResult<JournalEntry> {
        let current = self
            .find(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Journal", id))?;
        if current.status != expected || !change.precondition_holds(&current) {
            return Err(StoreError::concurrent("Journal", id));
        }

        let mut updated = current;
        change.apply(&mut updated);

        let mut update = journal_entries::Entity::update_many()
            .set(header_model(&updated))
            .filter(journal_entries::Column::Id.eq(id.0))
            .filter(journal_entries::Column::Status.eq(expected.as_str()));
        if matches!(change, JournalTransition::Approve { .. }) {
            update = update.filter(journal_entries::Column::IsApproved.eq(false));
        }
        let result = update.exec(&self.db).await.map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::concurrent("Journal", id));
        }
        Ok(updated)
    }

    async fn insert_reversal(
        &self,
        original_id: JournalId,
        mirror: JournalDraft,
        stamp: ReversalStamp,
    ) -> StoreResult<(JournalEntry, JournalEntry)> {
        let txn = self.db.begin().await.map_err(backend)?;
        let mut original = lock_entry(&txn, original_id).await?;
        if original.status != JournalStatus::Posted || original.is_reversed {
            return Err(StoreError::concurrent("Journal", original_id));
        }

        let mirror = store_draft(&txn, mirror, Some(&stamp)).await?;
        stamp.apply_to_original(&mut original, mirror.id);
        header_model(&original).update(&txn).await.map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        Ok((original, mirror))
    }

    async fn find(&self, id: JournalId) -> StoreResult<Option<JournalEntry>> {
        journal_entries::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_entry)
            .transpose()
    }

    async fn find_lines(&self, id: JournalId) -> StoreResult<Vec<JournalLine>> {
        Ok(journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalId.eq(id.0))
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_line)
            .collect())
    }

    async fn list(
        &self,
        filter: &JournalFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<JournalEntry>, u64)> {
        let condition = filter_condition(filter);
        let total = journal_entries::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(backend)?;

        let entries = journal_entries::Entity::find()
            .filter(condition)
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::JournalNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_entry)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((entries, total))
    }

    async fn find_active_by_source(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> StoreResult<Option<JournalEntry>> {
        use journal_entries::Column;

        journal_entries::Entity::find()
            .filter(Column::SourceType.eq(source_type))
            .filter(Column::SourceId.eq(source_id))
            .filter(Column::IsReversed.eq(false))
            .filter(Column::Status.ne(JournalStatus::Cancelled.as_str()))
            .filter(Column::EntryType.ne(EntryType::Reversal.as_str()))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::JournalNumber)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_entry)
            .transpose()
    }

    async fn posted_lines_until(
        &self,
        period: Period,
        as_of: NaiveDate,
        account_id: Option<AccountId>,
    ) -> StoreResult<Vec<PostedLine>> {
        let headers = Condition::all()
            .add(journal_entries::Column::Period.eq(period.to_string()))
            .add(journal_entries::Column::EntryDate.lte(as_of));
        self.posted_lines(headers, account_id).await
    }

    async fn posted_lines_in_period(&self, period: Period) -> StoreResult<Vec<PostedLine>> {
        let headers =
            Condition::all().add(journal_entries::Column::Period.eq(period.to_string()));
        self.posted_lines(headers, None).await
    }
}
