//! General ledger balance repository.

use async_trait::async_trait;
use blud_core::account::{AccountType, NormalBalance};
use blud_core::fiscal::Period;
use blud_core::general_ledger::{BalanceMovement, LedgerBalance};
use blud_core::store::{LedgerBalanceStore, StoreError, StoreResult};
use blud_shared::types::{AccountId, JournalId, LedgerBalanceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait, Value,
};

use super::{backend, parse_period, parse_with, to_tz, to_utc};
use crate::entities::{ledger_balances, ledger_postings};

const INSERT_IF_MISSING_SQL: &str = r"
INSERT INTO ledger_balances (
    id, account_id, account_code, account_name, account_type, normal_balance,
    period, year, opening_balance, period_debit, period_credit, net_movement,
    closing_balance, updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
ON CONFLICT (account_id, period) DO NOTHING
";

const RECORD_POSTING_SQL: &str = r"
INSERT INTO ledger_postings (journal_id, period, applied_at)
VALUES ($1, $2, NOW())
ON CONFLICT (journal_id) DO NOTHING
";

/// Stores one balance row per (account, period).
#[derive(Debug, Clone)]
pub struct LedgerBalanceRepository {
    db: DatabaseConnection,
}

impl LedgerBalanceRepository {
    /// Creates a new ledger balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_balance(m: ledger_balances::Model) -> StoreResult<LedgerBalance> {
    Ok(LedgerBalance {
        id: LedgerBalanceId(m.id),
        account_id: AccountId(m.account_id),
        account_type: parse_with("account_type", &m.account_type, AccountType::parse)?,
        normal_balance: parse_with("normal_balance", &m.normal_balance, NormalBalance::parse)?,
        period: parse_period(&m.period)?,
        account_code: m.account_code,
        account_name: m.account_name,
        year: m.year,
        opening_balance: m.opening_balance,
        period_debit: m.period_debit,
        period_credit: m.period_credit,
        net_movement: m.net_movement,
        closing_balance: m.closing_balance,
        updated_at: to_utc(m.updated_at),
    })
}

fn balance_model(b: &LedgerBalance) -> ledger_balances::ActiveModel {
    ledger_balances::ActiveModel {
        id: Set(b.id.0),
        account_id: Set(b.account_id.0),
        account_code: Set(b.account_code.clone()),
        account_name: Set(b.account_name.clone()),
        account_type: Set(b.account_type.as_str().to_string()),
        normal_balance: Set(b.normal_balance.as_str().to_string()),
        period: Set(b.period.to_string()),
        year: Set(b.year),
        opening_balance: Set(b.opening_balance),
        period_debit: Set(b.period_debit),
        period_credit: Set(b.period_credit),
        net_movement: Set(b.net_movement),
        closing_balance: Set(b.closing_balance),
        updated_at: Set(to_tz(b.updated_at)),
    }
}

async fn insert_if_missing(txn: &DatabaseTransaction, b: &LedgerBalance) -> StoreResult<u64> {
    let values = [
        Value::from(b.id.0),
        Value::from(b.account_id.0),
        Value::from(b.account_code.clone()),
        Value::from(b.account_name.clone()),
        Value::from(b.account_type.as_str()),
        Value::from(b.normal_balance.as_str()),
        Value::from(b.period.to_string()),
        Value::from(b.year),
        Value::from(b.opening_balance),
        Value::from(b.period_debit),
        Value::from(b.period_credit),
        Value::from(b.net_movement),
        Value::from(b.closing_balance),
        Value::from(to_tz(b.updated_at)),
    ];
    let result = txn
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            INSERT_IF_MISSING_SQL,
            values,
        ))
        .await
        .map_err(backend)?;
    Ok(result.rows_affected())
}

/// Adds a movement under a row lock inside `txn`, opening the row first.
async fn apply_in(
    txn: &DatabaseTransaction,
    movement: &BalanceMovement,
) -> StoreResult<LedgerBalance> {
    use ledger_balances::Column;

    let account_id = movement.account.id;
    let opening = ledger_balances::Entity::find()
        .filter(Column::AccountId.eq(account_id.0))
        .filter(Column::Period.eq(movement.period.previous().to_string()))
        .one(txn)
        .await
        .map_err(backend)?
        .map_or(Decimal::ZERO, |prev| prev.closing_balance);
    insert_if_missing(
        txn,
        &LedgerBalance::open(&movement.account, movement.period, opening),
    )
    .await?;

    let locked = ledger_balances::Entity::find()
        .filter(Column::AccountId.eq(account_id.0))
        .filter(Column::Period.eq(movement.period.to_string()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("LedgerBalance", &movement.account.code))?;

    let mut row = to_balance(locked)?;
    row.apply(movement.debit, movement.credit);
    balance_model(&row).update(txn).await.map_err(backend)?;
    Ok(row)
}

#[async_trait]
impl LedgerBalanceStore for LedgerBalanceRepository {
    async fn apply_movement(&self, movement: BalanceMovement) -> StoreResult<LedgerBalance> {
        let txn = self.db.begin().await.map_err(backend)?;
        let row = apply_in(&txn, &movement).await?;
        txn.commit().await.map_err(backend)?;
        Ok(row)
    }

    async fn apply_journal(
        &self,
        journal_id: JournalId,
        period: Period,
        movements: Vec<BalanceMovement>,
    ) -> StoreResult<Option<Vec<LedgerBalance>>> {
        let txn = self.db.begin().await.map_err(backend)?;
        let recorded = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                RECORD_POSTING_SQL,
                [Value::from(journal_id.0), Value::from(period.to_string())],
            ))
            .await
            .map_err(backend)?;
        if recorded.rows_affected() == 0 {
            txn.rollback().await.map_err(backend)?;
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(movements.len());
        for movement in &movements {
            rows.push(apply_in(&txn, movement).await?);
        }
        txn.commit().await.map_err(backend)?;
        Ok(Some(rows))
    }

    async fn find(
        &self,
        account_id: AccountId,
        period: Period,
    ) -> StoreResult<Option<LedgerBalance>> {
        ledger_balances::Entity::find()
            .filter(ledger_balances::Column::AccountId.eq(account_id.0))
            .filter(ledger_balances::Column::Period.eq(period.to_string()))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_balance)
            .transpose()
    }

    async fn list_period(&self, period: Period) -> StoreResult<Vec<LedgerBalance>> {
        ledger_balances::Entity::find()
            .filter(ledger_balances::Column::Period.eq(period.to_string()))
            .order_by_asc(ledger_balances::Column::AccountCode)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_balance)
            .collect()
    }

    async fn list_account(
        &self,
        account_id: AccountId,
        from: Period,
        to: Period,
    ) -> StoreResult<Vec<LedgerBalance>> {
        ledger_balances::Entity::find()
            .filter(ledger_balances::Column::AccountId.eq(account_id.0))
            .filter(ledger_balances::Column::Period.between(from.to_string(), to.to_string()))
            .order_by_asc(ledger_balances::Column::Period)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_balance)
            .collect()
    }

    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<LedgerBalance>> {
        ledger_balances::Entity::find()
            .filter(ledger_balances::Column::Period.between(from.to_string(), to.to_string()))
            .order_by_asc(ledger_balances::Column::AccountCode)
            .order_by_asc(ledger_balances::Column::Period)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_balance)
            .collect()
    }

    async fn replace_period(
        &self,
        period: Period,
        rows: Vec<LedgerBalance>,
        journals: Vec<JournalId>,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(backend)?;
        ledger_balances::Entity::delete_many()
            .filter(ledger_balances::Column::Period.eq(period.to_string()))
            .exec(&txn)
            .await
            .map_err(backend)?;
        ledger_postings::Entity::delete_many()
            .filter(ledger_postings::Column::Period.eq(period.to_string()))
            .exec(&txn)
            .await
            .map_err(backend)?;
        if !rows.is_empty() {
            ledger_balances::Entity::insert_many(rows.iter().map(balance_model))
                .exec(&txn)
                .await
                .map_err(backend)?;
        }
        for journal_id in journals {
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                RECORD_POSTING_SQL,
                [Value::from(journal_id.0), Value::from(period.to_string())],
            ))
            .await
            .map_err(backend)?;
        }
        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn insert_missing(&self, rows: Vec<LedgerBalance>) -> StoreResult<usize> {
        let txn = self.db.begin().await.map_err(backend)?;
        let mut inserted = 0;
        for row in &rows {
            inserted += insert_if_missing(&txn, row).await?;
        }
        txn.commit().await.map_err(backend)?;
        Ok(usize::try_from(inserted).unwrap_or(usize::MAX))
    }
}
