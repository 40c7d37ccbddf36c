//! Trial balance repository.

use async_trait::async_trait;
use blud_core::account::{AccountType, NormalBalance};
use blud_core::fiscal::Period;
use blud_core::store::{StoreError, StoreResult, TrialBalanceStore};
use blud_core::trial_balance::TrialBalanceRow;
use blud_shared::types::{AccountId, TrialBalanceRowId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use super::{backend, parse_period, parse_with, to_tz, to_utc};
use crate::entities::trial_balances;

/// Stores materialized trial balance rows.
#[derive(Debug, Clone)]
pub struct TrialBalanceRepository {
    db: DatabaseConnection,
}

impl TrialBalanceRepository {
    /// Creates a new trial balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_row(m: trial_balances::Model) -> StoreResult<TrialBalanceRow> {
    Ok(TrialBalanceRow {
        id: TrialBalanceRowId(m.id),
        period: parse_period(&m.period)?,
        account_type: parse_with("account_type", &m.account_type, AccountType::parse)?,
        normal_balance: parse_with("normal_balance", &m.normal_balance, NormalBalance::parse)?,
        year: m.year,
        account_id: AccountId(m.account_id),
        account_code: m.account_code,
        account_name: m.account_name,
        debit: m.debit,
        credit: m.credit,
        debit_adjustment: m.debit_adjustment,
        credit_adjustment: m.credit_adjustment,
        debit_adjusted: m.debit_adjusted,
        credit_adjusted: m.credit_adjusted,
        generated_at: to_utc(m.generated_at),
    })
}

fn row_model(r: &TrialBalanceRow) -> trial_balances::ActiveModel {
    trial_balances::ActiveModel {
        id: Set(r.id.0),
        period: Set(r.period.to_string()),
        year: Set(r.year),
        account_id: Set(r.account_id.0),
        account_code: Set(r.account_code.clone()),
        account_name: Set(r.account_name.clone()),
        account_type: Set(r.account_type.as_str().to_string()),
        normal_balance: Set(r.normal_balance.as_str().to_string()),
        debit: Set(r.debit),
        credit: Set(r.credit),
        debit_adjustment: Set(r.debit_adjustment),
        credit_adjustment: Set(r.credit_adjustment),
        debit_adjusted: Set(r.debit_adjusted),
        credit_adjusted: Set(r.credit_adjusted),
        generated_at: Set(to_tz(r.generated_at)),
    }
}

#[async_trait]
impl TrialBalanceStore for TrialBalanceRepository {
    async fn replace_period(&self, period: Period, rows: Vec<TrialBalanceRow>) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(backend)?;
        trial_balances::Entity::delete_many()
            .filter(trial_balances::Column::Period.eq(period.to_string()))
            .exec(&txn)
            .await
            .map_err(backend)?;
        if !rows.is_empty() {
            trial_balances::Entity::insert_many(rows.iter().map(row_model))
                .exec(&txn)
                .await
                .map_err(backend)?;
        }
        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn list_period(&self, period: Period) -> StoreResult<Vec<TrialBalanceRow>> {
        trial_balances::Entity::find()
            .filter(trial_balances::Column::Period.eq(period.to_string()))
            .order_by_asc(trial_balances::Column::AccountCode)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_row)
            .collect()
    }

    async fn list_range(&self, from: Period, to: Period) -> StoreResult<Vec<TrialBalanceRow>> {
        trial_balances::Entity::find()
            .filter(trial_balances::Column::Period.between(from.to_string(), to.to_string()))
            .order_by_asc(trial_balances::Column::AccountCode)
            .order_by_asc(trial_balances::Column::Period)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_row)
            .collect()
    }

    async fn apply_adjustment(
        &self,
        period: Period,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
    ) -> StoreResult<TrialBalanceRow> {
        let txn = self.db.begin().await.map_err(backend)?;
        let locked = trial_balances::Entity::find()
            .filter(trial_balances::Column::Period.eq(period.to_string()))
            .filter(trial_balances::Column::AccountId.eq(account_id.0))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(backend)?
            .ok_or_else(|| {
                StoreError::not_found("TrialBalanceRow", format!("{period}/{account_id}"))
            })?;

        let mut row = to_row(locked)?;
        row.adjust(debit, credit);
        row_model(&row).update(&txn).await.map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        Ok(row)
    }
}
