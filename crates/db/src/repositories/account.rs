//! Chart of accounts repository.

use async_trait::async_trait;
use blud_core::account::{Account, AccountType, NormalBalance};
use blud_core::store::{AccountStore, StoreResult};
use blud_shared::types::AccountId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{backend, parse_with, unique_or_backend};
use crate::entities::accounts;

/// Reads the chart of accounts; writes only on seeding.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_account(model: accounts::Model) -> StoreResult<Account> {
    Ok(Account {
        id: AccountId(model.id),
        account_type: parse_with("account_type", &model.account_type, AccountType::parse)?,
        normal_balance: parse_with("normal_balance", &model.normal_balance, NormalBalance::parse)?,
        level: u8::try_from(model.level).unwrap_or(u8::MAX),
        code: model.code,
        name: model.name,
        parent_code: model.parent_code,
        is_active: model.is_active,
        is_header: model.is_header,
    })
}

fn active_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.0),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        level: Set(i16::from(account.level)),
        parent_code: Set(account.parent_code.clone()),
        normal_balance: Set(account.normal_balance.as_str().to_string()),
        is_active: Set(account.is_active),
        is_header: Set(account.is_header),
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        accounts::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_account)
            .transpose()
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_account)
            .transpose()
    }

    async fn list(&self, active_only: bool) -> StoreResult<Vec<Account>> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::Code);
        if active_only {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        query
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_account)
            .collect()
    }

    async fn upsert(&self, mut account: Account) -> StoreResult<Account> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(account.code.as_str()))
            .one(&self.db)
            .await
            .map_err(backend)?;

        let saved = match existing {
            Some(model) => {
                account.id = AccountId(model.id);
                active_model(&account)
                    .update(&self.db)
                    .await
                    .map_err(backend)?
            }
            None => active_model(&account)
                .insert(&self.db)
                .await
                .map_err(unique_or_backend("Account", &account.code))?,
        };
        to_account(saved)
    }
}
