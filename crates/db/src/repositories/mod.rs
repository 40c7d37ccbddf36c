//! PostgreSQL implementations of the `blud-core` storage traits.
//!
//! One repository per table family, each owning a pooled connection handle.
//! Multi-step operations run inside a database transaction.

mod account;
mod journal;
mod ledger_balance;
mod mapping_rule;
mod trial_balance;

pub use account::AccountRepository;
pub use journal::JournalRepository;
pub use ledger_balance::LedgerBalanceRepository;
pub use mapping_rule::MappingRuleRepository;
pub use trial_balance::TrialBalanceRepository;

use blud_core::fiscal::Period;
use blud_core::store::StoreError;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, SqlErr};

/// Maps a database failure to a backend store error.
pub(crate) fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Like [`backend`], but reports a unique violation as a duplicate `key`.
pub(crate) fn unique_or_backend<'a>(
    entity: &'static str,
    key: &'a str,
) -> impl FnOnce(DbErr) -> StoreError + 'a {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::duplicate(entity, key),
        _ => backend(err),
    }
}

fn unreadable(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("Unreadable {column} value '{value}'"))
}

pub(crate) fn parse_period(raw: &str) -> Result<Period, StoreError> {
    raw.parse().map_err(|_| unreadable("period", raw))
}

pub(crate) fn parse_with<T>(
    column: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, StoreError> {
    parse(raw).ok_or_else(|| unreadable(column, raw))
}

pub(crate) fn to_utc(ts: DateTimeWithTimeZone) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

pub(crate) fn to_tz(ts: DateTime<Utc>) -> DateTimeWithTimeZone {
    ts.fixed_offset()
}
