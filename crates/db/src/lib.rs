//! PostgreSQL storage for the BLUD ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories implementing the `blud-core` storage traits
//! - The schema migration

pub mod entities;
pub mod migration;
pub mod repositories;

pub use migration::Migrator;
pub use repositories::{
    AccountRepository, JournalRepository, LedgerBalanceRepository, MappingRuleRepository,
    TrialBalanceRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!(max_connections, "Connected to PostgreSQL");
    Ok(db)
}
