//! BLUD ledger API server.
//!
//! Main entry point for the journal and general ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use blud_api::{AppState, Stores, create_router};
use blud_core::store::MemoryStore;
use blud_db::{
    AccountRepository, JournalRepository, LedgerBalanceRepository, MappingRuleRepository,
    TrialBalanceRepository, connect,
};
use blud_shared::{AppConfig, LogFormat, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blud=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }

    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = connect(
                config.database_url()?,
                config.database.max_connections,
                config.database.min_connections,
            )
            .await?;
            Stores {
                accounts: Arc::new(AccountRepository::new(db.clone())),
                rules: Arc::new(MappingRuleRepository::new(db.clone())),
                journals: Arc::new(JournalRepository::new(db.clone())),
                balances: Arc::new(LedgerBalanceRepository::new(db.clone())),
                trial_balances: Arc::new(TrialBalanceRepository::new(db)),
            }
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage, data is lost on exit");
            Stores::memory(&Arc::new(MemoryStore::new()))
        }
    };

    let state = AppState::new(stores, &config.posting);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
