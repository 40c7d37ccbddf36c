//! HTTP API layer for the BLUD ledger.
//!
//! This crate provides:
//! - REST routes for journals, mapping rules, auto-posting, the general
//!   ledger and the trial balance
//! - Actor extraction from the `X-Actor` header
//! - Response views with the `kode`/`uraian` aliases
//! - Mapping of component errors to HTTP responses

pub mod error;
pub mod extract;
pub mod routes;
pub mod views;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::Router;
use blud_core::autopost::AutoPostingEngine;
use blud_core::events::EventBus;
use blud_core::general_ledger::GeneralLedgerAccumulator;
use blud_core::journal::JournalLedger;
use blud_core::mapping::MappingRuleService;
use blud_core::store::{
    AccountStore, JournalStore, LedgerBalanceStore, MappingRuleStore, MemoryStore,
    TrialBalanceStore,
};
use blud_core::trial_balance::TrialBalanceMaterializer;
use blud_shared::config::PostingConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// The storage backend, one handle per table family.
#[derive(Clone)]
pub struct Stores {
    /// Chart of accounts.
    pub accounts: Arc<dyn AccountStore>,
    /// Mapping rules.
    pub rules: Arc<dyn MappingRuleStore>,
    /// Journals and their lines.
    pub journals: Arc<dyn JournalStore>,
    /// General ledger balances.
    pub balances: Arc<dyn LedgerBalanceStore>,
    /// Materialized trial balances.
    pub trial_balances: Arc<dyn TrialBalanceStore>,
}

impl Stores {
    /// Every table family backed by one in-memory store.
    #[must_use]
    pub fn memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            accounts: store.clone(),
            rules: store.clone(),
            journals: store.clone(),
            balances: store.clone(),
            trial_balances: store.clone(),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chart of accounts lookup.
    pub accounts: Arc<dyn AccountStore>,
    /// Journal ledger.
    pub ledger: Arc<JournalLedger>,
    /// Mapping rule service.
    pub rules: Arc<MappingRuleService>,
    /// Auto-posting engine.
    pub engine: Arc<AutoPostingEngine>,
    /// General ledger accumulator.
    pub general_ledger: Arc<GeneralLedgerAccumulator>,
    /// Trial balance materializer.
    pub trial_balance: Arc<TrialBalanceMaterializer>,
    /// Event bus the components are wired through.
    pub bus: Arc<EventBus>,
    /// Deliver HTTP transaction notifications on a background task.
    pub background_dispatch: bool,
}

impl AppState {
    /// Builds every component over `stores` and wires them through a new bus.
    ///
    /// The journal ledger publishes on the bus. The general ledger subscribes
    /// to `journal.posted`, the auto-posting engine to `transaction.*`.
    #[must_use]
    pub fn new(stores: Stores, posting: &PostingConfig) -> Self {
        let bus = Arc::new(EventBus::new());

        let ledger = Arc::new(JournalLedger::new(
            stores.journals.clone(),
            stores.accounts.clone(),
            bus.clone(),
        ));
        let general_ledger = Arc::new(GeneralLedgerAccumulator::new(
            stores.balances.clone(),
            stores.journals.clone(),
            stores.accounts.clone(),
        ));
        let engine = Arc::new(AutoPostingEngine::new(
            stores.rules.clone(),
            stores.accounts.clone(),
            ledger.clone(),
            posting.system_actor.clone(),
        ));
        let rules = Arc::new(MappingRuleService::new(
            stores.rules.clone(),
            stores.accounts.clone(),
        ));
        let trial_balance = Arc::new(TrialBalanceMaterializer::new(
            stores.balances.clone(),
            stores.trial_balances.clone(),
        ));

        bus.subscribe(general_ledger.clone());
        bus.subscribe(engine.clone());

        Self {
            accounts: stores.accounts,
            ledger,
            rules,
            engine,
            general_ledger,
            trial_balance,
            bus,
            background_dispatch: posting.background_dispatch,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
