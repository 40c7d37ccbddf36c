//! Core posting engine for the BLUD ledger.
//!
//! Pure business logic with ZERO web or database dependencies. Persistence
//! is reached through the async capabilities in [`store`].
//!
//! # Modules
//!
//! - `account` - chart of accounts lookups and normal-balance arithmetic
//! - `mapping` - mapping rules from transaction source types to line templates
//! - `journal` - double-entry journals and their DRAFT → POSTED → CANCELLED lifecycle
//! - `autopost` - turns transaction notifications into posted journals
//! - `general_ledger` - running per-account, per-period balances
//! - `trial_balance` - period snapshots, adjustments, comparison and trend
//! - `events` - in-process publish/subscribe
//! - `fiscal` - accounting periods
//! - `store` - storage capabilities and the in-memory backend

pub mod account;
pub mod autopost;
pub mod events;
pub mod fiscal;
pub mod general_ledger;
pub mod journal;
pub mod mapping;
pub mod store;
pub mod trial_balance;

#[cfg(test)]
mod testing;
