//! Trial balances materialized from the general ledger.
//!
//! - `types` - rows, summaries, grouped, comparison and trend views
//! - `service` - [`TrialBalanceMaterializer`]
//! - `export` - CSV rendering

pub mod error;
pub mod export;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::TrialBalanceError;
pub use service::TrialBalanceMaterializer;
pub use types::{
    AccountComparison, AccountTrend, GenerateOutcome, GroupedTrialBalance, TrendPoint,
    TrialBalanceComparison, TrialBalanceGroup, TrialBalanceReport, TrialBalanceRow,
    TrialBalanceSummary,
};
