//! General ledger: per-account, per-period running balances.
//!
//! - `types` - balance rows and query results
//! - `service` - [`GeneralLedgerAccumulator`], fed by `journal.posted`

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use error::GeneralLedgerError;
pub use service::GeneralLedgerAccumulator;
pub use types::{
    AccountBalanceAsOf, BalanceFigures, BalanceMovement, GeneralLedgerSummary, LedgerBalance,
    LedgerLineDetail, PeriodMaintenance, ReportAccount, ReportPeriod,
};
