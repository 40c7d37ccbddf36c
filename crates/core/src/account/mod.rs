//! Chart of accounts lookup.
//!
//! Accounts are owned by master-data administration. The ledger only reads
//! them to validate postings and to pick the normal-balance rule.

pub mod balance;
pub mod error;
pub mod types;

pub use balance::NormalBalance;
pub use error::AccountError;
pub use types::{Account, AccountCode, AccountType, MAX_CODE_LEVEL};
