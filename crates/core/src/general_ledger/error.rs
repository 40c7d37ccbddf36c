//! General ledger errors.

use blud_shared::AppError;
use blud_shared::types::JournalId;
use thiserror::Error;

use crate::fiscal::Period;
use crate::store::StoreError;

/// Errors raised by the general ledger accumulator and its queries.
#[derive(Debug, Error)]
pub enum GeneralLedgerError {
    /// Account id or code not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Posted journal referenced by an event does not exist.
    #[error("Journal not found: {0}")]
    JournalNotFound(JournalId),

    /// Period range is reversed.
    #[error("Invalid period range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: Period,
        /// Range end.
        to: Period,
    },

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GeneralLedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::InvalidRange { .. } => "INVALID_PERIOD_RANGE",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) | Self::JournalNotFound(_) => 404,
            Self::InvalidRange { .. } => 400,
            Self::Store(err) => err.http_status_code(),
        }
    }
}

impl From<GeneralLedgerError> for AppError {
    fn from(err: GeneralLedgerError) -> Self {
        Self::from_status(err.http_status_code(), err.to_string())
    }
}
