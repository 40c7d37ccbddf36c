//! Auto-posting errors.

use blud_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountError;
use crate::journal::JournalError;
use crate::store::StoreError;

/// Errors raised while turning a business transaction into a journal.
#[derive(Debug, Error)]
pub enum AutoPostError {
    /// No active mapping rule for the source type.
    #[error("No active mapping rule for source type {0}")]
    NoActiveRule(String),

    /// The source already has a live journal.
    #[error("Transaction {source_type}/{source_id} is already journaled as {journal_number}")]
    AlreadyPosted {
        /// Source type.
        source_type: String,
        /// Source id.
        source_id: String,
        /// Number of the live journal.
        journal_number: String,
    },

    /// Transaction amount missing, unparseable or not positive.
    #[error("Transaction amount must be greater than zero, got {0}")]
    InvalidAmount(String),

    /// Computed lines do not balance.
    #[error("Auto-posted lines not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Debit total.
        debit: Decimal,
        /// Credit total.
        credit: Decimal,
    },

    /// A template resolves to an unusable account.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Journal creation or posting failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AutoPostError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoActiveRule(_) => "MAPPING_RULE_NOT_FOUND",
            Self::AlreadyPosted { .. } => "ALREADY_POSTED",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Unbalanced { .. } => "JOURNAL_NOT_BALANCED",
            Self::Account(err) => err.error_code(),
            Self::Journal(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoActiveRule(_) => 404,
            Self::AlreadyPosted { .. } => 409,
            Self::InvalidAmount(_) | Self::Unbalanced { .. } => 400,
            Self::Account(err) => err.http_status_code(),
            Self::Journal(err) => err.http_status_code(),
            Self::Store(err) => err.http_status_code(),
        }
    }
}

impl From<AutoPostError> for AppError {
    fn from(err: AutoPostError) -> Self {
        Self::from_status(err.http_status_code(), err.to_string())
    }
}
