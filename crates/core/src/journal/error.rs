//! Journal error types.

use blud_shared::AppError;
use blud_shared::types::JournalId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::JournalStatus;
use crate::account::AccountError;
use crate::store::StoreError;

/// Errors that can occur while creating or moving a journal through its
/// lifecycle.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Fewer than two lines.
    #[error("Journal requires at least 2 lines, got {count}")]
    InsufficientLines {
        /// Lines supplied.
        count: usize,
    },

    /// Debit and credit totals differ by more than 0.01.
    #[error("Journal not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    /// A line carries an unusable amount.
    #[error("Line {line}: {reason}")]
    InvalidLineAmount {
        /// 1-based line number.
        line: usize,
        /// What is wrong.
        reason: &'static str,
    },

    /// A line references an unusable account.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Edit or delete attempted on a journal that is not a draft.
    #[error("Journal is {0} and can no longer be changed")]
    NotDraft(JournalStatus),

    /// Action not allowed from the current status.
    #[error("Cannot {action} a journal in status {from}")]
    InvalidTransition {
        /// Current status.
        from: JournalStatus,
        /// Attempted action.
        action: &'static str,
    },

    /// Journal was already approved.
    #[error("Journal is already approved")]
    AlreadyApproved,

    /// Auto-posted journals are not approved manually.
    #[error("Automatic journals do not go through approval")]
    ApprovalNotAllowed,

    /// Reverse attempted on a journal that is not posted.
    #[error("Only posted journals can be reversed")]
    NotPosted,

    /// Journal was already reversed.
    #[error("Journal has already been reversed")]
    AlreadyReversed,

    /// Reversal reason is blank.
    #[error("Reversal reason is required")]
    ReasonRequired,

    /// Journal id not found.
    #[error("Journal not found: {0}")]
    NotFound(JournalId),

    /// Another writer changed the journal first.
    #[error("Journal {0} was modified concurrently, retry the operation")]
    ConcurrentModification(String),

    /// Storage failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for JournalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrentModification { key, .. } => Self::ConcurrentModification(key),
            other => Self::Store(other),
        }
    }
}

impl JournalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "JOURNAL_NOT_BALANCED",
            Self::InvalidLineAmount { .. } => "INVALID_LINE_AMOUNT",
            Self::Account(err) => err.error_code(),
            Self::NotDraft(_) => "JOURNAL_NOT_DRAFT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyApproved => "ALREADY_APPROVED",
            Self::ApprovalNotAllowed => "APPROVAL_NOT_ALLOWED",
            Self::NotPosted => "JOURNAL_NOT_POSTED",
            Self::AlreadyReversed => "ALREADY_REVERSED",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::NotFound(_) => "JOURNAL_NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InsufficientLines { .. }
            | Self::Unbalanced { .. }
            | Self::InvalidLineAmount { .. }
            | Self::NotDraft(_)
            | Self::InvalidTransition { .. }
            | Self::AlreadyApproved
            | Self::ApprovalNotAllowed
            | Self::NotPosted
            | Self::AlreadyReversed
            | Self::ReasonRequired => 400,
            Self::Account(err) => err.http_status_code(),
            Self::NotFound(_) => 404,
            Self::ConcurrentModification(_) => 409,
            Self::Store(err) => err.http_status_code(),
        }
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        Self::from_status(err.http_status_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_message() {
        let err = JournalError::Unbalanced {
            debit: dec!(1000),
            credit: dec!(900),
        };
        assert_eq!(err.to_string(), "Journal not balanced. Debit: 1000, Credit: 900");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let err: JournalError = StoreError::concurrent("Journal", "x").into();
        assert!(matches!(err, JournalError::ConcurrentModification(_)));
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(AppError::from(err).status_code(), 409);
    }
}
