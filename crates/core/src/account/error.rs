//! Account lookup errors.

use blud_shared::AppError;
use thiserror::Error;

/// Errors raised when an account cannot be used for posting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// No account with the code exists.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The account exists but is inactive.
    #[error("Account {0} is inactive")]
    Inactive(String),

    /// The account is a header account and cannot receive postings.
    #[error("Account {0} is a header account and cannot receive postings")]
    HeaderAccount(String),

    /// The code is not a valid dot-segmented account code.
    #[error("Invalid account code: {0}")]
    InvalidCode(String),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Inactive(_) => "ACCOUNT_INACTIVE",
            Self::HeaderAccount(_) => "ACCOUNT_NOT_POSTABLE",
            Self::InvalidCode(_) => "INVALID_ACCOUNT_CODE",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// A missing account referenced from a journal line or template is a
    /// validation failure, not a missing resource.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        400
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        Self::Validation(err.to_string())
    }
}
