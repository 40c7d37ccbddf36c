//! Trial balance errors.

use blud_shared::AppError;
use blud_shared::types::AccountId;
use thiserror::Error;

use crate::fiscal::Period;
use crate::store::StoreError;

/// Errors raised by the trial balance materializer.
#[derive(Debug, Error)]
pub enum TrialBalanceError {
    /// Adjustment target has no row; generate the period first.
    #[error("No trial balance row for account {account_id} in {period}")]
    RowNotFound {
        /// Period.
        period: Period,
        /// Account.
        account_id: AccountId,
    },

    /// Adjustment amount has more than two decimal places.
    #[error("Adjustment amount {0} has more than two decimal places")]
    ExcessPrecision(rust_decimal::Decimal),

    /// Period range is reversed.
    #[error("Invalid period range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: Period,
        /// Range end.
        to: Period,
    },

    /// CSV rendering failed.
    #[error("Trial balance export failed: {0}")]
    Export(String),

    /// Storage failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<csv::Error> for TrialBalanceError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl TrialBalanceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RowNotFound { .. } => "TRIAL_BALANCE_ROW_NOT_FOUND",
            Self::ExcessPrecision(_) => "INVALID_ADJUSTMENT_AMOUNT",
            Self::InvalidRange { .. } => "INVALID_PERIOD_RANGE",
            Self::Export(_) => "EXPORT_FAILED",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// A missing adjustment target is a validation failure.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::RowNotFound { .. } | Self::ExcessPrecision(_) | Self::InvalidRange { .. } => 400,
            Self::Export(_) => 500,
            Self::Store(err) => err.http_status_code(),
        }
    }
}

impl From<StoreError> for TrialBalanceError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<TrialBalanceError> for AppError {
    fn from(err: TrialBalanceError) -> Self {
        Self::from_status(err.http_status_code(), err.to_string())
    }
}
