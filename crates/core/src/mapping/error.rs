//! Mapping rule errors.

use blud_shared::AppError;
use blud_shared::types::MappingRuleId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::Side;
use crate::account::AccountError;
use crate::store::StoreError;

/// Errors that can occur while managing or applying mapping rules.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Source type is blank.
    #[error("Source type is required")]
    SourceTypeRequired,

    /// A side has no templates.
    #[error("Mapping rule needs at least one {0} template")]
    EmptyTemplates(Side),

    /// Percentage templates on one side do not sum to 100.
    #[error("{side} percentages must total 100, got {total}")]
    PercentageTotal {
        /// Offending side.
        side: Side,
        /// Actual sum.
        total: Decimal,
    },

    /// A template carries an unusable amount.
    #[error("Template {index} on the {side} side: {reason}")]
    InvalidTemplate {
        /// Offending side.
        side: Side,
        /// Zero-based template position.
        index: usize,
        /// What is wrong.
        reason: &'static str,
    },

    /// A referenced account cannot be used.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Preview amount must be positive.
    #[error("Sample amount must be greater than zero, got {0}")]
    InvalidSampleAmount(Decimal),

    /// Another rule already uses the source type.
    #[error("Mapping rule for source type {0} already exists")]
    DuplicateSourceType(String),

    /// Rule id not found.
    #[error("Mapping rule not found: {0}")]
    NotFound(MappingRuleId),

    /// No rule for the source type.
    #[error("Mapping rule not found for source type {0}")]
    SourceTypeNotFound(String),

    /// Storage failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for MappingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { key, .. } => Self::DuplicateSourceType(key),
            other => Self::Store(other),
        }
    }
}

impl MappingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceTypeRequired => "SOURCE_TYPE_REQUIRED",
            Self::EmptyTemplates(_) => "EMPTY_TEMPLATES",
            Self::PercentageTotal { .. } => "INVALID_PERCENTAGE_TOTAL",
            Self::InvalidTemplate { .. } => "INVALID_TEMPLATE",
            Self::Account(err) => err.error_code(),
            Self::InvalidSampleAmount(_) => "INVALID_AMOUNT",
            Self::DuplicateSourceType(_) => "DUPLICATE_SOURCE_TYPE",
            Self::NotFound(_) | Self::SourceTypeNotFound(_) => "MAPPING_RULE_NOT_FOUND",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::SourceTypeRequired
            | Self::EmptyTemplates(_)
            | Self::PercentageTotal { .. }
            | Self::InvalidTemplate { .. }
            | Self::InvalidSampleAmount(_) => 400,
            Self::Account(err) => err.http_status_code(),
            Self::DuplicateSourceType(_) => 409,
            Self::NotFound(_) | Self::SourceTypeNotFound(_) => 404,
            Self::Store(err) => err.http_status_code(),
        }
    }
}

impl From<MappingError> for AppError {
    fn from(err: MappingError) -> Self {
        Self::from_status(err.http_status_code(), err.to_string())
    }
}
