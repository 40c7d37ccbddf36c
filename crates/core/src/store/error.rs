//! Storage errors shared by every backend.

use blud_shared::AppError;
use thiserror::Error;

/// Errors raised by storage implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind, e.g. "Journal".
        entity: &'static str,
        /// Lookup key.
        key: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Entity kind.
        entity: &'static str,
        /// Colliding key.
        key: String,
    },

    /// A compare-and-set lost against a concurrent writer.
    #[error("Concurrent modification of {entity} {key}, please retry")]
    ConcurrentModification {
        /// Entity kind.
        entity: &'static str,
        /// Record key.
        key: String,
    },

    /// Backend failure (connection, query, serialization).
    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`StoreError::Duplicate`].
    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`StoreError::ConcurrentModification`].
    pub fn concurrent(entity: &'static str, key: impl ToString) -> Self {
        Self::ConcurrentModification {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Backend(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Duplicate { .. } | Self::ConcurrentModification { .. } => 409,
            Self::Backend(_) => 500,
        }
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(message) => Self::Database(message),
            other => Self::from_status(other.http_status_code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = StoreError::not_found("Journal", "abc");
        assert_eq!(err.to_string(), "Journal not found: abc");
        assert_eq!(err.http_status_code(), 404);

        let err = StoreError::concurrent("Journal", "abc");
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");
        assert_eq!(err.http_status_code(), 409);
        assert!(err.is_retryable());

        assert_eq!(StoreError::duplicate("MappingRule", "X").http_status_code(), 409);
        assert_eq!(StoreError::Backend("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_into_app_error() {
        assert!(matches!(
            AppError::from(StoreError::Backend("down".into())),
            AppError::Database(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::duplicate("MappingRule", "X")),
            AppError::Conflict(_)
        ));
    }
}
