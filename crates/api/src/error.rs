//! Error responses.
//!
//! Every component error knows its code and status. [`ApiError`] carries
//! both to the client as `{"error": <code>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blud_core::account::AccountError;
use blud_core::autopost::AutoPostError;
use blud_core::general_ledger::GeneralLedgerError;
use blud_core::journal::JournalError;
use blud_core::mapping::MappingError;
use blud_core::store::StoreError;
use blud_core::trial_balance::TrialBalanceError;
use blud_shared::AppError;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

/// Result type of the handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error response.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with `code`.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of the response.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.message
        };
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::bad_request("VALIDATION_ERROR", err.to_string())
    }
}

macro_rules! component_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    Self::from_parts(err.http_status_code(), err.error_code(), err.to_string())
                }
            }
        )+
    };
}

component_error!(
    AccountError,
    AutoPostError,
    GeneralLedgerError,
    JournalError,
    MappingError,
    StoreError,
    TrialBalanceError,
);

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_component_error_body() {
        let err: ApiError = JournalError::Unbalanced {
            debit: dec!(1000),
            credit: dec!(900),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "JOURNAL_NOT_BALANCED");
        assert_eq!(body["message"], "Journal not balanced. Debit: 1000, Credit: 900");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let err: ApiError = StoreError::Backend("connection refused".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "STORAGE_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_app_error_keeps_status() {
        let err: ApiError = AppError::Conflict("dup".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONFLICT");
    }

    #[rstest]
    #[case(JournalError::ReasonRequired.into(), StatusCode::BAD_REQUEST, "REASON_REQUIRED")]
    #[case(
        JournalError::ConcurrentModification("JU-2025-03-0001".into()).into(),
        StatusCode::CONFLICT,
        "CONCURRENT_MODIFICATION"
    )]
    #[case(
        MappingError::DuplicateSourceType("PARKIR".into()).into(),
        StatusCode::CONFLICT,
        "DUPLICATE_SOURCE_TYPE"
    )]
    #[case(
        AutoPostError::NoActiveRule("PARKIR".into()).into(),
        StatusCode::NOT_FOUND,
        "MAPPING_RULE_NOT_FOUND"
    )]
    fn test_status_and_code(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        assert_eq!(err.status(), status);
        assert_eq!(err.code(), code);
    }
}
