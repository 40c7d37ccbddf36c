//! Trial balance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use blud_core::fiscal::Period;
use blud_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::parse_account_ids;
use crate::AppState;
use crate::error::ApiResult;
use crate::extract::RequiredActor;
use crate::views::{GroupedTrialBalanceView, TrialBalanceRowView, TrialBalanceView};

/// Creates the trial balance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trial-balance/compare", get(compare))
        .route("/trial-balance/trend", get(trend))
        .route("/trial-balance/{period}", get(get_trial_balance))
        .route("/trial-balance/{period}/grouped", get(get_grouped))
        .route("/trial-balance/{period}/generate", post(generate))
        .route("/trial-balance/{period}/adjustments", post(record_adjustment))
        .route("/trial-balance/{period}/export", get(export))
}

/// Query parameters for a period comparison.
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// Base period.
    pub base: Period,
    /// Period compared against the base.
    pub compare: Period,
}

/// Query parameters for a trend.
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// First period.
    pub from: Period,
    /// Last period.
    pub to: Period,
    /// Comma-separated account ids.
    pub account_ids: Option<String>,
}

/// Query parameters for the CSV export.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Subtotal per account classification.
    #[serde(default)]
    pub grouped: bool,
}

/// Request body for an adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    /// Adjusted account.
    #[serde(alias = "account_id")]
    pub account_id: AccountId,
    /// Debit adjustment.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit adjustment.
    #[serde(default)]
    pub credit: Decimal,
}

/// GET `/trial-balance/{period}` - Rows and totals, generated on first access.
async fn get_trial_balance(
    State(state): State<AppState>,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    let report = state.trial_balance.get(period).await?;
    Ok(Json(TrialBalanceView::from(report)))
}

/// GET `/trial-balance/{period}/grouped`
async fn get_grouped(
    State(state): State<AppState>,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    let grouped = state.trial_balance.get_grouped(period).await?;
    Ok(Json(GroupedTrialBalanceView::from(grouped)))
}

/// POST `/trial-balance/{period}/generate` - Regenerate from the ledger.
async fn generate(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.trial_balance.generate(period).await?;
    info!(
        period = %period,
        rows = outcome.rows_generated,
        actor = %actor,
        "Trial balance regenerated over HTTP"
    );
    Ok(Json(outcome))
}

/// POST `/trial-balance/{period}/adjustments`
async fn record_adjustment(
    State(state): State<AppState>,
    RequiredActor(_actor): RequiredActor,
    Path(period): Path<Period>,
    Json(payload): Json<AdjustmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .trial_balance
        .record_adjustment(period, payload.account_id, payload.debit, payload.credit)
        .await?;
    Ok(Json(TrialBalanceRowView::from(row)))
}

/// GET `/trial-balance/compare`
async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.trial_balance.compare(query.base, query.compare).await?,
    ))
}

/// GET `/trial-balance/trend`
async fn trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<impl IntoResponse> {
    let account_ids = parse_account_ids(query.account_ids.as_deref())?;
    let trends = state
        .trial_balance
        .trend(query.from, query.to, account_ids.as_deref())
        .await?;
    Ok(Json(trends))
}

/// GET `/trial-balance/{period}/export` - CSV download.
async fn export(
    State(state): State<AppState>,
    Path(period): Path<Period>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let csv = state.trial_balance.export_csv(period, query.grouped).await?;
    let disposition = format!("attachment; filename=\"neraca-saldo-{period}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::testing::{TestApp, amount};

    async fn funded() -> TestApp {
        let app = TestApp::new().await;
        app.post_journal("2025-03-05", "1.1.2", "3.1.1", "1000000").await;
        app.post_journal("2025-03-20", "5.1.1", "1.1.2", "250000").await;
        app
    }

    #[tokio::test]
    async fn test_first_read_generates_balanced_rows() {
        let app = funded().await;
        let (status, body) = app.get("/api/v1/trial-balance/2025-03").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["period"], "2025-03");
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["rows"][0]["kode"], "1.1.2");
        assert_eq!(body["summary"]["isBalanced"], true);
        assert_eq!(amount(&body["summary"]["totalDebet"]), dec!(1000000));
    }

    #[tokio::test]
    async fn test_adjustment_then_regenerate() {
        let app = funded().await;
        let bank = app.account_id("1.1.2").await;

        let (status, body) = app
            .post(
                "/api/v1/trial-balance/2025-03/adjustments",
                json!({ "accountId": bank, "debit": "5000" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "TRIAL_BALANCE_ROW_NOT_FOUND");

        let (status, body) = app
            .post("/api/v1/trial-balance/2025-03/generate", json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["rowsGenerated"], 3);

        let (status, body) = app
            .post(
                "/api/v1/trial-balance/2025-03/adjustments",
                json!({ "accountId": bank, "debit": "5000" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(amount(&body["debitAdjusted"]), dec!(755000));

        let (_, body) = app.get("/api/v1/trial-balance/2025-03").await;
        assert_eq!(amount(&body["summary"]["totalDebetAdjusted"]), dec!(1005000));
        assert_eq!(amount(&body["summary"]["totalDebet"]), dec!(1000000));

        let (_, body) = app
            .post("/api/v1/trial-balance/2025-03/generate", json!({}))
            .await;
        assert_eq!(body["discardedAdjustments"], 1);
        assert_eq!(amount(&body["summary"]["totalDebetAdjusted"]), dec!(1000000));
    }

    #[tokio::test]
    async fn test_grouped_and_compare() {
        let app = funded().await;
        let (status, body) = app.get("/api/v1/trial-balance/2025-03/grouped").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["groups"].as_array().unwrap().len(), 3);

        let (status, body) = app
            .get("/api/v1/trial-balance/compare?base=2025-03&compare=2025-04")
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["basePeriod"], "2025-03");
        let accounts = body["accounts"].as_array().unwrap();
        assert_eq!(accounts.len(), 3);
        let bank = accounts.iter().find(|a| a["accountCode"] == "1.1.2").unwrap();
        assert_eq!(amount(&bank["change"]), dec!(-750000));
    }

    #[tokio::test]
    async fn test_trend_filters_accounts() {
        let app = funded().await;
        app.post("/api/v1/trial-balance/2025-03/generate", json!({}))
            .await;

        let (status, body) = app
            .get("/api/v1/trial-balance/trend?from=2025-01&to=2025-03")
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body.as_array().unwrap().len(), 3);

        let bank = app.account_id("1.1.2").await;
        let (_, body) = app
            .get(&format!(
                "/api/v1/trial-balance/trend?from=2025-01&to=2025-03&account_ids={bank}"
            ))
            .await;
        let trends = body.as_array().unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0]["points"].as_array().unwrap().len(), 1);

        let (status, body) = app
            .get("/api/v1/trial-balance/trend?from=2025-01&to=2025-03&account_ids=x")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_ACCOUNT_ID");
    }

    #[tokio::test]
    async fn test_export_is_csv() {
        let app = funded().await;
        let (status, content_type, body) =
            app.get_text("/api/v1/trial-balance/2025-03/export").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/csv"));
        assert!(body.starts_with("Kode Akun,Nama Akun"));
        assert!(body.contains("TOTAL"));

        let (_, _, body) = app
            .get_text("/api/v1/trial-balance/2025-03/export?grouped=true")
            .await;
        assert!(body.contains("Subtotal"));
    }
}
