//! General ledger routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use blud_core::fiscal::Period;
use blud_shared::types::AccountId;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use super::parse_account_ids;
use crate::AppState;
use crate::error::ApiResult;
use crate::extract::RequiredActor;
use crate::views::LedgerBalanceView;

/// Creates the general ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/general-ledger/accounts/{account_id}", get(by_account))
        .route(
            "/general-ledger/accounts/{account_id}/periods/{period}/summary",
            get(summary),
        )
        .route("/general-ledger/periods/{period}", get(by_period))
        .route("/general-ledger/periods/{period}/rebuild", post(rebuild))
        .route("/general-ledger/periods/{period}/initialize", post(initialize))
        .route("/general-ledger/report", get(report))
        .route("/general-ledger/balance/{account_code}", get(balance))
}

/// Inclusive period range.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// First period, `YYYY-MM`.
    pub from: Period,
    /// Last period, `YYYY-MM`.
    pub to: Period,
}

/// Query parameters for the multi-period report.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// First period.
    pub from: Period,
    /// Last period.
    pub to: Period,
    /// Comma-separated account ids; every account when absent.
    pub account_ids: Option<String>,
}

/// Query parameters for a point-in-time balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Date to get the balance as of (YYYY-MM-DD). Defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// GET `/general-ledger/accounts/{account_id}` - Balance rows of an account.
async fn by_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let rows = state
        .general_ledger
        .by_account(account_id, range.from, range.to)
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(LedgerBalanceView::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET `/general-ledger/periods/{period}` - Balance rows of a period.
async fn by_period(
    State(state): State<AppState>,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.general_ledger.by_period(period).await?;
    Ok(Json(
        rows.into_iter()
            .map(LedgerBalanceView::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET `/general-ledger/accounts/{account_id}/periods/{period}/summary`
async fn summary(
    State(state): State<AppState>,
    Path((account_id, period)): Path<(AccountId, Period)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.general_ledger.summary(account_id, period).await?))
}

/// GET `/general-ledger/report` - Multi-period report grouped by account.
async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    let account_ids = parse_account_ids(query.account_ids.as_deref())?;
    let report = state
        .general_ledger
        .report(query.from, query.to, account_ids.as_deref())
        .await?;
    Ok(Json(report))
}

/// POST `/general-ledger/periods/{period}/rebuild` - Recompute from posted journals.
async fn rebuild(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    info!(period = %period, actor = %actor, "Ledger rebuild requested");
    Ok(Json(state.general_ledger.rebuild_for_period(period).await?))
}

/// POST `/general-ledger/periods/{period}/initialize` - Carry balances forward.
async fn initialize(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(period): Path<Period>,
) -> ApiResult<impl IntoResponse> {
    info!(period = %period, actor = %actor, "Ledger period initialization requested");
    Ok(Json(state.general_ledger.initialize_new_period(period).await?))
}

/// GET `/general-ledger/balance/{account_code}` - Balance at a date.
async fn balance(
    State(state): State<AppState>,
    Path(account_code): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<impl IntoResponse> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(
        state
            .general_ledger
            .account_balance_by_code(&account_code, as_of)
            .await?,
    ))
}
