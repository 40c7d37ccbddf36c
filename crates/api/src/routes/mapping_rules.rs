//! Mapping rule routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use blud_core::mapping::MappingRuleInput;
use blud_shared::types::MappingRuleId;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::RequiredActor;

/// Creates the mapping rule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mapping-rules", post(create_rule).get(list_rules))
        .route(
            "/mapping-rules/source-type/{source_type}",
            get(get_rule_by_source_type),
        )
        .route(
            "/mapping-rules/{id}",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route("/mapping-rules/{id}/activate", post(activate_rule))
        .route("/mapping-rules/{id}/deactivate", post(deactivate_rule))
        .route("/mapping-rules/{id}/test", post(test_rule))
}

/// Query parameters for listing rules.
#[derive(Debug, Deserialize)]
pub struct ListRulesQuery {
    /// Only active (`true`) or only inactive (`false`) rules.
    pub active: Option<bool>,
}

/// Request body for previewing a rule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRuleRequest {
    /// Amount the rule is applied to.
    #[serde(alias = "sample_amount")]
    pub sample_amount: Decimal,
}

/// POST `/mapping-rules` - Create a rule.
async fn create_rule(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Json(payload): Json<MappingRuleInput>,
) -> ApiResult<impl IntoResponse> {
    let rule = state.rules.create(payload).await?;
    info!(rule_id = %rule.id, actor = %actor, "Mapping rule created over HTTP");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// GET `/mapping-rules` - List rules.
async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<ListRulesQuery>,
) -> ApiResult<impl IntoResponse> {
    let rules = state.rules.list(query.active).await?;
    Ok(Json(json!({ "rules": rules })))
}

/// GET `/mapping-rules/{id}` - One rule.
async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<MappingRuleId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.get(id).await?))
}

/// GET `/mapping-rules/source-type/{source_type}` - Rule of a source type.
async fn get_rule_by_source_type(
    State(state): State<AppState>,
    Path(source_type): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.get_by_source_type(&source_type).await?))
}

/// PUT `/mapping-rules/{id}` - Replace a rule's content.
async fn update_rule(
    State(state): State<AppState>,
    RequiredActor(_actor): RequiredActor,
    Path(id): Path<MappingRuleId>,
    Json(payload): Json<MappingRuleInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.update(id, payload).await?))
}

/// DELETE `/mapping-rules/{id}` - Delete a rule.
async fn delete_rule(
    State(state): State<AppState>,
    RequiredActor(_actor): RequiredActor,
    Path(id): Path<MappingRuleId>,
) -> ApiResult<impl IntoResponse> {
    state.rules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/mapping-rules/{id}/activate`
async fn activate_rule(
    State(state): State<AppState>,
    RequiredActor(_actor): RequiredActor,
    Path(id): Path<MappingRuleId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.activate(id).await?))
}

/// POST `/mapping-rules/{id}/deactivate`
async fn deactivate_rule(
    State(state): State<AppState>,
    RequiredActor(_actor): RequiredActor,
    Path(id): Path<MappingRuleId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.deactivate(id).await?))
}

/// POST `/mapping-rules/{id}/test` - Preview the lines for a sample amount.
async fn test_rule(
    State(state): State<AppState>,
    Path(id): Path<MappingRuleId>,
    Json(payload): Json<TestRuleRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.rules.test(id, payload.sample_amount).await?))
}
