//! Journal routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use blud_core::fiscal::Period;
use blud_core::journal::{
    CreateJournalInput, EntryType, JournalFilter, JournalLineInput, JournalStatus,
    UpdateJournalInput,
};
use blud_shared::types::{JournalId, PageRequest};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{Actor, RequiredActor, validated};
use crate::views::{JournalDetailView, JournalView, ReversalView};

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journals", post(create_journal).get(list_journals))
        .route(
            "/journals/{id}",
            get(get_journal).patch(update_journal).delete(delete_journal),
        )
        .route("/journals/{id}/post", post(post_journal))
        .route("/journals/{id}/approve", post(approve_journal))
        .route("/journals/{id}/reverse", post(reverse_journal))
}

/// Request body for creating a journal.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJournalRequest {
    /// Transaction date.
    pub entry_date: NaiveDate,
    /// Period override, `YYYY-MM`.
    #[serde(default)]
    pub period: Option<Period>,
    /// Classification, `GENERAL` when absent.
    #[serde(default)]
    pub entry_type: Option<EntryType>,
    /// Originating transaction kind.
    #[serde(default)]
    pub source_type: Option<String>,
    /// Originating transaction id.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Narrative.
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    /// Journal lines.
    pub lines: Vec<JournalLineInput>,
}

/// Request body for changing a draft journal.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJournalRequest {
    /// New transaction date.
    pub entry_date: Option<NaiveDate>,
    /// New period override.
    pub period: Option<Period>,
    /// New narrative.
    pub description: Option<String>,
    /// Replacement lines.
    pub lines: Option<Vec<JournalLineInput>>,
}

/// Request body for reversing a journal.
#[derive(Debug, Deserialize)]
pub struct ReverseRequest {
    /// Why the journal is cancelled.
    #[serde(default)]
    pub reason: String,
}

/// Query parameters for listing journals.
#[derive(Debug, Default, Deserialize)]
pub struct ListJournalsQuery {
    /// Substring of the journal number.
    pub journal_number: Option<String>,
    /// Earliest entry date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Exact period.
    pub period: Option<Period>,
    /// Exact year.
    pub year: Option<i32>,
    /// Exact entry type.
    pub entry_type: Option<EntryType>,
    /// Exact source type.
    pub source_type: Option<String>,
    /// Exact source id.
    pub source_id: Option<String>,
    /// Exact status.
    pub status: Option<JournalStatus>,
    /// Exact creating actor.
    pub created_by: Option<String>,
    /// Substring of the description.
    pub description: Option<String>,
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 100).
    pub per_page: Option<u32>,
}

impl ListJournalsQuery {
    fn into_parts(self) -> (JournalFilter, PageRequest) {
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );
        let filter = JournalFilter {
            journal_number: self.journal_number,
            date_from: self.date_from,
            date_to: self.date_to,
            period: self.period,
            year: self.year,
            entry_type: self.entry_type,
            source_type: self.source_type,
            source_id: self.source_id,
            status: self.status,
            created_by: self.created_by,
            description: self.description,
        };
        (filter, page)
    }
}

/// POST `/journals` - Create a draft journal.
async fn create_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Json(payload): Json<CreateJournalRequest>,
) -> ApiResult<impl IntoResponse> {
    let payload = validated(payload)?;
    let journal = state
        .ledger
        .create(CreateJournalInput {
            entry_date: payload.entry_date,
            period: payload.period,
            entry_type: payload.entry_type.unwrap_or(EntryType::General),
            source_type: payload.source_type,
            source_id: payload.source_id,
            description: payload.description,
            lines: payload.lines,
            created_by: actor,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(JournalDetailView::from(journal))))
}

/// GET `/journals` - Filtered page of journals, newest first.
async fn list_journals(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<ListJournalsQuery>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = query.into_parts();
    let journals = state.ledger.list(&filter, page).await?;
    debug!(actor = %actor, total = journals.meta.total, "Journals listed");
    Ok(Json(journals.map(JournalView::from)))
}

/// GET `/journals/{id}` - Journal with its lines.
async fn get_journal(
    State(state): State<AppState>,
    Path(id): Path<JournalId>,
) -> ApiResult<impl IntoResponse> {
    let journal = state.ledger.get(id).await?;
    Ok(Json(JournalDetailView::from(journal)))
}

/// PATCH `/journals/{id}` - Change a draft.
async fn update_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(id): Path<JournalId>,
    Json(payload): Json<UpdateJournalRequest>,
) -> ApiResult<impl IntoResponse> {
    let journal = state
        .ledger
        .update(
            id,
            UpdateJournalInput {
                entry_date: payload.entry_date,
                period: payload.period,
                description: payload.description,
                lines: payload.lines,
            },
        )
        .await?;
    info!(journal_id = %id, actor = %actor, "Draft journal updated");
    Ok(Json(JournalDetailView::from(journal)))
}

/// DELETE `/journals/{id}` - Remove a draft.
async fn delete_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(id): Path<JournalId>,
) -> ApiResult<impl IntoResponse> {
    state.ledger.remove(id).await?;
    info!(journal_id = %id, actor = %actor, "Draft journal deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/journals/{id}/post` - Post a draft.
async fn post_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(id): Path<JournalId>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.ledger.post(id, &actor).await?;
    Ok(Json(JournalView::from(entry)))
}

/// POST `/journals/{id}/approve` - Approve a journal.
async fn approve_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(id): Path<JournalId>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.ledger.approve(id, &actor).await?;
    Ok(Json(JournalView::from(entry)))
}

/// POST `/journals/{id}/reverse` - Cancel a posted journal.
async fn reverse_journal(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Path(id): Path<JournalId>,
    Json(payload): Json<ReverseRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.ledger.reverse(id, &actor, &payload.reason).await?;
    Ok(Json(ReversalView::from(outcome)))
}
