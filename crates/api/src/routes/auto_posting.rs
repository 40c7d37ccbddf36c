//! Auto-posting routes.
//!
//! `/auto-posting/notifications` is where business modules announce
//! transactions. The notification is handed to the event bus and the
//! response never reflects whether posting succeeded.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use blud_core::events::{DomainEvent, Publisher};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{RequiredActor, validated};
use crate::views::JournalDetailView;

/// Creates the auto-posting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auto-posting/manual", post(manual_auto_post))
        .route("/auto-posting/notifications", post(notify))
}

/// Request body for a manual auto-post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualAutoPostRequest {
    /// Kind of business transaction.
    #[serde(alias = "source_type")]
    #[validate(length(min = 1, message = "sourceType is required"))]
    pub source_type: String,
    /// Identifier in the originating module.
    #[serde(alias = "source_id")]
    #[validate(length(min = 1, message = "sourceId is required"))]
    pub source_id: String,
    /// Raw transaction payload.
    #[serde(alias = "transaction_data", default)]
    pub transaction_data: Value,
}

/// What happened to the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// `transaction.created`
    Created,
    /// `transaction.updated`
    Updated,
    /// `transaction.deleted`
    Deleted,
}

/// A transaction notification from a business module.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// What happened.
    pub event: NotificationKind,
    /// Kind of business transaction.
    #[serde(alias = "source_type")]
    #[validate(length(min = 1, message = "sourceType is required"))]
    pub source_type: String,
    /// Identifier in the originating module.
    #[serde(alias = "source_id")]
    #[validate(length(min = 1, message = "sourceId is required"))]
    pub source_id: String,
    /// Transaction payload; ignored for deletions.
    #[serde(default)]
    pub data: Value,
}

impl NotificationRequest {
    fn into_event(self) -> DomainEvent {
        match self.event {
            NotificationKind::Created => DomainEvent::TransactionCreated {
                source_type: self.source_type,
                source_id: self.source_id,
                data: self.data,
            },
            NotificationKind::Updated => DomainEvent::TransactionUpdated {
                source_type: self.source_type,
                source_id: self.source_id,
                new_data: self.data,
            },
            NotificationKind::Deleted => DomainEvent::TransactionDeleted {
                source_type: self.source_type,
                source_id: self.source_id,
            },
        }
    }
}

/// POST `/auto-posting/manual` - Post a transaction now and return the journal.
async fn manual_auto_post(
    State(state): State<AppState>,
    RequiredActor(actor): RequiredActor,
    Json(payload): Json<ManualAutoPostRequest>,
) -> ApiResult<impl IntoResponse> {
    let payload = validated(payload)?;
    let journal = state
        .engine
        .manual_auto_post(
            &payload.source_type,
            &payload.source_id,
            &payload.transaction_data,
        )
        .await?;
    info!(
        source_type = %payload.source_type,
        source_id = %payload.source_id,
        journal_number = %journal.entry.journal_number,
        actor = %actor,
        "Manual auto-post completed"
    );
    Ok((StatusCode::CREATED, Json(JournalDetailView::from(journal))))
}

/// POST `/auto-posting/notifications` - Accept a transaction notification.
async fn notify(
    State(state): State<AppState>,
    Json(payload): Json<NotificationRequest>,
) -> ApiResult<impl IntoResponse> {
    let payload = validated(payload)?;
    let event = payload.into_event();
    let topic = event.topic();
    debug!(%topic, background = state.background_dispatch, "Transaction notification received");

    if state.background_dispatch {
        state.bus.dispatch(event);
    } else {
        state.bus.publish(event).await;
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": true, "topic": topic.as_str() })),
    ))
}
