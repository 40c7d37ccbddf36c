//! API route definitions.

use axum::Router;
use blud_shared::types::AccountId;

use crate::AppState;
use crate::error::ApiError;

pub mod auto_posting;
pub mod general_ledger;
pub mod health;
pub mod journals;
pub mod mapping_rules;
pub mod trial_balance;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(journals::routes())
        .merge(mapping_rules::routes())
        .merge(auto_posting::routes())
        .merge(general_ledger::routes())
        .merge(trial_balance::routes())
}

/// Parses a comma-separated `account_ids` query value.
pub(crate) fn parse_account_ids(raw: Option<&str>) -> Result<Option<Vec<AccountId>>, ApiError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<AccountId>()
                .map_err(|_| ApiError::bad_request("INVALID_ACCOUNT_ID", format!("Invalid account id: {part}")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
