use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{ClearedStateResponse, ToggleClearedRequest};
use crate::server::response::{ApiError, StoreResultExt};
use crate::types::ClearedTransaction;

pub async fn list_cleared(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cleared = state
        .store
        .list_cleared(&session.user_id)
        .api_err("Failed to list cleared transactions")?;

    Ok::<_, ApiError>(Json(cleared))
}

/// Flips the existence of the (user, transaction_key) row and reports the
/// new state. Toggling the same key twice returns to the original state.
pub async fn toggle_cleared(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleClearedRequest>,
) -> impl IntoResponse {
    if req.transaction_key.is_empty() {
        return Err(ApiError::bad_request("Transaction key cannot be empty"));
    }

    let existing = state
        .store
        .get_cleared(&session.user_id, &req.transaction_key)
        .api_err("Failed to check cleared state")?;

    let cleared = if existing.is_some() {
        state
            .store
            .delete_cleared(&session.user_id, &req.transaction_key)
            .api_err("Failed to clear transaction")?;
        false
    } else {
        state
            .store
            .create_cleared(&ClearedTransaction {
                user_id: session.user_id,
                transaction_key: req.transaction_key,
                cleared_at: Utc::now(),
            })
            .api_err("Failed to mark transaction cleared")?;
        true
    };

    Ok::<_, ApiError>(Json(ClearedStateResponse { cleared }))
}
