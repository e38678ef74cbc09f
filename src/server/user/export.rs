use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::ExportResponse;
use crate::server::response::{ApiError, StoreResultExt};

/// Point-in-time snapshot of everything the user owns. Reads are
/// independent, not one atomic view.
pub async fn export_data(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let settings = state
        .store
        .get_settings(&session.user_id)
        .api_err("Failed to export settings")?;
    let bills = state
        .store
        .list_bills(&session.user_id)
        .api_err("Failed to export bills")?;
    let overrides = state
        .store
        .list_overrides(&session.user_id)
        .api_err("Failed to export overrides")?;
    let cleared_transactions = state
        .store
        .list_cleared(&session.user_id)
        .api_err("Failed to export cleared transactions")?;

    Ok::<_, ApiError>(Json(ExportResponse {
        exported_at: Utc::now(),
        username: session.username,
        settings,
        bills,
        overrides,
        cleared_transactions,
    }))
}
