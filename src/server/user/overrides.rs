use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::SetOverrideRequest;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_amount, validate_month};
use crate::types::BillOverride;

pub async fn list_overrides(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let overrides = state
        .store
        .list_overrides(&session.user_id)
        .api_err("Failed to list overrides")?;

    Ok::<_, ApiError>(Json(overrides))
}

pub async fn set_override(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetOverrideRequest>,
) -> impl IntoResponse {
    validate_month(req.month)?;
    validate_amount(req.amount)?;

    // The bill must belong to the acting user; the schema does not
    // enforce this cross-entity rule.
    state
        .store
        .get_bill(&req.bill_id)
        .api_err("Failed to get bill")?
        .filter(|b| b.user_id == session.user_id)
        .or_not_found("Bill not found")?;

    let override_row = BillOverride {
        user_id: session.user_id,
        bill_id: req.bill_id,
        year: req.year,
        month: req.month,
        amount: req.amount,
    };

    // Last writer wins on the (bill, year, month) key
    state
        .store
        .upsert_override(&override_row)
        .api_err("Failed to set override")?;

    Ok::<_, ApiError>(Json(override_row))
}

pub async fn delete_override(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path((bill_id, year, month)): Path<(String, i32, i32)>,
) -> impl IntoResponse {
    state
        .store
        .delete_override(&session.user_id, &bill_id, year, month)
        .api_err("Failed to delete override")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
