use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::auth::{bill_from_payload, validate_bill_payload};
use crate::server::dto::{BillPayload, ResolvedAmountResponse};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_month;

pub async fn list_bills(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Ordered by due_day, then name
    let bills = state
        .store
        .list_bills(&session.user_id)
        .api_err("Failed to list bills")?;

    Ok::<_, ApiError>(Json(bills))
}

pub async fn create_bill(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BillPayload>,
) -> impl IntoResponse {
    validate_bill_payload(&req)?;

    let bill = bill_from_payload(&req, &session.user_id);
    state
        .store
        .create_bill(&bill)
        .api_err("Failed to create bill")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(bill)))
}

pub async fn update_bill(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BillPayload>,
) -> impl IntoResponse {
    validate_bill_payload(&req)?;

    let mut bill = state
        .store
        .get_bill(&id)
        .api_err("Failed to get bill")?
        .filter(|b| b.user_id == session.user_id)
        .or_not_found("Bill not found")?;

    bill.name = req.name;
    bill.base_amount = req.base_amount;
    bill.due_day = req.due_day;
    bill.frequency = req.frequency;
    bill.notes = req.notes.unwrap_or_default();
    bill.updated_at = Utc::now();

    state
        .store
        .update_bill(&bill)
        .api_err("Failed to update bill")?;

    Ok::<_, ApiError>(Json(bill))
}

pub async fn delete_bill(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // Idempotent: the user_id filter makes non-owned ids read as absent
    state
        .store
        .delete_bill(&id, &session.user_id)
        .api_err("Failed to delete bill")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Effective amount for one (year, month) occurrence of an owned bill:
/// the override amount when one exists for that exact period, otherwise
/// the base amount.
pub async fn resolved_amount(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path((id, year, month)): Path<(String, i32, i32)>,
) -> impl IntoResponse {
    validate_month(month)?;

    let bill = state
        .store
        .get_bill(&id)
        .api_err("Failed to get bill")?
        .filter(|b| b.user_id == session.user_id)
        .or_not_found("Bill not found")?;

    let override_row = state
        .store
        .get_override(&bill.id, year, month)
        .api_err("Failed to get override")?;

    Ok::<_, ApiError>(Json(ResolvedAmountResponse {
        amount: bill.effective_amount(override_row.as_ref()),
        bill_id: bill.id,
        year,
        month,
    }))
}
