use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::auth::validate_settings_payload;
use crate::server::dto::SettingsPayload;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};

pub async fn get_settings(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let settings = state
        .store
        .get_settings(&session.user_id)
        .api_err("Failed to get settings")?
        .or_not_found("Settings not found")?;

    Ok::<_, ApiError>(Json(settings))
}

pub async fn update_settings(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SettingsPayload>,
) -> impl IntoResponse {
    validate_settings_payload(&req)?;

    let mut settings = state
        .store
        .get_settings(&session.user_id)
        .api_err("Failed to get settings")?
        .or_not_found("Settings not found")?;

    settings.income_per_paycheck = req.income_per_paycheck;
    settings.payroll_day_1 = req.payroll_day_1;
    settings.payroll_day_2 = req.payroll_day_2;
    settings.bills_account_name = req.bills_account_name;
    settings.bills_account_deposit = req.bills_account_deposit;
    settings.personal_account_name = req.personal_account_name;
    settings.personal_account_deposit = req.personal_account_deposit;
    settings.savings_account_1_name = req.savings_account_1_name;
    settings.savings_account_1_deposit = req.savings_account_1_deposit;
    settings.savings_account_2_name = req.savings_account_2_name;
    settings.starting_balance = req.starting_balance;
    settings.updated_at = Utc::now();

    state
        .store
        .update_settings(&settings)
        .api_err("Failed to update settings")?;

    Ok::<_, ApiError>(Json(settings))
}
