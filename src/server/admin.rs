use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{AdminStatsResponse, ToggleAdminResponse, UpdateSystemSettingsRequest};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_system_settings))
        .route("/settings", put(update_system_settings))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/toggle-admin", post(toggle_admin))
        .route("/stats", get(stats))
}

pub async fn get_system_settings(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let settings = state
        .store
        .get_system_settings()
        .api_err("Failed to read system settings")?;

    Ok::<_, ApiError>(Json(settings))
}

pub async fn update_system_settings(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSystemSettingsRequest>,
) -> impl IntoResponse {
    let updated = state
        .store
        .update_system_settings(req.allow_registration)
        .api_err("Failed to update system settings")?;

    Ok::<_, ApiError>(Json(updated))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Password hashes are skipped during serialization
    let users = state.store.list_users().api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(users))
}

pub async fn delete_user(
    RequireAdmin(session): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if id == session.user_id {
        return Err(ApiError::forbidden("Cannot delete your own account"));
    }

    // Cascades to settings, bills, overrides, and cleared transactions.
    // Idempotent: deleting an unknown id is still a 204.
    state
        .store
        .delete_user(&id)
        .api_err("Failed to delete user")?;
    state.sessions.destroy_user_sessions(&id);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn toggle_admin(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let is_admin = !user.is_admin;
    state
        .store
        .set_user_admin(&user.id, is_admin)
        .api_err("Failed to update user")?;

    Ok::<_, ApiError>(Json(ToggleAdminResponse { is_admin }))
}

pub async fn stats(_admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let total_users = state.store.count_users().api_err("Failed to count users")?;
    let total_admins = state
        .store
        .count_admins()
        .api_err("Failed to count admins")?;
    let total_bills = state.store.count_bills().api_err("Failed to count bills")?;

    Ok::<_, ApiError>(Json(AdminStatsResponse {
        total_users,
        total_admins,
        total_bills,
    }))
}
