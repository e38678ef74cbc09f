mod bills;
mod cleared;
mod export;
mod overrides;
mod settings;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
        // Bills
        .route("/bills", get(bills::list_bills))
        .route("/bills", post(bills::create_bill))
        .route("/bills/{id}", put(bills::update_bill))
        .route("/bills/{id}", delete(bills::delete_bill))
        .route(
            "/bills/{id}/amount/{year}/{month}",
            get(bills::resolved_amount),
        )
        // Overrides
        .route("/overrides", get(overrides::list_overrides))
        .route("/overrides", post(overrides::set_override))
        .route(
            "/overrides/{bill_id}/{year}/{month}",
            delete(overrides::delete_override),
        )
        // Cleared transactions
        .route("/cleared", get(cleared::list_cleared))
        .route("/cleared/toggle", post(cleared::toggle_cleared))
        // Export
        .route("/export", get(export::export_data))
}
