use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::session::{Session, session_id_from_cookie_header};
use crate::server::AppState;

/// Extractor that requires a live session.
pub struct RequireAuth(pub Session);

/// Extractor that requires a live session with the admin flag set.
pub struct RequireAdmin(pub Session);

/// Extractor that surfaces the session when present but never rejects.
/// Used by endpoints that report auth state instead of demanding it.
pub struct MaybeAuth(pub Option<Session>);

#[derive(Debug)]
pub enum AuthError {
    Unauthenticated,
    NotAdmin,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = extract_session(parts, state).ok_or(AuthError::Unauthenticated)?;
        Ok(RequireAuth(session))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = extract_session(parts, state).ok_or(AuthError::Unauthenticated)?;

        if !session.is_admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(session))
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeAuth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(extract_session(parts, state)))
    }
}

/// Looks up the session referenced by the request's cookie, if any.
/// Expired sessions read as absent.
fn extract_session(parts: &Parts, state: &Arc<AppState>) -> Option<Session> {
    let session_id = parts
        .headers
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| session_id_from_cookie_header(h))?;

    state.sessions.get(&session_id)
}
