use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{CredentialHasher, MaybeAuth, RequireAuth, clear_cookie, session_cookie};
use crate::server::AppState;
use crate::server::dto::{
    AuthStatusResponse, BillPayload, ChangePasswordRequest, CreateAccountRequest, LoginRequest,
    SessionResponse, SettingsPayload, SetupStatusResponse,
};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::{
    validate_amount, validate_bill_name, validate_day_of_month, validate_password,
    validate_username,
};
use crate::types::{Bill, Settings, User};

const LOGIN_FAILED: &str = "Invalid username or password";

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        // Bootstrap
        .route("/setup/status", get(setup_status))
        .route("/setup/initialize", post(initialize))
        // Sessions
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/status", get(status))
        .route("/auth/change-password", post(change_password))
}

pub async fn setup_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let user_count = state
        .store
        .count_users()
        .api_err("Failed to check setup status")?;
    let system = state
        .store
        .get_system_settings()
        .api_err("Failed to read system settings")?;

    Ok::<_, ApiError>(Json(SetupStatusResponse {
        needs_setup: user_count == 0,
        allow_registration: system.allow_registration,
        has_users: user_count > 0,
    }))
}

pub async fn initialize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let user_count = state
        .store
        .count_users()
        .api_err("Failed to check setup status")?;
    if user_count > 0 {
        return Err(ApiError::conflict("Setup already completed"));
    }

    // First account is always the admin
    let user = create_account(&state, &req, true)?;
    let session = state.sessions.create(&user);

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Json(SessionResponse {
            username: user.username,
            is_admin: user.is_admin,
        }),
    ))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let system = state
        .store
        .get_system_settings()
        .api_err("Failed to read system settings")?;
    if !system.allow_registration {
        return Err(ApiError::forbidden(
            "Registration is currently disabled. Please contact an administrator.",
        ));
    }

    if state
        .store
        .get_user_by_username(&req.username)
        .api_err("Failed to check username")?
        .is_some()
    {
        return Err(ApiError::conflict("Username already exists"));
    }

    let user = create_account(&state, &req, false)?;
    let session = state.sessions.create(&user);

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Json(SessionResponse {
            username: user.username,
            is_admin: user.is_admin,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    // Identical message for unknown username and bad password, so the
    // endpoint cannot be used to enumerate accounts.
    let user = state
        .store
        .get_user_by_username(&req.username)
        .api_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized(LOGIN_FAILED))?;

    let hasher = CredentialHasher::new();
    let valid = hasher
        .verify(&req.password, &user.password_hash)
        .api_err("Failed to verify password")?;
    if !valid {
        return Err(ApiError::unauthorized(LOGIN_FAILED));
    }

    let session = state.sessions.create(&user);

    Ok::<_, ApiError>((
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Json(SessionResponse {
            username: user.username,
            is_admin: user.is_admin,
        }),
    ))
}

pub async fn logout(auth: MaybeAuth, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let MaybeAuth(Some(session)) = auth {
        state.sessions.destroy(&session.id);
    }

    (
        [(header::SET_COOKIE, clear_cookie())],
        StatusCode::NO_CONTENT,
    )
}

pub async fn status(auth: MaybeAuth) -> impl IntoResponse {
    let body = match auth.0 {
        Some(session) => AuthStatusResponse {
            authenticated: true,
            username: Some(session.username),
            is_admin: Some(session.is_admin),
        },
        None => AuthStatusResponse {
            authenticated: false,
            username: None,
            is_admin: None,
        },
    };
    Json(body)
}

pub async fn change_password(
    RequireAuth(session): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    validate_password(&req.new_password)?;

    let user = state
        .store
        .get_user(&session.user_id)
        .api_err("Failed to look up user")?
        .or_not_found("User not found")?;

    let hasher = CredentialHasher::new();
    let valid = hasher
        .verify(&req.current_password, &user.password_hash)
        .api_err("Failed to verify password")?;
    if !valid {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let new_hash = hasher
        .hash(&req.new_password)
        .api_err("Failed to hash password")?;
    state
        .store
        .update_user_password(&user.id, &new_hash)
        .api_err("Failed to update password")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Creates a user together with its settings row and any initial bills.
/// Inserts are independent, matching the original setup flow: a bill
/// failure does not roll back the account.
fn create_account(
    state: &Arc<AppState>,
    req: &CreateAccountRequest,
    is_admin: bool,
) -> Result<User, ApiError> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_settings_payload(&req.settings)?;
    for bill in &req.bills {
        validate_bill_payload(bill)?;
    }

    let hasher = CredentialHasher::new();
    let password_hash = hasher
        .hash(&req.password)
        .api_err("Failed to hash password")?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: req.username.clone(),
        password_hash,
        is_admin,
        created_at: now,
    };

    match state.store.create_user(&user) {
        Ok(()) => {}
        Err(crate::error::Error::AlreadyExists) => {
            return Err(ApiError::conflict("Username already exists"));
        }
        Err(e) => {
            tracing::error!("Failed to create user: {e}");
            return Err(ApiError::internal("Failed to create user"));
        }
    }

    let settings = settings_from_payload(&req.settings, &user.id);
    state
        .store
        .create_settings(&settings)
        .api_err("Failed to create settings")?;

    for bill in &req.bills {
        let bill = bill_from_payload(bill, &user.id);
        state
            .store
            .create_bill(&bill)
            .api_err("Failed to create bill")?;
    }

    Ok(user)
}

pub(super) fn validate_settings_payload(settings: &SettingsPayload) -> Result<(), ApiError> {
    validate_day_of_month(settings.payroll_day_1)?;
    validate_day_of_month(settings.payroll_day_2)?;
    validate_amount(settings.income_per_paycheck)?;
    validate_amount(settings.bills_account_deposit)?;
    validate_amount(settings.personal_account_deposit)?;
    validate_amount(settings.savings_account_1_deposit)?;
    Ok(())
}

pub(super) fn validate_bill_payload(bill: &BillPayload) -> Result<(), ApiError> {
    validate_bill_name(&bill.name)?;
    validate_amount(bill.base_amount)?;
    validate_day_of_month(bill.due_day)?;
    Ok(())
}

pub(super) fn settings_from_payload(payload: &SettingsPayload, user_id: &str) -> Settings {
    let now = Utc::now();
    Settings {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        income_per_paycheck: payload.income_per_paycheck,
        payroll_day_1: payload.payroll_day_1,
        payroll_day_2: payload.payroll_day_2,
        bills_account_name: payload.bills_account_name.clone(),
        bills_account_deposit: payload.bills_account_deposit,
        personal_account_name: payload.personal_account_name.clone(),
        personal_account_deposit: payload.personal_account_deposit,
        savings_account_1_name: payload.savings_account_1_name.clone(),
        savings_account_1_deposit: payload.savings_account_1_deposit,
        savings_account_2_name: payload.savings_account_2_name.clone(),
        starting_balance: payload.starting_balance,
        setup_completed: true,
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn bill_from_payload(payload: &BillPayload, user_id: &str) -> Bill {
    let now = Utc::now();
    Bill {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: payload.name.clone(),
        base_amount: payload.base_amount,
        due_day: payload.due_day,
        frequency: payload.frequency,
        notes: payload.notes.clone().unwrap_or_default(),
        created_at: now,
        updated_at: now,
    }
}
