use serde::{Deserialize, Serialize};

use crate::types::{Bill, BillOverride, ClearedTransaction, Frequency, Settings};

#[derive(Debug, Serialize)]
pub struct SetupStatusResponse {
    pub needs_setup: bool,
    pub allow_registration: bool,
    pub has_users: bool,
}

/// Per-user financial settings as sent by clients. Shared by the setup,
/// registration, and settings-update endpoints.
#[derive(Debug, Deserialize)]
pub struct SettingsPayload {
    pub income_per_paycheck: f64,
    pub payroll_day_1: i32,
    pub payroll_day_2: i32,
    pub bills_account_name: String,
    pub bills_account_deposit: f64,
    pub personal_account_name: String,
    pub personal_account_deposit: f64,
    pub savings_account_1_name: String,
    pub savings_account_1_deposit: f64,
    pub savings_account_2_name: String,
    pub starting_balance: f64,
}

#[derive(Debug, Deserialize)]
pub struct BillPayload {
    pub name: String,
    pub base_amount: f64,
    pub due_day: i32,
    pub frequency: Frequency,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
    pub settings: SettingsPayload,
    #[serde(default)]
    pub bills: Vec<BillPayload>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSystemSettingsRequest {
    pub allow_registration: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_bills: i64,
}

#[derive(Debug, Serialize)]
pub struct ToggleAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub bill_id: String,
    pub year: i32,
    pub month: i32,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct ToggleClearedRequest {
    pub transaction_key: String,
}

#[derive(Debug, Serialize)]
pub struct ClearedStateResponse {
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolvedAmountResponse {
    pub bill_id: String,
    pub year: i32,
    pub month: i32,
    pub amount: f64,
}

/// Point-in-time dump of a user's data. Not a versioned format.
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub exported_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
    pub settings: Option<Settings>,
    pub bills: Vec<Bill>,
    pub overrides: Vec<BillOverride>,
    pub cleared_transactions: Vec<ClearedTransaction>,
}
