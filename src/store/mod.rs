mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn update_user_password(&self, id: &str, password_hash: &str) -> Result<()>;
    fn set_user_admin(&self, id: &str, is_admin: bool) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn count_users(&self) -> Result<i64>;
    fn count_admins(&self) -> Result<i64>;

    // System settings (singleton row)
    fn get_system_settings(&self) -> Result<SystemSettings>;
    fn update_system_settings(&self, allow_registration: bool) -> Result<SystemSettings>;

    // Per-user settings
    fn create_settings(&self, settings: &Settings) -> Result<()>;
    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>>;
    fn update_settings(&self, settings: &Settings) -> Result<()>;

    // Bill operations
    fn create_bill(&self, bill: &Bill) -> Result<()>;
    fn get_bill(&self, id: &str) -> Result<Option<Bill>>;
    fn list_bills(&self, user_id: &str) -> Result<Vec<Bill>>;
    fn update_bill(&self, bill: &Bill) -> Result<()>;
    fn delete_bill(&self, id: &str, user_id: &str) -> Result<bool>;
    fn count_bills(&self) -> Result<i64>;

    // Override operations (upsert on the period key)
    fn upsert_override(&self, override_row: &BillOverride) -> Result<()>;
    fn get_override(&self, bill_id: &str, year: i32, month: i32) -> Result<Option<BillOverride>>;
    fn list_overrides(&self, user_id: &str) -> Result<Vec<BillOverride>>;
    fn delete_override(&self, user_id: &str, bill_id: &str, year: i32, month: i32) -> Result<bool>;

    // Cleared transaction operations
    fn create_cleared(&self, cleared: &ClearedTransaction) -> Result<()>;
    fn get_cleared(&self, user_id: &str, transaction_key: &str)
    -> Result<Option<ClearedTransaction>>;
    fn list_cleared(&self, user_id: &str) -> Result<Vec<ClearedTransaction>>;
    fn delete_cleared(&self, user_id: &str, transaction_key: &str) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
