use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Global admin-controlled configuration. Single row, fixed id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    pub allow_registration: bool,
    pub updated_at: DateTime<Utc>,
}

/// Per-user financial configuration. One row per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    pub user_id: String,
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
    pub setup_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How often a bill recurs. Informational only: the server never projects
/// occurrences from it; clients decide which months a bill applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "semi-annual")]
    SemiAnnual,
    #[serde(rename = "annual")]
    Annual,
}

impl Frequency {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnual => "semi-annual",
            Frequency::Annual => "annual",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "semi-annual" => Ok(Frequency::SemiAnnual),
            "annual" => Ok(Frequency::Annual),
            other => Err(Error::BadRequest(format!("invalid frequency: {other}"))),
        }
    }
}

/// A recurring financial obligation. `due_day` is 1-indexed (1-31).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub base_amount: f64,
    pub due_day: i32,
    pub frequency: Frequency,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// The effective amount due for one (year, month) occurrence: the
    /// override amount when one exists for that exact period, otherwise
    /// the base amount. A pure lookup, never a projection.
    #[must_use]
    pub fn effective_amount(&self, override_row: Option<&BillOverride>) -> f64 {
        match override_row {
            Some(o) => o.amount,
            None => self.base_amount,
        }
    }
}

/// A one-time amount substitution for a bill in a specific period.
/// `month` is 0-indexed (0-11), unlike the 1-indexed day-of-month fields;
/// this matches the stored wire format and is preserved deliberately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillOverride {
    pub user_id: String,
    pub bill_id: String,
    pub year: i32,
    pub month: i32,
    pub amount: f64,
}

/// Presence of a row marks a bill instance as paid/reconciled. The key is
/// caller-constructed and opaque to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearedTransaction {
    pub user_id: String,
    pub transaction_key: String,
    pub cleared_at: DateTime<Utc>,
}
