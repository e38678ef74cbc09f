use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<Settings> {
    Ok(Settings {
        id: row.get(0)?,
        user_id: row.get(1)?,
        income_per_paycheck: row.get(2)?,
        payroll_day_1: row.get(3)?,
        payroll_day_2: row.get(4)?,
        bills_account_name: row.get(5)?,
        bills_account_deposit: row.get(6)?,
        personal_account_name: row.get(7)?,
        personal_account_deposit: row.get(8)?,
        savings_account_1_name: row.get(9)?,
        savings_account_1_deposit: row.get(10)?,
        savings_account_2_name: row.get(11)?,
        starting_balance: row.get(12)?,
        setup_completed: row.get(13)?,
        created_at: parse_datetime(&row.get::<_, String>(14)?),
        updated_at: parse_datetime(&row.get::<_, String>(15)?),
    })
}

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    let frequency: String = row.get(5)?;
    let frequency = frequency.parse::<Frequency>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Bill {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        base_amount: row.get(3)?,
        due_day: row.get(4)?,
        frequency,
        notes: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn override_from_row(row: &Row<'_>) -> rusqlite::Result<BillOverride> {
    Ok(BillOverride {
        user_id: row.get(0)?,
        bill_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        amount: row.get(4)?,
    })
}

fn cleared_from_row(row: &Row<'_>) -> rusqlite::Result<ClearedTransaction> {
    Ok(ClearedTransaction {
        user_id: row.get(0)?,
        transaction_key: row.get(1)?,
        cleared_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, created_at";
const SETTINGS_COLUMNS: &str = "id, user_id, income_per_paycheck, payroll_day_1, payroll_day_2, \
     bills_account_name, bills_account_deposit, personal_account_name, personal_account_deposit, \
     savings_account_1_name, savings_account_1_deposit, savings_account_2_name, starting_balance, \
     setup_completed, created_at, updated_at";
const BILL_COLUMNS: &str =
    "id, user_id, name, base_amount, due_day, frequency, notes, created_at, updated_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        // Seed the singleton system settings row on first boot
        conn.execute(
            "INSERT OR IGNORE INTO system_settings (id, allow_registration) VALUES (1, 1)",
            [],
        )?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.username,
                user.password_hash,
                user.is_admin,
                format_datetime(&user.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id"
        ))?;

        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user_password(&self, id: &str, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_user_admin(&self, id: &str, is_admin: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET is_admin = ?1 WHERE id = ?2",
            params![is_admin, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_users(&self) -> Result<i64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_admins(&self) -> Result<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // System settings

    fn get_system_settings(&self) -> Result<SystemSettings> {
        let conn = self.conn();
        conn.query_row(
            "SELECT allow_registration, updated_at FROM system_settings WHERE id = 1",
            [],
            |row| {
                Ok(SystemSettings {
                    allow_registration: row.get(0)?,
                    updated_at: parse_datetime(&row.get::<_, String>(1)?),
                })
            },
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    fn update_system_settings(&self, allow_registration: bool) -> Result<SystemSettings> {
        let rows = self.conn().execute(
            "UPDATE system_settings SET allow_registration = ?1, updated_at = ?2 WHERE id = 1",
            params![allow_registration, format_datetime(&Utc::now())],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        self.get_system_settings()
    }

    // Per-user settings

    fn create_settings(&self, settings: &Settings) -> Result<()> {
        let result = self.conn().execute(
            &format!(
                "INSERT INTO settings ({SETTINGS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                settings.id,
                settings.user_id,
                settings.income_per_paycheck,
                settings.payroll_day_1,
                settings.payroll_day_2,
                settings.bills_account_name,
                settings.bills_account_deposit,
                settings.personal_account_name,
                settings.personal_account_deposit,
                settings.savings_account_1_name,
                settings.savings_account_1_deposit,
                settings.savings_account_2_name,
                settings.starting_balance,
                settings.setup_completed,
                format_datetime(&settings.created_at),
                format_datetime(&settings.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE user_id = ?1"),
            params![user_id],
            settings_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_settings(&self, settings: &Settings) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE settings SET
                income_per_paycheck = ?1, payroll_day_1 = ?2, payroll_day_2 = ?3,
                bills_account_name = ?4, bills_account_deposit = ?5,
                personal_account_name = ?6, personal_account_deposit = ?7,
                savings_account_1_name = ?8, savings_account_1_deposit = ?9,
                savings_account_2_name = ?10, starting_balance = ?11,
                setup_completed = ?12, updated_at = ?13
             WHERE user_id = ?14",
            params![
                settings.income_per_paycheck,
                settings.payroll_day_1,
                settings.payroll_day_2,
                settings.bills_account_name,
                settings.bills_account_deposit,
                settings.personal_account_name,
                settings.personal_account_deposit,
                settings.savings_account_1_name,
                settings.savings_account_1_deposit,
                settings.savings_account_2_name,
                settings.starting_balance,
                settings.setup_completed,
                format_datetime(&settings.updated_at),
                settings.user_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Bill operations

    fn create_bill(&self, bill: &Bill) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO bills ({BILL_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                bill.id,
                bill.user_id,
                bill.name,
                bill.base_amount,
                bill.due_day,
                bill.frequency.as_str(),
                bill.notes,
                format_datetime(&bill.created_at),
                format_datetime(&bill.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_bill(&self, id: &str) -> Result<Option<Bill>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"),
            params![id],
            bill_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_bills(&self, user_id: &str) -> Result<Vec<Bill>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE user_id = ?1 ORDER BY due_day, name"
        ))?;

        let rows = stmt.query_map(params![user_id], bill_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_bill(&self, bill: &Bill) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE bills SET
                name = ?1, base_amount = ?2, due_day = ?3, frequency = ?4, notes = ?5,
                updated_at = ?6
             WHERE id = ?7 AND user_id = ?8",
            params![
                bill.name,
                bill.base_amount,
                bill.due_day,
                bill.frequency.as_str(),
                bill.notes,
                format_datetime(&bill.updated_at),
                bill.id,
                bill.user_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_bill(&self, id: &str, user_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM bills WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn count_bills(&self) -> Result<i64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM bills", [], |row| row.get(0))?;
        Ok(count)
    }

    // Override operations

    fn upsert_override(&self, override_row: &BillOverride) -> Result<()> {
        self.conn().execute(
            "INSERT INTO overrides (user_id, bill_id, year, month, amount)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (bill_id, year, month) DO UPDATE SET
                amount = excluded.amount",
            params![
                override_row.user_id,
                override_row.bill_id,
                override_row.year,
                override_row.month,
                override_row.amount,
            ],
        )?;
        Ok(())
    }

    fn get_override(&self, bill_id: &str, year: i32, month: i32) -> Result<Option<BillOverride>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT user_id, bill_id, year, month, amount
             FROM overrides WHERE bill_id = ?1 AND year = ?2 AND month = ?3",
            params![bill_id, year, month],
            override_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_overrides(&self, user_id: &str) -> Result<Vec<BillOverride>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, bill_id, year, month, amount
             FROM overrides WHERE user_id = ?1 ORDER BY year, month, bill_id",
        )?;

        let rows = stmt.query_map(params![user_id], override_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_override(&self, user_id: &str, bill_id: &str, year: i32, month: i32) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM overrides
             WHERE bill_id = ?1 AND year = ?2 AND month = ?3 AND user_id = ?4",
            params![bill_id, year, month, user_id],
        )?;
        Ok(rows > 0)
    }

    // Cleared transaction operations

    fn create_cleared(&self, cleared: &ClearedTransaction) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO cleared_transactions (user_id, transaction_key, cleared_at)
             VALUES (?1, ?2, ?3)",
            params![
                cleared.user_id,
                cleared.transaction_key,
                format_datetime(&cleared.cleared_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    fn get_cleared(
        &self,
        user_id: &str,
        transaction_key: &str,
    ) -> Result<Option<ClearedTransaction>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT user_id, transaction_key, cleared_at
             FROM cleared_transactions WHERE user_id = ?1 AND transaction_key = ?2",
            params![user_id, transaction_key],
            cleared_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cleared(&self, user_id: &str) -> Result<Vec<ClearedTransaction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, transaction_key, cleared_at
             FROM cleared_transactions WHERE user_id = ?1 ORDER BY transaction_key",
        )?;

        let rows = stmt.query_map(params![user_id], cleared_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_cleared(&self, user_id: &str, transaction_key: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM cleared_transactions WHERE user_id = ?1 AND transaction_key = ?2",
            params![user_id, transaction_key],
        )?;
        Ok(rows > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
