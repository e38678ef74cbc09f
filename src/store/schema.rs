pub const SCHEMA: &str = r#"
-- Accounts; the first user created becomes admin
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2id hash with embedded salt
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Global admin-controlled settings (singleton row)
CREATE TABLE IF NOT EXISTS system_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    allow_registration INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Per-user financial configuration (one row per user)
CREATE TABLE IF NOT EXISTS settings (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    income_per_paycheck REAL NOT NULL,
    payroll_day_1 INTEGER NOT NULL,
    payroll_day_2 INTEGER NOT NULL,
    bills_account_name TEXT NOT NULL,
    bills_account_deposit REAL NOT NULL,
    personal_account_name TEXT NOT NULL,
    personal_account_deposit REAL NOT NULL,
    savings_account_1_name TEXT NOT NULL,
    savings_account_1_deposit REAL NOT NULL,
    savings_account_2_name TEXT NOT NULL,
    starting_balance REAL NOT NULL,
    setup_completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Recurring bills. due_day is 1-indexed; frequency is informational
CREATE TABLE IF NOT EXISTS bills (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    base_amount REAL NOT NULL,
    due_day INTEGER NOT NULL CHECK (due_day >= 1 AND due_day <= 31),
    frequency TEXT NOT NULL CHECK (frequency IN ('monthly', 'quarterly', 'semi-annual', 'annual')),
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- One-time amount substitutions. month is 0-indexed (stored wire format)
CREATE TABLE IF NOT EXISTS overrides (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    bill_id TEXT NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month >= 0 AND month <= 11),
    amount REAL NOT NULL,
    PRIMARY KEY (bill_id, year, month)
);

-- Presence of a row marks a bill instance as cleared
CREATE TABLE IF NOT EXISTS cleared_transactions (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    transaction_key TEXT NOT NULL,
    cleared_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, transaction_key)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_bills_user ON bills(user_id);
CREATE INDEX IF NOT EXISTS idx_overrides_user ON overrides(user_id);
CREATE INDEX IF NOT EXISTS idx_cleared_user ON cleared_transactions(user_id);
"#;
