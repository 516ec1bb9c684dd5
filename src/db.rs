use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS processed_files (
    id INTEGER PRIMARY KEY,
    fingerprint TEXT NOT NULL UNIQUE,
    format TEXT NOT NULL,
    filename TEXT,
    record_count INTEGER NOT NULL DEFAULT 0,
    processed_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    txn_type TEXT NOT NULL,
    category TEXT NOT NULL,
    sub_type TEXT,
    amount INTEGER NOT NULL,
    description TEXT NOT NULL,
    source TEXT NOT NULL,
    source_file TEXT,
    merchant_category TEXT,
    sub_type_hint TEXT,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    fingerprint TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_year_month ON transactions (year, month);
CREATE INDEX IF NOT EXISTS idx_transactions_type_category ON transactions (txn_type, category);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    pattern TEXT NOT NULL,
    match_type TEXT NOT NULL DEFAULT 'contains',
    case_sensitive INTEGER NOT NULL DEFAULT 0,
    amount_operator TEXT,
    amount_value INTEGER,
    txn_type TEXT NOT NULL,
    category TEXT NOT NULL,
    sub_type TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS budget_entries (
    id INTEGER PRIMARY KEY,
    txn_type TEXT NOT NULL,
    category TEXT NOT NULL,
    sub_type TEXT,
    year INTEGER NOT NULL,
    month INTEGER,
    amount INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_budget_entry_key ON budget_entries
    (txn_type, category, IFNULL(sub_type, ''), year, IFNULL(month, 0));
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["processed_files", "transactions", "rules", "budget_entries"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_budget_key_index_treats_null_month_as_one_key() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO budget_entries (txn_type, category, year, month, amount) VALUES ('Expenses', 'Housing', 2025, NULL, 100)",
            [],
        ).unwrap();
        let dup = conn.execute(
            "INSERT INTO budget_entries (txn_type, category, year, month, amount) VALUES ('Expenses', 'Housing', 2025, NULL, 200)",
            [],
        );
        assert!(dup.is_err(), "second yearly entry for the same key must be rejected");
        conn.execute(
            "INSERT INTO budget_entries (txn_type, category, year, month, amount) VALUES ('Expenses', 'Housing', 2025, 3, 150)",
            [],
        ).unwrap();
    }
}
