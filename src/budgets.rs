use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};

use crate::error::{LucidError, Result};
use crate::models::{BudgetEntry, TxnType};

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
    pub year: i32,
    /// `None` sets the yearly amount; `Some(m)` overrides one month.
    pub month: Option<u32>,
    pub amount: i64,
}

/// Largest accepted amount in cents (one trillion). Keeps yearly and
/// full-year totals well inside i64.
pub const MAX_AMOUNT: i64 = 100_000_000_000_000;

fn validate_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(LucidError::InvalidBudget("budget amount must not be negative".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(LucidError::InvalidBudget(format!(
            "budget amount must not exceed {} cents",
            MAX_AMOUNT
        )));
    }
    Ok(())
}

fn validate(budget: &NewBudget) -> Result<()> {
    if budget.category.trim().is_empty() {
        return Err(LucidError::InvalidBudget("budget category must not be empty".to_string()));
    }
    if let Some(m) = budget.month {
        if !(1..=12).contains(&m) {
            return Err(LucidError::InvalidBudget(format!("month must be between 1 and 12, got {m}")));
        }
    }
    validate_amount(budget.amount)
}

fn describe(budget: &NewBudget) -> String {
    let period = match budget.month {
        Some(m) => format!("{}-{m:02}", budget.year),
        None => budget.year.to_string(),
    };
    match &budget.sub_type {
        Some(s) => format!("{} / {} / {s} for {period}", budget.txn_type, budget.category),
        None => format!("{} / {} for {period}", budget.txn_type, budget.category),
    }
}

fn normalize_sub_type(sub_type: &Option<String>) -> Option<String> {
    sub_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Insert a budget entry. A second entry for the same
/// (type, category, sub_type, year, month) key is a `BudgetConflict`.
pub fn create(conn: &Connection, budget: &NewBudget) -> Result<i64> {
    validate(budget)?;
    let sub_type = normalize_sub_type(&budget.sub_type);
    let inserted = conn.execute(
        "INSERT INTO budget_entries (txn_type, category, sub_type, year, month, amount) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            budget.txn_type,
            budget.category.trim(),
            sub_type,
            budget.year,
            budget.month,
            budget.amount,
        ],
    );
    match inserted {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(LucidError::BudgetConflict(describe(budget)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the entry, or replace the amount of the existing one with the same key.
pub fn set(conn: &Connection, budget: &NewBudget) -> Result<i64> {
    validate(budget)?;
    let sub_type = normalize_sub_type(&budget.sub_type);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM budget_entries WHERE txn_type = ?1 AND category = ?2 \
             AND IFNULL(sub_type, '') = IFNULL(?3, '') AND year = ?4 AND IFNULL(month, 0) = IFNULL(?5, 0)",
            rusqlite::params![budget.txn_type, budget.category.trim(), sub_type, budget.year, budget.month],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => {
            update_amount(conn, id, budget.amount)?;
            Ok(id)
        }
        None => create(conn, budget),
    }
}

pub fn update_amount(conn: &Connection, id: i64, amount: i64) -> Result<()> {
    validate_amount(amount)?;
    let n = conn.execute(
        "UPDATE budget_entries SET amount = ?1, updated_at = datetime('now') WHERE id = ?2",
        rusqlite::params![amount, id],
    )?;
    if n == 0 {
        return Err(LucidError::NotFound(format!("budget entry {id}")));
    }
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM budget_entries WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(LucidError::NotFound(format!("budget entry {id}")));
    }
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<BudgetEntry> {
    conn.query_row(&format!("{SELECT_BUDGET} WHERE id = ?1"), [id], map_budget)
        .optional()?
        .ok_or_else(|| LucidError::NotFound(format!("budget entry {id}")))
}

/// Entries for one year (or all years), yearly entries before monthly overrides.
pub fn list(conn: &Connection, year: Option<i32>) -> Result<Vec<BudgetEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_BUDGET} WHERE (?1 IS NULL OR year = ?1) \
         ORDER BY year DESC, txn_type, category, IFNULL(sub_type, ''), IFNULL(month, 0)"
    ))?;
    let rows = stmt
        .query_map([year], map_budget)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

const SELECT_BUDGET: &str =
    "SELECT id, txn_type, category, sub_type, year, month, amount FROM budget_entries";

fn map_budget(row: &Row<'_>) -> rusqlite::Result<BudgetEntry> {
    Ok(BudgetEntry {
        id: row.get(0)?,
        txn_type: row.get(1)?,
        category: row.get(2)?,
        sub_type: row.get(3)?,
        year: row.get(4)?,
        month: row.get(5)?,
        amount: row.get(6)?,
    })
}
