pub mod budget;
pub mod import;
pub mod init;
pub mod rules;
pub mod status;
pub mod summary;
pub mod tx;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{LucidError, Result};
use crate::extractor::parse_amount;
use crate::settings::db_path;

/// Open the configured database, failing with a hint when `lucid init` has not run.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(LucidError::Settings(format!(
            "No database found at {}\nRun `lucid init` to set one up.",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// Parse a user-entered amount ("1'850.00", "42,5", "-12") into cents.
pub(crate) fn parse_cents(raw: &str) -> Result<i64> {
    parse_amount(raw).ok_or_else(|| LucidError::Other(format!("Invalid amount: '{raw}'")))
}

/// Parse `--month` given as "MM" or "YYYY-MM". Anything else, or a month
/// outside 1-12, is an error.
pub(crate) fn parse_month_opt(month: &Option<String>) -> Result<(Option<i32>, Option<u32>)> {
    let Some(raw) = month else {
        return Ok((None, None));
    };
    let invalid = || LucidError::Other(format!("Invalid month: '{raw}' (expected MM or YYYY-MM)"));
    let (year, m) = match raw.trim().split_once('-') {
        Some((y, m)) => (Some(y.parse::<i32>().map_err(|_| invalid())?), m),
        None => (None, raw.trim()),
    };
    let m: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&m) {
        return Err(invalid());
    }
    Ok((year, Some(m)))
}

pub(crate) fn split_list(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref().map(|s| {
        s.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    })
}

#[derive(Parser)]
#[command(
    name = "lucid",
    version,
    about = "Statement ingestion, rule-based categorization and budget tracking."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for Lucid data (default: ~/Documents/lucid)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a bank statement or card invoice export.
    Import {
        /// Path to the CSV export, or - for standard input
        file: String,
        /// Statement format: bank or card
        #[arg(long)]
        format: String,
        /// Re-read a file that was already imported; rows already stored are still skipped
        #[arg(long)]
        force: bool,
        /// Show how rows would be classified without writing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage budget entries.
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// List, correct and delete transactions.
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// Budget vs actual for a month or a whole year.
    Summary {
        /// Year (default: newest year with data)
        #[arg(long)]
        year: Option<i32>,
        /// Month: MM or YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Month-by-month actuals and budgets for a year.
    Trend {
        #[arg(long)]
        year: Option<i32>,
        /// Comma-separated category filter
        #[arg(long)]
        categories: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a categorization rule.
    Add {
        /// Pattern to match against transaction descriptions
        pattern: String,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Transaction type: income, expenses, savings
        #[arg(long = "type", default_value = "expenses")]
        txn_type: String,
        #[arg(long = "sub-type")]
        sub_type: Option<String>,
        /// Match type: contains, starts_with, regex
        #[arg(long = "match-type", default_value = "contains")]
        match_type: String,
        #[arg(long = "case-sensitive")]
        case_sensitive: bool,
        /// Amount comparison: <, >, =, <=, >= (compared against the absolute amount)
        #[arg(long = "amount-op", requires = "amount")]
        amount_op: Option<String>,
        /// Amount threshold, e.g. 20.00
        #[arg(long, requires = "amount_op")]
        amount: Option<String>,
        /// Rule priority (lower is evaluated first)
        #[arg(long, default_value = "0")]
        priority: i64,
    },
    /// List all categorization rules in evaluation order.
    List,
    /// Update an existing rule.
    Update {
        /// Rule ID (shown in `lucid rules list`)
        id: i64,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        txn_type: Option<String>,
        #[arg(long = "sub-type")]
        sub_type: Option<String>,
        #[arg(long = "match-type")]
        match_type: Option<String>,
        #[arg(long = "case-sensitive")]
        case_sensitive: Option<bool>,
        #[arg(long = "amount-op")]
        amount_op: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        /// Remove the amount condition
        #[arg(long = "clear-amount", conflicts_with_all = ["amount_op", "amount"])]
        clear_amount: bool,
        #[arg(long)]
        priority: Option<i64>,
        /// Enable or disable the rule
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a rule by ID.
    Delete {
        /// Rule ID (shown in `lucid rules list`)
        id: i64,
        /// Deactivate instead of deleting
        #[arg(long)]
        soft: bool,
    },
    /// Re-run the current rules over every stored transaction.
    Apply,
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a yearly budget, or a monthly override with --month.
    Set {
        /// Transaction type: income, expenses, savings
        #[arg(long = "type", default_value = "expenses")]
        txn_type: String,
        #[arg(long)]
        category: String,
        #[arg(long = "sub-type")]
        sub_type: Option<String>,
        #[arg(long)]
        year: i32,
        /// Month 1-12; omit for a yearly amount
        #[arg(long)]
        month: Option<u32>,
        /// Amount, e.g. 1200.00
        amount: String,
    },
    /// List budget entries.
    List {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete a budget entry by ID.
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// List transactions, newest first.
    List {
        #[arg(long)]
        year: Option<i32>,
        /// Month: MM or YYYY-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "type")]
        txn_type: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Minimum signed amount
        #[arg(long, allow_hyphen_values = true)]
        min: Option<String>,
        /// Maximum signed amount
        #[arg(long, allow_hyphen_values = true)]
        max: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Correct the classification of one transaction.
    Edit {
        id: i64,
        #[arg(long = "type")]
        txn_type: Option<String>,
        #[arg(long)]
        category: String,
        #[arg(long = "sub-type")]
        sub_type: Option<String>,
    },
    /// Delete a transaction.
    Delete {
        id: i64,
    },
}
