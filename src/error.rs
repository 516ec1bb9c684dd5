use std::fmt;

use thiserror::Error;

/// A statement row that could not be turned into a record. Collected and
/// reported alongside the rows that did parse.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MalformedRow {
    pub line: u64,
    pub reason: String,
}

impl fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum LucidError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unrecognized column layout for {format} file: {detail}")]
    SchemaMismatch { format: String, detail: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Budget conflict: {0}")]
    BudgetConflict(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LucidError>;
