use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::error::{LucidError, Result};

// ---------------------------------------------------------------------------
// Statement formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementFormat {
    BankStatement,
    CardInvoice,
}

impl StatementFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank",
            Self::CardInvoice => "card",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank statement",
            Self::CardInvoice => "card invoice",
        }
    }
}

impl FromStr for StatementFormat {
    type Err = LucidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank" | "bank-statement" | "bank_statement" => Ok(Self::BankStatement),
            "card" | "card-invoice" | "card_invoice" => Ok(Self::CardInvoice),
            other => Err(LucidError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Transaction types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TxnType {
    Income,
    Expenses,
    Savings,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expenses => "Expenses",
            Self::Savings => "Savings",
        }
    }

    /// Type for an amount nobody has classified: money out is an expense,
    /// everything else income.
    pub fn from_sign(amount: i64) -> Self {
        if amount < 0 {
            Self::Expenses
        } else {
            Self::Income
        }
    }
}

impl FromStr for TxnType {
    type Err = LucidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expenses" | "expense" => Ok(Self::Expenses),
            "savings" | "saving" => Ok(Self::Savings),
            other => Err(LucidError::Other(format!("Unknown transaction type: {other}"))),
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TxnType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TxnType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: LucidError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for StatementFormat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.key()))
    }
}

impl FromSql for StatementFormat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: LucidError| FromSqlError::Other(Box::new(e)))
    }
}

// ---------------------------------------------------------------------------
// Records and transactions
// ---------------------------------------------------------------------------

/// One parsed statement line. Amounts are signed cents.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub source: StatementFormat,
    pub merchant_category: Option<String>,
    pub sub_type_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
    pub amount: i64,
    pub description: String,
    pub source: StatementFormat,
    pub source_file: Option<String>,
    pub year: i32,
    pub month: u32,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchType {
    Contains,
    StartsWith,
    Regex,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::Regex => "regex",
        }
    }
}

impl FromStr for MatchType {
    type Err = LucidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "contains" => Ok(Self::Contains),
            "starts_with" => Ok(Self::StartsWith),
            "regex" => Ok(Self::Regex),
            other => Err(LucidError::InvalidRule(format!("unknown match type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmountOp {
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
}

impl AmountOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    pub fn holds(&self, amount: i64, threshold: i64) -> bool {
        match self {
            Self::Lt => amount < threshold,
            Self::Gt => amount > threshold,
            Self::Eq => amount == threshold,
            Self::Le => amount <= threshold,
            Self::Ge => amount >= threshold,
        }
    }
}

impl FromStr for AmountOp {
    type Err = LucidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<" | "lt" => Ok(Self::Lt),
            ">" | "gt" => Ok(Self::Gt),
            "=" | "==" | "eq" => Ok(Self::Eq),
            "<=" | "lte" => Ok(Self::Le),
            ">=" | "gte" => Ok(Self::Ge),
            other => Err(LucidError::InvalidRule(format!(
                "amount operator '{other}' is not one of <, >, =, <=, >="
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: i64,
    pub pattern: String,
    pub match_type: MatchType,
    pub case_sensitive: bool,
    pub amount_operator: Option<AmountOp>,
    pub amount_value: Option<i64>,
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
    pub priority: i64,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Budgets and the file ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BudgetEntry {
    pub id: i64,
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
    pub year: i32,
    /// `None` is a yearly entry.
    pub month: Option<u32>,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub id: i64,
    pub fingerprint: String,
    pub format: StatementFormat,
    pub filename: Option<String>,
    pub record_count: i64,
    pub processed_at: String,
}
