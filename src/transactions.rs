use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::categorizer::default_sub_type;
use crate::error::{LucidError, Result};
use crate::models::{Transaction, TxnType};

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub txn_type: Option<TxnType>,
    pub category: Option<String>,
    /// Signed cents, inclusive.
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

const SELECT_TRANSACTION: &str = "SELECT id, date, txn_type, category, sub_type, amount, description, \
     source, source_file, year, month FROM transactions";

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        txn_type: row.get(2)?,
        category: row.get(3)?,
        sub_type: row.get(4)?,
        amount: row.get(5)?,
        description: row.get(6)?,
        source: row.get(7)?,
        source_file: row.get(8)?,
        year: row.get(9)?,
        month: row.get(10)?,
    })
}

/// Matching transactions, newest first.
pub fn list(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(year) = filter.year {
        clauses.push("year = ?");
        params.push(Value::Integer(year.into()));
    }
    if let Some(month) = filter.month {
        clauses.push("month = ?");
        params.push(Value::Integer(month.into()));
    }
    if let Some(t) = filter.txn_type {
        clauses.push("txn_type = ?");
        params.push(Value::Text(t.as_str().to_string()));
    }
    if let Some(category) = &filter.category {
        clauses.push("category = ?");
        params.push(Value::Text(category.clone()));
    }
    if let Some(min) = filter.min_amount {
        clauses.push("amount >= ?");
        params.push(Value::Integer(min));
    }
    if let Some(max) = filter.max_amount {
        clauses.push("amount <= ?");
        params.push(Value::Integer(max));
    }

    let mut sql = SELECT_TRANSACTION.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    // SQLite needs a LIMIT before an OFFSET; -1 means unbounded.
    let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
    sql.push_str(&format!(" LIMIT {limit} OFFSET {}", filter.offset.unwrap_or(0)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), map_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(&format!("{SELECT_TRANSACTION} WHERE id = ?1"), [id], map_transaction)
        .optional()?
        .ok_or_else(|| LucidError::NotFound(format!("transaction {id}")))
}

/// Manual correction of one transaction's classification. Housing and
/// Health Insurance get the `Essentials` sub-type when none is given.
pub fn update_classification(
    conn: &Connection,
    id: i64,
    txn_type: TxnType,
    category: &str,
    sub_type: Option<&str>,
) -> Result<Transaction> {
    let category = category.trim();
    if category.is_empty() {
        return Err(LucidError::Other("category must not be empty".to_string()));
    }
    let sub_type = default_sub_type(category, sub_type.map(|s| s.trim().to_string()));
    let n = conn.execute(
        "UPDATE transactions SET txn_type = ?1, category = ?2, sub_type = ?3 WHERE id = ?4",
        rusqlite::params![txn_type, category, sub_type, id],
    )?;
    if n == 0 {
        return Err(LucidError::NotFound(format!("transaction {id}")));
    }
    tracing::debug!(id, category, "transaction reclassified by hand");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(LucidError::NotFound(format!("transaction {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::extractor::{BANK_SAMPLE, CARD_SAMPLE};
    use crate::importer::ingest;
    use crate::models::StatementFormat;

    fn seeded() -> (tempfile::TempDir, Connection) {
        let (dir, mut conn) = test_db();
        ingest(&mut conn, BANK_SAMPLE.as_bytes(), StatementFormat::BankStatement, false).unwrap();
        ingest(&mut conn, CARD_SAMPLE.as_bytes(), StatementFormat::CardInvoice, false).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, conn) = seeded();
        let all = list(&conn, &TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_list_filters() {
        let (_dir, conn) = seeded();
        let income = list(
            &conn,
            &TransactionFilter { txn_type: Some(TxnType::Income), ..Default::default() },
        )
        .unwrap();
        assert_eq!(income.len(), 2);

        let big = list(
            &conn,
            &TransactionFilter { max_amount: Some(-100000), ..Default::default() },
        )
        .unwrap();
        assert_eq!(big.len(), 1);
        assert_eq!(big[0].category, "Housing");

        let groceries = list(
            &conn,
            &TransactionFilter {
                year: Some(2025),
                month: Some(1),
                category: Some("Groceries".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(groceries.len(), 2);

        let none = list(&conn, &TransactionFilter { year: Some(2024), ..Default::default() }).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_paginates() {
        let (_dir, conn) = seeded();
        let page = list(&conn, &TransactionFilter { limit: Some(4), offset: Some(4), ..Default::default() }).unwrap();
        assert_eq!(page.len(), 2);
        let offset_only = list(&conn, &TransactionFilter { offset: Some(5), ..Default::default() }).unwrap();
        assert_eq!(offset_only.len(), 1);
    }

    #[test]
    fn test_update_classification_applies_essentials() {
        let (_dir, conn) = seeded();
        let migros = list(&conn, &TransactionFilter { max_amount: Some(-4235), min_amount: Some(-4235), ..Default::default() })
            .unwrap()
            .remove(0);
        let updated = update_classification(&conn, migros.id, TxnType::Expenses, "Health Insurance", None).unwrap();
        assert_eq!(updated.sub_type.as_deref(), Some("Essentials"));

        let updated = update_classification(&conn, migros.id, TxnType::Savings, "Pillar 3a", Some("Retirement")).unwrap();
        assert_eq!(updated.txn_type, TxnType::Savings);
        assert_eq!(updated.sub_type.as_deref(), Some("Retirement"));
    }

    #[test]
    fn test_update_and_delete_unknown() {
        let (_dir, conn) = test_db();
        assert!(matches!(
            update_classification(&conn, 9, TxnType::Expenses, "Extras", None),
            Err(LucidError::NotFound(_))
        ));
        assert!(matches!(delete(&conn, 9), Err(LucidError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (_dir, conn) = seeded();
        let first = list(&conn, &TransactionFilter::default()).unwrap().remove(0);
        delete(&conn, first.id).unwrap();
        assert_eq!(list(&conn, &TransactionFilter::default()).unwrap().len(), 5);
    }
}
