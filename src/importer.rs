use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::categorizer::{classify, RuleSet};
use crate::error::{MalformedRow, Result};
use crate::extractor::extract;
use crate::models::{Classification, ProcessedFile, RawRecord, StatementFormat, TxnType};
use crate::rules::load_rule_set;

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

pub fn file_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Row identity across uploads. `occurrence` separates identical rows inside
/// one file (two equal coffees on the same day) so they are not collapsed,
/// while an overlapping later export reproduces the same fingerprints.
pub fn row_fingerprint(record: &RawRecord, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}|{}|{}|{}|{}",
            record.date.format("%Y-%m-%d"),
            record.amount,
            record.description,
            record.source.key(),
            occurrence
        )
        .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

fn is_duplicate_row(conn: &Connection, fingerprint: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM transactions WHERE fingerprint = ?1")?;
    Ok(stmt.exists([fingerprint])?)
}

// ---------------------------------------------------------------------------
// ingest
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct IngestResult {
    pub inserted: usize,
    pub skipped_duplicate_file: bool,
    pub skipped_duplicate_rows: usize,
    pub errors: Vec<MalformedRow>,
}

pub fn ingest(conn: &mut Connection, bytes: &[u8], format: StatementFormat, force: bool) -> Result<IngestResult> {
    ingest_named(conn, bytes, format, None, force)
}

/// Ingest one statement file. The ledger check, row dedup and inserts share a
/// single immediate transaction, so concurrent uploads of the same file
/// serialize on the database write lock and only one of them inserts.
pub fn ingest_named(
    conn: &mut Connection,
    bytes: &[u8],
    format: StatementFormat,
    filename: Option<&str>,
    force: bool,
) -> Result<IngestResult> {
    let fingerprint = file_fingerprint(bytes);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let already_processed = tx
        .prepare("SELECT 1 FROM processed_files WHERE fingerprint = ?1")?
        .exists([&fingerprint])?;
    if already_processed && !force {
        tracing::info!(%fingerprint, ?filename, "file already processed, skipping");
        return Ok(IngestResult {
            skipped_duplicate_file: true,
            ..Default::default()
        });
    }

    let records = extract(bytes, format)?;
    let rules = load_rule_set(&tx)?;

    let mut result = IngestResult::default();
    let mut record_count = 0i64;
    let mut seen: HashMap<(NaiveDate, i64, String), usize> = HashMap::new();

    for item in records {
        let record = match item {
            Ok(record) => record,
            Err(row) => {
                tracing::warn!(line = row.line, reason = %row.reason, "skipping malformed row");
                result.errors.push(row);
                continue;
            }
        };
        record_count += 1;

        let occurrence = seen
            .entry((record.date, record.amount, record.description.clone()))
            .or_insert(0);
        let row_fp = row_fingerprint(&record, *occurrence);
        *occurrence += 1;

        if is_duplicate_row(&tx, &row_fp)? {
            result.skipped_duplicate_rows += 1;
            continue;
        }
        let classification = classify(&record, &rules);
        insert_transaction(&tx, &record, &classification, &fingerprint, &row_fp)?;
        result.inserted += 1;
    }

    tx.execute(
        "INSERT INTO processed_files (fingerprint, format, filename, record_count) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(fingerprint) DO UPDATE SET format = excluded.format, \
         filename = COALESCE(excluded.filename, processed_files.filename), \
         record_count = excluded.record_count, processed_at = datetime('now')",
        rusqlite::params![fingerprint, format, filename, record_count],
    )?;
    tx.commit()?;

    tracing::info!(
        %fingerprint,
        format = format.key(),
        inserted = result.inserted,
        duplicates = result.skipped_duplicate_rows,
        errors = result.errors.len(),
        "ingested statement"
    );
    Ok(result)
}

fn insert_transaction(
    conn: &Connection,
    record: &RawRecord,
    classification: &Classification,
    source_file: &str,
    fingerprint: &str,
) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO transactions (date, txn_type, category, sub_type, amount, description, source, \
         source_file, merchant_category, sub_type_hint, year, month, fingerprint) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?
    .execute(rusqlite::params![
        record.date,
        classification.txn_type,
        classification.category,
        classification.sub_type,
        record.amount,
        record.description,
        record.source,
        source_file,
        record.merchant_category,
        record.sub_type_hint,
        record.date.year(),
        record.date.month(),
        fingerprint,
    ])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Rule reapplication
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct ReapplyResult {
    pub examined: usize,
    pub updated: usize,
    pub active_rules: usize,
}

/// Reclassify every stored transaction with the current rules. Runs as one
/// write transaction; a second run with the same rules updates nothing.
pub fn reapply_rules(conn: &mut Connection) -> Result<ReapplyResult> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let rules = load_rule_set(&tx)?;
    let result = reapply_with(&tx, &rules)?;
    tx.commit()?;
    tracing::info!(
        examined = result.examined,
        updated = result.updated,
        active_rules = result.active_rules,
        "reapplied rules"
    );
    Ok(result)
}

struct StoredRow {
    id: i64,
    record: RawRecord,
    current: Classification,
}

fn reapply_with(conn: &Connection, rules: &RuleSet) -> Result<ReapplyResult> {
    let rows: Vec<StoredRow> = {
        let mut stmt = conn.prepare(
            "SELECT id, date, description, amount, source, merchant_category, sub_type_hint, \
             txn_type, category, sub_type FROM transactions ORDER BY id",
        )?;
        let mapped = stmt.query_map([], |row| {
            Ok(StoredRow {
                id: row.get(0)?,
                record: RawRecord {
                    date: row.get(1)?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    source: row.get(4)?,
                    merchant_category: row.get(5)?,
                    sub_type_hint: row.get(6)?,
                },
                current: Classification {
                    txn_type: row.get::<_, TxnType>(7)?,
                    category: row.get(8)?,
                    sub_type: row.get(9)?,
                },
            })
        })?;
        mapped.collect::<std::result::Result<Vec<_>, _>>()?
    };

    let mut updated = 0usize;
    let mut stmt = conn.prepare(
        "UPDATE transactions SET txn_type = ?1, category = ?2, sub_type = ?3 WHERE id = ?4",
    )?;
    for row in &rows {
        let next = classify(&row.record, rules);
        if next != row.current {
            stmt.execute(rusqlite::params![next.txn_type, next.category, next.sub_type, row.id])?;
            updated += 1;
        }
    }

    Ok(ReapplyResult {
        examined: rows.len(),
        updated,
        active_rules: rules.len(),
    })
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub fn processed_files(conn: &Connection) -> Result<Vec<ProcessedFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, fingerprint, format, filename, record_count, processed_at \
         FROM processed_files ORDER BY processed_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ProcessedFile {
                id: row.get(0)?,
                fingerprint: row.get(1)?,
                format: row.get(2)?,
                filename: row.get(3)?,
                record_count: row.get(4)?,
                processed_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_processed_file(conn: &Connection, fingerprint: &str) -> Result<Option<ProcessedFile>> {
    Ok(conn
        .query_row(
            "SELECT id, fingerprint, format, filename, record_count, processed_at \
             FROM processed_files WHERE fingerprint = ?1",
            [fingerprint],
            |row| {
                Ok(ProcessedFile {
                    id: row.get(0)?,
                    fingerprint: row.get(1)?,
                    format: row.get(2)?,
                    filename: row.get(3)?,
                    record_count: row.get(4)?,
                    processed_at: row.get(5)?,
                })
            },
        )
        .optional()?)
}
