use std::io::Read;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use super::open_db;
use crate::categorizer::classify;
use crate::error::{MalformedRow, Result};
use crate::extractor::extract_all;
use crate::fmt::money;
use crate::importer::{file_fingerprint, find_processed_file, ingest, ingest_named};
use crate::models::StatementFormat;
use crate::rules::load_rule_set;

/// Malformed rows printed before the list is cut short.
const MAX_REPORTED_ERRORS: usize = 10;

/// Read the export; `-` reads standard input.
fn read_input(file: &str) -> Result<(Vec<u8>, Option<String>)> {
    if file == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return Ok((bytes, None));
    }
    let path = PathBuf::from(file);
    let bytes = std::fs::read(&path)?;
    let filename = path.file_name().map(|n| n.to_string_lossy().to_string());
    Ok((bytes, filename))
}

fn print_errors(errors: &[MalformedRow]) {
    if errors.is_empty() {
        return;
    }
    println!("{}", format!("{} malformed row(s) skipped:", errors.len()).yellow());
    for row in errors.iter().take(MAX_REPORTED_ERRORS) {
        println!("  {row}");
    }
    if errors.len() > MAX_REPORTED_ERRORS {
        println!("  ... and {} more", errors.len() - MAX_REPORTED_ERRORS);
    }
}

pub fn run(file: &str, format: &str, force: bool, dry_run: bool) -> Result<()> {
    let format: StatementFormat = format.parse()?;
    let (bytes, filename) = read_input(file)?;
    let mut conn = open_db()?;

    if dry_run {
        return preview(&conn, &bytes, format);
    }

    let result = match filename.as_deref() {
        Some(name) => ingest_named(&mut conn, &bytes, format, Some(name), force)?,
        None => ingest(&mut conn, &bytes, format, force)?,
    };

    if result.skipped_duplicate_file {
        let previous = find_processed_file(&conn, &file_fingerprint(&bytes))?;
        match previous {
            Some(p) => println!(
                "This file has already been imported on {} (duplicate checksum). Use --force to re-read it.",
                p.processed_at
            ),
            None => println!("This file has already been imported (duplicate checksum)."),
        }
        return Ok(());
    }

    println!(
        "{} imported, {} skipped (duplicates) from {}",
        result.inserted.to_string().green().bold(),
        result.skipped_duplicate_rows,
        format.name()
    );
    print_errors(&result.errors);
    Ok(())
}

/// Parse and classify without writing anything.
fn preview(conn: &rusqlite::Connection, bytes: &[u8], format: StatementFormat) -> Result<()> {
    let extraction = extract_all(bytes, format)?;
    let rules = load_rule_set(conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Type", "Category", "Sub type"]);
    for record in &extraction.records {
        let c = classify(record, &rules);
        table.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d")),
            Cell::new(&record.description),
            Cell::new(money(record.amount)),
            Cell::new(c.txn_type),
            Cell::new(c.category),
            Cell::new(c.sub_type.unwrap_or_default()),
        ]);
    }
    println!("Preview ({} rows, nothing written)\n{table}", extraction.records.len());
    print_errors(&extraction.errors);
    Ok(())
}
