use chrono::Datelike;
use comfy_table::{Cell, Table};

use crate::dashboard::{available_years, latest_transaction_date, summarize};
use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::{format_bytes, money, month_name};
use crate::importer::processed_files;
use crate::settings::{load_settings, DB_FILE};

/// Ledger entries shown under the counts.
const RECENT_FILES: usize = 5;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Fixed costs: {}", settings.fixed_cost_categories.join(", "));

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `lucid init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let conn = get_connection(&db_path)?;
    let transactions: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
    let uncategorized: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE category = 'Uncategorized'",
        [],
        |r| r.get(0),
    )?;
    let rules: i64 = conn.query_row("SELECT count(*) FROM rules WHERE is_active = 1", [], |r| r.get(0))?;
    let budgets: i64 = conn.query_row("SELECT count(*) FROM budget_entries", [], |r| r.get(0))?;
    let years = available_years(&conn)?;
    let files = processed_files(&conn)?;

    println!();
    println!("Transactions:   {transactions}");
    println!("Uncategorized:  {uncategorized}");
    println!("Active rules:   {rules}");
    println!("Budget entries: {budgets}");
    println!("Files imported: {}", files.len());
    if !years.is_empty() {
        let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        println!("Years:          {}", years.join(", "));
    }

    if let Some(date) = latest_transaction_date(&conn)? {
        let month = summarize(&conn, date.year(), Some(date.month()))?;
        println!(
            "Net {} {}:   {} (budget {})",
            month_name(date.month()),
            date.year(),
            money(month.totals.net.actual),
            money(month.totals.net.budget)
        );
    }

    if !files.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Imported", "Format", "File", "Rows", "Fingerprint"]);
        for f in files.iter().take(RECENT_FILES) {
            table.add_row(vec![
                Cell::new(&f.processed_at),
                Cell::new(f.format.key()),
                Cell::new(f.filename.as_deref().unwrap_or("")),
                Cell::new(f.record_count),
                Cell::new(&f.fingerprint[..12.min(f.fingerprint.len())]),
            ]);
        }
        println!("\nRecent imports\n{table}");
    }
    Ok(())
}
