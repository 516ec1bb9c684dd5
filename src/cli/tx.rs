use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{open_db, parse_cents, parse_month_opt};
use crate::error::Result;
use crate::fmt::money;
use crate::models::TxnType;
use crate::transactions::{self, TransactionFilter};

pub struct ListArgs {
    pub year: Option<i32>,
    pub month: Option<String>,
    pub txn_type: Option<String>,
    pub category: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

pub fn list(args: ListArgs) -> Result<()> {
    let conn = open_db()?;
    let (month_year, month) = parse_month_opt(&args.month)?;
    let filter = TransactionFilter {
        year: args.year.or(month_year),
        month,
        txn_type: args.txn_type.as_deref().map(str::parse::<TxnType>).transpose()?,
        category: args.category,
        min_amount: args.min.as_deref().map(parse_cents).transpose()?,
        max_amount: args.max.as_deref().map(parse_cents).transpose()?,
        limit: Some(args.limit),
        offset: Some(args.offset),
    };
    let rows = transactions::list(&conn, &filter)?;
    if rows.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Type", "Category", "Sub type"]);
    for t in &rows {
        let amount = if t.amount < 0 {
            money(t.amount).red()
        } else {
            money(t.amount).green()
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.date.format("%Y-%m-%d")),
            Cell::new(&t.description),
            Cell::new(amount),
            Cell::new(t.txn_type),
            Cell::new(&t.category),
            Cell::new(t.sub_type.as_deref().unwrap_or("")),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn edit(id: i64, txn_type: Option<&str>, category: &str, sub_type: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let txn_type = match txn_type {
        Some(t) => t.parse::<TxnType>()?,
        None => transactions::get(&conn, id)?.txn_type,
    };
    let t = transactions::update_classification(&conn, id, txn_type, category, sub_type)?;
    println!(
        "Transaction {id} \u{2192} {} / {}{}",
        t.txn_type,
        t.category,
        t.sub_type.map(|s| format!(" / {s}")).unwrap_or_default()
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    let t = transactions::get(&conn, id)?;
    transactions::delete(&conn, id)?;
    println!("Deleted transaction {id}: {} {} {}", t.date, t.description, money(t.amount));
    Ok(())
}
