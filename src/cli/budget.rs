use comfy_table::{Cell, Table};

use super::{open_db, parse_cents};
use crate::budgets::{self, NewBudget};
use crate::error::Result;
use crate::fmt::{money, month_name};
use crate::models::TxnType;

pub fn set(
    txn_type: &str,
    category: &str,
    sub_type: Option<String>,
    year: i32,
    month: Option<u32>,
    amount: &str,
) -> Result<()> {
    let conn = open_db()?;
    let entry = NewBudget {
        txn_type: txn_type.parse::<TxnType>()?,
        category: category.to_string(),
        sub_type,
        year,
        month,
        amount: parse_cents(amount)?,
    };
    let id = budgets::set(&conn, &entry)?;
    let period = match month {
        Some(m) => format!("{} {year}", month_name(m)),
        None => format!("{year} (yearly)"),
    };
    println!(
        "Budget {id}: {} / {} for {period} = {}",
        entry.txn_type,
        entry.category.trim(),
        money(entry.amount)
    );
    Ok(())
}

pub fn list(year: Option<i32>) -> Result<()> {
    let conn = open_db()?;
    let entries = budgets::list(&conn, year)?;
    if entries.is_empty() {
        println!("No budget entries.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Year", "Month", "Type", "Category", "Sub type", "Amount"]);
    for e in &entries {
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(e.year),
            Cell::new(e.month.map(month_name).unwrap_or("yearly")),
            Cell::new(e.txn_type),
            Cell::new(&e.category),
            Cell::new(e.sub_type.as_deref().unwrap_or("")),
            Cell::new(money(e.amount)),
        ]);
    }
    println!("Budgets\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    let entry = budgets::get(&conn, id)?;
    budgets::delete(&conn, id)?;
    println!("Deleted budget {id}: {} / {} {}", entry.txn_type, entry.category, entry.year);
    Ok(())
}
