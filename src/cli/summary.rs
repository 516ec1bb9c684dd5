use chrono::{Datelike, Local};
use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use super::{open_db, parse_month_opt, split_list};
use crate::dashboard::{self, CategoryLine, DashboardSummary, Totals};
use crate::error::{LucidError, Result};
use crate::fmt::{money, month_name, percent};
use crate::settings::load_settings;

fn resolve_year(conn: &Connection, year: Option<i32>) -> Result<i32> {
    if let Some(y) = year {
        return Ok(y);
    }
    Ok(dashboard::available_years(conn)?
        .first()
        .copied()
        .unwrap_or_else(|| Local::now().year()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| LucidError::Other(e.to_string()))
}

pub fn summary(year: Option<i32>, month: Option<String>, json: bool) -> Result<()> {
    let conn = open_db()?;
    let (month_year, month) = parse_month_opt(&month)?;
    let year = resolve_year(&conn, year.or(month_year))?;
    let settings = load_settings();
    let summary = dashboard::summarize_with(&conn, year, month, &settings.fixed_cost_categories)?;

    if json {
        println!("{}", to_json(&summary)?);
        return Ok(());
    }
    print_summary(&summary);
    Ok(())
}

fn add_section(table: &mut Table, title: colored::ColoredString, lines: &[CategoryLine], totals: Totals) {
    if lines.is_empty() {
        return;
    }
    table.add_row(vec![Cell::new(title), Cell::new(""), Cell::new(""), Cell::new(""), Cell::new("")]);
    for line in lines {
        let remaining = if line.remaining < 0 {
            money(line.remaining).red()
        } else {
            money(line.remaining).normal()
        };
        table.add_row(vec![
            Cell::new(format!("  {}", line.category)),
            Cell::new(money(line.actual)),
            Cell::new(money(line.budget)),
            Cell::new(remaining),
            Cell::new(percent(line.percent_complete)),
        ]);
    }
    table.add_row(vec![
        Cell::new("  Total".bold()),
        Cell::new(money(totals.actual).bold()),
        Cell::new(money(totals.budget).bold()),
        Cell::new(money(totals.budget - totals.actual)),
        Cell::new(""),
    ]);
}

fn print_summary(s: &DashboardSummary) {
    let period = match s.month {
        Some(m) => format!("{} {}", month_name(m), s.year),
        None => s.year.to_string(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Category", "Actual", "Budget", "Remaining", "%"]);
    add_section(&mut table, "INCOME".green().bold(), &s.income, s.totals.income);
    add_section(&mut table, "EXPENSES".red().bold(), &s.expenses, s.totals.expenses);
    add_section(&mut table, "SAVINGS".blue().bold(), &s.savings, s.totals.savings);

    let net = s.totals.net;
    let net_label = if net.actual >= 0 { "NET".green().bold() } else { "NET".red().bold() };
    table.add_row(vec![
        Cell::new(net_label),
        Cell::new(money(net.actual)),
        Cell::new(money(net.budget)),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Budget vs Actual: {period}\n{table}");

    println!();
    println!("Fixed cost ratio: {}", percent(s.fixed_cost_ratio));
    let prior = &s.previous_period;
    let prior_period = match prior.month {
        Some(m) => format!("{} {}", month_name(m), prior.year),
        None => prior.year.to_string(),
    };
    let delta = if prior.delta >= 0 {
        format!("+{} (+{})", money(prior.delta), percent(prior.delta_percent)).green()
    } else {
        format!("{} ({})", money(prior.delta), percent(prior.delta_percent)).red()
    };
    println!("Net vs {prior_period}: {} \u{2192} {delta}", money(prior.net));
    if let Some(date) = s.latest_transaction_date {
        println!("Data through: {date}");
    }
}

pub fn trend(year: Option<i32>, categories: Option<String>, json: bool) -> Result<()> {
    let conn = open_db()?;
    let year = resolve_year(&conn, year)?;
    let filter = split_list(&categories);
    let rows = dashboard::trend(&conn, year, filter.as_deref())?;

    if json {
        println!("{}", to_json(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Month", "Income", "Budget", "Expenses", "Budget", "Savings", "Budget",
    ]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(month_name(r.month)),
            Cell::new(money(r.income)),
            Cell::new(money(r.income_budget)),
            Cell::new(money(r.expenses)),
            Cell::new(money(r.expenses_budget)),
            Cell::new(money(r.savings)),
            Cell::new(money(r.savings_budget)),
        ]);
    }
    let title = match &filter {
        Some(list) if !list.is_empty() => format!("Trend {year} ({})", list.join(", ")),
        _ => format!("Trend {year}"),
    };
    println!("{title}\n{table}");
    Ok(())
}
