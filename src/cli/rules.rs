use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{open_db, parse_cents};
use crate::error::Result;
use crate::fmt::money;
use crate::importer::reapply_rules;
use crate::models::{AmountOp, MatchType, Rule, TxnType};
use crate::rules::{self, NewRule, RuleUpdate};

pub struct AddArgs {
    pub pattern: String,
    pub category: String,
    pub txn_type: String,
    pub sub_type: Option<String>,
    pub match_type: String,
    pub case_sensitive: bool,
    pub amount_op: Option<String>,
    pub amount: Option<String>,
    pub priority: i64,
}

pub struct UpdateArgs {
    pub pattern: Option<String>,
    pub category: Option<String>,
    pub txn_type: Option<String>,
    pub sub_type: Option<String>,
    pub match_type: Option<String>,
    pub case_sensitive: Option<bool>,
    pub amount_op: Option<String>,
    pub amount: Option<String>,
    pub clear_amount: bool,
    pub priority: Option<i64>,
    pub active: Option<bool>,
}

fn describe(rule: &Rule) -> String {
    let condition = match (rule.amount_operator, rule.amount_value) {
        (Some(op), Some(v)) => format!(" (amount {} {})", op.symbol(), money(v)),
        _ => String::new(),
    };
    format!("'{}'{condition} \u{2192} {} / {}", rule.pattern, rule.txn_type, rule.category)
}

pub fn add(args: AddArgs) -> Result<()> {
    let conn = open_db()?;
    let rule = NewRule {
        pattern: args.pattern,
        match_type: args.match_type.parse::<MatchType>()?,
        case_sensitive: args.case_sensitive,
        amount_operator: args.amount_op.as_deref().map(str::parse::<AmountOp>).transpose()?,
        amount_value: args.amount.as_deref().map(parse_cents).transpose()?,
        txn_type: args.txn_type.parse::<TxnType>()?,
        category: args.category,
        sub_type: args.sub_type,
        priority: args.priority,
    };
    let id = rules::create(&conn, &rule)?;
    let stored = rules::get(&conn, id)?;
    println!("Added rule {id}: {}", describe(&stored));
    println!("Run `lucid rules apply` to reclassify existing transactions.");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rules = rules::list(&conn)?;
    if rules.is_empty() {
        println!("No rules yet. Add one with `lucid rules add <pattern> --category <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Priority", "Pattern", "Match", "Amount", "Type", "Category", "Sub type", "Active",
    ]);
    for r in &rules {
        let amount = match (r.amount_operator, r.amount_value) {
            (Some(op), Some(v)) => format!("{} {}", op.symbol(), money(v)),
            _ => String::new(),
        };
        let pattern = if r.case_sensitive {
            format!("{} (Aa)", r.pattern)
        } else {
            r.pattern.clone()
        };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.priority),
            Cell::new(pattern),
            Cell::new(r.match_type.as_str()),
            Cell::new(amount),
            Cell::new(r.txn_type),
            Cell::new(&r.category),
            Cell::new(r.sub_type.as_deref().unwrap_or("")),
            Cell::new(if r.is_active { "yes" } else { "no" }),
        ]);
    }
    println!("Rules (evaluated top to bottom)\n{table}");
    Ok(())
}

pub fn update(id: i64, args: UpdateArgs) -> Result<()> {
    let conn = open_db()?;
    let changes = RuleUpdate {
        pattern: args.pattern,
        match_type: args.match_type.as_deref().map(str::parse::<MatchType>).transpose()?,
        case_sensitive: args.case_sensitive,
        amount_operator: args.amount_op.as_deref().map(str::parse::<AmountOp>).transpose()?,
        amount_value: args.amount.as_deref().map(parse_cents).transpose()?,
        clear_amount: args.clear_amount,
        txn_type: args.txn_type.as_deref().map(str::parse::<TxnType>).transpose()?,
        category: args.category,
        sub_type: args.sub_type,
        priority: args.priority,
        is_active: args.active,
    };
    let rule = rules::update(&conn, id, &changes)?;
    println!("Updated rule {id}: {}", describe(&rule));
    Ok(())
}

pub fn delete(id: i64, soft: bool) -> Result<()> {
    let conn = open_db()?;
    let rule = rules::get(&conn, id)?;
    if soft {
        rules::deactivate(&conn, id)?;
        println!("Deactivated rule {id}: {}", describe(&rule));
    } else {
        rules::delete(&conn, id)?;
        println!("Deleted rule {id}: {}", describe(&rule));
    }
    Ok(())
}

pub fn apply() -> Result<()> {
    let mut conn = open_db()?;
    let result = reapply_rules(&mut conn)?;
    println!(
        "{} of {} transactions reclassified ({} active rules)",
        result.updated.to_string().green().bold(),
        result.examined,
        result.active_rules
    );
    Ok(())
}
