use std::str::FromStr;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::categorizer::RuleSet;
use crate::error::{LucidError, Result};
use crate::models::{AmountOp, MatchType, Rule, TxnType};

/// Rule definition as submitted by the management surface.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub pattern: String,
    pub match_type: MatchType,
    pub case_sensitive: bool,
    pub amount_operator: Option<AmountOp>,
    pub amount_value: Option<i64>,
    pub txn_type: TxnType,
    pub category: String,
    pub sub_type: Option<String>,
    pub priority: i64,
}

/// Partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub pattern: Option<String>,
    pub match_type: Option<MatchType>,
    pub case_sensitive: Option<bool>,
    pub amount_operator: Option<AmountOp>,
    pub amount_value: Option<i64>,
    pub clear_amount: bool,
    pub txn_type: Option<TxnType>,
    pub category: Option<String>,
    pub sub_type: Option<String>,
    pub priority: Option<i64>,
    pub is_active: Option<bool>,
}

pub fn validate(rule: &NewRule) -> Result<()> {
    if rule.pattern.trim().is_empty() {
        return Err(LucidError::InvalidRule("pattern must not be empty".to_string()));
    }
    if rule.category.trim().is_empty() {
        return Err(LucidError::InvalidRule("category must not be empty".to_string()));
    }
    if rule.match_type == MatchType::Regex {
        Regex::new(&rule.pattern)
            .map_err(|e| LucidError::InvalidRule(format!("pattern does not compile: {e}")))?;
    }
    match (rule.amount_operator, rule.amount_value) {
        (Some(_), None) => {
            return Err(LucidError::InvalidRule(
                "amount operator given without an amount value".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(LucidError::InvalidRule(
                "amount value given without an amount operator".to_string(),
            ))
        }
        (Some(_), Some(v)) if v < 0 => {
            return Err(LucidError::InvalidRule(
                "amount value is compared against the absolute amount and must not be negative"
                    .to_string(),
            ))
        }
        _ => {}
    }
    Ok(())
}

pub fn create(conn: &Connection, rule: &NewRule) -> Result<i64> {
    validate(rule).inspect_err(|e| tracing::warn!(pattern = %rule.pattern, error = %e, "rule rejected"))?;
    conn.execute(
        "INSERT INTO rules (pattern, match_type, case_sensitive, amount_operator, amount_value, \
         txn_type, category, sub_type, priority, is_active) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
        rusqlite::params![
            rule.pattern,
            rule.match_type.as_str(),
            rule.case_sensitive,
            rule.amount_operator.map(|op| op.symbol()),
            rule.amount_value,
            rule.txn_type,
            rule.category.trim(),
            rule.sub_type,
            rule.priority,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Rule> {
    conn.query_row(&format!("{SELECT_RULE} WHERE id = ?1"), [id], map_rule)
        .optional()?
        .ok_or_else(|| LucidError::NotFound(format!("rule {id}")))
}

pub fn update(conn: &Connection, id: i64, changes: &RuleUpdate) -> Result<Rule> {
    let current = get(conn, id)?;
    let (amount_operator, amount_value) = if changes.clear_amount {
        (None, None)
    } else {
        (
            changes.amount_operator.or(current.amount_operator),
            changes.amount_value.or(current.amount_value),
        )
    };
    let merged = NewRule {
        pattern: changes.pattern.clone().unwrap_or(current.pattern),
        match_type: changes.match_type.unwrap_or(current.match_type),
        case_sensitive: changes.case_sensitive.unwrap_or(current.case_sensitive),
        amount_operator,
        amount_value,
        txn_type: changes.txn_type.unwrap_or(current.txn_type),
        category: changes.category.clone().unwrap_or(current.category),
        sub_type: changes.sub_type.clone().or(current.sub_type),
        priority: changes.priority.unwrap_or(current.priority),
    };
    validate(&merged)?;
    let is_active = changes.is_active.unwrap_or(current.is_active);
    conn.execute(
        "UPDATE rules SET pattern = ?1, match_type = ?2, case_sensitive = ?3, amount_operator = ?4, \
         amount_value = ?5, txn_type = ?6, category = ?7, sub_type = ?8, priority = ?9, is_active = ?10 \
         WHERE id = ?11",
        rusqlite::params![
            merged.pattern,
            merged.match_type.as_str(),
            merged.case_sensitive,
            merged.amount_operator.map(|op| op.symbol()),
            merged.amount_value,
            merged.txn_type,
            merged.category.trim(),
            merged.sub_type,
            merged.priority,
            is_active,
            id,
        ],
    )?;
    get(conn, id)
}

pub fn deactivate(conn: &Connection, id: i64) -> Result<Rule> {
    update(conn, id, &RuleUpdate { is_active: Some(false), ..Default::default() })
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM rules WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(LucidError::NotFound(format!("rule {id}")));
    }
    Ok(())
}

/// All rules (active and inactive) in evaluation order.
pub fn list(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(&format!("{SELECT_RULE} ORDER BY priority ASC, id ASC"))?;
    let rows = stmt
        .query_map([], map_rule)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_rule_set(conn: &Connection) -> Result<RuleSet> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RULE} WHERE is_active = 1 ORDER BY priority ASC, id ASC"
    ))?;
    let rules = stmt
        .query_map([], map_rule)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(RuleSet::new(rules))
}

const SELECT_RULE: &str = "SELECT id, pattern, match_type, case_sensitive, amount_operator, amount_value, \
     txn_type, category, sub_type, priority, is_active FROM rules";

fn parse_column<T: FromStr<Err = LucidError>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    raw.parse().map_err(|e: LucidError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_rule(row: &Row<'_>) -> rusqlite::Result<Rule> {
    let match_type: String = row.get(2)?;
    let amount_operator: Option<String> = row.get(4)?;
    Ok(Rule {
        id: row.get(0)?,
        pattern: row.get(1)?,
        match_type: parse_column(2, &match_type)?,
        case_sensitive: row.get(3)?,
        amount_operator: amount_operator
            .as_deref()
            .map(|op| parse_column(4, op))
            .transpose()?,
        amount_value: row.get(5)?,
        txn_type: row.get(6)?,
        category: row.get(7)?,
        sub_type: row.get(8)?,
        priority: row.get(9)?,
        is_active: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn new_rule(pattern: &str, category: &str, priority: i64) -> NewRule {
        NewRule {
            pattern: pattern.to_string(),
            match_type: MatchType::Contains,
            case_sensitive: false,
            amount_operator: None,
            amount_value: None,
            txn_type: TxnType::Expenses,
            category: category.to_string(),
            sub_type: None,
            priority,
        }
    }

    #[test]
    fn test_create_and_list_in_evaluation_order() {
        let (_dir, conn) = test_db();
        create(&conn, &new_rule("b", "Extras", 5)).unwrap();
        create(&conn, &new_rule("a", "Media", 1)).unwrap();
        create(&conn, &new_rule("c", "Sport", 5)).unwrap();
        let rules = list(&conn).unwrap();
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_amount_predicate_roundtrips_through_store() {
        let (_dir, conn) = test_db();
        let mut r = new_rule("uber", "Travel", 0);
        r.amount_operator = Some(AmountOp::Gt);
        r.amount_value = Some(3000);
        let id = create(&conn, &r).unwrap();
        let stored = get(&conn, id).unwrap();
        assert_eq!(stored.amount_operator, Some(AmountOp::Gt));
        assert_eq!(stored.amount_value, Some(3000));
        assert!(stored.is_active);
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let (_dir, conn) = test_db();
        let mut r = new_rule("([", "Extras", 0);
        r.match_type = MatchType::Regex;
        let err = create(&conn, &r).unwrap_err();
        assert!(matches!(err, LucidError::InvalidRule(_)));
        assert!(list(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_plain_pattern_with_regex_metacharacters_is_fine() {
        let (_dir, conn) = test_db();
        create(&conn, &new_rule("pilet + renaud", "Housing", 0)).unwrap();
    }

    #[test]
    fn test_inconsistent_amount_predicate_is_rejected() {
        let mut r = new_rule("x", "Extras", 0);
        r.amount_operator = Some(AmountOp::Lt);
        assert!(validate(&r).is_err());
        r.amount_operator = None;
        r.amount_value = Some(100);
        assert!(validate(&r).is_err());
        r.amount_operator = Some(AmountOp::Lt);
        r.amount_value = Some(-100);
        assert!(validate(&r).is_err());
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        assert!(validate(&new_rule("  ", "Extras", 0)).is_err());
        assert!(validate(&new_rule("x", "", 0)).is_err());
    }

    #[test]
    fn test_update_and_deactivate() {
        let (_dir, conn) = test_db();
        let id = create(&conn, &new_rule("adobe", "Extras", 0)).unwrap();
        let updated = update(
            &conn,
            id,
            &RuleUpdate {
                category: Some("Digital Goods".to_string()),
                priority: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.category, "Digital Goods");
        assert_eq!(updated.priority, 3);

        assert!(!deactivate(&conn, id).unwrap().is_active);
        assert!(load_rule_set(&conn).unwrap().is_empty());
        assert_eq!(list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_update_validates_merged_rule() {
        let (_dir, conn) = test_db();
        let id = create(&conn, &new_rule("adobe", "Extras", 0)).unwrap();
        let err = update(
            &conn,
            id,
            &RuleUpdate { amount_operator: Some(AmountOp::Eq), ..Default::default() },
        )
        .unwrap_err();
        assert!(matches!(err, LucidError::InvalidRule(_)));
    }

    #[test]
    fn test_delete_unknown_rule() {
        let (_dir, conn) = test_db();
        assert!(matches!(delete(&conn, 42), Err(LucidError::NotFound(_))));
    }
}
