use regex::{Regex, RegexBuilder};

use crate::fallback;
use crate::models::{Classification, MatchType, RawRecord, Rule, TxnType};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Categories that are essentials regardless of how they were classified.
const ESSENTIAL_CATEGORIES: &[&str] = &["Housing", "Health Insurance"];
const ESSENTIALS: &str = "Essentials";

enum Matcher {
    /// Pattern already lowercased when the rule is case-insensitive.
    Contains(String),
    StartsWith(String),
    Regex(Regex),
}

struct CompiledRule {
    rule: Rule,
    matcher: Matcher,
}

impl CompiledRule {
    fn compile(rule: Rule) -> Result<Self, regex::Error> {
        let fold = |p: &str| {
            if rule.case_sensitive {
                p.to_string()
            } else {
                p.to_lowercase()
            }
        };
        let matcher = match rule.match_type {
            MatchType::Contains => Matcher::Contains(fold(&rule.pattern)),
            MatchType::StartsWith => Matcher::StartsWith(fold(&rule.pattern)),
            MatchType::Regex => Matcher::Regex(
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(!rule.case_sensitive)
                    .build()?,
            ),
        };
        Ok(Self { rule, matcher })
    }

    fn matches(&self, description: &str, folded: &str, amount: i64) -> bool {
        let haystack = if self.rule.case_sensitive { description } else { folded };
        let pattern_ok = match &self.matcher {
            Matcher::Contains(p) => haystack.contains(p.as_str()),
            Matcher::StartsWith(p) => haystack.starts_with(p.as_str()),
            Matcher::Regex(re) => re.is_match(description),
        };
        if !pattern_ok {
            return false;
        }
        match (self.rule.amount_operator, self.rule.amount_value) {
            (Some(op), Some(value)) => op.holds(amount.abs(), value),
            _ => true,
        }
    }
}

/// Active rules in evaluation order: priority ascending, then id ascending.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter(|r| r.is_active)
            .filter_map(|r| {
                let id = r.id;
                CompiledRule::compile(r)
                    .map_err(|e| tracing::warn!(rule_id = id, error = %e, "skipping rule with invalid pattern"))
                    .ok()
            })
            .collect();
        compiled.sort_by_key(|c| (c.rule.priority, c.rule.id));
        Self { rules: compiled }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn first_match(&self, record: &RawRecord) -> Option<&Rule> {
        let folded = record.description.to_lowercase();
        self.rules
            .iter()
            .find(|c| c.matches(&record.description, &folded, record.amount))
            .map(|c| &c.rule)
    }
}

/// Classify one record: user rules first, then the format's fallback table,
/// then `Uncategorized` typed by the amount's sign.
pub fn classify(record: &RawRecord, rules: &RuleSet) -> Classification {
    let classification = if let Some(rule) = rules.first_match(record) {
        Classification {
            txn_type: rule.txn_type,
            category: rule.category.clone(),
            sub_type: rule.sub_type.clone(),
        }
    } else if let Some(legacy) = fallback::lookup(record) {
        legacy
    } else {
        Classification {
            txn_type: TxnType::from_sign(record.amount),
            category: UNCATEGORIZED.to_string(),
            sub_type: record.sub_type_hint.clone(),
        }
    };
    with_default_sub_type(classification)
}

pub fn default_sub_type(category: &str, sub_type: Option<String>) -> Option<String> {
    match sub_type {
        Some(s) if !s.is_empty() => Some(s),
        _ if ESSENTIAL_CATEGORIES.contains(&category) => Some(ESSENTIALS.to_string()),
        _ => None,
    }
}

fn with_default_sub_type(mut c: Classification) -> Classification {
    c.sub_type = default_sub_type(&c.category, c.sub_type.take());
    c
}

#[cfg(test)]
pub(crate) fn rule(id: i64, pattern: &str, category: &str, priority: i64) -> Rule {
    Rule {
        id,
        pattern: pattern.to_string(),
        match_type: MatchType::Contains,
        case_sensitive: false,
        amount_operator: None,
        amount_value: None,
        txn_type: TxnType::Expenses,
        category: category.to_string(),
        sub_type: None,
        priority,
        is_active: true,
    }
}
