use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::budgets;
use crate::error::Result;
use crate::models::{BudgetEntry, TxnType};

pub const DEFAULT_FIXED_COST_CATEGORIES: &[&str] =
    &["Housing", "Health Insurance", "Health Other", "Tax"];

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLine {
    pub txn_type: TxnType,
    pub category: String,
    pub budget: i64,
    pub actual: i64,
    pub remaining: i64,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub actual: i64,
    pub budget: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeTotals {
    pub income: Totals,
    pub expenses: Totals,
    pub savings: Totals,
    pub net: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorPeriod {
    pub year: i32,
    pub month: Option<u32>,
    pub net: i64,
    pub delta: i64,
    pub delta_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub month: Option<u32>,
    pub income: Vec<CategoryLine>,
    pub expenses: Vec<CategoryLine>,
    pub savings: Vec<CategoryLine>,
    pub totals: TypeTotals,
    pub fixed_cost_ratio: f64,
    pub previous_period: PriorPeriod,
    pub latest_transaction_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendRow {
    pub month: u32,
    pub income: i64,
    pub expenses: i64,
    pub savings: i64,
    pub income_budget: i64,
    pub expenses_budget: i64,
    pub savings_budget: i64,
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Transactions are stored signed; budgets are positive. Outflow types are
/// flipped so spending counts up and refunds count down.
pub fn orient(txn_type: TxnType, signed: i64) -> i64 {
    match txn_type {
        TxnType::Income => signed,
        TxnType::Expenses | TxnType::Savings => -signed,
    }
}

/// Integer division rounded half away from zero.
fn div_round(n: i64, d: i64) -> i64 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d.abs() {
        q + n.signum() * d.signum()
    } else {
        q
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

/// Budget entries of one (type, category, sub_type) key.
#[derive(Debug, Default)]
struct BudgetPlan {
    yearly: Option<i64>,
    overrides: BTreeMap<u32, i64>,
}

impl BudgetPlan {
    fn for_month(&self, month: u32) -> i64 {
        match self.overrides.get(&month) {
            Some(&amount) => amount,
            None => self.yearly.map(|y| div_round(y, 12)).unwrap_or(0),
        }
    }

    /// The twelve monthly resolutions summed without per-month rounding.
    /// `yearly * (12 - k) / 12` is split on `yearly = 12q + r` so the product never overflows.
    fn for_year(&self) -> i64 {
        let k = self.overrides.len() as i64;
        let amortized = self
            .yearly
            .map(|y| (y / 12) * (12 - k) + div_round((y % 12) * (12 - k), 12))
            .unwrap_or(0);
        amortized + self.overrides.values().sum::<i64>()
    }

    fn resolve(&self, month: Option<u32>) -> i64 {
        match month {
            Some(m) => self.for_month(m),
            None => self.for_year(),
        }
    }
}

/// Resolve budget entries to one amount per (type, category) for the period,
/// summing across sub-types.
pub fn resolve_budgets(entries: &[BudgetEntry], month: Option<u32>) -> HashMap<(TxnType, String), i64> {
    let mut plans: HashMap<(TxnType, &str, &str), BudgetPlan> = HashMap::new();
    for e in entries {
        let plan = plans
            .entry((e.txn_type, e.category.as_str(), e.sub_type.as_deref().unwrap_or("")))
            .or_default();
        match e.month {
            None => plan.yearly = Some(e.amount),
            Some(m) => {
                plan.overrides.insert(m, e.amount);
            }
        }
    }

    let mut resolved: HashMap<(TxnType, String), i64> = HashMap::new();
    for ((txn_type, category, _), plan) in &plans {
        *resolved.entry((*txn_type, category.to_string())).or_insert(0) += plan.resolve(month);
    }
    resolved
}

fn build_lines(
    txn_type: TxnType,
    actuals: &HashMap<(TxnType, String), i64>,
    budgets: &HashMap<(TxnType, String), i64>,
) -> Vec<CategoryLine> {
    let mut categories: Vec<&String> = actuals
        .keys()
        .chain(budgets.keys())
        .filter(|(t, _)| *t == txn_type)
        .map(|(_, c)| c)
        .collect();
    categories.sort();
    categories.dedup();

    let mut lines: Vec<CategoryLine> = categories
        .into_iter()
        .filter_map(|category| {
            let key = (txn_type, category.clone());
            let actual = actuals.get(&key).copied().unwrap_or(0);
            let budget = budgets.get(&key).copied().unwrap_or(0);
            if actual == 0 && budget == 0 {
                return None;
            }
            Some(CategoryLine {
                txn_type,
                category: category.clone(),
                budget,
                actual,
                remaining: budget - actual,
                percent_complete: percent(actual, budget),
            })
        })
        .collect();
    lines.sort_by(|a, b| b.actual.cmp(&a.actual).then_with(|| a.category.cmp(&b.category)));
    lines
}

fn totals(lines: &[CategoryLine]) -> Totals {
    Totals {
        actual: lines.iter().map(|l| l.actual).sum(),
        budget: lines.iter().map(|l| l.budget).sum(),
    }
}

fn net(income: i64, expenses: i64, savings: i64) -> i64 {
    income - expenses - savings
}

pub fn fixed_cost_ratio(expenses: &[CategoryLine], income_actual: i64, fixed_cost_categories: &[String]) -> f64 {
    if income_actual <= 0 {
        return 0.0;
    }
    let fixed: i64 = expenses
        .iter()
        .filter(|l| fixed_cost_categories.iter().any(|c| c == &l.category))
        .map(|l| l.actual)
        .sum();
    percent(fixed, income_actual)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn actuals_by_category(conn: &Connection, year: i32, month: Option<u32>) -> Result<HashMap<(TxnType, String), i64>> {
    let mut stmt = conn.prepare(
        "SELECT txn_type, category, SUM(amount) FROM transactions \
         WHERE year = ?1 AND (?2 IS NULL OR month = ?2) \
         GROUP BY txn_type, category",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![year, month], |row| {
            let txn_type: TxnType = row.get(0)?;
            Ok(((txn_type, row.get::<_, String>(1)?), orient(txn_type, row.get(2)?)))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

fn net_actual(conn: &Connection, year: i32, month: Option<u32>) -> Result<i64> {
    let mut stmt = conn.prepare(
        "SELECT txn_type, SUM(amount) FROM transactions \
         WHERE year = ?1 AND (?2 IS NULL OR month = ?2) GROUP BY txn_type",
    )?;
    let by_type = stmt
        .query_map(rusqlite::params![year, month], |row| {
            let txn_type: TxnType = row.get(0)?;
            Ok((txn_type, orient(txn_type, row.get(1)?)))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    let get = |t: TxnType| by_type.get(&t).copied().unwrap_or(0);
    Ok(net(get(TxnType::Income), get(TxnType::Expenses), get(TxnType::Savings)))
}

pub fn latest_transaction_date(conn: &Connection) -> Result<Option<NaiveDate>> {
    Ok(conn.query_row("SELECT MAX(date) FROM transactions", [], |row| row.get(0))?)
}

pub fn available_years(conn: &Connection) -> Result<Vec<i32>> {
    let mut stmt = conn.prepare("SELECT DISTINCT year FROM transactions ORDER BY year DESC")?;
    let years = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i32>, _>>()?;
    Ok(years)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

pub fn summarize(conn: &Connection, year: i32, month: Option<u32>) -> Result<DashboardSummary> {
    let defaults: Vec<String> = DEFAULT_FIXED_COST_CATEGORIES.iter().map(|s| s.to_string()).collect();
    summarize_with(conn, year, month, &defaults)
}

/// Budget-vs-actual summary for a month, or the whole year when `month` is
/// `None`. All reads share one snapshot.
pub fn summarize_with(
    conn: &Connection,
    year: i32,
    month: Option<u32>,
    fixed_cost_categories: &[String],
) -> Result<DashboardSummary> {
    let tx = conn.unchecked_transaction()?;

    let actuals = actuals_by_category(&tx, year, month)?;
    let budget_map = resolve_budgets(&budgets::list(&tx, Some(year))?, month);

    let income = build_lines(TxnType::Income, &actuals, &budget_map);
    let expenses = build_lines(TxnType::Expenses, &actuals, &budget_map);
    let savings = build_lines(TxnType::Savings, &actuals, &budget_map);

    let (ti, te, ts) = (totals(&income), totals(&expenses), totals(&savings));
    let totals = TypeTotals {
        income: ti,
        expenses: te,
        savings: ts,
        net: Totals {
            actual: net(ti.actual, te.actual, ts.actual),
            budget: net(ti.budget, te.budget, ts.budget),
        },
    };

    let prior_net = net_actual(&tx, year - 1, month)?;
    let delta = totals.net.actual - prior_net;
    let previous_period = PriorPeriod {
        year: year - 1,
        month,
        net: prior_net,
        delta,
        delta_percent: percent(delta, prior_net.abs()),
    };

    let latest_transaction_date = latest_transaction_date(&tx)?;
    tx.commit()?;

    Ok(DashboardSummary {
        year,
        month,
        fixed_cost_ratio: fixed_cost_ratio(&expenses, ti.actual, fixed_cost_categories),
        income,
        expenses,
        savings,
        totals,
        previous_period,
        latest_transaction_date,
    })
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Twelve rows, one per month, actual and budget per type. An empty or
/// missing category filter means all categories.
pub fn trend(conn: &Connection, year: i32, categories: Option<&[String]>) -> Result<Vec<TrendRow>> {
    let filter = categories.filter(|c| !c.is_empty());
    let included = |category: &str| filter.map_or(true, |list| list.iter().any(|c| c == category));

    let tx = conn.unchecked_transaction()?;

    let mut stmt = tx.prepare(
        "SELECT month, txn_type, category, SUM(amount) FROM transactions \
         WHERE year = ?1 GROUP BY month, txn_type, category",
    )?;
    let actuals = stmt
        .query_map([year], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, TxnType>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let entries: Vec<BudgetEntry> = budgets::list(&tx, Some(year))?
        .into_iter()
        .filter(|e| included(&e.category))
        .collect();
    tx.commit()?;

    let mut rows: Vec<TrendRow> = (1..=12).map(|month| TrendRow { month, ..Default::default() }).collect();

    for (month, txn_type, category, sum) in actuals {
        if !included(&category) || !(1..=12).contains(&month) {
            continue;
        }
        let row = &mut rows[(month - 1) as usize];
        let amount = orient(txn_type, sum);
        match txn_type {
            TxnType::Income => row.income += amount,
            TxnType::Expenses => row.expenses += amount,
            TxnType::Savings => row.savings += amount,
        }
    }

    for row in &mut rows {
        for ((txn_type, _), amount) in resolve_budgets(&entries, Some(row.month)) {
            match txn_type {
                TxnType::Income => row.income_budget += amount,
                TxnType::Expenses => row.expenses_budget += amount,
                TxnType::Savings => row.savings_budget += amount,
            }
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budgets::NewBudget;
    use crate::db::test_db;
    use chrono::Datelike;

    fn add_txn(conn: &Connection, date: &str, txn_type: TxnType, category: &str, amount: i64) {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let n: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap();
        conn.execute(
            "INSERT INTO transactions (date, txn_type, category, amount, description, source, year, month, fingerprint) \
             VALUES (?1, ?2, ?3, ?4, 'test', 'bank', ?5, ?6, ?7)",
            rusqlite::params![date, txn_type, category, amount, date.year(), date.month(), format!("fp-{n}")],
        )
        .unwrap();
    }

    fn add_budget(conn: &Connection, txn_type: TxnType, category: &str, month: Option<u32>, amount: i64) {
        budgets::create(
            conn,
            &NewBudget {
                txn_type,
                category: category.to_string(),
                sub_type: None,
                year: 2025,
                month,
                amount,
            },
        )
        .unwrap();
    }

    fn entry(month: Option<u32>, amount: i64) -> BudgetEntry {
        BudgetEntry {
            id: 0,
            txn_type: TxnType::Expenses,
            category: "Groceries".to_string(),
            sub_type: None,
            year: 2025,
            month,
            amount,
        }
    }

    fn key() -> (TxnType, String) {
        (TxnType::Expenses, "Groceries".to_string())
    }

    #[test]
    fn test_yearly_budget_amortizes_to_months() {
        let entries = vec![entry(None, 120000)];
        for m in 1..=12 {
            assert_eq!(resolve_budgets(&entries, Some(m))[&key()], 10000);
        }
        assert_eq!(resolve_budgets(&entries, None)[&key()], 120000);
    }

    #[test]
    fn test_monthly_override_replaces_that_month_only() {
        let entries = vec![entry(None, 120000), entry(Some(3), 15000)];
        assert_eq!(resolve_budgets(&entries, Some(3))[&key()], 15000);
        assert_eq!(resolve_budgets(&entries, Some(4))[&key()], 10000);
        assert_eq!(resolve_budgets(&entries, None)[&key()], 125000);
    }

    #[test]
    fn test_overrides_without_yearly_entry() {
        let entries = vec![entry(Some(1), 5000), entry(Some(2), 7000)];
        assert_eq!(resolve_budgets(&entries, Some(2))[&key()], 7000);
        assert_eq!(resolve_budgets(&entries, Some(5))[&key()], 0);
        assert_eq!(resolve_budgets(&entries, None)[&key()], 12000);
    }

    #[test]
    fn test_uneven_yearly_amount_rounds_to_cent() {
        let entries = vec![entry(None, 100000)];
        assert_eq!(resolve_budgets(&entries, Some(1))[&key()], 8333);
        assert_eq!(resolve_budgets(&entries, None)[&key()], 100000);
        let with_override = vec![entry(None, 100000), entry(Some(6), 0)];
        assert_eq!(resolve_budgets(&with_override, None)[&key()], 91667);
    }

    #[test]
    fn test_full_year_of_large_yearly_budget() {
        let (_dir, conn) = test_db();
        // Stored outside the budget API, above its cap.
        conn.execute(
            "INSERT INTO budget_entries (txn_type, category, year, amount) VALUES ('Expenses', 'Groceries', 2025, ?1)",
            [800_000_000_000_000_000i64],
        )
        .unwrap();
        let summary = summarize(&conn, 2025, None).unwrap();
        assert_eq!(summary.totals.expenses.budget, 800_000_000_000_000_000);

        let entries = vec![entry(None, budgets::MAX_AMOUNT), entry(Some(6), 0)];
        assert_eq!(resolve_budgets(&entries, None)[&key()], 91_666_666_666_667);
    }

    #[test]
    fn test_sub_types_are_summed_per_category() {
        let mut needs = entry(None, 60000);
        needs.sub_type = Some("Needs".to_string());
        let mut wants = entry(None, 24000);
        wants.sub_type = Some("Wants".to_string());
        assert_eq!(resolve_budgets(&[needs, wants], Some(1))[&key()], 7000);
    }

    #[test]
    fn test_fixed_cost_ratio_reference_figures() {
        let (_dir, conn) = test_db();
        add_txn(&conn, "2025-02-25", TxnType::Income, "Employment", 500000);
        add_txn(&conn, "2025-02-01", TxnType::Expenses, "Housing", -150000);
        add_txn(&conn, "2025-02-05", TxnType::Expenses, "Health Insurance", -30000);
        add_txn(&conn, "2025-02-06", TxnType::Expenses, "Health Other", -10000);
        add_txn(&conn, "2025-02-07", TxnType::Expenses, "Tax", -20000);
        add_txn(&conn, "2025-02-08", TxnType::Expenses, "Groceries", -40000);

        let summary = summarize(&conn, 2025, Some(2)).unwrap();
        assert_eq!(summary.fixed_cost_ratio, 42.0);
        assert_eq!(summary.totals.expenses.actual, 250000);
        assert_eq!(summary.totals.net.actual, 250000);

        let custom = summarize_with(&conn, 2025, Some(2), &["Housing".to_string()]).unwrap();
        assert_eq!(custom.fixed_cost_ratio, 30.0);
    }

    #[test]
    fn test_fixed_cost_ratio_without_income_is_zero() {
        let (_dir, conn) = test_db();
        add_txn(&conn, "2025-02-01", TxnType::Expenses, "Housing", -150000);
        assert_eq!(summarize(&conn, 2025, Some(2)).unwrap().fixed_cost_ratio, 0.0);
    }

    #[test]
    fn test_year_over_year_delta() {
        let (_dir, conn) = test_db();
        add_txn(&conn, "2024-02-25", TxnType::Income, "Employment", 100000);
        add_txn(&conn, "2024-02-10", TxnType::Expenses, "Groceries", -40000);
        add_txn(&conn, "2025-02-25", TxnType::Income, "Employment", 120000);
        add_txn(&conn, "2025-02-10", TxnType::Expenses, "Groceries", -30000);
        add_txn(&conn, "2025-02-11", TxnType::Savings, "Pillar 3a", -10000);
        // Other months must not leak into the comparison.
        add_txn(&conn, "2024-03-25", TxnType::Income, "Employment", 999900);

        let summary = summarize(&conn, 2025, Some(2)).unwrap();
        assert_eq!(summary.totals.net.actual, 80000);
        let prior = &summary.previous_period;
        assert_eq!((prior.year, prior.month), (2024, Some(2)));
        assert_eq!(prior.net, 60000);
        assert_eq!(prior.delta, 20000);
        assert_eq!(prior.delta_percent, 33.3);
    }

    #[test]
    fn test_year_over_year_without_prior_data() {
        let (_dir, conn) = test_db();
        add_txn(&conn, "2025-02-25", TxnType::Income, "Employment", 120000);
        let prior = summarize(&conn, 2025, None).unwrap().previous_period;
        assert_eq!(prior.net, 0);
        assert_eq!(prior.delta, 120000);
        assert_eq!(prior.delta_percent, 0.0);
    }

    #[test]
    fn test_lines_combine_actuals_and_budgets() {
        let (_dir, conn) = test_db();
        add_budget(&conn, TxnType::Expenses, "Groceries", None, 120000);
        add_budget(&conn, TxnType::Expenses, "Groceries", Some(3), 15000);
        add_budget(&conn, TxnType::Expenses, "Sport", None, 24000);
        add_budget(&conn, TxnType::Expenses, "Travel", None, 0);
        add_txn(&conn, "2025-03-02", TxnType::Expenses, "Groceries", -9000);
        add_txn(&conn, "2025-03-09", TxnType::Expenses, "Groceries", -4500);
        add_txn(&conn, "2025-03-10", TxnType::Expenses, "Groceries", 1500);
        add_txn(&conn, "2025-03-12", TxnType::Expenses, "Restaurants", -20000);

        let summary = summarize(&conn, 2025, Some(3)).unwrap();
        let names: Vec<&str> = summary.expenses.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(names, vec!["Restaurants", "Groceries", "Sport"]);

        let groceries = &summary.expenses[1];
        assert_eq!(groceries.actual, 12000);
        assert_eq!(groceries.budget, 15000);
        assert_eq!(groceries.remaining, 3000);
        assert_eq!(groceries.percent_complete, 80.0);

        let restaurants = &summary.expenses[0];
        assert_eq!(restaurants.budget, 0);
        assert_eq!(restaurants.remaining, -20000);
        assert_eq!(restaurants.percent_complete, 0.0);

        let sport = &summary.expenses[2];
        assert_eq!((sport.actual, sport.budget), (0, 2000));
        assert_eq!(summary.totals.expenses.budget, 17000);
        assert_eq!(summary.totals.net.budget, -17000);
        assert_eq!(summary.latest_transaction_date, NaiveDate::from_ymd_opt(2025, 3, 12));
    }

    #[test]
    fn test_full_year_summary_uses_amortized_budget() {
        let (_dir, conn) = test_db();
        add_budget(&conn, TxnType::Expenses, "Groceries", None, 120000);
        add_budget(&conn, TxnType::Expenses, "Groceries", Some(3), 15000);
        let summary = summarize(&conn, 2025, None).unwrap();
        assert_eq!(summary.expenses[0].budget, 125000);
    }

    #[test]
    fn test_empty_store() {
        let (_dir, conn) = test_db();
        let summary = summarize(&conn, 2025, Some(1)).unwrap();
        assert!(summary.income.is_empty() && summary.expenses.is_empty() && summary.savings.is_empty());
        assert_eq!(summary.totals.net, Totals::default());
        assert_eq!(summary.latest_transaction_date, None);
        assert!(available_years(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_trend_has_twelve_zero_filled_rows() {
        let (_dir, conn) = test_db();
        let rows = trend(&conn, 2025, None).unwrap();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().enumerate().all(|(i, r)| r.month == i as u32 + 1 && r.expenses == 0));
    }

    #[test]
    fn test_trend_with_category_filter() {
        let (_dir, conn) = test_db();
        add_budget(&conn, TxnType::Expenses, "Groceries", None, 120000);
        add_budget(&conn, TxnType::Expenses, "Groceries", Some(3), 15000);
        add_budget(&conn, TxnType::Expenses, "Sport", None, 24000);
        add_txn(&conn, "2025-03-02", TxnType::Expenses, "Groceries", -9000);
        add_txn(&conn, "2025-03-05", TxnType::Expenses, "Sport", -5000);
        add_txn(&conn, "2025-06-25", TxnType::Income, "Employment", 500000);

        let all = trend(&conn, 2025, None).unwrap();
        assert_eq!(all[2].expenses, 14000);
        assert_eq!(all[2].expenses_budget, 17000);
        assert_eq!(all[3].expenses_budget, 12000);
        assert_eq!(all[5].income, 500000);

        let filter = vec!["Groceries".to_string()];
        let groceries = trend(&conn, 2025, Some(&filter)).unwrap();
        assert_eq!(groceries.len(), 12);
        assert_eq!(groceries[2].expenses, 9000);
        assert_eq!(groceries[2].expenses_budget, 15000);
        assert_eq!(groceries[3].expenses_budget, 10000);
        assert_eq!(groceries[5].income, 0);
    }

    #[test]
    fn test_available_years_newest_first() {
        let (_dir, conn) = test_db();
        add_txn(&conn, "2023-05-01", TxnType::Expenses, "Groceries", -100);
        add_txn(&conn, "2025-05-01", TxnType::Expenses, "Groceries", -100);
        add_txn(&conn, "2024-05-01", TxnType::Expenses, "Groceries", -100);
        add_txn(&conn, "2025-06-01", TxnType::Expenses, "Groceries", -100);
        assert_eq!(available_years(&conn).unwrap(), vec![2025, 2024, 2023]);
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(100000, 12), 8333);
        assert_eq!(div_round(6, 12), 1);
        assert_eq!(div_round(5, 12), 0);
        assert_eq!(div_round(-6, 12), -1);
    }
}
