use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const BANK_CSV: &str = "\
Account number:;0240 00123456.01;
From:;2025-01-01;

Trade date;Booking date;Currency;Debit;Credit;Balance;Description1;Description2;Description3
03.01.2025;03.01.2025;CHF;-1'850,00;;;Pilet + Renaud SA;Rent January;
15.01.2025;15.01.2025;CHF;;5'200,50;;Webloyalty Sarl;;Salaire janvier
17.01.2025;17.01.2025;CHF;-42,35;;;Migros Geneve;Debit card;
21.01.2025;21.01.2025;CHF;-15,90;;;Netflix.com;;
32.01.2025;32.01.2025;CHF;-1,00;;;Broken date;;
";

fn lucid(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lucid").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("data");
    lucid(home.path())
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized Lucid"));
    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, BANK_CSV).unwrap();
    (home, csv)
}

#[test]
fn commands_fail_before_init() {
    let home = tempfile::tempdir().unwrap();
    lucid(home.path())
        .args(["rules", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lucid init"));
}

#[test]
fn import_is_idempotent() {
    let (home, csv) = setup();
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 imported"))
        .stdout(predicate::str::contains("1 malformed row"));

    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 imported, 4 skipped"));
}

#[test]
fn wrong_format_is_rejected() {
    let (home, csv) = setup();
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "card"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized column layout"));
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn rules_apply_and_summary_json() {
    let (home, csv) = setup();
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank"])
        .assert()
        .success();

    lucid(home.path())
        .args(["rules", "add", "netflix", "--category", "Media", "--amount-op", "<", "--amount", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added rule 1"));
    lucid(home.path())
        .args(["rules", "apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 4 transactions reclassified"));
    lucid(home.path())
        .args(["rules", "apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 4"));

    lucid(home.path())
        .args(["budget", "set", "--category", "Media", "--year", "2025", "240.00"])
        .assert()
        .success();

    let output = lucid(home.path())
        .args(["summary", "--year", "2025", "--month", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let media = summary["expenses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["category"] == "Media")
        .unwrap();
    assert_eq!(media["actual"], 1590);
    assert_eq!(media["budget"], 2000);
    assert_eq!(summary["totals"]["income"]["actual"], 520050);
}

#[test]
fn invalid_regex_rule_is_refused() {
    let (home, _) = setup();
    lucid(home.path())
        .args(["rules", "add", "([", "--category", "Extras", "--match-type", "regex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid rule"));
}

#[test]
fn duplicate_budget_month_is_upserted() {
    let (home, _) = setup();
    for amount in ["150", "175"] {
        lucid(home.path())
            .args(["budget", "set", "--category", "Groceries", "--year", "2025", "--month", "3", amount])
            .assert()
            .success();
    }
    lucid(home.path())
        .args(["budget", "list", "--year", "2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains("175.00"))
        .stdout(predicate::str::contains("150.00").not());
}

#[test]
fn trend_has_twelve_months() {
    let (home, csv) = setup();
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank"])
        .assert()
        .success();
    let output = lucid(home.path())
        .args(["trend", "--year", "2025", "--categories", "Housing,Groceries", "--json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0]["expenses"], 189235);
    assert_eq!(rows[0]["income"], 0);
}

#[test]
fn status_reports_counts() {
    let (home, csv) = setup();
    lucid(home.path())
        .args(["import", csv.to_str().unwrap(), "--format", "bank"])
        .assert()
        .success();
    lucid(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions:   4"))
        .stdout(predicate::str::contains("statement.csv"));
}

#[test]
fn bad_month_is_rejected() {
    let (home, _) = setup();
    lucid(home.path())
        .args(["summary", "--year", "2025", "--month", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));
    lucid(home.path())
        .args(["tx", "list", "--month", "2025-xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));
}
