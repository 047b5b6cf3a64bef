//! CLI Integration Tests
//!
//! Tests the `cellsense` binary directly using assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{Formula, Workbook as XlsxWorkbook};
use std::path::PathBuf;
use tempfile::TempDir;

/// A1=0, B1=10, C1==B1/A1 (#DIV/0!), D1==C1*2, A2:A17 fifteen 10s and a 100.
fn model(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("model.xlsx");
    let mut book = XlsxWorkbook::new();
    let sheet = book.add_worksheet();
    sheet.set_name("Model").unwrap();
    sheet.write_number(0, 0, 0.0).unwrap();
    sheet.write_number(0, 1, 10.0).unwrap();
    sheet
        .write_formula(0, 2, Formula::new("=B1/A1").set_result("#DIV/0!"))
        .unwrap();
    sheet
        .write_formula(0, 3, Formula::new("=C1*2").set_result("#DIV/0!"))
        .unwrap();
    for row in 1..16 {
        sheet.write_number(row, 0, 10.0).unwrap();
    }
    sheet.write_number(16, 0, 100.0).unwrap();
    book.save(&path).unwrap();
    path
}

fn cellsense() -> Command {
    let mut cmd = Command::cargo_bin("cellsense").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    cellsense()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cellsense"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    cellsense()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cellsense"));
}

#[test]
fn test_structure_help() {
    cellsense()
        .args(["structure", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Intermediates"));
}

// ═══════════════════════════════════════════════════════════════════════════
// ANALYSIS COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_errors_command() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("errors")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("#DIV/0!"))
        .stdout(predicate::str::contains("A1 is zero or empty"))
        .stdout(predicate::str::contains("Found 2 calculation errors"));
}

#[test]
fn test_explain_command() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .args(["explain"])
        .arg(&path)
        .arg("C1")
        .assert()
        .success()
        .stdout(predicate::str::contains("=IF(A1=0;\"\";B1/A1)"));
}

#[test]
fn test_structure_command() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("structure")
        .arg(&path)
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inputs: A1, B1"))
        .stdout(predicate::str::contains("Outputs: D1"))
        .stdout(predicate::str::contains("Evaluation Order"));
}

#[test]
fn test_precedents_and_dependents_commands() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("precedents")
        .arg(&path)
        .arg("c1")
        .assert()
        .success()
        .stdout(predicate::str::contains("C1 reads: B1, A1"));
    cellsense()
        .arg("dependents")
        .arg(&path)
        .arg("C1")
        .assert()
        .success()
        .stdout(predicate::str::contains("is read by: D1"));
}

#[test]
fn test_outliers_command() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("outliers")
        .arg(&path)
        .arg("A2:A17")
        .assert()
        .success()
        .stdout(predicate::str::contains("A17"))
        .stdout(predicate::str::contains("z = 3.75"));
}

#[test]
fn test_stats_command() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("stats")
        .arg(&path)
        .arg("B")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sum:    10"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION AND FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_caps_range_reads() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    let config = dir.path().join("analysis.yaml");
    std::fs::write(&config, "max_cells: 2\n").unwrap();
    cellsense()
        .arg("--config")
        .arg(&config)
        .arg("read")
        .arg(&path)
        .arg("A1:D1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("too large"));
}

#[test]
fn test_missing_workbook_fails() {
    let dir = TempDir::new().unwrap();
    cellsense()
        .arg("errors")
        .arg(dir.path().join("missing.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workbook error"));
}

#[test]
fn test_bad_address_fails() {
    let dir = TempDir::new().unwrap();
    let path = model(&dir);
    cellsense()
        .arg("precedents")
        .arg(&path)
        .arg("1A")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid cell address"));
}
