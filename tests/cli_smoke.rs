//! Black-box smoke tests over the compiled `xchecker` binary.
//!
//! Run with `cargo test --test cli_smoke`.

use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn xchecker_cmd(project_root: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("xchecker"));
    cmd.arg("--project-root").arg(project_root);
    cmd
}

#[test]
fn init_on_a_bare_project_root_succeeds() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["init", "F001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("F001"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_rejects_a_malformed_feature_id() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["init", "not-a-feature"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid feature identifier"));
}

#[test]
fn status_on_an_uninitialized_feature_reports_not_initialized() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["status", "F002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("F002"));
}

#[test]
fn status_json_is_well_formed() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["init", "F003"])
        .assert()
        .success();

    let output = xchecker_cmd(dir.path()).args(["status", "F003", "--json"]).output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status --json must emit valid JSON");
    assert_eq!(parsed["feature_id"], "F003");
}

#[test]
fn advance_without_init_fails_with_feature_not_initialized() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["advance", "F004"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has not been initialized"));
}

#[test]
fn boundary_detect_with_no_shared_files_reports_none() {
    let dir = TempDir::new().unwrap();
    xchecker_cmd(dir.path())
        .args(["boundary", "detect", "--scope", "F005=a.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no shared boundaries found"));
}
