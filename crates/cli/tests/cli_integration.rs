//! CLI integration tests for the `workhist` binary.
//!
//! Every test runs in its own temporary directory so that no stray
//! `workhist.toml` or draft directory leaks between tests.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn workhist(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("workhist");
    cmd.current_dir(dir);
    cmd.env_remove("WORKHIST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

const COMPLETE_RECORD: &str = r#"{
  "projectName": "顧客管理システム刷新",
  "startDate": "2022-04-01",
  "endDate": "2023-03-31",
  "industry": 3,
  "companyName": "株式会社サンプル",
  "teamSize": 8,
  "role": "PL",
  "projectOverview": "基幹システムのクラウド移行プロジェクト",
  "responsibilities": "要件定義から結合テストまでを担当",
  "processes": [1, 2, 3],
  "programmingLanguages": ["Rust", "TypeScript"],
  "serversDatabases": ["PostgreSQL"],
  "tools": ["Git"]
}"#;

const BASIC_INFO_ONLY: &str = r#"{
  "projectName": "在庫管理",
  "startDate": "2021-10-01",
  "industry": 2,
  "teamSize": 5,
  "role": "SE"
}"#;

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Work-history record validation and draft storage",
        ));
}

#[test]
fn version_exits_0() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("workhist"));
}

// ──────────────────────────────────────────────
// 2. validate
// ──────────────────────────────────────────────

#[test]
fn validate_complete_record_exits_0() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "record.json", COMPLETE_RECORD);
    workhist(tmp.path())
        .args(["validate"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("valid (score 100, completion 91%)"));
}

#[test]
fn validate_empty_record_exits_1_and_lists_issues() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "empty.json", "{}");
    workhist(tmp.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::starts_with("invalid"))
        .stdout(predicate::str::contains("REQUIRED"))
        .stdout(predicate::str::contains("MIN_TOTAL_TECHNOLOGIES"));
}

#[test]
fn validate_json_output_is_a_report() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "empty.json", "{}");
    let out = workhist(tmp.path())
        .args(["--output", "json", "validate"])
        .arg(&file)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["isValid"], false);
    assert_eq!(report["overallScore"], 64);
    assert_eq!(report["completionRate"], 0);
    assert!(report["issuesByField"]["projectName"].is_array());
}

#[test]
fn lenient_mode_ignores_unreached_steps() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "basic.json", BASIC_INFO_ONLY);
    workhist(tmp.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .failure();
    workhist(tmp.path())
        .args(["validate", "--mode", "lenient", "--step", "1"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("valid"));
}

#[test]
fn unknown_mode_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "record.json", COMPLETE_RECORD);
    workhist(tmp.path())
        .args(["validate", "--mode", "loose"])
        .arg(&file)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown validation mode"));
}

#[test]
fn validate_missing_file_reports_error() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .args(["validate", "nope.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading file"));
}

#[test]
fn validate_rejects_kind_mismatch() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "bad.json", r#"{"teamSize": "eight"}"#);
    workhist(tmp.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid record"));
}

#[test]
fn quiet_suppresses_error_output() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .args(["--quiet", "validate", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. rules
// ──────────────────────────────────────────────

#[test]
fn rules_prints_built_in_rule_set_as_toml() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("[[rule]]"))
        .stdout(predicate::str::contains("anchor = \"projectName\""))
        .stdout(predicate::str::contains("MIN_TOTAL_TECHNOLOGIES"));
}

#[test]
fn custom_rules_replace_the_built_in_set() {
    let tmp = TempDir::new().unwrap();
    let rules = write(
        tmp.path(),
        "rules.toml",
        r#"
[[rule]]
anchor = "role"
label = "Role"
step = 1
completion = "required"
subject = { field = "role" }
checks = [{ test = { kind = "required" } }]
"#,
    );
    let file = write(tmp.path(), "record.json", r#"{"role": "PM"}"#);
    workhist(tmp.path())
        .arg("validate")
        .arg(&file)
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("valid (score 100, completion 100%)"));
}

#[test]
fn malformed_rules_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    let rules = write(
        tmp.path(),
        "rules.toml",
        r#"
[[rule]]
anchor = "projectName"
label = "Project name"
step = 1
subject = { field = "projectName" }
checks = [{ test = { kind = "pattern", pattern = "([" } }]
"#,
    );
    workhist(tmp.path())
        .arg("rules")
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rules"));
}

// ──────────────────────────────────────────────
// 4. draft
// ──────────────────────────────────────────────

#[test]
fn draft_save_show_clear_cycle() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "record.json", BASIC_INFO_ONLY);
    let store = tmp.path().join("drafts");

    workhist(tmp.path())
        .args(["draft", "save"])
        .arg(&file)
        .arg("--store")
        .arg(&store)
        .args(["--user", "alice", "--step", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved draft to"))
        .stdout(predicate::str::contains("(step 2 of 4)"));
    assert!(store.join("alice").join("work-history.json").is_file());

    workhist(tmp.path())
        .args(["draft", "show", "--user", "alice"])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("draft at step 2 of 4"))
        .stdout(predicate::str::contains("在庫管理"));

    workhist(tmp.path())
        .args(["draft", "clear", "--user", "alice"])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared draft"));

    workhist(tmp.path())
        .args(["draft", "show", "--user", "alice"])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("no resumable draft"));
}

#[test]
fn draft_show_json_without_draft_is_null() {
    let tmp = TempDir::new().unwrap();
    let out = workhist(tmp.path())
        .args(["--output", "json", "draft", "show"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(value["draft"].is_null());
}

#[test]
fn draft_from_another_device_is_not_shown() {
    let tmp = TempDir::new().unwrap();
    let file = write(tmp.path(), "record.json", BASIC_INFO_ONLY);
    let laptop = write(tmp.path(), "laptop.toml", "[session]\ndevice = \"laptop\"\n");
    let phone = write(tmp.path(), "phone.toml", "[session]\ndevice = \"phone\"\n");

    workhist(tmp.path())
        .arg("--config")
        .arg(&laptop)
        .args(["draft", "save"])
        .arg(&file)
        .assert()
        .success();
    workhist(tmp.path())
        .arg("--config")
        .arg(&phone)
        .args(["draft", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no resumable draft"));
}

#[test]
fn oversized_draft_is_refused() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "workhist.toml", "[storage]\nmax_bytes = 64\n");
    let file = write(tmp.path(), "record.json", COMPLETE_RECORD);
    workhist(tmp.path())
        .args(["draft", "save"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft not saved"));
}

// ──────────────────────────────────────────────
// 5. config
// ──────────────────────────────────────────────

#[test]
fn config_defaults_without_a_file() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("autosave_interval_secs = 30"))
        .stdout(predicate::str::contains("validation_mode = \"normal\""));
}

#[test]
fn config_picks_up_workhist_toml_in_working_directory() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "workhist.toml",
        "[session]\nvalidation_mode = \"strict\"\n\n[storage]\nuser = \"bob\"\n",
    );
    workhist(tmp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("validation_mode = \"strict\""))
        .stdout(predicate::str::contains("user = \"bob\""));
}

#[test]
fn explicit_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    workhist(tmp.path())
        .args(["--config", "missing.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading config"));
}
