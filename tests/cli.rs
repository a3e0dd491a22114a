//! End-to-end tests for the `bt` binary.
//!
//! stdout is a pipe here, so every command answers in JSON.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn bt(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bt").unwrap();
    cmd.env_remove("BT_STORE")
        .env_remove("BT_REPORT")
        .env_remove("BT_WORKSPACE")
        .env_remove("RUST_LOG")
        .current_dir(dir)
        .arg("--store")
        .arg(dir.join("bugs.json"))
        .arg("--report")
        .arg(dir.join("BUGS.md"));
    cmd
}

fn json_out(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn write_source(dir: &Path) -> String {
    let path = dir.join("a.py");
    let body: String = (1..=12).map(|n| format!("    line_{n} = {n}\n")).collect();
    fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn add_resolve_and_export() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let file = write_source(dir);

    let bug = json_out(bt(dir).args(["add", "off-by-one", "--at", &format!("{file}:10:2"), "-s", "high"]));
    assert_eq!(bug["line"], 9);
    assert_eq!(bug["column"], 1);
    assert_eq!(bug["code"], "line_10 = 10");
    assert_eq!(bug["status"], "open");
    assert_eq!(bug["severity"], "high");
    assert_eq!(bug["isStandalone"], false);
    let id = bug["id"].as_str().unwrap().to_string();

    let updated = json_out(bt(dir).args(["set-status", &id, "resolved"]));
    assert_eq!(updated["status"], "resolved");
    assert_ne!(updated["updatedAt"], bug["updatedAt"]);

    let export = json_out(bt(dir).arg("export"));
    assert_eq!(export["stats"]["records"], 1);
    assert_eq!(export["stats"]["counts"]["open"], 0);
    assert_eq!(export["stats"]["counts"]["resolved"], 1);

    let report = fs::read_to_string(dir.join("BUGS.md")).unwrap();
    assert!(report.contains("| 🔴 Open | 0 |"));
    assert!(report.contains("| 🟢 Resolved | 1 |"));
    assert!(report.contains(&format!("### {id}")));
}

#[test]
fn standalone_note() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let bug = json_out(bt(dir).args(["note", "flaky CI", "-s", "critical"]));
    assert_eq!(bug["isStandalone"], true);
    assert_eq!(bug["line"], 0);
    assert_eq!(bug["code"], "");
    assert_eq!(bug["file"], "");

    let report = fs::read_to_string(dir.join("BUGS.md")).unwrap();
    assert!(report.contains("**Location:** _Standalone_"));
}

#[test]
fn list_filters_and_items() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let file = write_source(dir);

    bt(dir)
        .args(["add", "first", "--at", &format!("{file}:1"), "-s", "low"])
        .assert()
        .success();
    bt(dir).args(["note", "second", "-s", "blocker"]).assert().success();

    let all = json_out(bt(dir).arg("list"));
    assert_eq!(all["count"], 2);

    let critical = json_out(bt(dir).args(["list", "--severity", "critical"]));
    assert_eq!(critical["count"], 1);
    assert_eq!(critical["items"][0]["label"], "second");
    assert_eq!(critical["items"][0]["description"], "standalone [critical] [open]");

    let in_file = json_out(bt(dir).args(["list", "--file", &file]));
    assert_eq!(in_file["count"], 1);
    assert_eq!(in_file["items"][0]["description"], "a.py:1 [low] [open]");

    let marks = json_out(bt(dir).args(["marks", &file]));
    assert_eq!(marks["count"], 1);
    assert_eq!(marks["marks"][0]["endColumn"], 1);
}

#[test]
fn remove_unknown_id_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    bt(dir).args(["note", "keep me"]).assert().success();

    let out = json_out(bt(dir).args(["remove", "bug_doesnotexist"]));
    assert_eq!(out["removed"].as_array().unwrap().len(), 0);
    assert_eq!(out["not_found"][0], "bug_doesnotexist");

    let all = json_out(bt(dir).arg("list"));
    assert_eq!(all["count"], 1);
}

#[test]
fn show_unknown_id_fails_with_not_found() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let output = bt(dir)
        .args(["show", "bug_nope"])
        .assert()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "BUG_NOT_FOUND");
}

#[test]
fn invalid_severity_is_a_validation_error() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    bt(dir).args(["note", "x", "-s", "cosmic"]).assert().code(4);
    assert!(!dir.join("bugs.json").exists());
}

#[test]
fn import_twice_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let target = temp.path().join("target");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&target).unwrap();

    bt(&source).args(["note", "one", "--solution", "_Pending_"]).assert().success();
    bt(&source).args(["note", "two", "-s", "high"]).assert().success();
    let report = source.join("BUGS.md");

    let first = json_out(
        bt(&target)
            .arg("import")
            .arg("--input")
            .arg(&report),
    );
    assert_eq!(first["stats"]["created"].as_array().unwrap().len(), 2);

    let second = json_out(
        bt(&target)
            .arg("import")
            .arg("--input")
            .arg(&report),
    );
    assert_eq!(second["stats"]["created"].as_array().unwrap().len(), 0);
    assert_eq!(second["stats"]["skipped"].as_array().unwrap().len(), 2);

    let listed = json_out(bt(&target).arg("list"));
    assert_eq!(listed["count"], 2);
    let solutions: Vec<&Value> = listed["bugs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| &b["solution"])
        .collect();
    assert!(solutions.contains(&&Value::String("_Pending_".into())));
}

#[test]
fn dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let out = json_out(bt(dir).args(["--dry-run", "note", "preview only"]));
    assert_eq!(out["dry_run"], true);
    assert!(!dir.join("bugs.json").exists());
}

#[test]
fn summary_reports_counts() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    bt(dir).args(["note", "a"]).assert().success();
    bt(dir).args(["note", "b"]).assert().success();

    let status = json_out(bt(dir).arg("summary"));
    assert_eq!(status["total"], 2);
    assert_eq!(status["counts"]["open"], 2);
    assert_eq!(status["report_exists"], true);
    assert_eq!(status["report_stale"], false);
}

#[test]
fn importing_own_report_keeps_a_copy_of_bad_sections() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    bt(dir).args(["note", "tracked"]).assert().success();

    let report = dir.join("BUGS.md");
    let mut text = fs::read_to_string(&report).unwrap();
    text.push_str("### bug_typo\n**Description:** x\n**Severity:** hgih\n**Status:** open\n---\n");
    fs::write(&report, &text).unwrap();

    let out = json_out(bt(dir).arg("import"));
    assert_eq!(out["stats"]["rejected"][0]["id"], "bug_typo");
    assert!(out["stats"]["backup"].as_str().unwrap().ends_with("BUGS.md.bak"));
    assert!(fs::read_to_string(dir.join("BUGS.md.bak")).unwrap().contains("hgih"));
}
