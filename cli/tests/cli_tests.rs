//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("jsonshape").expect("binary should exist")
}

fn user_bundle() -> String {
    serde_json::json!({
        "products": [
            {
                "name": "User",
                "fields": [
                    { "name": "id", "shape": "i64" },
                    { "name": "name", "shape": "string" },
                    { "name": "nickname", "shape": { "optional": "string" } }
                ]
            }
        ],
        "root": { "named": { "name": "User" } }
    })
    .to_string()
}

// ── Check ───────────────────────────────────────────────────────────────────

#[test]
fn test_check_valid_document() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": 7, "name": "ada"}"#).unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\":true"));
}

#[test]
fn test_check_reports_every_error_with_paths() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    // id has the wrong kind AND name is missing: both must be reported.
    fs::write(&input, r#"{"id": "seven"}"#).unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("/id"))
        .stdout(predicate::str::contains("/name"))
        .stdout(predicate::str::contains("required property is missing"));
}

#[test]
fn test_check_rejects_unknown_key_by_default() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": 7, "name": "ada", "extra": 1}"#).unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("/extra"))
        .stdout(predicate::str::contains("unexpected property"));
}

#[test]
fn test_check_ignore_unknown_flag() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": 7, "name": "ada", "extra": 1}"#).unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .arg("--ignore-unknown")
        .assert()
        .success();
}

// ── Normalize ───────────────────────────────────────────────────────────────

#[test]
fn test_normalize_to_stdout() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"name": "ada", "id": 7}"#).unwrap();

    cmd()
        .args(["normalize", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\""))
        .stdout(predicate::str::contains("\"name\""));
}

#[test]
fn test_normalize_to_file_drops_absent_optional() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");
    let output = dir.path().join("out.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": 7, "name": "ada"}"#).unwrap();

    cmd()
        .args(["normalize", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();

    let out_content = fs::read_to_string(&output).expect("output file should exist");
    let parsed: serde_json::Value =
        serde_json::from_str(&out_content).expect("output should be valid JSON");
    assert_eq!(parsed, serde_json::json!({"id": 7, "name": "ada"}));
}

#[test]
fn test_normalize_compact_format() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": 7, "name": "ada"}"#).unwrap();

    cmd()
        .args(["normalize", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .args(["--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{\"id\":7,\"name\":\"ada\"}"));
}

#[test]
fn test_normalize_invalid_document_fails() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, r#"{"id": true, "name": "ada"}"#).unwrap();

    cmd()
        .args(["normalize", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match"));
}

// ── Error Handling ──────────────────────────────────────────────────────────

#[test]
fn test_missing_bundle_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(&input, "{}").unwrap();

    cmd()
        .args(["check", "nonexistent.json", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open bundle file"));
}

#[test]
fn test_malformed_input_json() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    fs::write(&bundle, user_bundle()).unwrap();
    fs::write(&input, "{not json").unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON"));
}

#[test]
fn test_duplicate_type_in_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.json");
    let input = dir.path().join("doc.json");

    let doubled = serde_json::json!({
        "products": [
            { "name": "User", "fields": [{ "name": "id", "shape": "i64" }] },
            { "name": "User", "fields": [{ "name": "id", "shape": "i32" }] }
        ],
        "root": { "named": { "name": "User" } }
    });
    fs::write(&bundle, doubled.to_string()).unwrap();
    fs::write(&input, r#"{"id": 1}"#).unwrap();

    cmd()
        .args(["check", bundle.to_str().unwrap(), input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting types"));
}
