//! Binary-level tests for the `eligor` CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn valid_package() -> String {
    serde_json::json!({
        "metadata": {"programId": "snap", "jurisdiction": "US-WA", "source": "WAC 388-400"},
        "rules": [{
            "id": "snap_income",
            "name": "SNAP income limit",
            "programId": "snap",
            "ruleType": "eligibility",
            "ruleLogic": {"<=": [{"var": "householdIncome"}, 2072]},
            "citations": [{"source": "WAC 388-478-0060"}],
            "testCases": [
                {"id": "under", "description": "", "input": {"householdIncome": 1500}, "expected": true},
                {"id": "over", "description": "", "input": {"householdIncome": 2500}, "expected": false}
            ]
        }]
    })
    .to_string()
}

#[test]
fn check_passes_on_a_valid_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "snap.json", &valid_package());

    Command::cargo_bin("eligor")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("structure valid"))
        .stdout(predicate::str::contains("2 passed, 0 failed"));
}

#[test]
fn check_fails_on_duplicate_rule_ids() {
    let mut doc: serde_json::Value = serde_json::from_str(&valid_package()).unwrap();
    let rule = doc["rules"][0].clone();
    doc["rules"].as_array_mut().unwrap().push(rule);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "dupes.json", &doc.to_string());

    Command::cargo_bin("eligor")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("duplicate rule id"));
}

#[test]
fn check_fails_on_a_failing_embedded_test() {
    let mut doc: serde_json::Value = serde_json::from_str(&valid_package()).unwrap();
    doc["rules"][0]["testCases"][1]["expected"] = serde_json::json!(true);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "failing.json", &doc.to_string());

    Command::cargo_bin("eligor")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 failed"))
        .stdout(predicate::str::contains("expected value does not match"));
}

#[test]
fn one_bad_file_does_not_abort_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_file(&dir, "bad.json", "{not json");
    let good = write_file(&dir, "good.json", &valid_package());

    Command::cargo_bin("eligor")
        .unwrap()
        .arg("check")
        .arg(&bad)
        .arg(&good)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error parsing JSON"))
        .stdout(predicate::str::contains("structure valid"));
}

#[test]
fn strict_env_promotes_missing_citations() {
    let mut doc: serde_json::Value = serde_json::from_str(&valid_package()).unwrap();
    doc["rules"][0]["citations"] = serde_json::json!([]);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "uncited.json", &doc.to_string());

    // Standard mode: warning only, exit 0.
    Command::cargo_bin("eligor")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .success();

    // STRICT=1: promoted to a hard failure.
    Command::cargo_bin("eligor")
        .unwrap()
        .env("STRICT", "1")
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing_citations"));
}

#[test]
fn eval_prints_the_determination_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = write_file(&dir, "snap.json", &valid_package());
    let data = write_file(&dir, "answers.json", r#"{"householdIncome": 1800}"#);

    Command::cargo_bin("eligor")
        .unwrap()
        .args(["eval"])
        .arg(&pkg)
        .args(["--rule", "snap_income", "--data"])
        .arg(&data)
        .args(["--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"result\": true"))
        .stdout(predicate::str::contains("householdIncome"));
}

#[test]
fn eval_unknown_rule_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = write_file(&dir, "snap.json", &valid_package());
    let data = write_file(&dir, "answers.json", "{}");

    Command::cargo_bin("eligor")
        .unwrap()
        .args(["eval"])
        .arg(&pkg)
        .args(["--rule", "nope", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn explain_prints_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = write_file(&dir, "snap.json", &valid_package());
    let data = write_file(&dir, "answers.json", r#"{"householdIncome": 2500}"#);

    Command::cargo_bin("eligor")
        .unwrap()
        .args(["explain"])
        .arg(&pkg)
        .args(["--rule", "snap_income", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("requirements were not met"));
}
