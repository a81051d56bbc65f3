//! Integration tests for the `busmon` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn busmon(rules: &Path) -> Command {
    let mut cmd = Command::cargo_bin("busmon").unwrap();
    cmd.env_remove("BUSMON_RULES").arg("--rules").arg(rules);
    cmd
}

fn add_dlq_rule(rules: &Path) {
    busmon(rules)
        .args([
            "rules",
            "add",
            "--id",
            "dlq-10",
            "--name",
            "Prod dead letters",
            "--type",
            "dead-letter",
            "--severity",
            "critical",
            "--threshold",
            "10",
            "--pattern",
            "^prod-",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rule 'Prod dead letters' created"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("busmon")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("evaluate"));
}

#[test]
fn list_without_rules_file() {
    let dir = tempfile::tempdir().unwrap();
    busmon(&dir.path().join("rules.json"))
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout("No rules found\n");
}

#[test]
fn added_rule_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    add_dlq_rule(&rules);

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&rules).unwrap()).unwrap();
    assert_eq!(saved[0]["Id"], "dlq-10");
    assert_eq!(saved[0]["Type"], "DeadLetterThreshold");
    assert_eq!(saved[0]["Severity"], "Critical");
    assert_eq!(saved[0]["EntityPattern"], "^prod-");

    busmon(&rules)
        .args(["--format", "json", "rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"dlq-10\""));
}

#[test]
fn disable_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    add_dlq_rule(&rules);

    busmon(&rules)
        .args(["rules", "disable", "dlq-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    busmon(&rules)
        .args(["--format", "json", "rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"enabled\": false"));
}

#[test]
fn remove_unknown_rule_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    busmon(&dir.path().join("rules.json"))
        .args(["rules", "remove", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rule not found: missing"));
}

#[test]
fn evaluate_reports_matching_breaches() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    add_dlq_rule(&rules);

    let snapshot = dir.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{"queues": [
            {"name": "prod-orders", "dead_letter_count": 15},
            {"name": "dev-orders", "dead_letter_count": 999}
        ]}"#,
    )
    .unwrap();

    busmon(&rules)
        .args(["evaluate", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("prod-orders"))
        .stdout(predicate::str::contains("dev-orders").not())
        .stdout(predicate::str::contains("Total: 1 alerts"));
}

#[test]
fn evaluate_rejects_malformed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    fs::write(&snapshot, "[1, 2").unwrap();

    busmon(&dir.path().join("rules.json"))
        .args(["evaluate", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid snapshot"));
}

#[test]
fn test_command_raises_test_alert() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    add_dlq_rule(&rules);

    busmon(&rules)
        .args(["test", "dlq-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Test Entity]"));
}

#[test]
fn unreadable_rules_file_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    add_dlq_rule(&rules);
    let saved = fs::read_to_string(&rules).unwrap();
    let damaged = format!("{},", saved.trim_end());
    fs::write(&rules, &damaged).unwrap();

    busmon(&rules)
        .args([
            "rules",
            "add",
            "--id",
            "other",
            "--name",
            "Other",
            "--type",
            "queue-size",
            "--threshold",
            "5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read rules file"));

    assert_eq!(fs::read_to_string(&rules).unwrap(), damaged);
}

#[test]
fn failed_rules_write_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    fs::create_dir_all(&rules).unwrap();

    busmon(&rules)
        .args([
            "rules",
            "add",
            "--id",
            "dlq-10",
            "--name",
            "Dead letters",
            "--type",
            "dead-letter",
            "--threshold",
            "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to write rules file"))
        .stdout(predicate::str::contains("created").not());
}
