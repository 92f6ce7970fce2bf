use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn kanban_board() -> Command {
    let mut cmd = Command::cargo_bin("kanban-board").unwrap();
    cmd.env_remove("KANBAN_DEBUG_LOG")
        .env_remove("KANBAN_DATABASE")
        .env_remove("KANBAN_CONFIG")
        .env("RUST_LOG", "error");
    cmd
}

fn parse_json_output(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("Failed to parse JSON output")
}

#[test]
fn test_migrate_full_schema() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("board.db");

    let output = kanban_board()
        .args(["migrate", "--database", db.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = parse_json_output(&output);
    assert!(json["success"].as_bool().unwrap());
    assert_eq!(json["data"]["applied"], serde_json::json!([1, 2]));
    assert_eq!(json["data"]["ordering"], true);
}

#[test]
fn test_migrate_skip_ordering_then_status() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("board.db");

    kanban_board()
        .args(["migrate", "--database", db.to_str().unwrap(), "--skip-ordering"])
        .assert()
        .success();

    let output = kanban_board()
        .args(["status", "--database", db.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = parse_json_output(&output);
    assert_eq!(json["data"]["schemaVersion"], 1);
    assert_eq!(json["data"]["latestVersion"], 2);
    assert_eq!(json["data"]["ordering"], false);
    assert_eq!(json["data"]["tagging"], true);
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();

    kanban_board()
        .args([
            "--config",
            dir.path().join("absent.toml").to_str().unwrap(),
            "status",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_help_lists_commands() {
    kanban_board()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("status"));
}
