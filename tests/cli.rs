//! End-to-end checks of the `heartbeat-rs` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

const ENV_KEYS: &[&str] = &[
    "HEARTBEAT_ROLE",
    "HEARTBEAT_USER",
    "HEARTBEAT_VECTOR_URL",
    "HEARTBEAT_DATA_DIR",
    "HEARTBEAT_PRIMARY_ENDPOINT",
    "HEARTBEAT_PROMPT_DIR",
    "HEARTBEAT_VOCABULARY",
    "CLIPS_BASE_PATH",
    "OPENAI_API_KEY",
    "RUST_LOG",
];

fn heartbeat() -> Command {
    let mut cmd = Command::cargo_bin("heartbeat-rs").unwrap_or_else(|_| unreachable!());
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn write_fixture(root: &Path) {
    let tables = root.join("tables/player_performance");
    std::fs::create_dir_all(&tables).unwrap_or_else(|_| unreachable!());
    std::fs::write(
        tables.join("skaters.json"),
        json!({
            "columns": ["player", "gp", "points"],
            "rows": [
                ["Nick Suzuki", 60, 58],
                ["Cole Caufield", 60, 49]
            ]
        })
        .to_string(),
    )
    .unwrap_or_else(|_| unreachable!());
}

#[test]
fn classify_reports_route_as_json() {
    heartbeat()
        .args([
            "--format",
            "json",
            "classify",
            "How is Suzuki performing this season?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"player_analysis\""))
        .stdout(predicate::str::contains("structured_query"))
        .stdout(predicate::str::contains("\"data_only\""));
}

#[test]
fn classify_rejects_unknown_role() {
    heartbeat()
        .args(["classify", "hello", "--role", "goalie"])
        .assert()
        .failure();
}

#[test]
fn query_offline_answers_from_tables() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    write_fixture(dir.path());

    heartbeat()
        .args(["--format", "json", "query", "How is Suzuki performing this season?"])
        .arg("--data-dir")
        .arg(dir.path().join("tables"))
        .arg("--offline")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("[skaters:player_performance]"))
        .stdout(predicate::str::contains("Nick Suzuki"));
}

#[test]
fn query_rejects_empty_question() {
    heartbeat()
        .args(["query", "   ", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("encountered an error processing"));
}

#[test]
fn init_prompts_writes_role_files() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());

    heartbeat()
        .arg("init-prompts")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 role prompt(s)"));

    for role in ["coach", "player", "analyst", "scout", "staff"] {
        assert!(dir.path().join(format!("{role}.md")).exists());
    }
}
