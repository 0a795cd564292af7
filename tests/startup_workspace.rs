mod common;

use common::Sidecar;
use serde_json::json;
use std::process::{Command, Stdio};

#[test]
fn workspace_from_environment_is_opened_at_startup() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let path = workspace.path().to_string_lossy().to_string();
    let mut sc = Sidecar::spawn_with_env(&[("PLANBOOKD_WORKSPACE", path.as_str())]);

    let health = sc.ok("health", json!({}));
    assert_eq!(health["workspacePath"], path.as_str());
    sc.ok("subjects.list", json!({}));
    assert!(workspace.path().join("planbook.sqlite3").is_file());
}

#[test]
fn unopenable_startup_workspace_exits_non_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("plain-file");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    let bad = blocker.join("workspace");

    let status = Command::new(env!("CARGO_BIN_EXE_planbookd"))
        .env("PLANBOOKD_WORKSPACE", &bad)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run planbookd");
    assert!(!status.success());
}

#[test]
fn failed_select_keeps_previous_workspace() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("plain-file");
    std::fs::write(&blocker, b"x").expect("write blocker");

    let mut sc = Sidecar::open(workspace.path());
    assert_eq!(
        sc.err_code(
            "workspace.select",
            json!({ "path": blocker.join("ws").to_string_lossy() })
        ),
        "db_open_failed"
    );
    let health = sc.ok("health", json!({}));
    assert_eq!(
        health["workspacePath"],
        workspace.path().to_string_lossy().as_ref()
    );
    sc.ok("subjects.list", json!({}));
}
