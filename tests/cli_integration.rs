//! Integration tests for the taskboard CLI
//!
//! These tests exercise the binary end-to-end using a temporary database.
//! They verify that commands work without mocking.

use std::path::Path;
use std::process::Command;
use taskboard::{Database, NewProjectInput, NewTaskInput};
use tempfile::TempDir;

/// Helper to run taskboard CLI with a specific database path
fn run_taskboard(args: &[&str], db_path: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(args)
        .env("TASKBOARD_DB_PATH", db_path)
        .output()
        .expect("Failed to execute taskboard")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("taskboard"));
    assert!(out.contains("project board"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("taskboard"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    let out = stdout(&output);
    assert!(
        out.contains("#compdef taskboard"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion bash failed: {}",
        stderr(&output)
    );
    let out = stdout(&output);
    assert!(
        out.contains("_taskboard"),
        "bash completion should contain _taskboard function"
    );
}

// =============================================================================
// Workspace / Listing Tests
// =============================================================================

#[test]
fn test_init_creates_workspace() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "init failed: {}", stderr(&output));
    assert!(dir.path().join(".taskboard/config.toml").exists());
    assert!(dir.path().join(".taskboard/taskboard.db").exists());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    for _ in 0..2 {
        let output = Command::new(env!("CARGO_BIN_EXE_taskboard"))
            .arg("init")
            .current_dir(dir.path())
            .output()
            .expect("Failed to execute");
        assert!(output.status.success());
    }
}

#[test]
fn test_projects_command_empty() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("board.db");
    let output = run_taskboard(&["projects"], &db_path);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No projects"));
}

#[test]
fn test_projects_command_lists_created() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("board.db");
    {
        let db = Database::open_at(&db_path).unwrap();
        db.create_project(&NewProjectInput {
            name: "Atlas".to_string(),
            manager: Some("dana".to_string()),
            ..Default::default()
        })
        .unwrap();
    }

    let output = run_taskboard(&["projects"], &db_path);
    assert!(output.status.success(), "failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Atlas"));
    assert!(out.contains("Todo"));
    assert!(out.contains("dana"));
}

#[test]
fn test_tasks_command_lists_board() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("board.db");
    let project_id = {
        let db = Database::open_at(&db_path).unwrap();
        let project = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.create_task(&NewTaskInput {
            project_id: project.id.clone(),
            title: "Ship it".to_string(),
            priority: Some("high".to_string()),
            ..Default::default()
        })
        .unwrap();
        project.id
    };

    let output = run_taskboard(&["tasks", &project_id], &db_path);
    assert!(output.status.success(), "failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Ship it"));
    assert!(out.contains("Todo"));
    assert!(out.contains("unassigned"));
}
