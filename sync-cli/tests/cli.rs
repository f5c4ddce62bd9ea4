//! End-to-end tests for the cleanout-sync binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cleanout-sync").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

/// Point the backend at a port nothing listens on.
fn write_offline_config(data_dir: &Path) {
    std::fs::write(
        data_dir.join("cleanout-sync.toml"),
        r#"
[backend]
base_url = "http://127.0.0.1:1"
health_timeout_secs = 1
"#,
    )
    .unwrap();
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("cleanout-sync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("enqueue"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn enqueued_operation_survives_between_runs() {
    let dir = tempdir().unwrap();

    cli(dir.path())
        .args(["enqueue", "delete", "job", "J1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued delete job"));

    cli(dir.path())
        .args(["status", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 1"))
        .stdout(predicate::str::contains("delete job J1"));

    assert!(dir.path().join("cleanout").join("sync_queue.json").exists());
}

#[test]
fn enqueue_room_requires_existing_image() {
    let dir = tempdir().unwrap();

    cli(dir.path())
        .args([
            "enqueue", "room", "--job", "J1", "--name", "Garage", "--image", "missing.jpg",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Image not found"));
}

#[test]
fn enqueue_room_with_image() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("garage.jpg");
    std::fs::write(&image, b"jpeg").unwrap();

    cli(dir.path())
        .args(["enqueue", "room", "--job", "J1", "--name", "Garage", "--number", "3"])
        .arg("--image")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued create room"))
        .stdout(predicate::str::contains("Pending: 1"));
}

#[test]
fn sync_while_offline_keeps_queue() {
    let dir = tempdir().unwrap();
    write_offline_config(dir.path());

    cli(dir.path())
        .args(["enqueue", "delete", "room", "R1"])
        .assert()
        .success();

    cli(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend unreachable"))
        .stdout(predicate::str::contains("Pending: 1"));
}

#[test]
fn clear_all_discards_queue() {
    let dir = tempdir().unwrap();

    cli(dir.path())
        .args(["enqueue", "delete", "customer", "C1"])
        .assert()
        .success();

    cli(dir.path())
        .args(["clear", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Discarded 1 operations"));

    cli(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 0"));
}

#[test]
fn login_then_logout() {
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("cleanout").join("auth_token.json");

    cli(dir.path())
        .args(["login", "--token", "tok-123"])
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&token_file).unwrap(), "tok-123");

    cli(dir.path()).arg("logout").assert().success();
    assert!(!token_file.exists());
}

#[test]
fn sqlite_storage_backend() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("cleanout-sync.toml"),
        "[storage]\nbackend = \"sqlite\"\n",
    )
    .unwrap();

    cli(dir.path())
        .args(["enqueue", "delete", "job", "J9"])
        .assert()
        .success();

    cli(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 1"));
    assert!(dir.path().join("cleanout-sync.db").exists());
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("cleanout-sync.toml"), "[backend\n").unwrap();

    cli(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn unknown_entity_is_rejected() {
    let dir = tempdir().unwrap();

    cli(dir.path())
        .args(["enqueue", "delete", "truck", "T1"])
        .assert()
        .failure();
}
