use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const SECRETS: &[&str] = &[
    "DOCCLE_USERNAME",
    "DOCCLE_PASSWORD",
    "PAPERLESS_URL",
    "PAPERLESS_TOKEN",
];

fn command(work: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("doccle-sync").expect("Binary exists");
    cmd.current_dir(work).env("LOG_DIR", work.join("logs"));
    for var in SECRETS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_all_commands() {
    let work = tempdir().unwrap();
    command(work.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("sweep"));
}

#[test]
fn sync_without_credentials_fails_before_any_work() {
    let work = tempdir().unwrap();
    command(work.path())
        .arg("sync")
        .env("DOWNLOAD_DIR", work.path().join("downloads"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCCLE_USERNAME"));

    assert!(!work.path().join("downloads").exists());
}

#[test]
fn sweep_only_needs_ingestion_settings() {
    let work = tempdir().unwrap();
    command(work.path())
        .args(["sweep", "--dir"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("PAPERLESS_URL"))
        .stderr(predicate::str::contains("DOCCLE_USERNAME").not());
}

#[test]
fn sweep_of_unreadable_directory_fails() {
    let work = tempdir().unwrap();
    command(work.path())
        .args(["sweep", "--dir"])
        .arg(work.path().join("absent"))
        .env("PAPERLESS_URL", "http://127.0.0.1:1")
        .env("PAPERLESS_TOKEN", "abc123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read directory"));
}

#[test]
fn sweep_of_empty_directory_succeeds_and_writes_a_log_file() {
    let work = tempdir().unwrap();
    let inbox = work.path().join("inbox");
    fs::create_dir(&inbox).unwrap();

    command(work.path())
        .args(["sweep", "--dir"])
        .arg(&inbox)
        .env("PAPERLESS_URL", "http://127.0.0.1:1")
        .env("PAPERLESS_TOKEN", "abc123")
        .assert()
        .success();

    let logs: Vec<_> = fs::read_dir(work.path().join("logs"))
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("doccle_sync_") && logs[0].ends_with(".log"));
}

#[test]
fn invalid_interval_is_a_startup_error() {
    let work = tempdir().unwrap();
    command(work.path())
        .arg("serve")
        .env("POLL_INTERVAL_SECONDS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("POLL_INTERVAL_SECONDS"));
}

#[test]
fn config_errors_reach_the_log_file() {
    let work = tempdir().unwrap();
    command(work.path())
        .arg("sync")
        .env("HTTP_TIMEOUT_SECONDS", "later")
        .assert()
        .failure();

    let log_dir = work.path().join("logs");
    let entry = fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(Result::ok)
        .next()
        .expect("a log file was created");
    let logged = fs::read_to_string(entry.path()).unwrap();
    assert!(logged.contains("HTTP_TIMEOUT_SECONDS"), "log was: {logged}");
    assert!(logged.contains("Failed to load configuration"), "log was: {logged}");
}

#[test]
fn log_dir_from_config_file_is_used() {
    let work = tempdir().unwrap();
    let config = work.path().join("doccle.yaml");
    fs::write(&config, "log_dir: from-file-logs\n").unwrap();

    let mut cmd = Command::cargo_bin("doccle-sync").expect("Binary exists");
    cmd.current_dir(work.path()).env_remove("LOG_DIR");
    for var in SECRETS {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(&config).arg("sync").assert().failure();

    assert!(work.path().join("from-file-logs").is_dir());
    assert!(!work.path().join("logs").exists());
}
