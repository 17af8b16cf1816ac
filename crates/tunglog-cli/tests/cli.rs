//! End-to-end runs of the `tunglog` binary against a scratch database.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tunglog_api::ApiLog;
use tunglog_api::server::{AppState, router, serve_on};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("logs.sqlite3")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn tunglog(&self) -> Command {
        let mut cmd = Command::cargo_bin("tunglog").unwrap();
        cmd.env_remove("RUST_LOG")
            .env("TUNGLOG_RETRY_BASE_DELAY_MS", "1")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn add(&self, message: &str, log_type: &str) {
        self.tunglog()
            .args(["add", message, "--type", log_type])
            .assert()
            .success();
    }
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

#[test]
fn add_then_list_shows_newest_first() {
    let ws = Workspace::new();
    ws.tunglog().arg("init").assert().success();

    ws.tunglog()
        .args(["add", "first entry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved log #1 (INFO)!"));
    ws.add("second entry", "ERROR");

    let output = ws.tunglog().arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let first = stdout.find("first entry").unwrap();
    let second = stdout.find("second entry").unwrap();
    assert!(second < first, "newest entry should be listed first:\n{stdout}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Fetched 2 logs from DB!"));
}

#[test]
fn list_filters_by_type_and_limit() {
    let ws = Workspace::new();
    ws.add("boot", "INFO");
    ws.add("disk full", "ERROR");
    ws.add("cache miss", "DEBUG");
    ws.add("retrying", "WARNING");

    ws.tunglog()
        .args(["list", "--type", "ERROR", "--type", "DEBUG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disk full"))
        .stdout(predicate::str::contains("cache miss"))
        .stdout(predicate::str::contains("boot").not());

    ws.tunglog()
        .args(["list", "--only", "WARNING"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retrying"))
        .stdout(predicate::str::contains("disk full").not());

    ws.tunglog()
        .args(["list", "--limit", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Fetched 1 logs from DB!"))
        .stdout(predicate::str::contains("retrying"));
}

#[test]
fn invalid_type_fails_with_manager_message() {
    let ws = Workspace::new();

    ws.tunglog()
        .args(["add", "oops", "--type", "TRACE"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to add log"))
        .stderr(predicate::str::contains("Invalid log_type 'TRACE'"));
}

#[test]
fn blank_message_is_refused() {
    let ws = Workspace::new();

    ws.tunglog()
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Log message cannot be empty!"));
    ws.tunglog()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no logs)"));
}

#[test]
fn reset_requires_confirmation_and_restarts_ids() {
    let ws = Workspace::new();
    ws.add("one", "INFO");
    ws.add("two", "INFO");

    ws.tunglog()
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ws.tunglog()
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Log table and ID counter successfully reset!",
        ));

    ws.tunglog()
        .args(["add", "fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved log #1 (INFO)!"));
}

#[test]
fn health_reports_healthy_store() {
    let ws = Workspace::new();

    ws.tunglog()
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Database connection is perfectly healthy!",
        ));
}

#[test]
fn export_writes_each_format() {
    let ws = Workspace::new();
    ws.add("exported, with comma", "WARNING");

    for (format, name) in [
        ("json", "logs.json"),
        ("csv", "logs.csv"),
        ("pdf", "nested/logs.pdf"),
        ("docx", "logs.docx"),
    ] {
        let target = ws.path(name);
        ws.tunglog()
            .arg("export")
            .arg(format)
            .arg(&target)
            .assert()
            .success()
            .stdout(predicate::str::contains("Exported 1 logs"));
        assert!(file_len(&target) > 0, "{format} export is empty");
    }

    let csv = std::fs::read_to_string(ws.path("logs.csv")).unwrap();
    assert!(csv.contains("\"exported, with comma\""));
}

#[test]
fn export_with_no_logs_is_refused() {
    let ws = Workspace::new();
    let target = ws.path("empty.json");

    ws.tunglog()
        .arg("export")
        .arg("json")
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("There are no logs to export!"));
    assert!(!target.exists());
}

#[test]
fn import_with_empty_endpoint_fails() {
    let ws = Workspace::new();

    ws.tunglog()
        .args(["import-api", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API Endpoint is empty!"));
}

#[test]
fn import_pulls_valid_entries_from_demo_server() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::with_logs(vec![
        ApiLog::new("error", "upstream refused"),
        ApiLog::new("TRACE", "dropped: unknown type"),
        ApiLog::new("INFO", ""),
    ]);
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    runtime.spawn(serve_on(listener, router(state)));

    let ws = Workspace::new();
    ws.tunglog()
        .arg("import-api")
        .arg(format!("http://{addr}/api/logs_wrapped"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 1 logs!"));

    ws.tunglog()
        .args(["list", "--type", "ERROR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("upstream refused"));

    ws.tunglog()
        .arg("import-api")
        .arg(format!("http://{addr}/"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("API response is not a list!"));
}
