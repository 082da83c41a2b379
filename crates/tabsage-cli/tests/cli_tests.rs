//! CLI integration tests over the no-network paths: init, guarded query,
//! schema derivation, and session management.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestFixture {
    _temp_dir: TempDir,
    workspace: PathBuf,
    csv: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = temp_dir.path().join("workspace");
        let csv = temp_dir.path().join("plants.csv");
        fs::write(
            &csv,
            "factory,line,output_qty\nAC25,AAA157,1200\nAB25,AAA130,900\nAC25,AAA201,450\n",
        )
        .expect("Failed to write sample csv");
        Self {
            _temp_dir: temp_dir,
            workspace,
            csv,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tabsage").expect("binary builds");
        cmd.arg("--workspace").arg(&self.workspace);
        cmd
    }
}

#[test]
fn test_init_creates_workspace_layout() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized workspace"));

    assert!(fx.workspace.join("cache").is_dir());
    assert!(fx.workspace.join("sessions").is_dir());
    assert!(fx.workspace.join("config.toml").is_file());
}

#[test]
fn test_query_renders_markdown_table() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("query")
        .arg("--source")
        .arg(&fx.csv)
        .arg("SELECT factory FROM plants WHERE output_qty = '1200'")
        .assert()
        .success()
        .stdout(predicate::str::contains("| factory |"))
        .stdout(predicate::str::contains("| AC25 |"))
        .stdout(predicate::str::contains("LIMIT 500"));
}

#[test]
fn test_query_guard_rejects_mutation() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("query")
        .arg("--source")
        .arg(&fx.csv)
        .arg("SELECT * FROM plants; DROP TABLE plants")
        .assert()
        .failure()
        .stderr(predicate::str::contains("guard rejected"));
}

#[test]
fn test_schema_derives_and_caches() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("schema")
        .arg("--source")
        .arg(&fx.csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fields\""))
        .stdout(predicate::str::contains("output_qty"))
        .stdout(predicate::str::contains("\"float\""));

    // The cache directory landed under the workspace.
    let cache_entries = fs::read_dir(fx.workspace.join("cache")).unwrap().count();
    assert_eq!(cache_entries, 1);
}

#[test]
fn test_session_list_and_reset_all() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("session")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("no active sessions"));

    fx.cmd()
        .arg("session")
        .arg("reset-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("all sessions removed"));
}

#[test]
fn test_log_without_records() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("log")
        .arg("--source")
        .arg(&fx.csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("no query log yet"));
}

#[test]
fn test_ask_requires_api_key() {
    let fx = TestFixture::new();
    fx.cmd()
        .arg("ask")
        .arg("--source")
        .arg(&fx.csv)
        .arg("which factory made the most?")
        .env_remove("OPENAI_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"));
}

#[test]
fn test_query_unsupported_format() {
    let fx = TestFixture::new();
    let bogus = fx.csv.with_extension("parquet");
    fs::write(&bogus, "x").unwrap();
    fx.cmd()
        .arg("query")
        .arg("--source")
        .arg(&bogus)
        .arg("SELECT 1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported source format"));
}
