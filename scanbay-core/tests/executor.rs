#![cfg(unix)]

use scanbay_core::config::Config;
use scanbay_core::queue::TaskState;
use scanbay_core::{Domain, ResultStore, ScanExecutor};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use uuid::Uuid;

const STUB_REPORT: &str = r#"<?xml version="1.0" ?>
<niktoscan>
  <scandetails targetip="203.0.113.7">
    <item id="1">
      <description>Server banner disclosed</description>
      <osvdbid>877</osvdbid>
    </item>
  </scandetails>
</niktoscan>"#;

struct Harness {
    _dir: TempDir,
    bin_dir: PathBuf,
    store: ResultStore,
    results_dir: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let bin_dir = dir.path().join("bin");
        let results_dir = dir.path().join("results");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let store = ResultStore::new(&results_dir);
        store.ensure_layout().unwrap();
        Self {
            _dir: dir,
            bin_dir,
            store,
            results_dir,
        }
    }

    /// Writes an executable stub standing in for the scanner. The stub
    /// receives the real argument list (`-h <domain> -o <path> -Format
    /// xml`), so `$4` is the output path.
    fn stub_scanner(&self, body: &str) -> PathBuf {
        let path = self.bin_dir.join("stub-scanner.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn executor(&self, scanner_path: &Path, timeout_secs: u64) -> ScanExecutor {
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            task_ttl_secs: 60,
            results_dir: self.results_dir.clone(),
            scanner_path: scanner_path.to_string_lossy().into_owned(),
            scanner_args: Vec::new(),
            scan_timeout_secs: timeout_secs,
            worker_count: 1,
        };
        ScanExecutor::new(&config, self.store.clone())
    }
}

fn write_report_body() -> String {
    format!("cat > \"$4\" <<'XML'\n{STUB_REPORT}\nXML")
}

#[tokio::test]
async fn completed_scan_publishes_both_artifacts_and_succeeds() {
    let harness = Harness::new();
    let scanner = harness.stub_scanner(&write_report_body());
    let executor = harness.executor(&scanner, 30);
    let task_id = Uuid::new_v4();

    let state = executor.execute(task_id, "test.example.org").await;

    assert_eq!(
        state,
        TaskState::Succeeded {
            xml_file: "test.example.org_scan.xml".to_string(),
            html_file: "test.example.org_report.html".to_string(),
        }
    );

    let domain = Domain::parse("test.example.org").unwrap();
    assert_eq!(harness.store.exists(&domain), (true, true));
    assert!(!harness.store.staging_dir(task_id).exists());

    let html = std::fs::read_to_string(harness.store.published_paths(&domain).html).unwrap();
    assert!(html.contains("<td>Server banner disclosed</td>"));
}

#[tokio::test]
async fn scanner_exit_code_does_not_gate_success() {
    let harness = Harness::new();
    let scanner = harness.stub_scanner(&format!("{}\nexit 3", write_report_body()));
    let executor = harness.executor(&scanner, 30);

    let state = executor.execute(Uuid::new_v4(), "example.com").await;

    assert!(matches!(state, TaskState::Succeeded { .. }));
}

#[tokio::test]
async fn unparsable_scanner_output_degrades_with_published_xml() {
    let harness = Harness::new();
    let scanner =
        harness.stub_scanner("printf '%s' '<niktoscan></mismatch>' > \"$4\"");
    let executor = harness.executor(&scanner, 30);
    let task_id = Uuid::new_v4();

    let state = executor.execute(task_id, "example.com").await;

    match state {
        TaskState::Degraded { xml_file, detail } => {
            assert_eq!(xml_file.as_deref(), Some("example.com_scan.xml"));
            assert!(!detail.is_empty());
        }
        other => panic!("expected degraded outcome, got {other:?}"),
    }

    let domain = Domain::parse("example.com").unwrap();
    assert_eq!(harness.store.exists(&domain), (true, false));
    assert!(!harness.store.staging_dir(task_id).exists());
}

#[tokio::test]
async fn scanner_writing_no_report_degrades_with_no_artifacts() {
    let harness = Harness::new();
    let scanner = harness.stub_scanner("exit 0");
    let executor = harness.executor(&scanner, 30);

    let state = executor.execute(Uuid::new_v4(), "example.com").await;

    match state {
        TaskState::Degraded { xml_file, .. } => assert!(xml_file.is_none()),
        other => panic!("expected degraded outcome, got {other:?}"),
    }

    let domain = Domain::parse("example.com").unwrap();
    assert_eq!(harness.store.exists(&domain), (false, false));
}

#[tokio::test]
async fn hung_scanner_is_killed_and_task_fails() {
    let harness = Harness::new();
    let scanner = harness.stub_scanner("sleep 30");
    let executor = harness.executor(&scanner, 1);
    let task_id = Uuid::new_v4();

    let started = Instant::now();
    let state = executor.execute(task_id, "example.com").await;

    assert!(
        started.elapsed().as_secs() < 10,
        "timed-out scan should not wait for the scanner to finish"
    );
    match state {
        TaskState::Failed { error } => assert!(error.contains("timed out"), "{error}"),
        other => panic!("expected failed outcome, got {other:?}"),
    }
    assert!(!harness.store.staging_dir(task_id).exists());
}

#[tokio::test]
async fn invalid_queued_domain_fails_without_spawning_scanner() {
    let harness = Harness::new();
    let marker = harness.bin_dir.join("ran");
    let scanner = harness.stub_scanner(&format!("touch {}", marker.display()));
    let executor = harness.executor(&scanner, 30);

    let state = executor.execute(Uuid::new_v4(), "not a domain").await;

    assert!(matches!(state, TaskState::Failed { .. }));
    assert!(!marker.exists(), "scanner must not run for an invalid domain");
}

#[tokio::test]
async fn missing_scanner_binary_fails_task() {
    let harness = Harness::new();
    let missing = harness.bin_dir.join("no-such-scanner");
    let executor = harness.executor(&missing, 30);
    let task_id = Uuid::new_v4();

    let state = executor.execute(task_id, "example.com").await;

    match state {
        TaskState::Failed { error } => assert!(error.contains("failed to start"), "{error}"),
        other => panic!("expected failed outcome, got {other:?}"),
    }
    assert!(!harness.store.staging_dir(task_id).exists());
}
