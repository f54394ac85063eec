use crate::artifacts::{self, ResultStore};
use crate::config::Config;
use crate::domain::Domain;
use crate::error::{Result, ScanError};
use crate::queue::TaskState;
use crate::report;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs one scan end to end: spawn the external scanner, wait for it
/// under a timeout, transform its structured report, and publish the
/// artifacts.
///
/// Every failure mode becomes a terminal [`TaskState`] rather than an
/// error; the caller's only job is to record the outcome.
#[derive(Debug, Clone)]
pub struct ScanExecutor {
    scanner_path: String,
    scanner_args: Vec<String>,
    scan_timeout: Duration,
    store: ResultStore,
}

impl ScanExecutor {
    pub fn new(config: &Config, store: ResultStore) -> Self {
        Self {
            scanner_path: config.scanner_path.clone(),
            scanner_args: config.scanner_args.clone(),
            scan_timeout: config.scan_timeout(),
            store,
        }
    }

    /// Execute a scan task, returning its terminal state.
    ///
    /// The domain arrives as the raw string from the task envelope and
    /// is validated again here; an invalid domain fails the task before
    /// any process is spawned.
    pub async fn execute(&self, task_id: Uuid, raw_domain: &str) -> TaskState {
        let domain = match Domain::parse(raw_domain) {
            Ok(domain) => domain,
            Err(e) => {
                warn!(task_id = %task_id, "Rejected queued task: {e}");
                return TaskState::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.run_scan(task_id, &domain).await {
            Ok(state) => state,
            Err(e) => {
                error!(task_id = %task_id, domain = %domain, "Scan failed: {e}");
                self.store.discard_staging(task_id).await;
                TaskState::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run_scan(&self, task_id: Uuid, domain: &Domain) -> Result<TaskState> {
        self.store.create_staging(task_id).await?;
        let staged = self.store.staging_paths(task_id, domain);
        let published = self.store.published_paths(domain);

        let mut command = self.build_scanner_command(domain, &staged.xml);
        debug!(task_id = %task_id, "Starting scanner: {:?}", command);

        let mut child = command.spawn().map_err(|e| {
            ScanError::Scanner(format!("failed to start {:?}: {e}", self.scanner_path))
        })?;

        match timeout(self.scan_timeout, child.wait()).await {
            Err(_) => {
                warn!(
                    task_id = %task_id,
                    domain = %domain,
                    "Scanner still running after {}s, killing it",
                    self.scan_timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    warn!(task_id = %task_id, "Failed to kill scanner process: {e}");
                }
                return Err(ScanError::ScanTimeout(self.scan_timeout.as_secs()));
            }
            Ok(waited) => {
                // Exit code is informational only; a scanner that bailed
                // out may still have written a usable partial report.
                let status =
                    waited.map_err(|e| ScanError::Scanner(format!("wait failed: {e}")))?;
                info!(
                    task_id = %task_id,
                    domain = %domain,
                    exit_code = ?status.code(),
                    "Scanner exited"
                );
            }
        }

        let transform = {
            let xml = staged.xml.clone();
            let html = staged.html.clone();
            tokio::task::spawn_blocking(move || report::render_report(&xml, &html)).await
        };
        let transform_result = match transform {
            Ok(result) => result,
            Err(join_err) => Err(ScanError::Internal(format!(
                "report transform panicked: {join_err}"
            ))),
        };

        let xml_file = artifacts::xml_basename(domain);
        let html_file = artifacts::html_basename(domain);

        match transform_result {
            Ok(()) => {
                self.store.publish(&staged.xml, &published.xml).await?;
                self.store.publish(&staged.html, &published.html).await?;
                self.store.discard_staging(task_id).await;
                info!(task_id = %task_id, domain = %domain, "Scan artifacts published");
                Ok(TaskState::Succeeded { xml_file, html_file })
            }
            Err(e) => {
                warn!(task_id = %task_id, domain = %domain, "Report transform failed: {e}");
                let xml_file = if staged.xml.exists() {
                    self.store.publish(&staged.xml, &published.xml).await?;
                    Some(xml_file)
                } else {
                    None
                };
                self.store.discard_staging(task_id).await;
                Ok(TaskState::Degraded {
                    xml_file,
                    detail: e.to_string(),
                })
            }
        }
    }

    fn build_scanner_command(&self, domain: &Domain, output: &Path) -> Command {
        let mut cmd = Command::new(&self.scanner_path);
        cmd.arg("-h").arg(domain.as_str());
        cmd.arg("-o").arg(output);
        cmd.arg("-Format").arg("xml");
        cmd.args(&self.scanner_args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd
    }
}
