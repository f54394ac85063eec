use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Queue backend settings
    pub redis_url: String,
    pub task_ttl_secs: u64,

    // Result store settings
    pub results_dir: PathBuf,

    // Scanner settings
    pub scanner_path: String,
    pub scanner_args: Vec<String>,
    pub scan_timeout_secs: u64,

    // Worker settings
    pub worker_count: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8400".to_string())
                .parse()
                .unwrap_or(8400),

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            task_ttl_secs: env::var("TASK_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),

            results_dir: env::var("RESULTS_DIR")
                .unwrap_or_else(|_| "./scan_results".to_string())
                .into(),

            scanner_path: env::var("SCANNER_PATH").unwrap_or_else(|_| "nikto".to_string()),
            scanner_args: env::var("SCANNER_ARGS")
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            scan_timeout_secs: env::var("SCAN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),

            worker_count: env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
        }
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_ttl_secs)
    }
}
