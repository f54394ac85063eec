use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue backend error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Scanner process error: {0}")]
    Scanner(String),

    #[error("Scan timed out after {0} seconds")]
    ScanTimeout(u64),

    #[error("Report parse error: {0}")]
    ReportParse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
