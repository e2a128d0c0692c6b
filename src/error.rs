use thiserror::Error;

use crate::domain::parse::MalformedAmountError;

pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    MalformedAmount(#[from] MalformedAmountError),
    #[error("no access token for user {0}")]
    MissingAccessToken(String),
    #[error("directory error: {0}")]
    Directory(String),
    #[error("queue error: {0}")]
    Queue(String),
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("telemetry error: {0}")]
    Telemetry(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
