//! Error types for fingerprint providers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fingerprint table: {0}")]
    InvalidTable(String),
}
