//! Error types for the relevance scorer.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelevanceError>;

#[derive(Error, Debug)]
pub enum RelevanceError {
    #[error("Weight file not found in any of {searched:?}")]
    WeightsNotFound { searched: Vec<PathBuf> },

    #[error("Weight loading failed: {0}")]
    Load(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template library has {found} templates, network scores {expected}")]
    TemplateMismatch { expected: usize, found: usize },

    #[error("Template library out of order: {0}")]
    TemplateOrder(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<candle_core::Error> for RelevanceError {
    fn from(e: candle_core::Error) -> Self {
        RelevanceError::Inference(e.to_string())
    }
}
