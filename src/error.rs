//! Error types for Stevedore

use thiserror::Error;

/// Result type for Stevedore operations
pub type Result<T> = std::result::Result<T, StevedoreError>;

/// Stevedore error types
#[derive(Error, Debug)]
pub enum StevedoreError {
    #[error("Invalid image reference: {0}")]
    InvalidImage(String),

    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Run command parse error: {0}")]
    RunParse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
