//! Error types for specforge.

use thiserror::Error;

/// The main error type for specforge operations.
///
/// Parsing surfaces exactly one exceptional condition: a configuration
/// block that is not valid YAML. Everything else degrades to empty or
/// placeholder output so that iterative document authoring never aborts.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The detected YAML configuration block is not parseable.
    #[error("invalid YAML configuration block: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A spec.json or collaborator artifact could not be decoded.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing an artifact failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for specforge operations.
pub type Result<T> = std::result::Result<T, SpecError>;
