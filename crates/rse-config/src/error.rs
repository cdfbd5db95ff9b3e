//! Error types for config persistence, validation, and repair.

use crate::model::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while creating, updating, or writing config documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem access failed.
    #[error("config io failed: {0}")]
    Io(#[from] std::io::Error),
    /// A write step failed for a specific artifact.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parsing a config document failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// The document does not satisfy the schema.
    #[error("invalid config: {}", join_violations(.0))]
    SchemaViolation(Vec<ValidationError>),
    /// Generic validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Wrap an IO error with the artifact path it was raised for.
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

fn join_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
