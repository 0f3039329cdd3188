use std::path::PathBuf;

use thiserror::Error;

/// Structural failures that stop a single check
///
/// Content-level defects (bad log lines, invalid values, garbled service
/// states) never surface here; they are folded into the check result.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The evidence source could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not valid JSON
    #[error("{target} is not valid JSON: {source}")]
    Json {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    /// Input is not valid TOML
    #[error("{target} is not valid TOML: {source}")]
    Toml {
        target: String,
        #[source]
        source: toml::de::Error,
    },

    /// Input parsed but has the wrong container shape
    #[error("{target}: expected {expected}")]
    Shape {
        target: String,
        expected: &'static str,
    },

    /// A result could not be serialized
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckError>;
