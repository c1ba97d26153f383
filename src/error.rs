//! Error types for the migration pipeline.
//!
//! Malformed legacy input never surfaces here; it ends up in the report.
//! These errors cover the cases where the pipeline itself cannot proceed.

use thiserror::Error;

/// Errors that escape the migration API.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("sub-migrators '{first}' and '{second}' both produce {file_name}")]
    DuplicateOutput {
        file_name: String,
        first: String,
        second: String,
    },

    #[error("failed to serialize {file_name}: {source}")]
    Serialize {
        file_name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to convert {file_name} to a document tree: {source}")]
    Encode {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MigrationError>;
