//! Error types for ntuple-launcher operations.
//!
//! Defines error types for each stage of the launch pipeline:
//! - Catalog discovery and parsing
//! - Per-sample parameter derivation
//! - Task submission and dispatch

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering or reading sample catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to list catalog directory '{}': {message}", dir.display())]
    Walk { dir: PathBuf, message: String },

    #[error("No catalog files matching '{pattern}' in '{}'", dir.display())]
    NoCatalogFiles { dir: PathBuf, pattern: String },

    #[error("Failed to read catalog '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog '{}' is not a valid table: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Catalog '{}' is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Catalog '{}' line {line}: sample '{dataset}' has no '{field}' field", path.display())]
    MissingField {
        path: PathBuf,
        line: u64,
        dataset: String,
        field: String,
    },

    #[error("Catalog '{}' line {line}: sample '{dataset}' has non-numeric '{field}' value '{value}'", path.display())]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        dataset: String,
        field: String,
        value: String,
    },

    #[error("Sample index {index} is out of range: only {len} samples were loaded")]
    SelectionOutOfRange { index: usize, len: usize },
}

/// Errors that can occur while deriving per-sample parameters.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Sample '{dataset}' has no globaltag in its options '{options}'")]
    MissingGlobalTag { dataset: String, options: String },
}

/// Errors reported by a submission backend.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Task '{request_name}' was rejected: {reason}")]
    Rejected {
        request_name: String,
        reason: String,
    },

    #[error("Failed to serialize task '{request_name}': {source}")]
    Serialization {
        request_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error while submitting '{request_name}' via '{}': {source}", path.display())]
    Io {
        request_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch submit command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to submit command '{program}' for '{request_name}': {source}")]
    CommandIo {
        program: String,
        request_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Submit command for '{request_name}' exited with {}: {stderr}", exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    CommandFailed {
        request_name: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Errors that stop a dispatch run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Submission of task #{index} ('{request_name}') failed: {source}")]
    Failed {
        index: usize,
        request_name: String,
        #[source]
        source: SubmissionError,
    },
}

impl DispatchError {
    /// Returns the underlying submission error.
    pub fn submission_error(&self) -> &SubmissionError {
        match self {
            DispatchError::Failed { source, .. } => source,
        }
    }
}
