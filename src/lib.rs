//! ntuple-launcher: turn dataset catalogs into ntuple production tasks.
//!
//! A launch reads `samples_*.csv` catalogs, derives per-sample job
//! parameters, builds one immutable task descriptor per sample and submits
//! the descriptors in order through a pluggable backend.

pub mod catalog;
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod task;

// Re-export commonly used error types
pub use error::{CatalogError, DispatchError, ParameterError, SubmissionError};
pub use pipeline::{ConfigError, PipelineError};
