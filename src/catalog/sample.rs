//! Sample records produced from catalog rows.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the processing framework locates the input files of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleSource {
    /// Files are looked up in the bookkeeping service by dataset name.
    Dataset,
    /// Files are listed from a storage directory.
    Directory {
        /// Directory holding the input files.
        location: String,
    },
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSource::Dataset => write!(f, "dataset"),
            SampleSource::Directory { location } => write!(f, "directory:{}", location),
        }
    }
}

/// Where a sample was read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleOrigin {
    /// Catalog file path.
    pub path: PathBuf,
    /// 1-based line number of the row.
    pub line: u64,
}

impl fmt::Display for SampleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// One retained row of a sample catalog.
///
/// Samples are built by the catalog loader, which guarantees that
/// `dataset` is neither blank nor a comment. They are never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Dataset identifier, trimmed of surrounding whitespace.
    pub dataset: String,
    /// Cross section.
    pub xsec: f64,
    /// Efficiency factor (typically a branching ratio).
    pub efficiency: f64,
    /// Raw pset options string.
    pub options: String,
    /// How the input files are located.
    pub source: SampleSource,
    /// Catalog position the sample came from.
    pub origin: SampleOrigin,
}

impl Sample {
    /// Creates a bookkeeping-backed sample with no recorded origin.
    pub fn new(
        dataset: impl Into<String>,
        xsec: f64,
        efficiency: f64,
        options: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            xsec,
            efficiency,
            options: options.into(),
            source: SampleSource::Dataset,
            origin: SampleOrigin::default(),
        }
    }

    /// Reads input files from a directory instead of the bookkeeping service.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.source = SampleSource::Directory {
            location: location.into(),
        };
        self
    }

    /// Records the catalog position of the sample.
    pub fn with_origin(mut self, path: impl Into<PathBuf>, line: u64) -> Self {
        self.origin = SampleOrigin {
            path: path.into(),
            line,
        };
        self
    }
}
