//! Spool directory backend.
//!
//! Each task is written to `<spool>/<request_name>.json` as a
//! [`SpoolEntry`]: the descriptor plus its fingerprint. A framework daemon
//! picks the files up. Resubmitting an identical task is a no-op; a task
//! whose settings changed replaces the previous entry.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SubmissionReceipt, SubmissionStatus, Submitter};
use crate::error::SubmissionError;
use crate::task::{Fingerprint, TaskDescriptor};

/// File extension of spool entries.
const SPOOL_EXTENSION: &str = "json";

/// Contents of one spool file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolEntry {
    /// Fingerprint of `task`.
    pub fingerprint: Fingerprint,
    /// The submitted task.
    pub task: TaskDescriptor,
}

/// Writes tasks into a spool directory.
#[derive(Debug, Clone)]
pub struct SpoolSubmitter {
    dir: PathBuf,
}

impl SpoolSubmitter {
    /// Creates a submitter writing into `dir`. The directory is created on
    /// first submission.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Spool directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the spool file for a request name.
    pub fn entry_path(&self, request_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", request_name, SPOOL_EXTENSION))
    }

    /// Reads back a spooled entry.
    ///
    /// Returns `Ok(None)` when no entry exists or its content does not parse.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Io` if an existing entry cannot be read.
    pub fn read_entry(&self, request_name: &str) -> Result<Option<SpoolEntry>, SubmissionError> {
        let path = self.entry_path(request_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(request_name, &path, e)),
        };
        match serde_json::from_str(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(task = request_name, error = %e, "Ignoring unparsable spool entry");
                Ok(None)
            }
        }
    }

    fn io_error(&self, request_name: &str, path: &Path, source: std::io::Error) -> SubmissionError {
        SubmissionError::Io {
            request_name: request_name.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Writes `content` next to `path` and renames it into place.
    fn write_atomic(&self, request_name: &str, path: &Path, content: &[u8]) -> Result<(), SubmissionError> {
        let tmp_path = path.with_extension(format!("{}.tmp", SPOOL_EXTENSION));
        let mut file =
            fs::File::create(&tmp_path).map_err(|e| self.io_error(request_name, &tmp_path, e))?;
        file.write_all(content)
            .and_then(|_| file.sync_all())
            .map_err(|e| self.io_error(request_name, &tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| self.io_error(request_name, path, e))
    }
}

impl Submitter for SpoolSubmitter {
    fn name(&self) -> &str {
        "spool"
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        let request_name = task.request_name.as_str();
        let serialization = |source| SubmissionError::Serialization {
            request_name: request_name.to_string(),
            source,
        };

        let fingerprint = task.fingerprint().map_err(serialization)?;
        let path = self.entry_path(request_name);
        let detail = path.display().to_string();

        let status = match self.read_entry(request_name)? {
            Some(existing) if existing.fingerprint == fingerprint => {
                debug!(task = request_name, "Identical task already spooled");
                return Ok(SubmissionReceipt::new(request_name, SubmissionStatus::Unchanged)
                    .with_detail(detail));
            }
            Some(existing) => {
                warn!(
                    task = request_name,
                    old = %existing.fingerprint,
                    new = %fingerprint,
                    "Replacing spooled task with changed settings"
                );
                SubmissionStatus::Updated
            }
            None => SubmissionStatus::Created,
        };

        fs::create_dir_all(&self.dir).map_err(|e| self.io_error(request_name, &self.dir, e))?;

        let entry = SpoolEntry {
            fingerprint,
            task: task.clone(),
        };
        let content = serde_json::to_vec_pretty(&entry).map_err(serialization)?;
        self.write_atomic(request_name, &path, &content)?;

        Ok(SubmissionReceipt::new(request_name, status).with_detail(detail))
    }
}
