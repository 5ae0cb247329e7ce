//! Submitter that only logs.

use tracing::info;

use super::{SubmissionReceipt, SubmissionStatus, Submitter};
use crate::error::SubmissionError;
use crate::task::TaskDescriptor;

/// Accepts every task without contacting anything.
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    submitted: usize,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks seen so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl Submitter for DryRunSubmitter {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        self.submitted += 1;
        info!(task = %task, "Dry run, not submitting");
        Ok(SubmissionReceipt::new(&task.request_name, SubmissionStatus::Accepted))
    }
}
