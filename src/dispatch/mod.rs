//! Handing task descriptors to the processing framework.
//!
//! The framework is reached through the [`Submitter`] trait: one blocking
//! call per task, which either accepts the task or fails. The
//! [`Dispatcher`] drives a submitter over an ordered list of tasks and
//! stops at the first failure. It does not retry; resubmission belongs to
//! the framework.
//!
//! # Backends
//!
//! - [`DryRunSubmitter`]: logs each task and accepts it.
//! - [`SpoolSubmitter`]: writes one JSON file per task into a spool
//!   directory watched by the framework.
//! - [`CommandSubmitter`]: pipes each task as JSON into an external submit
//!   command.
//!
//! # Example
//!
//! ```rust,ignore
//! use ntuple_launcher::dispatch::{Dispatcher, SpoolSubmitter};
//!
//! let mut dispatcher = Dispatcher::new(SpoolSubmitter::new("./spool"));
//! let report = dispatcher.dispatch(tasks)?;
//! println!("submitted {} tasks", report.len());
//! ```

pub mod command;
pub mod dry_run;
pub mod spool;

pub use command::CommandSubmitter;
pub use dry_run::DryRunSubmitter;
pub use spool::{SpoolEntry, SpoolSubmitter};

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{DispatchError, SubmissionError};
use crate::task::TaskDescriptor;

/// What a backend did with an accepted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The framework accepted the task.
    Accepted,
    /// A new task entry was created.
    Created,
    /// An existing entry for the same task was replaced with new settings.
    Updated,
    /// An identical entry already existed.
    Unchanged,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Accepted => write!(f, "accepted"),
            SubmissionStatus::Created => write!(f, "created"),
            SubmissionStatus::Updated => write!(f, "updated"),
            SubmissionStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Acknowledgement returned by a backend for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Request name of the submitted task.
    pub request_name: String,
    /// Outcome.
    pub status: SubmissionStatus,
    /// Backend specific detail, e.g. a spool path or command output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubmissionReceipt {
    /// Creates a receipt without detail.
    pub fn new(request_name: impl Into<String>, status: SubmissionStatus) -> Self {
        Self {
            request_name: request_name.into(),
            status,
            detail: None,
        }
    }

    /// Attaches backend detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Single entry point into the processing framework.
///
/// Submitting the same task identity twice must be safe: backends either
/// detect the duplicate or rely on the framework to do so.
pub trait Submitter {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Submits one task. Blocks until the framework has answered.
    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError>;
}

impl<S: Submitter + ?Sized> Submitter for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        (**self).submit(task)
    }
}

impl<S: Submitter + ?Sized> Submitter for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        (**self).submit(task)
    }
}

/// Receipts of a completed dispatch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub receipts: Vec<SubmissionReceipt>,
}

impl DispatchReport {
    /// Number of submitted tasks.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Returns true when nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Number of receipts with the given status.
    pub fn count(&self, status: SubmissionStatus) -> usize {
        self.receipts.iter().filter(|r| r.status == status).count()
    }
}

/// Submits tasks one after another through a [`Submitter`].
pub struct Dispatcher<S> {
    submitter: S,
}

impl<S: Submitter> Dispatcher<S> {
    /// Creates a dispatcher around `submitter`.
    pub fn new(submitter: S) -> Self {
        Self { submitter }
    }

    /// Gives the submitter back.
    pub fn into_inner(self) -> S {
        self.submitter
    }

    /// Submits every task in order.
    ///
    /// Each task is dropped once the submitter has seen it; the framework
    /// owns its state from then on.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Failed` for the first task the submitter
    /// rejects. Later tasks are not submitted.
    pub fn dispatch<I>(&mut self, tasks: I) -> Result<DispatchReport, DispatchError>
    where
        I: IntoIterator<Item = TaskDescriptor>,
    {
        let mut report = DispatchReport::default();

        for (index, task) in tasks.into_iter().enumerate() {
            match self.submitter.submit(&task) {
                Ok(receipt) => {
                    info!(
                        backend = self.submitter.name(),
                        task = %task.request_name,
                        status = %receipt.status,
                        "Submitted task"
                    );
                    report.receipts.push(receipt);
                }
                Err(source) => {
                    error!(
                        backend = self.submitter.name(),
                        task = %task.request_name,
                        error = %source,
                        "Submission failed, stopping"
                    );
                    return Err(DispatchError::Failed {
                        index,
                        request_name: task.request_name,
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Sample;
    use crate::params::DerivedParameters;
    use crate::task::TaskFactory;

    /// Records submitted request names and fails on a chosen call.
    struct RecordingSubmitter {
        seen: Vec<String>,
        fail_on: Option<usize>,
    }

    impl RecordingSubmitter {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                seen: Vec::new(),
                fail_on,
            }
        }
    }

    impl Submitter for RecordingSubmitter {
        fn name(&self) -> &str {
            "recording"
        }

        fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
            let call = self.seen.len();
            self.seen.push(task.request_name.clone());
            if self.fail_on == Some(call) {
                return Err(SubmissionError::Rejected {
                    request_name: task.request_name.clone(),
                    reason: "quota exceeded".to_string(),
                });
            }
            Ok(SubmissionReceipt::new(&task.request_name, SubmissionStatus::Accepted))
        }
    }

    fn tasks(datasets: &[&str]) -> Vec<TaskDescriptor> {
        let factory = TaskFactory::default();
        let derived = DerivedParameters {
            is_simulation: true,
            events_per_output: 200_000,
            global_tag: "T".to_string(),
        };
        datasets
            .iter()
            .map(|d| factory.build(&Sample::new(*d, 1.0, 1.0, "globaltag=T"), &derived))
            .collect()
    }

    #[test]
    fn test_dispatch_submits_each_once_in_order() {
        let mut dispatcher = Dispatcher::new(RecordingSubmitter::new(None));
        let report = dispatcher
            .dispatch(tasks(&["/A/x/M", "/B/x/M", "/C/x/M"]))
            .expect("dispatch should work");

        assert_eq!(report.len(), 3);
        assert_eq!(report.count(SubmissionStatus::Accepted), 3);
        assert_eq!(
            dispatcher.into_inner().seen,
            vec!["A_x_M_OFFSHELL_v0", "B_x_M_OFFSHELL_v0", "C_x_M_OFFSHELL_v0"]
        );
    }

    #[test]
    fn test_dispatch_stops_after_first_failure() {
        let mut dispatcher = Dispatcher::new(RecordingSubmitter::new(Some(1)));
        let result = dispatcher.dispatch(tasks(&["/A/x/M", "/B/x/M", "/C/x/M"]));

        match result {
            Err(DispatchError::Failed {
                index,
                request_name,
                source,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(request_name, "B_x_M_OFFSHELL_v0");
                assert!(matches!(source, SubmissionError::Rejected { .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(dispatcher.into_inner().seen.len(), 2);
    }

    #[test]
    fn test_dispatch_empty() {
        let mut dispatcher = Dispatcher::new(RecordingSubmitter::new(Some(0)));
        let report = dispatcher.dispatch(Vec::new()).expect("dispatch should work");
        assert!(report.is_empty());
    }

    #[test]
    fn test_boxed_submitter() {
        let boxed: Box<dyn Submitter> = Box::new(RecordingSubmitter::new(None));
        let mut dispatcher = Dispatcher::new(boxed);
        let report = dispatcher.dispatch(tasks(&["/A/x/M"])).expect("dispatch should work");
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SubmissionStatus::Accepted.to_string(), "accepted");
        assert_eq!(SubmissionStatus::Created.to_string(), "created");
        assert_eq!(SubmissionStatus::Updated.to_string(), "updated");
        assert_eq!(SubmissionStatus::Unchanged.to_string(), "unchanged");
    }
}
