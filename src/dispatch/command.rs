//! External command backend.
//!
//! Runs the framework's submit program once per task. The descriptor is
//! written as JSON to the program's stdin and the request name is appended
//! as the last argument. Exit status zero means the task was accepted; the
//! first line of stdout, if any, is kept as receipt detail.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use super::{SubmissionReceipt, SubmissionStatus, Submitter};
use crate::error::SubmissionError;
use crate::task::TaskDescriptor;

/// Submits tasks by running an external program.
#[derive(Debug, Clone)]
pub struct CommandSubmitter {
    program: String,
    args: Vec<String>,
}

impl CommandSubmitter {
    /// Creates a submitter running `program` with `args`.
    pub fn new<S: Into<String>>(program: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a command line on whitespace into program and arguments.
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }

    /// Program that is run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Error for a failure after the program has started.
    fn io_error(&self, request_name: &str, source: std::io::Error) -> SubmissionError {
        SubmissionError::CommandIo {
            program: self.program.clone(),
            request_name: request_name.to_string(),
            source,
        }
    }
}

impl Submitter for CommandSubmitter {
    fn name(&self) -> &str {
        "command"
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        let request_name = task.request_name.as_str();
        let payload =
            serde_json::to_vec(task).map_err(|source| SubmissionError::Serialization {
                request_name: request_name.to_string(),
                source,
            })?;

        debug!(program = %self.program, task = request_name, "Running submit command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(request_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SubmissionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The program may exit without reading; its exit status decides.
            match stdin.write_all(&payload) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(self.io_error(request_name, e))
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.io_error(request_name, e))?;

        if !output.status.success() {
            return Err(SubmissionError::CommandFailed {
                request_name: request_name.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let receipt = SubmissionReceipt::new(request_name, SubmissionStatus::Accepted);
        Ok(match stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(line) => receipt.with_detail(line),
            None => receipt,
        })
    }
}
