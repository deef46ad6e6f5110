/*!
 * Error Types
 * Centralized error handling with thiserror and miette support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Outcome of a single process generation
pub type ProcessOutcome = ProcessResult<()>;

/// Scheduler operation result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Result of a single trigger wait
pub type TriggerResult = Result<(), TriggerError>;

/// Result returned by operations driven by a process
pub type OperationResult = Result<(), OperationError>;

/// Process lifecycle errors
///
/// Cloneable so a single generation outcome can be handed to every observer
/// of its termination completion.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process '{0}' terminated without cancellation being requested")]
    #[diagnostic(
        code(process::unexpected_termination),
        help("Operations must run until their cancellation token fires and only then return.")
    )]
    UnexpectedTermination(String),

    #[error("Process '{0}' reported a cancellation its own token never requested")]
    #[diagnostic(
        code(process::foreign_cancellation),
        help("Return OperationError::Cancelled only after the token passed to run() was cancelled.")
    )]
    ForeignCancellation(String),

    #[error("Process '{process}' faulted: {message}")]
    #[diagnostic(
        code(process::faulted),
        help("The operation returned an error. Inspect the message for the root cause.")
    )]
    Faulted { process: String, message: String },

    #[error("Process '{process}' panicked: {message}")]
    #[diagnostic(code(process::panicked))]
    Panicked { process: String, message: String },

    #[error("Timed out after {timeout_ms}ms waiting for {operation}")]
    #[diagnostic(
        code(process::timeout),
        help("The wait was abandoned; the operation itself was not affected.")
    )]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Wait for {0} abandoned by caller")]
    #[diagnostic(code(process::abandoned))]
    Abandoned(String),

    #[error("No tokio runtime available to start process '{0}'")]
    #[diagnostic(
        code(process::no_runtime),
        help("Call start() from within a tokio runtime context.")
    )]
    NoRuntime(String),

    #[error("Process '{0}' was dropped before its generation resolved")]
    #[diagnostic(code(process::dropped))]
    Dropped(String),
}

impl ProcessError {
    /// Whether this error describes a fault of the operation itself, as
    /// opposed to a caller-side wait that gave up
    #[inline]
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Timeout { .. } | Self::Abandoned(_))
    }
}

/// Trigger scheduler errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Trigger failed: {0}")]
    #[diagnostic(
        code(scheduler::trigger_failed),
        help("A registered trigger returned an error other than cooperative cancellation.")
    )]
    TriggerFailed(String),

    #[error("Trigger reported a cancellation the scheduler never requested")]
    #[diagnostic(code(scheduler::foreign_cancellation))]
    ForeignCancellation,
}

/// Errors a trigger may report from a wait
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The wait observed cancellation of the token it was given
    #[error("Trigger wait cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Errors an operation may report
#[derive(Error, Debug)]
pub enum OperationError {
    /// The operation stopped because its cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<SchedulerError> for OperationError {
    fn from(err: SchedulerError) -> Self {
        OperationError::Failed(anyhow::Error::new(err))
    }
}
