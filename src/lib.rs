/*!
 * Process Trigger Library
 * Cancellable process lifecycles and trigger-driven re-execution
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod triggerable;

// Re-exports
pub use crate::core::errors::*;
pub use crate::monitoring::init_tracing;
pub use crate::process::{Completion, Operation, Process, ProcessConfig, ProcessState};
pub use crate::scheduler::{IntervalTrigger, NotifyTrigger, Trigger, TriggerScheduler};
pub use crate::triggerable::{GuardedOperation, TriggerableProcess, TriggerableState};

// Operations and triggers are written against this token type
pub use tokio_util::sync::CancellationToken;
