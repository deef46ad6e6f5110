/*!
 * Triggerable Types
 */

use crate::process::ProcessState;
use serde::{Deserialize, Serialize};

/// Combined state of the driving loop and the guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerableState {
    /// Driving loop not running
    Terminated,
    /// Driving loop running, waiting for the next trigger
    Waiting,
    /// Driving loop running and the guarded operation in flight
    Executing,
    /// Driving loop ended with an unobserved fault
    Failed,
}

impl TriggerableState {
    pub fn from_parts(process: ProcessState, executing: bool) -> Self {
        match (process, executing) {
            (ProcessState::Running, true) => Self::Executing,
            (ProcessState::Running, false) => Self::Waiting,
            (ProcessState::Failed, _) => Self::Failed,
            (ProcessState::Terminated, _) => Self::Terminated,
        }
    }

    /// Whether the driving loop is running
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Waiting | Self::Executing)
    }
}
