/*!
 * Process Types
 * Common types for process lifecycle management
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process state
///
/// Derived from the current generation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// No generation is in flight and the last one (if any) ended cleanly or
    /// had its fault observed
    Terminated,
    /// A generation is in flight
    Running,
    /// The last generation ended with a fault nobody has observed yet
    Failed,
}

impl ProcessState {
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Terminated => "terminated",
            Self::Running => "running",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
