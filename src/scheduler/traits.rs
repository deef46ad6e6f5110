/*!
 * Scheduler Traits
 * Trigger sources the scheduler races
 */

use crate::core::errors::TriggerResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Source of trigger events
///
/// `wait` resolves with `Ok(())` on the next occurrence. It must honour
/// `cancel` by returning [`TriggerError::Cancelled`] promptly, and a
/// cancelled wait must not consume or suppress a later occurrence. Any other
/// error is treated as a scheduler fault.
///
/// Triggers are registered as `Arc<dyn Trigger>` and identified by pointer,
/// so the same trigger can be registered at most once per scheduler.
///
/// [`TriggerError::Cancelled`]: crate::core::errors::TriggerError::Cancelled
#[async_trait]
pub trait Trigger: Send + Sync {
    async fn wait(&self, cancel: CancellationToken) -> TriggerResult;

    /// Label used in logs
    fn name(&self) -> &str {
        "trigger"
    }
}
