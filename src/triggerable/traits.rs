/*!
 * Triggerable Traits
 * The guarded unit of work run once per accepted trigger
 */

use crate::core::errors::OperationResult;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Unit of work run by a [`TriggerableProcess`] each time a trigger is
/// accepted
///
/// Unlike an [`Operation`], a guarded operation is expected to return after
/// one pass. `cancel` is the owning process generation's token; returning an
/// error ends the driving loop and faults the process.
///
/// [`TriggerableProcess`]: super::TriggerableProcess
/// [`Operation`]: crate::process::Operation
#[async_trait]
pub trait GuardedOperation: Send + Sync {
    async fn execute(&self, cancel: CancellationToken) -> OperationResult;
}

#[async_trait]
impl<F, Fut> GuardedOperation for F
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = OperationResult> + Send,
{
    async fn execute(&self, cancel: CancellationToken) -> OperationResult {
        (self)(cancel).await
    }
}
