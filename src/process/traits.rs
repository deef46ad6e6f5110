/*!
 * Process Traits
 * The unit of work a process drives
 */

use crate::core::errors::OperationResult;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Long-lived, cancellable unit of work
///
/// An operation must keep running until `cancel` fires and then return
/// promptly, either with `Ok(())` or with [`OperationError::Cancelled`].
/// Returning before cancellation is a contract violation and faults the
/// process with [`ProcessError::UnexpectedTermination`].
///
/// Closures of the shape `Fn(CancellationToken) -> impl Future<Output =
/// OperationResult>` implement this trait.
///
/// [`OperationError::Cancelled`]: crate::core::errors::OperationError::Cancelled
/// [`ProcessError::UnexpectedTermination`]: crate::core::errors::ProcessError::UnexpectedTermination
#[async_trait]
pub trait Operation: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> OperationResult;
}

#[async_trait]
impl<F, Fut> Operation for F
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = OperationResult> + Send,
{
    async fn run(&self, cancel: CancellationToken) -> OperationResult {
        (self)(cancel).await
    }
}
