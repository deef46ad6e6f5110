/*!
 * Driving Loop
 *
 * The operation a triggerable process runs: wait for the next trigger, then
 * start the guarded operation unless it is already in flight. The loop
 * keeps waiting for triggers while the guarded operation runs, so a trigger
 * that lands mid-run is absorbed by the execution guard instead of being
 * queued behind it.
 */

use super::traits::GuardedOperation;
use crate::core::errors::{OperationError, OperationResult};
use crate::core::sync::{ExecutionGuard, ExecutionPermit};
use crate::process::Operation;
use crate::scheduler::TriggerScheduler;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub(crate) struct DrivingLoop {
    name: Arc<str>,
    pub(crate) scheduler: TriggerScheduler,
    operation: Arc<dyn GuardedOperation>,
    pub(crate) guard: ExecutionGuard,
    absorbed: AtomicU64,
}

/// Guarded operation in flight; the permit is held until the run is dropped
struct InFlight<'a> {
    _permit: ExecutionPermit<'a>,
    run: BoxFuture<'a, OperationResult>,
}

impl DrivingLoop {
    pub(crate) fn new(name: &str, operation: Arc<dyn GuardedOperation>) -> Self {
        Self {
            name: Arc::from(name),
            scheduler: TriggerScheduler::new(),
            operation,
            guard: ExecutionGuard::new(),
            absorbed: AtomicU64::new(0),
        }
    }

    /// Triggers that arrived while the guarded operation was running
    pub(crate) fn absorbed(&self) -> u64 {
        self.absorbed.load(Ordering::Relaxed)
    }

    fn accept<'a>(&'a self, cancel: &CancellationToken) -> Option<InFlight<'a>> {
        match self.guard.try_enter() {
            Some(permit) => {
                trace!(process = %self.name, "Trigger accepted, executing");
                Some(InFlight {
                    _permit: permit,
                    run: self.operation.execute(cancel.clone()),
                })
            }
            None => {
                self.absorb();
                None
            }
        }
    }

    fn absorb(&self) {
        self.absorbed.fetch_add(1, Ordering::Relaxed);
        debug!(process = %self.name, "Trigger absorbed, execution already in flight");
    }

    /// Absorb a firing that landed while the run was finishing. Must be
    /// called while the permit is still held.
    fn drain_pending(&self) -> OperationResult {
        if let Some(fired) = self.scheduler.next_trigger().now_or_never() {
            fired?;
            self.absorb();
        }
        Ok(())
    }
}

async fn finish(in_flight: &mut Option<InFlight<'_>>) -> OperationResult {
    match in_flight {
        Some(execution) => execution.run.as_mut().await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl Operation for DrivingLoop {
    async fn run(&self, cancel: CancellationToken) -> OperationResult {
        let mut in_flight: Option<InFlight<'_>> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    // The guarded operation shares the token; let it unwind
                    if let Some(execution) = in_flight.take() {
                        execution.run.await?;
                    }
                    return Err(OperationError::Cancelled);
                }

                result = finish(&mut in_flight) => {
                    let drained = result.and_then(|()| self.drain_pending());
                    in_flight = None;
                    drained?;
                }

                fired = self.scheduler.next_trigger() => {
                    fired?;
                    // The permit lives inside in_flight, so this never replaces a run
                    if let Some(execution) = self.accept(&cancel) {
                        in_flight = Some(execution);
                    }
                }
            }
        }
    }
}
