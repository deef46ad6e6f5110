/*!
 * Triggerable Process
 *
 * A process whose operation re-runs a guarded unit of work every time one
 * of its triggers fires or `trigger_execution` is called. At most one run is
 * ever in flight; triggers arriving during a run are absorbed.
 */

use super::driver::DrivingLoop;
use super::traits::GuardedOperation;
use super::types::TriggerableState;
use crate::core::errors::ProcessOutcome;
use crate::process::{Completion, Operation, Process, ProcessConfig, ProcessState};
use crate::scheduler::{Trigger, TriggerScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Process driven by triggers
///
/// # Example
///
/// ```ignore
/// let process = TriggerableProcess::new("sync", |_cancel: CancellationToken| async move {
///     sync_once().await?;
///     Ok(())
/// });
///
/// process.register_trigger(Arc::new(IntervalTrigger::new("tick", Duration::from_secs(60))));
/// process.start_async().await?;
/// process.trigger_execution();
/// ```
pub struct TriggerableProcess {
    process: Process,
    driver: Arc<DrivingLoop>,
}

impl TriggerableProcess {
    /// Create a triggerable process with default configuration; it is not
    /// started
    pub fn new(name: impl Into<String>, operation: impl GuardedOperation + 'static) -> Self {
        Self::with_config(ProcessConfig::new(name), Arc::new(operation))
    }

    pub fn with_config(config: ProcessConfig, operation: Arc<dyn GuardedOperation>) -> Self {
        let driver = Arc::new(DrivingLoop::new(&config.name, operation));
        let process = Process::with_config(config, driver.clone() as Arc<dyn Operation>);
        Self { process, driver }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.process.name()
    }

    /// Combined state of the driving loop and the guarded operation
    pub fn state(&self) -> TriggerableState {
        TriggerableState::from_parts(self.process.state(), self.driver.guard.is_running())
    }

    /// State of the driving loop alone
    pub fn process_state(&self) -> ProcessState {
        self.process.state()
    }

    pub fn generation(&self) -> u64 {
        self.process.generation()
    }

    pub fn startup(&self) -> Option<Completion> {
        self.process.startup()
    }

    pub fn termination(&self) -> Option<Completion> {
        self.process.termination()
    }

    pub fn start(&self) -> Completion {
        self.process.start()
    }

    pub async fn start_async(&self) -> ProcessOutcome {
        self.process.start_async().await
    }

    pub async fn start_async_timeout(&self, timeout: Duration) -> ProcessOutcome {
        self.process.start_async_timeout(timeout).await
    }

    pub fn terminate(&self) -> Completion {
        self.process.terminate()
    }

    pub async fn terminate_async(&self) -> ProcessOutcome {
        self.process.terminate_async().await
    }

    pub async fn terminate_async_timeout(&self, timeout: Duration) -> ProcessOutcome {
        self.process.terminate_async_timeout(timeout).await
    }

    pub async fn terminate_until(&self, abandon: &CancellationToken) -> ProcessOutcome {
        self.process.terminate_until(abandon).await
    }

    /// Request one run of the guarded operation
    pub fn trigger_execution(&self) {
        self.driver.scheduler.trigger();
    }

    /// Returns `false` if the trigger was already registered
    pub fn register_trigger(&self, trigger: Arc<dyn Trigger>) -> bool {
        self.driver.scheduler.add_trigger(trigger)
    }

    /// Returns `false` if the trigger was not registered
    pub fn unregister_trigger(&self, trigger: &Arc<dyn Trigger>) -> bool {
        self.driver.scheduler.remove_trigger(trigger)
    }

    pub fn scheduler(&self) -> &TriggerScheduler {
        &self.driver.scheduler
    }

    #[inline]
    pub fn is_executing(&self) -> bool {
        self.driver.guard.is_running()
    }

    /// Finished runs of the guarded operation (including failed or cancelled
    /// ones), across all generations
    pub fn execution_count(&self) -> u64 {
        self.driver.guard.completed()
    }

    /// Triggers absorbed because a run was already in flight
    pub fn absorbed_count(&self) -> u64 {
        self.driver.absorbed()
    }
}

impl std::fmt::Debug for TriggerableProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerableProcess")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("triggers", &self.driver.scheduler.len())
            .field("executions", &self.execution_count())
            .finish()
    }
}
