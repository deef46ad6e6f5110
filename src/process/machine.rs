/*!
 * Process State Machine
 *
 * Runs one cancellable operation per generation with idempotent start and
 * terminate. Each accepted start installs a fresh cancellation token and a
 * fresh startup/termination completion pair; terminate only ever cancels
 * the generation that is current when it is called.
 *
 * # Outcomes
 *
 * - Operation returns after its token fired: clean termination
 * - Operation returns while its token is live: `UnexpectedTermination`
 * - Operation reports `Cancelled` for its own token: clean termination
 * - Operation reports `Cancelled` while its token is live: `ForeignCancellation`
 * - Operation fails or panics: `Faulted` / `Panicked`
 *
 * Faults are never raised from `start`/`terminate`. They resolve the
 * termination completion and are handed out exactly once by
 * `terminate_async*`; until then the process reports `Failed`.
 */

use super::completion::{Completer, Completion};
use super::config::ProcessConfig;
use super::traits::Operation;
use super::types::ProcessState;
use crate::core::errors::{OperationError, OperationResult, ProcessError, ProcessOutcome};
use crate::monitoring::generation_span;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// One start-to-terminate lifecycle
#[derive(Debug)]
struct Generation {
    id: u64,
    cancel: CancellationToken,
    startup: Completion,
    termination: Completion,
    fault_observed: AtomicBool,
}

impl Generation {
    fn state(&self) -> ProcessState {
        match self.termination.peek() {
            None => ProcessState::Running,
            Some(Err(_)) if !self.fault_observed.load(Ordering::Acquire) => ProcessState::Failed,
            Some(_) => ProcessState::Terminated,
        }
    }

    /// Hand out a fault at most once
    fn observe(&self, outcome: ProcessOutcome) -> ProcessOutcome {
        match outcome {
            Err(err) if !self.fault_observed.swap(true, Ordering::AcqRel) => Err(err),
            _ => Ok(()),
        }
    }
}

/// Cancellable process with explicit lifecycle
///
/// # Example
///
/// ```ignore
/// let process = Process::new("heartbeat", |cancel: CancellationToken| async move {
///     cancel.cancelled().await;
///     Ok(())
/// });
///
/// process.start_async().await?;
/// process.terminate_async().await?;
/// ```
pub struct Process {
    config: ProcessConfig,
    name: Arc<str>,
    operation: Arc<dyn Operation>,
    current: Mutex<Option<Arc<Generation>>>,
    generations: AtomicU64,
}

impl Process {
    /// Create a process with default configuration; it is not started
    pub fn new(name: impl Into<String>, operation: impl Operation + 'static) -> Self {
        Self::with_config(ProcessConfig::new(name), Arc::new(operation))
    }

    pub fn with_config(config: ProcessConfig, operation: Arc<dyn Operation>) -> Self {
        let name: Arc<str> = Arc::from(config.name.as_str());
        debug!(process = %name, "Process created");
        Self {
            config,
            name,
            operation,
            current: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Current state, computed from the current generation
    pub fn state(&self) -> ProcessState {
        self.current
            .lock()
            .as_ref()
            .map_or(ProcessState::Terminated, |generation| generation.state())
    }

    /// Id of the current generation (0 before the first start)
    pub fn generation(&self) -> u64 {
        self.current.lock().as_ref().map_or(0, |generation| generation.id)
    }

    /// Startup completion of the current generation
    pub fn startup(&self) -> Option<Completion> {
        self.current
            .lock()
            .as_ref()
            .map(|generation| generation.startup.clone())
    }

    /// Termination completion of the current generation
    pub fn termination(&self) -> Option<Completion> {
        self.current
            .lock()
            .as_ref()
            .map(|generation| generation.termination.clone())
    }

    /// Start a new generation unless one is already running
    ///
    /// Returns the startup completion of the running generation, which is
    /// the existing one when the call was a no-op.
    pub fn start(&self) -> Completion {
        let mut current = self.current.lock();

        if let Some(generation) = current.as_ref() {
            match generation.state() {
                ProcessState::Running => {
                    debug!(
                        process = %self.name,
                        generation = generation.id,
                        "Start ignored, process already running"
                    );
                    return generation.startup.clone();
                }
                ProcessState::Failed => {
                    if let Some(Err(err)) = generation.termination.peek() {
                        warn!(
                            process = %self.name,
                            generation = generation.id,
                            error = %err,
                            "Restarting over an unobserved fault"
                        );
                    }
                }
                ProcessState::Terminated => {}
            }
        }

        let id = self.generations.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancellationToken::new();
        let (startup_tx, startup) = Completion::pending(self.name.clone());
        let (termination_tx, termination) = Completion::pending(self.name.clone());

        match Handle::try_current() {
            Ok(handle) => {
                let span = generation_span(&self.name, id);
                handle.spawn(
                    execute(
                        self.name.clone(),
                        id,
                        self.operation.clone(),
                        cancel.clone(),
                        startup_tx,
                        termination_tx,
                    )
                    .instrument(span),
                );
                info!(process = %self.name, generation = id, "Process start accepted");
            }
            Err(_) => {
                let err = ProcessError::NoRuntime(self.name.to_string());
                error!(process = %self.name, generation = id, error = %err, "Process start failed");
                startup_tx.complete(Err(err.clone()));
                termination_tx.complete(Err(err));
            }
        }

        *current = Some(Arc::new(Generation {
            id,
            cancel,
            startup: startup.clone(),
            termination,
            fault_observed: AtomicBool::new(false),
        }));

        startup
    }

    /// Start and wait for startup, bounded by the configured startup timeout
    pub async fn start_async(&self) -> ProcessOutcome {
        match self.config.startup_timeout {
            Some(timeout) => self.start_async_timeout(timeout).await,
            None => self.start().wait().await,
        }
    }

    /// Start and wait for startup, giving up after `timeout`
    ///
    /// Giving up does not stop the generation.
    pub async fn start_async_timeout(&self, timeout: Duration) -> ProcessOutcome {
        let startup = self.start();
        tokio::select! {
            outcome = startup.wait() => outcome,
            err = expire(timeout, "startup") => Err(err),
        }
    }

    /// Request termination of the current generation without waiting
    ///
    /// Returns the generation's termination completion, or an already
    /// resolved one when nothing was ever started.
    pub fn terminate(&self) -> Completion {
        let current = self.current.lock().clone();
        match current {
            Some(generation) => {
                if !generation.termination.is_resolved() {
                    info!(
                        process = %self.name,
                        generation = generation.id,
                        "Process termination requested"
                    );
                    generation.cancel.cancel();
                }
                generation.termination.clone()
            }
            None => Completion::resolved(self.name.clone(), Ok(())),
        }
    }

    /// Terminate and wait, bounded by the configured termination timeout
    ///
    /// Returns the generation's fault the first time it is observed; later
    /// calls return `Ok(())`.
    pub async fn terminate_async(&self) -> ProcessOutcome {
        match self.config.termination_timeout {
            Some(timeout) => self.terminate_async_timeout(timeout).await,
            None => self.terminate_with(std::future::pending()).await,
        }
    }

    /// Terminate and wait, giving up after `timeout`
    ///
    /// Giving up leaves the cancellation in place; the operation keeps
    /// unwinding on its own.
    pub async fn terminate_async_timeout(&self, timeout: Duration) -> ProcessOutcome {
        self.terminate_with(expire(timeout, "termination")).await
    }

    /// Terminate and wait until the generation ends or `abandon` fires
    pub async fn terminate_until(&self, abandon: &CancellationToken) -> ProcessOutcome {
        self.terminate_with(async {
            abandon.cancelled().await;
            ProcessError::Abandoned("termination".into())
        })
        .await
    }

    async fn terminate_with<F>(&self, abandon: F) -> ProcessOutcome
    where
        F: Future<Output = ProcessError>,
    {
        let Some(generation) = self.current.lock().clone() else {
            return Ok(());
        };

        if !generation.termination.is_resolved() {
            info!(
                process = %self.name,
                generation = generation.id,
                "Process termination requested"
            );
            generation.cancel.cancel();
        }

        let outcome = tokio::select! {
            outcome = generation.termination.wait() => outcome,
            err = abandon => {
                warn!(process = %self.name, generation = generation.id, error = %err, "Termination wait abandoned");
                return Err(err);
            }
        };

        generation.observe(outcome)
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish()
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if let Some(generation) = self.current.get_mut().as_ref() {
            if !generation.termination.is_resolved() {
                debug!(
                    process = %self.name,
                    generation = generation.id,
                    "Process dropped while running, cancelling"
                );
                generation.cancel.cancel();
            }
        }
    }
}

async fn expire(timeout: Duration, operation: &str) -> ProcessError {
    tokio::time::sleep(timeout).await;
    timeout_error(timeout, operation)
}

fn timeout_error(timeout: Duration, operation: &str) -> ProcessError {
    ProcessError::Timeout {
        operation: operation.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Body of one generation
async fn execute(
    name: Arc<str>,
    id: u64,
    operation: Arc<dyn Operation>,
    cancel: CancellationToken,
    startup: Completer,
    termination: Completer,
) {
    // Never run the operation inline with the caller of start()
    tokio::task::yield_now().await;
    startup.complete(Ok(()));
    debug!(process = %name, generation = id, "Process started");

    let result = AssertUnwindSafe(operation.run(cancel.clone()))
        .catch_unwind()
        .await;
    let outcome = classify(&name, &cancel, result);

    match &outcome {
        Ok(()) => info!(process = %name, generation = id, "Process terminated"),
        Err(err) => error!(process = %name, generation = id, error = %err, "Process faulted"),
    }

    termination.complete(outcome);
}

fn classify(
    name: &str,
    cancel: &CancellationToken,
    result: std::thread::Result<OperationResult>,
) -> ProcessOutcome {
    match result {
        Ok(Ok(())) if cancel.is_cancelled() => Ok(()),
        Ok(Ok(())) => Err(ProcessError::UnexpectedTermination(name.to_string())),
        Ok(Err(OperationError::Cancelled)) if cancel.is_cancelled() => Ok(()),
        Ok(Err(OperationError::Cancelled)) => {
            Err(ProcessError::ForeignCancellation(name.to_string()))
        }
        Ok(Err(OperationError::Failed(err))) => Err(ProcessError::Faulted {
            process: name.to_string(),
            message: format!("{err:#}"),
        }),
        Err(payload) => Err(ProcessError::Panicked {
            process: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
