/*!
 * Completion Signals
 *
 * Single-resolution outcome cells readable by any number of observers.
 * Each process generation owns one for startup and one for termination.
 */

use crate::core::errors::{ProcessError, ProcessOutcome};
use futures::future::BoxFuture;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::watch;

/// Write side of a completion; the first `complete` call wins
#[derive(Debug)]
pub(crate) struct Completer {
    tx: watch::Sender<Option<ProcessOutcome>>,
}

impl Completer {
    /// Resolve the completion. Returns `false` if it was already resolved.
    pub(crate) fn complete(&self, outcome: ProcessOutcome) -> bool {
        let mut outcome = Some(outcome);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = outcome.take();
            true
        })
    }
}

/// Read side of a completion
///
/// Cheap to clone. Awaiting it (or calling [`Completion::wait`]) yields the
/// resolved outcome; every observer sees the same value, no matter when it
/// looks.
#[derive(Debug, Clone)]
pub struct Completion {
    rx: watch::Receiver<Option<ProcessOutcome>>,
    process: Arc<str>,
}

impl Completion {
    /// Create an unresolved completion and its writer
    pub(crate) fn pending(process: Arc<str>) -> (Completer, Self) {
        let (tx, rx) = watch::channel(None);
        (Completer { tx }, Self { rx, process })
    }

    /// Create a completion that is already resolved
    pub(crate) fn resolved(process: Arc<str>, outcome: ProcessOutcome) -> Self {
        // The receiver keeps the value after the sender is gone
        let (_, rx) = watch::channel(Some(outcome));
        Self { rx, process }
    }

    /// Outcome if already resolved
    #[inline]
    pub fn peek(&self) -> Option<ProcessOutcome> {
        self.rx.borrow().clone()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the outcome
    ///
    /// Yields [`ProcessError::Dropped`] if the writer went away unresolved.
    pub async fn wait(&self) -> ProcessOutcome {
        let mut rx = self.rx.clone();
        let resolved = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };
        resolved.unwrap_or_else(|| Err(ProcessError::Dropped(self.process.to_string())))
    }
}

impl IntoFuture for Completion {
    type Output = ProcessOutcome;
    type IntoFuture = BoxFuture<'static, ProcessOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}
