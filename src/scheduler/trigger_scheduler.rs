/*!
 * Trigger Scheduler
 *
 * Resolves `next_trigger()` whenever any registered trigger fires or the
 * manual signal is set, while the trigger set keeps changing underneath.
 *
 * # Coordination
 *
 * - The trigger set is an immutable snapshot replaced by compare-and-swap,
 *   so concurrent registrations never lose updates
 * - Every effective membership change either cancels the in-flight wait
 *   (forcing a resnapshot) or, with no wait in flight, sets a flag that
 *   makes the next wait resnapshot before racing
 * - The bookkeeping lock is only held for O(1) flag/token updates, never
 *   across an await
 * - Callers of `next_trigger` are served one at a time, so one manual
 *   signal satisfies exactly one wait
 */

use super::manual::ManualSignal;
use super::traits::Trigger;
use crate::core::errors::{SchedulerError, SchedulerResult, TriggerError, TriggerResult};
use crate::core::sync::RcuCell;
use futures::future::{select_all, BoxFuture};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Registered trigger set, unique by pointer identity
pub type TriggerSet = Vec<Arc<dyn Trigger>>;

#[derive(Debug, Default)]
struct WaitState {
    /// Token of the race currently in flight
    active: Option<CancellationToken>,
    /// Membership changed while no race was in flight
    changed: bool,
}

/// How one race ended
enum RaceOutcome {
    Fired { source: String },
    Resnapshot,
    Failed(SchedulerError),
}

/// Scheduler over a dynamic set of triggers plus one manual signal
#[derive(Default)]
pub struct TriggerScheduler {
    triggers: RcuCell<TriggerSet>,
    manual: ManualSignal,
    wait: Mutex<WaitState>,
    consumer: tokio::sync::Mutex<()>,
}

impl TriggerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Returns `false` if it was already registered.
    pub fn add_trigger(&self, trigger: Arc<dyn Trigger>) -> bool {
        let changed = self.triggers.try_update(|current| {
            if current.iter().any(|existing| same_trigger(existing, &trigger)) {
                return None;
            }
            let mut next = current.clone();
            next.push(Arc::clone(&trigger));
            Some(next)
        });

        if changed {
            debug!(trigger = trigger.name(), "Trigger registered");
            self.membership_changed();
        }
        changed
    }

    /// Unregister a trigger. Returns `false` if it was not registered.
    pub fn remove_trigger(&self, trigger: &Arc<dyn Trigger>) -> bool {
        let changed = self.triggers.try_update(|current| {
            if !current.iter().any(|existing| same_trigger(existing, trigger)) {
                return None;
            }
            Some(
                current
                    .iter()
                    .filter(|existing| !same_trigger(existing, trigger))
                    .cloned()
                    .collect(),
            )
        });

        if changed {
            debug!(trigger = trigger.name(), "Trigger unregistered");
            self.membership_changed();
        }
        changed
    }

    /// Set the manual signal
    pub fn trigger(&self) {
        trace!("Manual trigger set");
        self.manual.set();
    }

    /// Snapshot of the registered triggers
    pub fn triggers(&self) -> Arc<TriggerSet> {
        self.triggers.load()
    }

    pub fn contains(&self, trigger: &Arc<dyn Trigger>) -> bool {
        self.triggers
            .load()
            .iter()
            .any(|existing| same_trigger(existing, trigger))
    }

    pub fn len(&self) -> usize {
        self.triggers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.load().is_empty()
    }

    /// Whether a `next_trigger` race is currently in flight
    pub fn is_waiting(&self) -> bool {
        self.wait.lock().active.is_some()
    }

    /// Wait for the next trigger occurrence or manual signal
    ///
    /// The manual signal is reset once this returns `Ok`. Dropping the
    /// returned future abandons the wait without side effects on the
    /// trigger set.
    pub async fn next_trigger(&self) -> SchedulerResult<()> {
        let _consumer = self.consumer.lock().await;

        loop {
            let snapshot = self.triggers.load();
            let Some(wait) = self.begin_wait() else {
                debug!(triggers = snapshot.len(), "Trigger set changed, resnapshotting");
                continue;
            };

            let outcome = self.race(&snapshot, &wait.token).await;
            match outcome {
                RaceOutcome::Fired { source } => {
                    drop(wait);
                    self.manual.reset();
                    trace!(source = %source, "Trigger fired");
                    return Ok(());
                }
                RaceOutcome::Resnapshot => {
                    drop(wait);
                    debug!("Trigger set changed mid-wait, resnapshotting");
                }
                RaceOutcome::Failed(err) => {
                    drop(wait);
                    warn!(error = %err, "Trigger wait failed");
                    return Err(err);
                }
            }
        }
    }

    /// Install a fresh wait token unless membership changed since the last
    /// snapshot
    fn begin_wait(&self) -> Option<ActiveWait<'_>> {
        let mut state = self.wait.lock();
        if std::mem::take(&mut state.changed) {
            return None;
        }
        let token = CancellationToken::new();
        state.active = Some(token.clone());
        Some(ActiveWait {
            scheduler: self,
            token,
        })
    }

    fn membership_changed(&self) {
        let mut state = self.wait.lock();
        match &state.active {
            Some(token) => token.cancel(),
            None => state.changed = true,
        }
    }

    async fn race(&self, snapshot: &[Arc<dyn Trigger>], token: &CancellationToken) -> RaceOutcome {
        let mut racers: Vec<BoxFuture<'_, TriggerResult>> = Vec::with_capacity(snapshot.len() + 1);
        racers.push(Box::pin(self.manual.wait(token)));
        for trigger in snapshot {
            racers.push(trigger.wait(token.clone()));
        }

        let (result, index, remaining) = select_all(racers).await;
        // Classify before tearing down; teardown cancels the token itself
        let cancelled_by_scheduler = token.is_cancelled();
        drop(remaining);

        match result {
            Ok(()) => RaceOutcome::Fired {
                source: match index {
                    0 => "manual".to_string(),
                    n => snapshot[n - 1].name().to_string(),
                },
            },
            Err(TriggerError::Cancelled) if cancelled_by_scheduler => RaceOutcome::Resnapshot,
            Err(TriggerError::Cancelled) => RaceOutcome::Failed(SchedulerError::ForeignCancellation),
            Err(TriggerError::Failed(err)) => {
                RaceOutcome::Failed(SchedulerError::TriggerFailed(format!("{err:#}")))
            }
        }
    }
}

impl std::fmt::Debug for TriggerScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerScheduler")
            .field("triggers", &self.len())
            .field("manual", &self.manual.is_set())
            .field("waiting", &self.is_waiting())
            .finish()
    }
}

/// In-flight race registration; tears the race down on drop
struct ActiveWait<'a> {
    scheduler: &'a TriggerScheduler,
    token: CancellationToken,
}

impl Drop for ActiveWait<'_> {
    fn drop(&mut self) {
        self.token.cancel();
        self.scheduler.wait.lock().active = None;
    }
}

#[inline]
fn same_trigger(a: &Arc<dyn Trigger>, b: &Arc<dyn Trigger>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
