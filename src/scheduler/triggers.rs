/*!
 * Built-in Triggers
 *
 * - `NotifyTrigger`: fired explicitly by its owner
 * - `IntervalTrigger`: fires on a fixed period
 */

use super::traits::Trigger;
use crate::core::errors::{TriggerError, TriggerResult};
use crate::core::limits::MIN_TRIGGER_INTERVAL;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Trigger fired explicitly through [`NotifyTrigger::fire`]
///
/// A fire with no wait in flight is kept as a single pending occurrence and
/// satisfies the next wait immediately; further fires before that wait
/// coalesce into the same occurrence.
#[derive(Debug)]
pub struct NotifyTrigger {
    name: String,
    notify: Notify,
    fired: AtomicU64,
}

impl NotifyTrigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notify: Notify::new(),
            fired: AtomicU64::new(0),
        }
    }

    pub fn fire(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Number of `fire` calls so far
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Trigger for NotifyTrigger {
    async fn wait(&self, cancel: CancellationToken) -> TriggerResult {
        tokio::select! {
            _ = self.notify.notified() => Ok(()),
            _ = cancel.cancelled() => Err(TriggerError::Cancelled),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Trigger firing every `period`
///
/// The first occurrence comes one full period after the first wait; ticks
/// missed while nobody was waiting are skipped rather than replayed.
#[derive(Debug)]
pub struct IntervalTrigger {
    name: String,
    period: Duration,
    // Created on first wait, which is guaranteed to run inside a runtime
    interval: tokio::sync::Mutex<Option<Interval>>,
}

impl IntervalTrigger {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period: period.max(MIN_TRIGGER_INTERVAL),
            interval: tokio::sync::Mutex::new(None),
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl Trigger for IntervalTrigger {
    async fn wait(&self, cancel: CancellationToken) -> TriggerResult {
        let mut slot = tokio::select! {
            slot = self.interval.lock() => slot,
            _ = cancel.cancelled() => return Err(TriggerError::Cancelled),
        };
        let interval = slot.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        tokio::select! {
            _ = interval.tick() => Ok(()),
            _ = cancel.cancelled() => Err(TriggerError::Cancelled),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_trigger_keeps_early_fire() {
        let trigger = NotifyTrigger::new("early");
        trigger.fire();
        trigger.fire();

        let token = CancellationToken::new();
        assert!(trigger.wait(token.clone()).await.is_ok());
        assert_eq!(trigger.fired(), 2);

        // Both fires coalesced into one occurrence
        let second = tokio::time::timeout(Duration::from_millis(20), trigger.wait(token)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_notify_trigger_cancel() {
        let trigger = NotifyTrigger::new("cancel");
        let token = CancellationToken::new();
        token.cancel();

        assert!(matches!(
            trigger.wait(token).await,
            Err(TriggerError::Cancelled)
        ));

        // A cancelled wait does not swallow the next occurrence
        trigger.fire();
        assert!(trigger.wait(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_period() {
        let trigger = IntervalTrigger::new("tick", Duration::from_secs(10));
        let token = CancellationToken::new();

        let started = Instant::now();
        trigger.wait(token.clone()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(10));

        trigger.wait(token).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(20));
    }

    #[test]
    fn test_interval_trigger_clamps_period() {
        let trigger = IntervalTrigger::new("zero", Duration::ZERO);
        assert_eq!(trigger.period(), MIN_TRIGGER_INTERVAL);
    }
}
