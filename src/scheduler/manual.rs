/*!
 * Manual Signal
 *
 * Level-triggered event set by `TriggerScheduler::trigger`. Stays set until
 * the scheduler resets it after the wait it satisfied, so a signal raised
 * while nobody is waiting is picked up by the next wait.
 */

use crate::core::errors::{TriggerError, TriggerResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct ManualSignal {
    set: AtomicBool,
    notify: Notify,
}

impl ManualSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter
    pub fn set(&self) {
        self.set.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn reset(&self) {
        self.set.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Wait until the signal is set or `cancel` fires
    pub async fn wait(&self, cancel: &CancellationToken) -> TriggerResult {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent set() is not missed
            notified.as_mut().enable();

            if self.is_set() {
                return Ok(());
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return Err(TriggerError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_before_wait() {
        let signal = ManualSignal::new();
        signal.set();

        let token = CancellationToken::new();
        assert!(signal.wait(&token).await.is_ok());
        // Level-triggered: still set until reset
        assert!(signal.wait(&token).await.is_ok());

        signal.reset();
        assert!(!signal.is_set());
    }

    #[tokio::test]
    async fn test_set_wakes_waiter() {
        let signal = Arc::new(ManualSignal::new());
        let token = CancellationToken::new();

        let waiter = {
            let signal = signal.clone();
            let token = token.clone();
            tokio::spawn(async move { signal.wait(&token).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.set();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_wait() {
        let signal = ManualSignal::new();
        let token = CancellationToken::new();
        token.cancel();

        assert!(matches!(
            signal.wait(&token).await,
            Err(TriggerError::Cancelled)
        ));
    }
}
