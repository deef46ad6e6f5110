/*!
 * Read-Copy-Update (RCU) Cell
 * Lock-free snapshot reads with compare-and-swap replacement
 */

use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;

/// RCU-protected value with lock-free snapshot reads
///
/// Readers take an `Arc` snapshot that stays valid no matter how many
/// writers replace the value afterwards. Writers never mutate in place: they
/// build a new value from the current one and publish it with a
/// compare-and-swap, retrying against the fresh value on contention so no
/// concurrent update is ever lost.
///
/// # Example
///
/// ```ignore
/// let cell = RcuCell::new(Vec::new());
///
/// let changed = cell.try_update(|items| {
///     if items.contains(&7) {
///         return None;
///     }
///     let mut next = items.clone();
///     next.push(7);
///     Some(next)
/// });
/// ```
pub struct RcuCell<T> {
    inner: ArcSwap<T>,
}

impl<T> RcuCell<T> {
    /// Create new RCU cell
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Load a snapshot of the current value
    #[inline]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace value entirely
    #[inline]
    pub fn store(&self, new_value: T) {
        self.inner.store(Arc::new(new_value));
    }

    /// Conditionally replace the value with a compare-and-swap retry loop
    ///
    /// `f` receives the current value and returns `Some(next)` to publish a
    /// replacement or `None` to leave the value untouched. `f` may run
    /// several times under contention, always against the latest value.
    /// Returns `true` when a replacement was published.
    pub fn try_update<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&T) -> Option<T>,
    {
        let mut current = self.inner.load_full();
        loop {
            let Some(next) = f(&current) else {
                return false;
            };

            let previous = self.inner.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &current) {
                return true;
            }
            current = Guard::into_inner(previous);
        }
    }
}

impl<T: Default> Default for RcuCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RcuCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RcuCell").field(&*self.load()).finish()
    }
}
