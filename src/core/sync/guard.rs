/*!
 * Execution Guard
 *
 * Single-entry guard built on an atomic exchange. At most one permit exists
 * at a time; a caller that finds the guard taken is turned away instead of
 * waiting, so work arriving during a run is absorbed rather than queued.
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Single-entry execution guard
#[derive(Debug, Default)]
pub struct ExecutionGuard {
    running: AtomicBool,
    completed: AtomicU64,
}

impl ExecutionGuard {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            completed: AtomicU64::new(0),
        }
    }

    /// Try to enter the guard
    ///
    /// Returns `None` when a permit is already outstanding.
    #[inline]
    pub fn try_enter(&self) -> Option<ExecutionPermit<'_>> {
        if self.running.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(ExecutionPermit { guard: self })
        }
    }

    /// Whether a permit is currently outstanding
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of permits released so far
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

/// RAII permit; releases the guard on drop
#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct ExecutionPermit<'a> {
    guard: &'a ExecutionGuard,
}

impl Drop for ExecutionPermit<'_> {
    fn drop(&mut self) {
        self.guard.completed.fetch_add(1, Ordering::AcqRel);
        self.guard.running.store(false, Ordering::Release);
    }
}
