/*!
 * Process Configuration
 *
 * Runtime configuration for process naming and lifecycle wait bounds
 */

use crate::core::limits::{
    DEFAULT_PROCESS_NAME, DEFAULT_STARTUP_TIMEOUT, DEFAULT_TERMINATION_TIMEOUT,
    ENV_STARTUP_TIMEOUT_MS, ENV_TERMINATION_TIMEOUT_MS,
};
use std::time::Duration;
use tracing::warn;

/// Process configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Name used in logs and error messages
    pub name: String,
    /// Bound applied by `start_async` (None waits indefinitely)
    pub startup_timeout: Option<Duration>,
    /// Bound applied by `terminate_async` (None waits indefinitely)
    pub termination_timeout: Option<Duration>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROCESS_NAME.to_string(),
            startup_timeout: Some(DEFAULT_STARTUP_TIMEOUT),
            termination_timeout: Some(DEFAULT_TERMINATION_TIMEOUT),
        }
    }
}

impl ProcessConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Short bounds for operations that unwind quickly
    pub fn fast(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            startup_timeout: Some(Duration::from_millis(500)),
            termination_timeout: Some(Duration::from_secs(2)),
        }
    }

    /// No bounds at all; waits last as long as the operation needs
    pub fn patient(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            startup_timeout: None,
            termination_timeout: None,
        }
    }

    /// Defaults overridden by `PROCESS_STARTUP_TIMEOUT_MS` and
    /// `PROCESS_TERMINATION_TIMEOUT_MS`
    pub fn from_env(name: impl Into<String>) -> Self {
        let mut config = Self::new(name);
        if let Some(timeout) = read_timeout(ENV_STARTUP_TIMEOUT_MS) {
            config.startup_timeout = timeout;
        }
        if let Some(timeout) = read_timeout(ENV_TERMINATION_TIMEOUT_MS) {
            config.termination_timeout = timeout;
        }
        config
    }

    #[inline]
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.startup_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_termination_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.termination_timeout = timeout;
        self
    }
}

/// Outer None: variable unset or invalid. Inner None: explicitly unbounded.
fn read_timeout(var: &str) -> Option<Option<Duration>> {
    let raw = std::env::var(var).ok()?;
    parse_timeout_ms(&raw).or_else(|| {
        warn!(variable = var, value = %raw, "Ignoring invalid timeout override");
        None
    })
}

fn parse_timeout_ms(raw: &str) -> Option<Option<Duration>> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Some(None),
        Ok(ms) => Some(Some(Duration::from_millis(ms))),
        Err(_) => None,
    }
}
