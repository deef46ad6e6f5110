/*!
 * Lifecycle Limits and Constants
 *
 * Centralized defaults for process lifecycle waits and trigger timing.
 */

use std::time::Duration;

// =============================================================================
// PROCESS LIFECYCLE
// =============================================================================

/// Default bound on `start_async` waiting for the startup completion (5s)
/// Startup only requires the spawned execution to be polled once
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on `terminate_async` waiting for the operation to unwind (30s)
pub const DEFAULT_TERMINATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Name used when a process is built without one
pub const DEFAULT_PROCESS_NAME: &str = "process";

// =============================================================================
// TRIGGERS
// =============================================================================

/// Shortest accepted `IntervalTrigger` period (1ms)
/// tokio::time::interval panics on a zero period
pub const MIN_TRIGGER_INTERVAL: Duration = Duration::from_millis(1);

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides the startup timeout, in milliseconds (0 disables the bound)
pub const ENV_STARTUP_TIMEOUT_MS: &str = "PROCESS_STARTUP_TIMEOUT_MS";

/// Overrides the termination timeout, in milliseconds (0 disables the bound)
pub const ENV_TERMINATION_TIMEOUT_MS: &str = "PROCESS_TERMINATION_TIMEOUT_MS";

/// Enables JSON trace output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "PROCESS_TRACE_JSON";
