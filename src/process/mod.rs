/*!
 * Process Lifecycle
 *
 * A process wraps one long-lived, cancellable operation and gives it an
 * explicit lifecycle:
 *
 * - **Idempotent start**: starting a running process returns the startup
 *   completion already in flight
 * - **Idempotent terminate**: terminating a stopped process is a no-op
 * - **Generations**: every accepted start gets a fresh cancellation token
 *   and fresh startup/termination completions
 * - **Deferred faults**: failures resolve the termination completion and are
 *   observed once through `terminate_async`
 */

pub mod completion;
pub mod config;
pub mod machine;
pub mod traits;
pub mod types;

pub use completion::Completion;
pub use config::ProcessConfig;
pub use machine::Process;
pub use traits::Operation;
pub use types::ProcessState;
