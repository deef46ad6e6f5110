/*!
 * Triggerable Processes
 *
 * Composes a process (the driving loop), a trigger scheduler and a guarded
 * operation behind a single-entry execution guard.
 */

mod driver;
pub mod traits;
pub mod triggerable_process;
pub mod types;

pub use traits::GuardedOperation;
pub use triggerable_process::TriggerableProcess;
pub use types::TriggerableState;
