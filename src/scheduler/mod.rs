/*!
 * Scheduler Module
 * Trigger sources and the scheduler that races them
 */

pub mod manual;
pub mod traits;
pub mod trigger_scheduler;
pub mod triggers;

// Re-export public API
pub use manual::ManualSignal;
pub use traits::Trigger;
pub use trigger_scheduler::{TriggerScheduler, TriggerSet};
pub use triggers::{IntervalTrigger, NotifyTrigger};
