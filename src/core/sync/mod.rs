/*!
 * Synchronization Primitives
 *
 * Lock-free building blocks shared by the process and scheduler layers:
 * - `RcuCell` for snapshot reads with compare-and-swap replacement
 * - `ExecutionGuard` for single-entry execution via atomic exchange
 */

mod guard;
mod rcu;

pub use guard::{ExecutionGuard, ExecutionPermit};
pub use rcu::RcuCell;
