/*!
 * Monitoring
 * Structured logging setup for lifecycle events
 */

pub mod tracer;

pub use tracer::{generation_span, init_tracing};
