/*!
 * Monitoring
 * Structured logging setup shared by every component
 */

mod tracer;

pub use tracer::{init_tracing, try_init_tracing, CallSpan};
