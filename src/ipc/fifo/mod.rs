/*!
 * Fifo Module
 * Bounded buffer queues used to hand data across concurrency boundaries
 */

pub mod config;
pub mod queue;
pub mod types;

// Re-export public API
pub use config::FifoConfig;
pub use queue::BufferFifo;
pub use types::{DequeueFlags, FifoStats, Rejected};
