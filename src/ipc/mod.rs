/*!
 * IPC Module
 * Buffer handoff between protocol layers and socket readers
 */

pub mod fifo;

// Re-export for convenience
pub use fifo::{BufferFifo, DequeueFlags, FifoConfig, FifoStats, Rejected};
