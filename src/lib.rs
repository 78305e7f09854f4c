/*!
 * Network Stack Core Library
 * Synchronization and buffering substrate shared by protocol layers:
 * deferred-execution timers, bounded buffer queues, the Internet checksum
 * and syscall restart bookkeeping
 */

pub mod core;
pub mod ipc;
pub mod monitoring;
pub mod net;
pub mod syscalls;
pub mod timer;

// Re-exports
pub use crate::core::errors::StackError;
pub use crate::core::types::{StackResult, TimerId};
pub use ipc::{BufferFifo, DequeueFlags, FifoConfig, FifoStats, Rejected};
pub use monitoring::{init_tracing, try_init_tracing};
pub use net::{checksum, ByteBuffer, Checksum, NetBuffer, SocketEvent, SocketNotifier, UserBuffer};
pub use timer::{NetTimer, TimerHandle, TimerService, TimerServiceConfig};
