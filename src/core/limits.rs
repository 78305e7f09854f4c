/*!
 * Limits
 * Compile-time defaults shared by queues and the timer service
 */

/// A `max_bytes` of zero disables the capacity check
pub const UNBOUNDED: usize = 0;

/// Default receive queue capacity for a socket
pub const DEFAULT_SOCKET_RECEIVE_BYTES: usize = 64 * 1024;

/// Default send queue capacity for a socket
pub const DEFAULT_SOCKET_SEND_BYTES: usize = 64 * 1024;

/// Name given to the timer worker thread
pub const TIMER_THREAD_NAME: &str = "net timer";

/// Stack size for the timer worker; hooks are expected to be short
pub const TIMER_THREAD_STACK_SIZE: usize = 256 * 1024;
