/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::sync::WaitError;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the buffering and timer substrate
///
/// Every failure is returned to the immediate caller; nothing in this crate
/// swallows one of these.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StackError {
    #[error("No buffer space: {requested} bytes requested, {available} available")]
    #[diagnostic(
        code(stack::no_buffer_space),
        help("The queue is at capacity. Retry after the consumer drains it.")
    )]
    NoBufferSpace { requested: usize, available: usize },

    #[error("Operation would block")]
    #[diagnostic(code(stack::would_block))]
    WouldBlock,

    #[error("Wait timed out after {elapsed_ms}ms")]
    #[diagnostic(
        code(stack::timed_out),
        help("No data arrived before the deadline.")
    )]
    TimedOut { elapsed_ms: u64 },

    #[error("Wait was interrupted")]
    #[diagnostic(
        code(stack::interrupted),
        help("The caller may reissue the call; restartable calls resume with the remaining timeout.")
    )]
    Interrupted,

    #[error("Unsupported option: {0:#x}")]
    #[diagnostic(
        code(stack::not_supported),
        help("Only DONT_WAIT and PEEK are accepted.")
    )]
    NotSupported(u32),

    #[error("Invalid operation: {0}")]
    #[diagnostic(code(stack::invalid_operation))]
    InvalidOperation(String),

    #[error("Out of memory: {0}")]
    #[diagnostic(
        code(stack::no_memory),
        help("A buffer clone or backing primitive could not be allocated.")
    )]
    NoMemory(String),

    #[error("Failed to spawn worker thread: {0}")]
    #[diagnostic(
        code(stack::thread_spawn),
        help("The service is unusable; do not call any of its operations.")
    )]
    ThreadSpawn(String),

    #[error("Wait primitive was deleted")]
    #[diagnostic(code(stack::deleted))]
    Deleted,
}

impl StackError {
    /// True for the would-block and timed-out outcomes callers usually map
    /// onto their own non-blocking/timeout semantics
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StackError::WouldBlock | StackError::TimedOut { .. })
    }
}

impl From<WaitError> for StackError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Timeout { elapsed } => StackError::TimedOut {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            },
            WaitError::Interrupted => StackError::Interrupted,
            WaitError::Deleted => StackError::Deleted,
        }
    }
}
