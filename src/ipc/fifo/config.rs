/*!
 * Fifo Configuration
 */

use crate::core::limits::{DEFAULT_SOCKET_RECEIVE_BYTES, DEFAULT_SOCKET_SEND_BYTES, UNBOUNDED};
use serde::{Deserialize, Serialize};

/// Name and byte capacity of a buffer queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoConfig {
    /// Used for the lock/semaphore names and in logs
    pub name: String,
    /// Total byte capacity; 0 disables the check
    pub max_bytes: usize,
}

impl FifoConfig {
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_bytes: UNBOUNDED,
        }
    }

    pub fn bounded(name: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            name: name.into(),
            max_bytes,
        }
    }

    /// Default socket receive queue
    pub fn socket_receive(name: impl Into<String>) -> Self {
        Self::bounded(name, DEFAULT_SOCKET_RECEIVE_BYTES)
    }

    /// Default socket send queue
    pub fn socket_send(name: impl Into<String>) -> Self {
        Self::bounded(name, DEFAULT_SOCKET_SEND_BYTES)
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.max_bytes != UNBOUNDED
    }
}
