/*!
 * Fifo Types
 * Dequeue flags, statistics and the rejected-enqueue carrier
 */

use crate::core::errors::StackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Options accepted by `BufferFifo::dequeue`
///
/// Bit values follow the socket `MSG_*` flags so raw flags can be passed
/// through; any bit other than `DONT_WAIT` and `PEEK` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DequeueFlags(u32);

impl DequeueFlags {
    /// Wait for data (subject to the timeout)
    pub const NONE: Self = Self(0);
    /// Return a copy of the head buffer and leave it queued
    pub const PEEK: Self = Self(0x2);
    /// Never block; a zero timeout means the same
    pub const DONT_WAIT: Self = Self(0x80);

    const SUPPORTED: u32 = Self::PEEK.0 | Self::DONT_WAIT.0;

    /// Wrap raw flag bits without validating them
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits outside the supported set, if any
    #[inline]
    #[must_use]
    pub const fn unsupported_bits(&self) -> u32 {
        self.0 & !Self::SUPPORTED
    }
}

impl BitOr for DequeueFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DequeueFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A buffer the queue refused; ownership goes back to the caller
pub struct Rejected<B> {
    pub error: StackError,
    pub buffer: B,
}

impl<B> Rejected<B> {
    pub fn into_buffer(self) -> B {
        self.buffer
    }
}

impl<B> From<Rejected<B>> for StackError {
    fn from(rejected: Rejected<B>) -> Self {
        rejected.error
    }
}

impl<B> fmt::Debug for Rejected<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<B> fmt::Display for Rejected<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer rejected: {}", self.error)
    }
}

/// Point-in-time queue statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoStats {
    pub name: String,
    pub max_bytes: usize,
    pub current_bytes: usize,
    pub buffers: usize,
    pub waiting: usize,
}
