/*!
 * Wait Outcomes
 *
 * Error type and deadline arithmetic shared by every blocking primitive.
 */

use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("Wait was interrupted")]
    Interrupted,

    #[error("Wait primitive was deleted")]
    Deleted,
}

/// Point in time a blocking wait gives up at
///
/// Relative timeouts are converted once, on entry, so that re-waiting after a
/// spurious wake never extends the total time spent blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Block until woken
    Infinite,
    /// Block until woken or until this instant passes
    At(Instant),
}

impl Deadline {
    /// Deadline `timeout` from now; overflow saturates to infinite
    #[inline]
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Deadline::Infinite, Deadline::At)
    }

    /// `None` means wait forever
    #[inline]
    #[must_use]
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or(Deadline::Infinite, Self::after)
    }

    /// Time left before the deadline; `None` for infinite deadlines
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Deadline::Infinite => None,
            Deadline::At(at) => Some(at.saturating_duration_since(Instant::now())),
        }
    }

    #[inline]
    #[must_use]
    pub fn has_expired(&self) -> bool {
        match self {
            Deadline::Infinite => false,
            Deadline::At(at) => Instant::now() >= *at,
        }
    }

    /// The earlier of two deadlines
    #[must_use]
    pub fn min(self, other: Deadline) -> Deadline {
        match (self, other) {
            (Deadline::Infinite, d) | (d, Deadline::Infinite) => d,
            (Deadline::At(a), Deadline::At(b)) => Deadline::At(a.min(b)),
        }
    }
}
