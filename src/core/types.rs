/*!
 * Core Types
 * Common types used across the stack substrate
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common result type for stack operations
pub type StackResult<T> = Result<T, super::errors::StackError>;

/// Process-unique timer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}
