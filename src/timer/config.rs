/*!
 * Timer Service Configuration
 */

use crate::core::limits::{TIMER_THREAD_NAME, TIMER_THREAD_STACK_SIZE};
use serde::{Deserialize, Serialize};

/// Worker thread settings for a timer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerServiceConfig {
    /// Name of the worker thread (default: "net timer")
    pub thread_name: String,
    /// Worker stack size; `None` uses the platform default
    pub stack_size: Option<usize>,
}

impl TimerServiceConfig {
    pub fn new() -> Self {
        Self {
            thread_name: TIMER_THREAD_NAME.to_string(),
            stack_size: Some(TIMER_THREAD_STACK_SIZE),
        }
    }

    /// Defaults overridden by `NETSTACK_TIMER_THREAD` and
    /// `NETSTACK_TIMER_STACK` (bytes)
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(name) = std::env::var("NETSTACK_TIMER_THREAD") {
            if !name.is_empty() {
                config.thread_name = name;
            }
        }
        if let Some(size) = std::env::var("NETSTACK_TIMER_STACK")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.stack_size = Some(size);
        }
        config
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for TimerServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
