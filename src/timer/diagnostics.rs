/*!
 * Timer Diagnostics
 * Read-only listing of scheduled timers for operator debugging
 */

use super::clock::Bigtime;
use super::net_timer::NetTimer;
use crate::core::types::TimerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One scheduled timer at the moment of the dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub label: String,
    pub has_hook: bool,
    /// Time until due; zero when already overdue
    pub due_in: Option<Duration>,
}

impl TimerSnapshot {
    pub(super) fn capture(timer: &NetTimer, now: Bigtime) -> Self {
        let due = timer.due();
        let due_in = (due > 0).then(|| {
            Duration::from_micros(u64::try_from(due.saturating_sub(now)).unwrap_or(0))
        });
        Self {
            id: timer.id(),
            label: timer.label().to_string(),
            has_hook: timer.hook().is_some(),
            due_in,
        }
    }
}

/// Every timer in the scheduled set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDump {
    pub timers: Vec<TimerSnapshot>,
}

impl fmt::Display for TimerDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:<20} {:<6} {:>14}", "timer", "label", "hook", "due in (us)")?;
        for timer in &self.timers {
            let due_in = timer
                .due_in
                .map_or_else(|| "-1".to_string(), |d| d.as_micros().to_string());
            writeln!(
                f,
                "{:<12} {:<20} {:<6} {:>14}",
                timer.id.to_string(),
                timer.label,
                timer.has_hook,
                due_in
            )?;
        }
        Ok(())
    }
}
