/*!
 * Network Timer
 * Callback plus due-time, embedded by whichever session owns it
 */

use super::clock::{Bigtime, UNSCHEDULED};
use super::service::TimerHandle;
use crate::core::errors::StackError;
use crate::core::types::{StackResult, TimerId};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Callback run on the timer worker thread
///
/// Receives a handle to the service that fired it, so the hook can
/// reschedule or cancel timers without capturing the service.
pub type TimerHook = dyn Fn(&TimerHandle, &Arc<NetTimer>) + Send + Sync + 'static;

pub(super) struct HookFn(Box<TimerHook>);

impl HookFn {
    #[inline]
    pub(super) fn call(&self, handle: &TimerHandle, timer: &Arc<NetTimer>) {
        (self.0)(handle, timer)
    }
}

/// A deferred callback
///
/// The service never allocates or frees timers; it only moves them in and
/// out of its scheduled set, updates the due-time and runs the hook. The
/// due-time is written only under the service lock.
pub struct NetTimer {
    id: TimerId,
    label: String,
    hook: ArcSwapOption<HookFn>,
    due: AtomicI64,
}

impl NetTimer {
    /// Create an idle timer
    pub fn new<F>(label: impl Into<String>, hook: F) -> Arc<Self>
    where
        F: Fn(&TimerHandle, &Arc<NetTimer>) + Send + Sync + 'static,
    {
        Arc::new(Self {
            id: TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.into(),
            hook: ArcSwapOption::new(Some(Arc::new(HookFn(Box::new(hook))))),
            due: AtomicI64::new(UNSCHEDULED),
        })
    }

    /// Replace the hook and reset the schedule state
    ///
    /// The timer must be idle: cancelled and, if it might be firing, waited
    /// for. A scheduled timer is refused.
    pub fn init<F>(&self, hook: F) -> StackResult<()>
    where
        F: Fn(&TimerHandle, &Arc<NetTimer>) + Send + Sync + 'static,
    {
        if self.is_active() {
            return Err(StackError::InvalidOperation(format!(
                "{} is scheduled; cancel it before init",
                self.id
            )));
        }
        self.hook.store(Some(Arc::new(HookFn(Box::new(hook)))));
        self.due.store(UNSCHEDULED, Ordering::Release);
        Ok(())
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Scheduled with a positive due-time
    #[inline]
    pub fn is_active(&self) -> bool {
        self.due() > 0
    }

    #[inline]
    pub(super) fn due(&self) -> Bigtime {
        self.due.load(Ordering::Acquire)
    }

    #[inline]
    pub(super) fn set_due(&self, due: Bigtime) {
        self.due.store(due, Ordering::Release);
    }

    pub(super) fn hook(&self) -> Option<Arc<HookFn>> {
        self.hook.load_full()
    }
}

impl fmt::Debug for NetTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetTimer")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("due", &self.due())
            .finish()
    }
}
