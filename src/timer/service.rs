/*!
 * Timer Service
 *
 * One worker thread per service runs every due timer hook, one at a time,
 * outside the service lock.
 *
 * # Worker loop
 *
 * 1. Scan the scheduled set under the lock
 * 2. A due timer leaves the set, becomes "current", and its hook runs with
 *    the lock released; afterwards completion waiters are broadcast and the
 *    scan restarts, since the set may have changed meanwhile
 * 3. Pending timers contribute their due-time to the next sleep deadline
 * 4. Sleep on the wake semaphore until that deadline or a nudge from
 *    `schedule`; deleting the semaphore ends the loop
 */

use super::clock::{self, Bigtime, INFINITE_TIMEOUT, UNSCHEDULED};
use super::config::TimerServiceConfig;
use super::diagnostics::{TimerDump, TimerSnapshot};
use super::net_timer::NetTimer;
use crate::core::errors::StackError;
use crate::core::sync::{Deadline, Semaphore, WaitError};
use crate::core::types::{StackResult, TimerId};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

struct TimerState {
    /// Scheduled timers; a timer is here iff its due-time is positive
    timers: Vec<Arc<NetTimer>>,
    /// Timer whose hook is running right now
    current: Option<TimerId>,
    /// Deadline the worker is sleeping towards
    sleep_deadline: Bigtime,
}

struct TimerShared {
    name: String,
    state: Mutex<TimerState>,
    wake: Semaphore,
    completion: Condvar,
    worker: OnceLock<ThreadId>,
}

/// Cloneable access to a running timer service
///
/// Handed to every hook, so callbacks can reschedule or cancel timers
/// (including their own) without deadlocking: hooks run with the service
/// lock released.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<TimerShared>,
}

impl TimerHandle {
    /// Schedule `timer` to fire `delay` from now, or cancel it with `None`
    ///
    /// Rescheduling a pending timer moves its due-time. Rescheduling a timer
    /// whose hook is running from another thread is unsupported: cancel and
    /// `wait_for_completion` first. On a stopped service this only logs.
    pub fn schedule(&self, timer: &Arc<NetTimer>, delay: Option<Duration>) {
        let mut state = self.shared.state.lock();

        trace!(timer = %timer.id(), label = timer.label(), ?delay, "set timer");

        let Some(delay) = delay else {
            if timer.is_active() {
                Self::remove(&mut state, timer);
            }
            return;
        };

        if self.shared.wake.is_deleted() {
            warn!(service = %self.shared.name, timer = %timer.id(), "timer scheduled on a stopped service");
            return;
        }

        if !timer.is_active() {
            state.timers.push(timer.clone());
        }

        let due = clock::system_time()
            .saturating_add(clock::micros(delay))
            .min(INFINITE_TIMEOUT - 1);
        timer.set_due(due);

        if state.sleep_deadline > due {
            // Only fails once the service is stopping
            let _ = self.shared.wake.release(1);
        }
    }

    fn remove(state: &mut TimerState, timer: &Arc<NetTimer>) {
        state.timers.retain(|t| !Arc::ptr_eq(t, timer));
        timer.set_due(UNSCHEDULED);
    }

    /// Remove `timer` from the scheduled set
    ///
    /// Returns whether it was scheduled. Does not wait for a hook that is
    /// already running.
    pub fn cancel(&self, timer: &Arc<NetTimer>) -> bool {
        let mut state = self.shared.state.lock();

        trace!(timer = %timer.id(), label = timer.label(), "cancel timer");

        if !timer.is_active() {
            return false;
        }
        Self::remove(&mut state, timer);
        true
    }

    /// Block until `timer` is neither scheduled nor running
    ///
    /// Fails with `InvalidOperation` on the worker thread, which would
    /// otherwise wait for itself.
    pub fn wait_for_completion(&self, timer: &Arc<NetTimer>) -> StackResult<()> {
        if self.is_worker_thread() {
            return Err(StackError::InvalidOperation(format!(
                "{} cannot be waited for from the timer thread",
                timer.id()
            )));
        }

        let mut state = self.shared.state.lock();
        while timer.is_active() || state.current == Some(timer.id()) {
            self.shared.completion.wait(&mut state);
        }
        Ok(())
    }

    /// Scheduled with a positive due-time
    pub fn is_active(&self, timer: &NetTimer) -> bool {
        timer.is_active()
    }

    /// Hook currently running on the worker
    pub fn is_running(&self, timer: &NetTimer) -> bool {
        self.shared.state.lock().current == Some(timer.id())
    }

    /// Whether the caller is this service's worker thread
    pub fn is_worker_thread(&self) -> bool {
        self.shared.worker.get() == Some(&thread::current().id())
    }

    /// Snapshot of every scheduled timer, for operator debugging
    pub fn dump_timers(&self) -> TimerDump {
        let state = self.shared.state.lock();
        let now = clock::system_time();
        TimerDump {
            timers: state
                .timers
                .iter()
                .map(|timer| TimerSnapshot::capture(timer, now))
                .collect(),
        }
    }

    fn run(&self) {
        let _ = self.shared.worker.set(thread::current().id());
        debug!(service = %self.shared.name, "timer worker started");

        loop {
            let deadline = self.scan();
            let wake = clock::to_instant(deadline).map_or(Deadline::Infinite, Deadline::At);

            match self.shared.wake.acquire(wake) {
                // A nudge from `schedule` or the deadline passing
                Ok(()) | Err(WaitError::Timeout { .. } | WaitError::Interrupted) => {}
                Err(WaitError::Deleted) => break,
            }
        }

        debug!(service = %self.shared.name, "timer worker exiting");
    }

    /// Fire every due timer, returning the next sleep deadline
    fn scan(&self) -> Bigtime {
        let mut state = self.shared.state.lock();
        let mut deadline = INFINITE_TIMEOUT;
        let mut index = 0;

        while index < state.timers.len() {
            let due = state.timers[index].due();
            if due >= clock::system_time() {
                deadline = deadline.min(due);
                index += 1;
                continue;
            }

            let timer = state.timers.remove(index);
            timer.set_due(UNSCHEDULED);
            state.current = Some(timer.id());

            MutexGuard::unlocked(&mut state, || self.fire(&timer));

            state.current = None;
            self.shared.completion.notify_all();

            // The set may have changed while unlocked
            index = 0;
            deadline = INFINITE_TIMEOUT;
        }

        state.sleep_deadline = deadline;
        deadline
    }

    fn fire(&self, timer: &Arc<NetTimer>) {
        let Some(hook) = timer.hook() else {
            return;
        };

        trace!(timer = %timer.id(), label = timer.label(), "firing timer");
        let result = panic::catch_unwind(AssertUnwindSafe(|| hook.call(self, timer)));
        if result.is_err() {
            error!(timer = %timer.id(), label = timer.label(), "timer hook panicked");
        }
    }
}

/// Process-wide deferred execution service
///
/// Created once at startup and passed by reference (or as a cloned
/// [`TimerHandle`]) to anything that schedules timers. Dropping the service
/// stops and joins the worker.
pub struct TimerService {
    handle: TimerHandle,
    worker: Option<JoinHandle<()>>,
}

impl TimerService {
    /// Start a service with the default configuration
    pub fn start() -> StackResult<Self> {
        Self::with_config(TimerServiceConfig::default())
    }

    /// Start the worker thread
    ///
    /// On failure nothing is leaked and the service must not be used.
    pub fn with_config(config: TimerServiceConfig) -> StackResult<Self> {
        let handle = TimerHandle {
            shared: Arc::new(TimerShared {
                wake: Semaphore::new(format!("{} wait", config.thread_name), 0),
                name: config.thread_name.clone(),
                state: Mutex::new(TimerState {
                    timers: Vec::new(),
                    current: None,
                    sleep_deadline: INFINITE_TIMEOUT,
                }),
                completion: Condvar::new(),
                worker: OnceLock::new(),
            }),
        };

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let worker_handle = handle.clone();
        let worker = builder
            .spawn(move || worker_handle.run())
            .map_err(|e| {
                handle.shared.wake.delete();
                StackError::ThreadSpawn(e.to_string())
            })?;

        info!(service = %config.thread_name, "timer service started");
        Ok(Self {
            handle,
            worker: Some(worker),
        })
    }

    /// Cloneable handle for subsystems that schedule timers
    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    /// Stop the worker, join it and unschedule every remaining timer
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let shared = &self.handle.shared;

        shared.wake.delete();
        if self.handle.is_worker_thread() {
            warn!(service = %shared.name, "timer service dropped from its own hook; not joining");
        } else if worker.join().is_err() {
            error!(service = %shared.name, "timer worker panicked");
        }

        let mut state = shared.state.lock();
        for timer in state.timers.drain(..) {
            timer.set_due(UNSCHEDULED);
        }
        drop(state);
        shared.completion.notify_all();

        info!(service = %shared.name, "timer service stopped");
    }
}

impl Deref for TimerService {
    type Target = TimerHandle;

    fn deref(&self) -> &TimerHandle {
        &self.handle
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.stop();
    }
}
