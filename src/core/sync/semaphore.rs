/*!
 * Counting Semaphore
 *
 * Countable wake primitive built on parking_lot::{Mutex, Condvar}.
 * Releases are never lost: a release that happens before the matching
 * acquire leaves a count behind for it to consume.
 */

use super::wait::{Deadline, WaitError, WaitResult};
use parking_lot::{Condvar, Mutex};
use std::time::Instant;
use tracing::trace;

struct SemaphoreState {
    count: usize,
    waiters: usize,
    /// Bumped by `interrupt`; a waiter that sees it change gives up
    interrupt_epoch: u64,
    deleted: bool,
}

/// Counting semaphore with timeouts, interruption and teardown
///
/// # Semantics
///
/// - `release(n)` adds `n` counts and wakes up to `n` waiters
/// - `acquire` consumes one count, blocking until one is available
/// - `interrupt` aborts every thread currently blocked in `acquire`
/// - `delete` aborts all current and future acquires with `Deleted`
pub struct Semaphore {
    name: String,
    state: Mutex<SemaphoreState>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial` counts
    pub fn new(name: impl Into<String>, initial: usize) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SemaphoreState {
                count: initial,
                waiters: 0,
                interrupt_epoch: 0,
                deleted: false,
            }),
            available: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume one count, blocking until `deadline`
    ///
    /// A count that is already available is taken even if an interrupt or
    /// the deadline raced with it.
    pub fn acquire(&self, deadline: Deadline) -> WaitResult<()> {
        let start = Instant::now();
        let mut state = self.state.lock();
        let epoch = state.interrupt_epoch;
        state.waiters += 1;

        let result = loop {
            if state.deleted {
                break Err(WaitError::Deleted);
            }
            if state.count > 0 {
                state.count -= 1;
                break Ok(());
            }
            if state.interrupt_epoch != epoch {
                break Err(WaitError::Interrupted);
            }

            match deadline {
                Deadline::Infinite => self.available.wait(&mut state),
                Deadline::At(at) => {
                    if Instant::now() >= at {
                        break Err(WaitError::Timeout {
                            elapsed: start.elapsed(),
                        });
                    }
                    // Timeout is re-evaluated at the top of the loop
                    let _ = self.available.wait_until(&mut state, at);
                }
            }
        };

        state.waiters -= 1;
        result
    }

    /// Consume one count without blocking
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.deleted || state.count == 0 {
            return false;
        }
        state.count -= 1;
        true
    }

    /// Add `n` counts, waking up to `n` waiters
    pub fn release(&self, n: usize) -> WaitResult<()> {
        let mut state = self.state.lock();
        if state.deleted {
            return Err(WaitError::Deleted);
        }
        state.count += n;
        let to_wake = n.min(state.waiters);
        drop(state);

        for _ in 0..to_wake {
            self.available.notify_one();
        }
        Ok(())
    }

    /// Abort every thread currently blocked in `acquire`
    ///
    /// Returns how many waiters were signalled.
    pub fn interrupt(&self) -> usize {
        let mut state = self.state.lock();
        state.interrupt_epoch = state.interrupt_epoch.wrapping_add(1);
        let waiters = state.waiters;
        drop(state);

        if waiters > 0 {
            trace!(semaphore = %self.name, waiters, "interrupting waiters");
            self.available.notify_all();
        }
        waiters
    }

    /// Tear the semaphore down; idempotent
    pub fn delete(&self) {
        let mut state = self.state.lock();
        if state.deleted {
            return;
        }
        state.deleted = true;
        drop(state);

        trace!(semaphore = %self.name, "semaphore deleted");
        self.available.notify_all();
    }

    pub fn is_deleted(&self) -> bool {
        self.state.lock().deleted
    }

    /// Current count (for diagnostics)
    pub fn count(&self) -> usize {
        self.state.lock().count
    }

    /// Approximate number of blocked acquirers (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Semaphore")
            .field("name", &self.name)
            .field("count", &state.count)
            .field("waiters", &state.waiters)
            .field("deleted", &state.deleted)
            .finish()
    }
}
