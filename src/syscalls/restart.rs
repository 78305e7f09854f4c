/*!
 * Syscall Restart Context
 *
 * Per-thread bookkeeping that lets a blocking call resume with the time it
 * had left when it was interrupted, instead of the full original timeout.
 *
 * A 5s wait interrupted after 2s stores 3s; the reissued call loads it back
 * and waits 3s.
 */

use crate::core::errors::StackError;
use crate::core::types::StackResult;
use crate::monitoring::CallSpan;
use std::cell::Cell;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, trace};

/// Timeout persisted across a restart; `None` inside means wait forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingTimeout(pub Option<Duration>);

#[derive(Debug, Clone, Copy, Default)]
struct RestartState {
    /// Inside a call the caller may interrupt and reissue
    restartable: bool,
    /// The current call is itself a reissue
    restarted: bool,
    /// Survives the end of the call frame so the reissue can read it
    stored: Option<RemainingTimeout>,
}

thread_local! {
    static RESTART_STATE: Cell<RestartState> = Cell::new(RestartState::default());
}

#[inline]
fn current() -> RestartState {
    RESTART_STATE.with(Cell::get)
}

#[inline]
fn update(f: impl FnOnce(&mut RestartState)) {
    RESTART_STATE.with(|cell| {
        let mut state = cell.get();
        f(&mut state);
        cell.set(state);
    });
}

/// Whether the current blocking entry point may be interrupted and reissued
pub fn is_restartable_call() -> bool {
    current().restartable
}

/// Whether the current invocation is a reissue of an interrupted call
pub fn is_restarted_call() -> bool {
    let state = current();
    state.restartable && state.restarted
}

/// Persist the timeout to use if the current call is reissued
///
/// Outside a restartable call this does nothing.
pub fn store_remaining_timeout(timeout: Option<Duration>) {
    update(|state| {
        if state.restartable {
            state.stored = Some(RemainingTimeout(timeout));
        }
    });
    trace!(?timeout, "stored restart timeout");
}

/// Timeout stored by the interrupted predecessor of this call, if any
pub fn load_remaining_timeout() -> Option<RemainingTimeout> {
    current().stored
}

/// Timeout a blocking call should actually use
///
/// A restarted call resumes with what its predecessor stored; anything else
/// uses the caller's `requested` timeout.
pub fn resume_timeout(requested: Option<Duration>) -> Option<Duration> {
    if is_restarted_call() {
        if let Some(RemainingTimeout(stored)) = load_remaining_timeout() {
            return stored;
        }
    }
    requested
}

/// RAII frame marking the current thread as inside a restartable call
///
/// Frames nest; dropping one restores the enclosing frame's flags. The frame
/// is tied to the thread that created it.
pub struct SyscallFrame {
    previous: RestartState,
    _not_send: PhantomData<*const ()>,
}

impl SyscallFrame {
    /// Begin a fresh restartable call; any stale stored timeout is discarded
    #[must_use]
    pub fn enter() -> Self {
        let previous = current();
        update(|state| {
            state.restartable = true;
            state.restarted = false;
            state.stored = None;
        });
        Self {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Begin the reissue of an interrupted call, keeping its stored timeout
    #[must_use]
    pub fn restart() -> Self {
        let previous = current();
        update(|state| {
            state.restartable = true;
            state.restarted = true;
        });
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for SyscallFrame {
    fn drop(&mut self) {
        let previous = self.previous;
        update(|state| {
            state.restartable = previous.restartable;
            state.restarted = previous.restarted;
            // The stored value outlives the frame for a possible `restart`;
            // the next `enter` clears it
        });
    }
}

/// Run `call` as a restartable call, reissuing it on interruption
///
/// Each reissue runs inside a restarted frame, so blocking primitives pick
/// up the remaining timeout. Gives up with `Interrupted` after
/// `max_restarts` reissues.
pub fn run_restartable<T, F>(name: &'static str, max_restarts: usize, mut call: F) -> StackResult<T>
where
    F: FnMut() -> StackResult<T>,
{
    let span = CallSpan::new(name);
    let _entered = span.enter();

    let mut result = {
        let _frame = SyscallFrame::enter();
        call()
    };

    let mut restarts = 0;
    while matches!(result, Err(StackError::Interrupted)) && restarts < max_restarts {
        restarts += 1;
        debug!(
            call = name,
            restarts,
            remaining = ?load_remaining_timeout(),
            "reissuing interrupted call"
        );
        let _frame = SyscallFrame::restart();
        result = call();
    }

    span.record_restarts(restarts);
    span.record_result(result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_call() {
        assert!(!is_restartable_call());
        assert!(!is_restarted_call());

        store_remaining_timeout(Some(Duration::from_secs(1)));
        assert_eq!(load_remaining_timeout(), None);
    }

    #[test]
    fn test_store_and_restart() {
        {
            let _frame = SyscallFrame::enter();
            assert!(is_restartable_call());
            assert!(!is_restarted_call());
            store_remaining_timeout(Some(Duration::from_secs(3)));
        }
        assert!(!is_restartable_call());

        let _frame = SyscallFrame::restart();
        assert!(is_restarted_call());
        assert_eq!(
            load_remaining_timeout(),
            Some(RemainingTimeout(Some(Duration::from_secs(3))))
        );
        assert_eq!(
            resume_timeout(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_fresh_call_clears_stored_timeout() {
        {
            let _frame = SyscallFrame::enter();
            store_remaining_timeout(None);
        }
        let _frame = SyscallFrame::enter();
        assert_eq!(load_remaining_timeout(), None);
        assert_eq!(
            resume_timeout(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_state_is_per_thread() {
        let _frame = SyscallFrame::enter();
        store_remaining_timeout(Some(Duration::from_millis(10)));

        let other = std::thread::spawn(|| (is_restartable_call(), load_remaining_timeout()))
            .join()
            .unwrap();
        assert_eq!(other, (false, None));
    }

    #[test]
    fn test_run_restartable_gives_up() {
        let mut calls = 0;
        let result: StackResult<()> = run_restartable("test", 2, || {
            calls += 1;
            Err(StackError::Interrupted)
        });
        assert_eq!(result, Err(StackError::Interrupted));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_run_restartable_sees_restarted_flag() {
        let mut seen = Vec::new();
        let result = run_restartable("test", 3, || {
            seen.push(is_restarted_call());
            if seen.len() < 2 {
                store_remaining_timeout(Some(Duration::from_millis(7)));
                Err(StackError::Interrupted)
            } else {
                Ok(resume_timeout(Some(Duration::from_secs(1))))
            }
        });
        assert_eq!(result, Ok(Some(Duration::from_millis(7))));
        assert_eq!(seen, vec![false, true]);
    }
}
