/*!
 * Syscalls Module
 * Restart bookkeeping for blocking calls
 */

pub mod restart;

// Re-export public API
pub use restart::{
    is_restartable_call, is_restarted_call, load_remaining_timeout, resume_timeout,
    run_restartable, store_remaining_timeout, RemainingTimeout, SyscallFrame,
};
