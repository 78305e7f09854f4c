/*!
 * Synchronization Primitives
 *
 * Wait/notify building blocks used by the buffer queues and the timer
 * service:
 * - Counting semaphore (countable wake primitive, never loses a release)
 * - Deadline arithmetic shared by every blocking call
 *
 * # Architecture
 *
 * Blocking callers follow one pattern: lock, check the predicate, release
 * the lock, block on a wake signal, then re-acquire and re-check. A wake is
 * a hint, never proof that the predicate now holds.
 */

mod semaphore;
mod wait;

pub use semaphore::Semaphore;
pub use wait::{Deadline, WaitError, WaitResult};
