/*!
 * Buffer Fifo
 * Byte-capacity-bounded queue handing buffers between producer and consumer
 * threads
 *
 * # Wake-up policy
 *
 * - Enqueue wakes at most one blocked reader, and only if one is counted as
 *   waiting; the waiting counter is decremented by that same enqueue
 * - A peek leaves the buffer queued, so it passes the wake on to one more
 *   reader; a plain dequeue claimed the only copy and does not
 */

use super::config::FifoConfig;
use super::types::{DequeueFlags, FifoStats, Rejected};
use crate::core::errors::StackError;
use crate::core::sync::{Deadline, Semaphore, WaitError};
use crate::core::types::StackResult;
use crate::net::buffer::NetBuffer;
use crate::net::notify::{notify_socket, SocketEvent, SocketNotifier};
use crate::syscalls::restart;
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

struct FifoState<B> {
    buffers: VecDeque<B>,
    current_bytes: usize,
    /// Readers counted as blocked; only an enqueue (or a peek) decrements it
    waiting: usize,
}

/// Bounded queue of owned buffers with blocking, non-blocking and peek
/// dequeue
///
/// # Invariants
///
/// - `current_bytes` equals the summed size of the queued buffers
/// - `current_bytes <= max_bytes` whenever `max_bytes > 0`
/// - Non-peek dequeues return buffers in enqueue order
pub struct BufferFifo<B: NetBuffer> {
    name: String,
    max_bytes: usize,
    state: Mutex<FifoState<B>>,
    notify: Semaphore,
}

impl<B: NetBuffer> BufferFifo<B> {
    /// Create an empty queue; `max_bytes` of 0 means unbounded
    pub fn new(name: impl Into<String>, max_bytes: usize) -> Self {
        let name = name.into();
        debug!(fifo = %name, max_bytes, "fifo initialized");
        Self {
            notify: Semaphore::new(name.clone(), 0),
            name,
            max_bytes,
            state: Mutex::new(FifoState {
                buffers: VecDeque::new(),
                current_bytes: 0,
                waiting: 0,
            }),
        }
    }

    pub fn from_config(config: FifoConfig) -> Self {
        Self::new(config.name, config.max_bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[inline]
    fn notify_one_reader(&self, state: &mut FifoState<B>) {
        if state.waiting > 0 {
            state.waiting -= 1;
            // Only fails once the queue is being torn down
            let _ = self.notify.release(1);
        }
    }

    fn base_enqueue(&self, state: &mut FifoState<B>, buffer: B) -> Result<(), Rejected<B>> {
        let size = buffer.size();
        if self.max_bytes > 0 && state.current_bytes + size > self.max_bytes {
            trace!(
                fifo = %self.name,
                size,
                current_bytes = state.current_bytes,
                max_bytes = self.max_bytes,
                "enqueue rejected"
            );
            return Err(Rejected {
                error: StackError::NoBufferSpace {
                    requested: size,
                    available: self.max_bytes - state.current_bytes,
                },
                buffer,
            });
        }

        state.buffers.push_back(buffer);
        state.current_bytes += size;
        self.notify_one_reader(state);
        Ok(())
    }

    /// Append `buffer`, taking ownership
    ///
    /// On `NoBufferSpace` the queue is unchanged and the buffer is handed
    /// back inside the error.
    pub fn enqueue(&self, buffer: B) -> Result<(), Rejected<B>> {
        let mut state = self.state.lock();
        self.base_enqueue(&mut state, buffer)
    }

    /// Enqueue a copy of `buffer` and tell `target` how many bytes are queued
    ///
    /// The caller keeps its own buffer. A failing notifier is logged; the
    /// enqueue itself stands.
    pub fn enqueue_and_notify(
        &self,
        buffer: &B,
        target: &dyn SocketNotifier,
        event: SocketEvent,
    ) -> StackResult<()> {
        let copy = buffer
            .try_clone()
            .ok_or_else(|| StackError::NoMemory(format!("{}: buffer clone failed", self.name)))?;

        let mut state = self.state.lock();
        self.base_enqueue(&mut state, copy)?;

        if let Err(e) = notify_socket(target, event, state.current_bytes) {
            warn!(fifo = %self.name, ?event, error = %e, "socket notification failed");
        }
        Ok(())
    }

    /// Take the head buffer, or a copy of it under `PEEK`
    ///
    /// Blocks up to `timeout` (`None` = forever) unless `DONT_WAIT` is set or
    /// the timeout is zero, in which case an empty queue gives `WouldBlock`.
    /// Inside a restartable call an interrupted wait records the time left,
    /// and a restarted call waits only that long.
    pub fn dequeue(&self, flags: DequeueFlags, timeout: Option<Duration>) -> StackResult<B> {
        let unsupported = flags.unsupported_bits();
        if unsupported != 0 {
            return Err(StackError::NotSupported(unsupported));
        }

        let timeout = restart::resume_timeout(timeout);
        let peek = flags.contains(DequeueFlags::PEEK);
        let dont_wait = flags.contains(DequeueFlags::DONT_WAIT) || timeout == Some(Duration::ZERO);
        let start = Instant::now();
        let deadline = Deadline::from_timeout(timeout);

        let mut state = self.state.lock();
        loop {
            if let Some(head) = state.buffers.front() {
                if peek {
                    let copy = head.try_clone();
                    // The original stays available to another reader
                    self.notify_one_reader(&mut state);
                    return copy.ok_or_else(|| {
                        StackError::NoMemory(format!("{}: peek clone failed", self.name))
                    });
                }

                if let Some(buffer) = state.buffers.pop_front() {
                    state.current_bytes -= buffer.size();
                    return Ok(buffer);
                }
            }

            if dont_wait {
                return Err(StackError::WouldBlock);
            }

            state.waiting += 1;
            let waited = MutexGuard::unlocked(&mut state, || self.notify.acquire(deadline));
            if let Err(err) = waited {
                return Err(self.wait_failed(err, start, deadline));
            }
        }
    }

    fn wait_failed(&self, err: WaitError, start: Instant, deadline: Deadline) -> StackError {
        match err {
            WaitError::Timeout { .. } => {
                trace!(fifo = %self.name, "dequeue timed out");
                StackError::TimedOut {
                    elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                }
            }
            WaitError::Interrupted => {
                if restart::is_restartable_call() {
                    restart::store_remaining_timeout(deadline.remaining());
                }
                debug!(fifo = %self.name, "dequeue interrupted");
                StackError::Interrupted
            }
            WaitError::Deleted => StackError::Deleted,
        }
    }

    /// Abort every reader currently blocked in `dequeue`
    pub fn interrupt_readers(&self) -> usize {
        self.notify.interrupt()
    }

    /// Free every queued buffer; blocked readers keep waiting
    pub fn clear(&self) -> usize {
        let drained: Vec<B> = {
            let mut state = self.state.lock();
            state.current_bytes = 0;
            state.buffers.drain(..).collect()
        };
        drained.len()
    }

    /// Drain the queue and release its wake primitive
    pub fn uninit(self) {
        let freed = self.clear();
        debug!(fifo = %self.name, freed, "fifo uninitialized");
    }

    pub fn current_bytes(&self) -> usize {
        self.state.lock().current_bytes
    }

    pub fn len(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().buffers.is_empty()
    }

    pub fn stats(&self) -> FifoStats {
        let state = self.state.lock();
        FifoStats {
            name: self.name.clone(),
            max_bytes: self.max_bytes,
            current_bytes: state.current_bytes,
            buffers: state.buffers.len(),
            waiting: state.waiting,
        }
    }
}

impl<B: NetBuffer> Drop for BufferFifo<B> {
    fn drop(&mut self) {
        self.notify.delete();
    }
}

impl<B: NetBuffer> std::fmt::Debug for BufferFifo<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferFifo")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::buffer::ByteBuffer;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    fn buf(size: usize) -> ByteBuffer {
        ByteBuffer::filled(size as u8, size)
    }

    #[test]
    fn test_fifo_order() {
        let fifo = BufferFifo::new("order", 100);
        for size in [3, 5, 2] {
            fifo.enqueue(buf(size)).unwrap();
        }
        assert_eq!(fifo.current_bytes(), 10);

        for size in [3, 5, 2] {
            let got = fifo.dequeue(DequeueFlags::DONT_WAIT, None).unwrap();
            assert_eq!(got.size(), size);
        }
        assert_eq!(fifo.current_bytes(), 0);
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_capacity_rejects_and_returns_buffer() {
        let fifo = BufferFifo::new("small", 4);
        fifo.enqueue(buf(1)).unwrap();

        let rejected = fifo.enqueue(buf(5)).unwrap_err();
        assert_eq!(
            rejected.error,
            StackError::NoBufferSpace {
                requested: 5,
                available: 3
            }
        );
        assert_eq!(rejected.into_buffer().size(), 5);
        assert_eq!(fifo.current_bytes(), 1);
        assert_eq!(fifo.len(), 1);
    }

    #[test]
    fn test_unbounded_accepts_anything() {
        let fifo = BufferFifo::new("unbounded", 0);
        fifo.enqueue(buf(200)).unwrap();
        fifo.enqueue(buf(200)).unwrap();
        assert_eq!(fifo.current_bytes(), 400);
    }

    #[test]
    fn test_unsupported_flags() {
        let fifo: BufferFifo<ByteBuffer> = BufferFifo::new("flags", 0);
        let result = fifo.dequeue(DequeueFlags::from_bits(0x1), None);
        assert_eq!(result.unwrap_err(), StackError::NotSupported(0x1));
    }

    #[test]
    fn test_zero_timeout_would_block() {
        let fifo: BufferFifo<ByteBuffer> = BufferFifo::new("empty", 0);
        assert_eq!(
            fifo.dequeue(DequeueFlags::NONE, Some(Duration::ZERO)).unwrap_err(),
            StackError::WouldBlock
        );
        assert_eq!(
            fifo.dequeue(DequeueFlags::DONT_WAIT, None).unwrap_err(),
            StackError::WouldBlock
        );
        assert_eq!(fifo.stats().waiting, 0);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let fifo = BufferFifo::new("peek", 0);
        fifo.enqueue(ByteBuffer::from(b"hello".to_vec())).unwrap();

        let peeked = fifo.dequeue(DequeueFlags::PEEK, None).unwrap();
        assert_eq!(fifo.len(), 1);
        assert_eq!(fifo.current_bytes(), 5);

        let taken = fifo.dequeue(DequeueFlags::NONE, None).unwrap();
        assert_eq!(peeked.as_bytes(), taken.as_bytes());
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_clear_resets_total() {
        let fifo = BufferFifo::new("clear", 0);
        fifo.enqueue(buf(3)).unwrap();
        fifo.enqueue(buf(4)).unwrap();

        assert_eq!(fifo.clear(), 2);
        assert_eq!(fifo.current_bytes(), 0);
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_blocking_dequeue_times_out() {
        let fifo: BufferFifo<ByteBuffer> = BufferFifo::new("timeout", 0);
        let start = Instant::now();
        let err = fifo
            .dequeue(DequeueFlags::NONE, Some(Duration::from_millis(50)))
            .unwrap_err();

        assert!(matches!(err, StackError::TimedOut { .. }));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_interrupt_readers() {
        let fifo: Arc<BufferFifo<ByteBuffer>> = Arc::new(BufferFifo::new("interrupt", 0));
        let reader = {
            let fifo = fifo.clone();
            thread::spawn(move || fifo.dequeue(DequeueFlags::NONE, Some(Duration::from_secs(5))))
        };

        while fifo.stats().waiting == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        // The reader may not have parked yet; keep signalling until it has
        while fifo.interrupt_readers() == 0 {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(reader.join().unwrap().unwrap_err(), StackError::Interrupted);
    }
}
