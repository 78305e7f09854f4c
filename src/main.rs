/*!
 * Network Stack Core - Demo Entry Point
 *
 * Runs a producer/consumer pair over a bounded fifo with a keep-alive timer,
 * then prints the timer table.
 */

use netstack_core::{
    checksum, init_tracing, BufferFifo, ByteBuffer, DequeueFlags, FifoConfig, NetTimer,
    SocketEvent, SocketNotifier, StackError, StackResult, TimerService, TimerServiceConfig,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

struct LoggingSocket;

impl SocketNotifier for LoggingSocket {
    fn notify(&self, event: SocketEvent, value: usize) -> StackResult<()> {
        info!(?event, queued_bytes = value, "socket event");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let timers = TimerService::with_config(TimerServiceConfig::from_env())?;
    let fifo: Arc<BufferFifo<ByteBuffer>> =
        Arc::new(BufferFifo::from_config(FifoConfig::socket_receive("demo receive")));

    let keepalives = Arc::new(AtomicUsize::new(0));
    let stopping = Arc::new(AtomicBool::new(false));
    let keepalive = {
        let keepalives = keepalives.clone();
        let stopping = stopping.clone();
        NetTimer::new("keepalive", move |handle, timer| {
            keepalives.fetch_add(1, Ordering::Relaxed);
            if !stopping.load(Ordering::Acquire) {
                handle.schedule(timer, Some(Duration::from_millis(50)));
            }
        })
    };
    timers.schedule(&keepalive, Some(Duration::ZERO));

    let reader = {
        let fifo = fifo.clone();
        thread::spawn(move || {
            let mut received = 0usize;
            loop {
                match fifo.dequeue(DequeueFlags::NONE, Some(Duration::from_millis(500))) {
                    Ok(buffer) => {
                        info!(
                            size = buffer.len(),
                            checksum = checksum(buffer.as_bytes()),
                            "received"
                        );
                        received += buffer.len();
                    }
                    Err(StackError::TimedOut { .. }) => break,
                    Err(e) => {
                        warn!(error = %e, "dequeue failed");
                        break;
                    }
                }
            }
            received
        })
    };

    let socket = LoggingSocket;
    for i in 0..8u8 {
        let payload = ByteBuffer::filled(i, 128 * usize::from(i + 1));
        fifo.enqueue_and_notify(&payload, &socket, SocketEvent::Receive)?;
        thread::sleep(Duration::from_millis(25));
    }

    let received = reader.join().map_err(|_| anyhow::anyhow!("reader panicked"))?;
    info!(received, keepalives = keepalives.load(Ordering::Relaxed), "demo finished");

    println!("{}", timers.dump_timers());
    println!("{}", serde_json::to_string_pretty(&fifo.stats())?);

    // A hook that is mid-flight may reschedule once more; it sees the flag
    // on that final run
    stopping.store(true, Ordering::Release);
    timers.cancel(&keepalive);
    timers.wait_for_completion(&keepalive)?;
    timers.shutdown();
    Ok(())
}
