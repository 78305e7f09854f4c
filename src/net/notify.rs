/*!
 * Socket Notification
 * Event sink through which queues tell an owning socket that data arrived
 */

use crate::core::types::StackResult;
use serde::{Deserialize, Serialize};

/// Socket event codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketEvent {
    /// New data is readable
    Receive,
    /// Send space became available
    Send,
    /// An asynchronous error is pending
    Error,
    /// Protocol-specific event code
    Other(u8),
}

impl SocketEvent {
    pub fn code(&self) -> u8 {
        match self {
            SocketEvent::Receive => 1,
            SocketEvent::Send => 2,
            SocketEvent::Error => 3,
            SocketEvent::Other(code) => *code,
        }
    }
}

/// Receiver of socket events
pub trait SocketNotifier: Send + Sync {
    /// Deliver `event` with its payload (e.g. the bytes now queued)
    fn notify(&self, event: SocketEvent, value: usize) -> StackResult<()>;
}

/// Forward an event to `target`
#[inline]
pub fn notify_socket(target: &dyn SocketNotifier, event: SocketEvent, value: usize) -> StackResult<()> {
    target.notify(event, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Codes(Mutex<Vec<(u8, usize)>>);

    impl SocketNotifier for Codes {
        fn notify(&self, event: SocketEvent, value: usize) -> StackResult<()> {
            self.0.lock().push((event.code(), value));
            Ok(())
        }
    }

    #[test]
    fn test_event_codes_forwarded() {
        let sink = Codes::default();
        notify_socket(&sink, SocketEvent::Receive, 10).unwrap();
        notify_socket(&sink, SocketEvent::Send, 0).unwrap();
        notify_socket(&sink, SocketEvent::Error, 0).unwrap();
        notify_socket(&sink, SocketEvent::Other(42), 7).unwrap();

        assert_eq!(*sink.0.lock(), vec![(1, 10), (2, 0), (3, 0), (42, 7)]);
    }
}
