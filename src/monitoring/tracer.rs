/*!
 * Structured Tracing
 * Subscriber setup and spans for blocking calls
 *
 * Environment variables:
 * - RUST_LOG: Set log level (default: info)
 * - NETSTACK_TRACE_JSON: Enable JSON output (default: false)
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Blocking calls slower than this are reported at warn level
const SLOW_CALL_THRESHOLD: Duration = Duration::from_millis(10);

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

fn use_json() -> bool {
    std::env::var("NETSTACK_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}

/// Install the global subscriber, returning false if one already exists
pub fn try_init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    }
}

/// Initialize structured tracing
pub fn init_tracing() {
    if try_init_tracing() {
        debug!(json = use_json(), "structured tracing initialized");
    }
}

/// Span around one blocking call, including its restarts
pub struct CallSpan {
    span: tracing::Span,
    start: Instant,
    call: &'static str,
    call_id: u64,
}

impl CallSpan {
    pub fn new(call: &'static str) -> Self {
        let call_id = NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::DEBUG,
            "blocking_call",
            call_id,
            call,
            restarts = tracing::field::Empty,
            result = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            call,
            call_id,
        }
    }

    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    pub fn record_restarts(&self, restarts: usize) {
        self.span.record("restarts", restarts);
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for CallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration > SLOW_CALL_THRESHOLD {
            warn!(
                call_id = self.call_id,
                call = self.call,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow blocking call"
            );
        } else {
            debug!(
                call_id = self.call_id,
                call = self.call,
                duration_us = duration.as_micros() as u64,
                "blocking call completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_span_ids_are_unique() {
        let a = CallSpan::new("a");
        let b = CallSpan::new("b");
        assert_ne!(a.call_id(), b.call_id());
        a.record_restarts(2);
        b.record_result(true);
    }
}
