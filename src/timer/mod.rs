/*!
 * Timer Module
 * Deferred execution of protocol callbacks (retransmission, keep-alive, ...)
 */

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod net_timer;
pub mod service;

// Re-export public API
pub use config::TimerServiceConfig;
pub use diagnostics::{TimerDump, TimerSnapshot};
pub use net_timer::{NetTimer, TimerHook};
pub use service::{TimerHandle, TimerService};
