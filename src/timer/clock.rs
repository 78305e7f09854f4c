/*!
 * Timer Clock
 * Monotonic microsecond timestamps for due-times
 */

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Microseconds on the timer clock; values `<= 0` mean "not scheduled"
pub type Bigtime = i64;

/// Due-time of an idle timer
pub const UNSCHEDULED: Bigtime = 0;

/// Sleep deadline meaning "until woken"
pub const INFINITE_TIMEOUT: Bigtime = Bigtime::MAX;

static EPOCH: OnceLock<Instant> = OnceLock::new();

#[inline]
fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// Current time; always positive so a freshly scheduled due-time is too
#[inline]
pub fn system_time() -> Bigtime {
    micros(epoch().elapsed()).saturating_add(1)
}

/// Saturating conversion of a duration to microseconds
#[inline]
pub fn micros(duration: Duration) -> Bigtime {
    Bigtime::try_from(duration.as_micros()).unwrap_or(Bigtime::MAX)
}

/// `Instant` at which timestamp `time` is reached; `None` for infinite
pub fn to_instant(time: Bigtime) -> Option<Instant> {
    if time == INFINITE_TIMEOUT {
        return None;
    }
    let offset = u64::try_from(time.saturating_sub(1)).unwrap_or(0);
    epoch().checked_add(Duration::from_micros(offset))
}
