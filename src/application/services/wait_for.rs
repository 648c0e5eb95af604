//! Bounded polling for a condition to hold.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Default delay between probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default time before giving up.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Calls `probe` every `interval` until it returns `Some` or `timeout` elapses.
///
/// The first probe runs immediately. Returns `None` on timeout.
pub async fn wait_for<T, F>(mut probe: F, interval: Duration, timeout: Duration) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Some(value) = probe() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            debug!(timeout_ms = timeout.as_millis(), "Gave up waiting");
            return None;
        }
    }
}
