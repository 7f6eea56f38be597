use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single reference point for all time calculations in the cache. The
// monotonic instant and the wall clock are captured together so entry
// timestamps can be reported as calendar time.
static CACHE_EPOCH: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// Converts an `Instant` into a `Duration` since the cache's epoch.
#[inline]
pub(crate) fn instant_to_duration(instant: Instant) -> Duration {
  instant.saturating_duration_since(CACHE_EPOCH.0)
}

/// A helper to get the current time as a `Duration` since the epoch.
#[inline]
pub(crate) fn now_duration() -> Duration {
  instant_to_duration(Instant::now())
}

/// Maps an epoch-relative `Duration` onto the wall clock.
pub(crate) fn to_wall_clock(since_epoch: Duration) -> DateTime<Utc> {
  let offset = chrono::Duration::from_std(since_epoch).unwrap_or_else(|_| chrono::Duration::zero());
  CACHE_EPOCH.1 + offset
}
