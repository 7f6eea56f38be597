use crate::time;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A container for a value in the cache, holding all necessary metadata.
///
/// All timestamps are durations since the cache epoch (see `time.rs`).
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Arc<V>,
  created_at: Duration,
  ttl: Duration,
  access_count: u64,
  last_accessed: Duration,
  /// Estimated serialized size in bytes. 0 when memory tracking is off.
  size: u64,
}

impl<V> CacheEntry<V> {
  pub(crate) fn new(value: V, ttl: Duration, size: u64, now: Duration) -> Self {
    Self::from_arc(Arc::new(value), ttl, size, now)
  }

  pub(crate) fn from_arc(value: Arc<V>, ttl: Duration, size: u64, now: Duration) -> Self {
    Self {
      value,
      created_at: now,
      ttl,
      access_count: 0,
      last_accessed: now,
      size,
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  #[inline]
  pub(crate) fn size(&self) -> u64 {
    self.size
  }

  #[inline]
  pub(crate) fn created_at(&self) -> Duration {
    self.created_at
  }

  /// An entry is expired once strictly more than its TTL has elapsed.
  #[inline]
  pub(crate) fn is_expired_at(&self, now: Duration) -> bool {
    now.saturating_sub(self.created_at) > self.ttl
  }

  /// Records a successful read.
  #[inline]
  pub(crate) fn record_access(&mut self, now: Duration) {
    self.access_count += 1;
    // Keeps last_accessed >= created_at even if `now` was sampled early.
    self.last_accessed = now.max(self.created_at);
  }

  pub(crate) fn info(&self, now: Duration) -> EntryInfo<V> {
    EntryInfo {
      value: self.value(),
      created_at: time::to_wall_clock(self.created_at),
      ttl: self.ttl,
      access_count: self.access_count,
      last_accessed_at: time::to_wall_clock(self.last_accessed),
      estimated_size: self.size,
      expired: self.is_expired_at(now),
    }
  }
}

/// A read-only view of a cache entry and its bookkeeping, for diagnostics.
#[derive(Debug, Clone)]
pub struct EntryInfo<V> {
  pub value: Arc<V>,
  pub created_at: DateTime<Utc>,
  pub ttl: Duration,
  pub access_count: u64,
  pub last_accessed_at: DateTime<Utc>,
  pub estimated_size: u64,
  /// Whether the entry had already expired when the view was taken.
  pub expired: bool,
}
