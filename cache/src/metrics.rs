use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Internal counters for a single cache instance.
///
/// Lives inside the store and is only touched while the store lock is held,
/// so plain integers are enough.
#[derive(Debug, Default, Clone)]
pub(crate) struct Metrics {
  pub(crate) hits: u64,
  pub(crate) misses: u64,
  pub(crate) inserts: u64,
  pub(crate) updates: u64,
  pub(crate) invalidations: u64,
  pub(crate) evicted_by_capacity: u64,
  pub(crate) evicted_by_ttl: u64,
}

impl Metrics {
  pub(crate) fn reset(&mut self) {
    *self = Metrics::default();
  }

  /// Hit rate in percent, rounded to two decimals. 0 when nothing was looked up.
  pub(crate) fn hit_rate(&self) -> f64 {
    let total_lookups = self.hits + self.misses;
    if total_lookups == 0 {
      return 0.0;
    }
    let percent = self.hits as f64 / total_lookups as f64 * 100.0;
    (percent * 100.0).round() / 100.0
  }
}

/// A point-in-time, public-facing snapshot of the cache's statistics.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
  /// Entries currently held, including expired ones not yet purged.
  pub total_entries: usize,
  /// The number of successful lookups.
  pub hit_count: u64,
  /// The number of failed lookups, including lookups of expired entries.
  pub miss_count: u64,
  /// `hits / (hits + misses)` in percent, rounded to two decimals.
  pub hit_rate: f64,
  /// Sum of the estimated serialized sizes. Always 0 unless memory tracking is on.
  pub estimated_memory_bytes: u64,
  pub oldest_entry_timestamp: Option<DateTime<Utc>>,
  pub newest_entry_timestamp: Option<DateTime<Utc>>,
  /// Inserts of new keys.
  pub inserts: u64,
  /// Replacements of existing keys.
  pub updates: u64,
  /// Explicit deletes.
  pub invalidations: u64,
  pub evicted_by_capacity: u64,
  pub evicted_by_ttl: u64,
}

impl fmt::Debug for CacheStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheStats")
      .field("total_entries", &self.total_entries)
      .field("hit_count", &self.hit_count)
      .field("miss_count", &self.miss_count)
      .field("hit_rate", &format!("{:.2}%", self.hit_rate))
      .field("estimated_memory_bytes", &self.estimated_memory_bytes)
      .field("oldest_entry_timestamp", &self.oldest_entry_timestamp)
      .field("newest_entry_timestamp", &self.newest_entry_timestamp)
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("invalidations", &self.invalidations)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("evicted_by_ttl", &self.evicted_by_ttl)
      .finish()
  }
}
