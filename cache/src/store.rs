use crate::entry::{CacheEntry, EntryInfo};
use crate::metrics::{CacheStats, Metrics};
use crate::policy::CachePolicy;
use crate::time;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use ahash::{HashMap, HashMapExt};

/// Divisor of `max_entries` giving the eviction batch (10% of capacity).
const EVICTION_DIVISOR: usize = 10;

/// Number of entries to evict when an insert finds the cache full: a tenth of
/// the capacity, but always at least one.
pub(crate) fn eviction_batch_size(max_entries: usize) -> usize {
  (max_entries / EVICTION_DIVISOR).max(1)
}

/// The map, eviction policy and counters of one cache, always accessed under
/// the cache's lock.
#[derive(Debug)]
pub(crate) struct EntryStore<K, V> {
  map: HashMap<K, CacheEntry<V>>,
  policy: Box<dyn CachePolicy<K>>,
  metrics: Metrics,
  max_entries: usize,
}

impl<K, V> EntryStore<K, V>
where
  K: Eq + Hash + Clone,
{
  pub(crate) fn new(max_entries: usize, policy: Box<dyn CachePolicy<K>>) -> Self {
    Self {
      map: HashMap::with_capacity(max_entries.min(1024)),
      policy,
      metrics: Metrics::default(),
      max_entries,
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.map.len()
  }

  /// Looks up a live entry, recording a hit or a miss. An expired entry is
  /// purged and counted as a miss.
  pub(crate) fn get(&mut self, key: &K, now: Duration) -> Option<Arc<V>> {
    let expired = match self.map.get_mut(key) {
      Some(entry) if !entry.is_expired_at(now) => {
        entry.record_access(now);
        let value = entry.value();
        self.policy.on_access(key);
        self.metrics.hits += 1;
        return Some(value);
      }
      Some(_) => true,
      None => false,
    };

    if expired {
      self.purge(key);
    }
    self.metrics.misses += 1;
    None
  }

  /// Existence check that respects expiry but leaves statistics and recency alone.
  pub(crate) fn contains_live(&self, key: &K, now: Duration) -> bool {
    self
      .map
      .get(key)
      .map_or(false, |entry| !entry.is_expired_at(now))
  }

  /// Inserts or replaces an entry. Returns the number of entries evicted to
  /// make room.
  ///
  /// Only a new key can trigger eviction. Replacing an existing key keeps the
  /// size unchanged, so a full cache evicts nothing on overwrite.
  pub(crate) fn insert(&mut self, key: K, entry: CacheEntry<V>) -> usize {
    let mut evicted = 0;

    if self.map.contains_key(&key) {
      self.metrics.updates += 1;
    } else {
      if self.map.len() >= self.max_entries {
        evicted = self.evict(eviction_batch_size(self.max_entries));
      }
      self.metrics.inserts += 1;
    }

    self.map.insert(key.clone(), entry);
    self.policy.on_admit(&key);
    evicted
  }

  fn evict(&mut self, count: usize) -> usize {
    let victims = self.policy.evict(count);
    let mut removed = 0;
    for victim in victims {
      if self.map.remove(&victim).is_some() {
        removed += 1;
      }
    }
    self.metrics.evicted_by_capacity += removed as u64;
    removed
  }

  pub(crate) fn remove(&mut self, key: &K) -> bool {
    match self.map.remove(key) {
      Some(_) => {
        self.policy.on_remove(key);
        self.metrics.invalidations += 1;
        true
      }
      None => false,
    }
  }

  // Drops an expired entry.
  fn purge(&mut self, key: &K) {
    if self.map.remove(key).is_some() {
      self.policy.on_remove(key);
      self.metrics.evicted_by_ttl += 1;
    }
  }

  /// Removes every expired entry and returns how many were dropped.
  pub(crate) fn purge_expired(&mut self, now: Duration) -> usize {
    let expired: Vec<K> = self
      .map
      .iter()
      .filter(|(_, entry)| entry.is_expired_at(now))
      .map(|(key, _)| key.clone())
      .collect();

    for key in &expired {
      self.purge(key);
    }
    expired.len()
  }

  /// Drops all entries and resets the counters.
  pub(crate) fn clear(&mut self) {
    self.map.clear();
    self.policy.clear();
    self.metrics.reset();
  }

  pub(crate) fn live_keys(&self, now: Duration) -> Vec<K> {
    self
      .map
      .iter()
      .filter(|(_, entry)| !entry.is_expired_at(now))
      .map(|(key, _)| key.clone())
      .collect()
  }

  pub(crate) fn entry_infos(&self, now: Duration) -> Vec<(K, EntryInfo<V>)> {
    self
      .map
      .iter()
      .map(|(key, entry)| (key.clone(), entry.info(now)))
      .collect()
  }

  pub(crate) fn stats(&self) -> CacheStats {
    let oldest = self.map.values().map(CacheEntry::created_at).min();
    let newest = self.map.values().map(CacheEntry::created_at).max();

    CacheStats {
      total_entries: self.map.len(),
      hit_count: self.metrics.hits,
      miss_count: self.metrics.misses,
      hit_rate: self.metrics.hit_rate(),
      estimated_memory_bytes: self.map.values().map(CacheEntry::size).sum(),
      oldest_entry_timestamp: oldest.map(time::to_wall_clock),
      newest_entry_timestamp: newest.map(time::to_wall_clock),
      inserts: self.metrics.inserts,
      updates: self.metrics.updates,
      invalidations: self.metrics.invalidations,
      evicted_by_capacity: self.metrics.evicted_by_capacity,
      evicted_by_ttl: self.metrics.evicted_by_ttl,
    }
  }
}
