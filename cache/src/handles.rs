use crate::builder::CacheConfig;
use crate::entry::{CacheEntry, EntryInfo};
use crate::metrics::CacheStats;
use crate::shared::CacheShared;
use crate::time;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe cache handle. Cloning the handle shares the same cache.
///
/// Every operation completes under a single acquisition of the cache's lock,
/// so a `get` followed by a `set` from one caller is never torn by a
/// concurrent sweep.
#[derive(Debug)]
pub struct Cache<K, V> {
  pub(crate) shared: Arc<CacheShared<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, V> Cache<K, V>
where
  K: Eq + Hash + Clone,
{
  /// Retrieves a value from the cache.
  ///
  /// Returns a clone of the `Arc` containing the value if the key is found
  /// and the entry is not expired. An expired entry is purged and the lookup
  /// counts as a miss.
  pub fn get(&self, key: &K) -> Option<Arc<V>> {
    self.shared.store.lock().get(key, time::now_duration())
  }

  /// Inserts a value with the cache's default TTL.
  pub fn set(&self, key: K, value: V) {
    self.set_with_ttl(key, value, self.shared.config.default_ttl);
  }

  /// Inserts a value with an explicit TTL, replacing any existing entry.
  ///
  /// If the key is new and the cache is full, a tenth of the capacity (at
  /// least one entry) is evicted first.
  pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
    let size = self.shared.size_estimator.map_or(0, |estimate| estimate(&value));
    let entry = CacheEntry::new(value, ttl, size, time::now_duration());
    let evicted = self.shared.store.lock().insert(key, entry);
    if evicted > 0 {
      tracing::trace!(cache = %self.shared.name, evicted, "evicted entries to make room");
    }
  }

  /// Returns the cached value or inserts the one produced by `init`.
  ///
  /// `init` runs without the lock held, so two racing callers may both
  /// compute; the later insert wins.
  pub fn get_or_try_insert_with<E, F>(&self, key: K, init: F) -> Result<Arc<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    if let Some(value) = self.get(&key) {
      return Ok(value);
    }
    let value = Arc::new(init()?);
    let size = self.shared.size_estimator.map_or(0, |estimate| estimate(&*value));
    let entry = CacheEntry::from_arc(
      value.clone(),
      self.shared.config.default_ttl,
      size,
      time::now_duration(),
    );
    self.shared.store.lock().insert(key, entry);
    Ok(value)
  }

  /// Checks whether a live entry exists, without touching statistics or
  /// eviction order.
  pub fn has(&self, key: &K) -> bool {
    self.shared.store.lock().contains_live(key, time::now_duration())
  }

  /// Removes an entry. Returns `true` if one was present.
  pub fn delete(&self, key: &K) -> bool {
    self.shared.store.lock().remove(key)
  }

  /// Removes all entries and resets the hit/miss counters.
  pub fn clear(&self) {
    self.shared.store.lock().clear();
  }

  /// Keys of all live entries, in no particular order.
  pub fn keys(&self) -> Vec<K> {
    self.shared.store.lock().live_keys(time::now_duration())
  }

  /// A debugging view of every stored entry, expired or not.
  pub fn entries(&self) -> Vec<(K, EntryInfo<V>)> {
    self.shared.store.lock().entry_infos(time::now_duration())
  }

  /// Purges all expired entries now and returns how many were removed.
  pub fn cleanup(&self) -> usize {
    self.shared.cleanup()
  }

  /// Stops the periodic sweep and clears the cache. The handle stays usable
  /// but is no longer swept in the background.
  pub fn destroy(&self) {
    self.shared.stop_janitor();
    self.clear();
    tracing::debug!(cache = %self.shared.name, "cache destroyed");
  }

  pub fn stats(&self) -> CacheStats {
    self.shared.store.lock().stats()
  }

  /// Number of stored entries, including expired ones not yet purged.
  pub fn len(&self) -> usize {
    self.shared.store.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn config(&self) -> &CacheConfig {
    &self.shared.config
  }

  pub fn name(&self) -> &str {
    &self.shared.name
  }

  /// Whether the background sweep thread is running.
  pub fn is_sweeping(&self) -> bool {
    self.shared.janitor.lock().is_some()
  }
}
