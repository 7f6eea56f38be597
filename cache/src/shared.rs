use crate::builder::CacheConfig;
use crate::store::EntryStore;
use crate::task::janitor::Janitor;
use crate::time;

use std::fmt;
use std::hash::Hash;

use parking_lot::Mutex;

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<K, V> {
  pub(crate) name: String,
  pub(crate) config: CacheConfig,
  pub(crate) store: Mutex<EntryStore<K, V>>,
  pub(crate) janitor: Mutex<Option<Janitor>>,
  /// Present only when memory tracking is enabled.
  pub(crate) size_estimator: Option<fn(&V) -> u64>,
}

impl<K, V> fmt::Debug for CacheShared<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("name", &self.name)
      .field("config", &self.config)
      .field("sweeping", &self.janitor.lock().is_some())
      .finish_non_exhaustive()
  }
}

impl<K, V> Drop for CacheShared<K, V> {
  fn drop(&mut self) {
    if let Some(janitor) = self.janitor.get_mut().take() {
      janitor.stop();
    }
  }
}

impl<K, V> CacheShared<K, V>
where
  K: Eq + Hash + Clone,
{
  /// Purges expired entries. Called by the janitor and by `Cache::cleanup`.
  pub(crate) fn cleanup(&self) -> usize {
    let removed = self.store.lock().purge_expired(time::now_duration());
    if removed > 0 {
      tracing::debug!(cache = %self.name, removed, "purged expired cache entries");
    }
    removed
  }

  pub(crate) fn stop_janitor(&self) {
    // Take the janitor out before joining so the lock is not held meanwhile.
    let janitor = self.janitor.lock().take();
    if let Some(janitor) = janitor {
      janitor.stop();
    }
  }
}
