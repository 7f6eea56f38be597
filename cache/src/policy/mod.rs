pub mod fifo;
pub mod lru;
mod lru_list;

use std::fmt;

/// A trait for cache eviction policies.
///
/// The policy tracks key order and picks victims when an insert would push
/// the cache past `max_entries`. It is always called with the store lock
/// held, so implementations can use plain `&mut self` state.
pub trait CachePolicy<K>: Send + fmt::Debug {
  /// Called on every successful read.
  fn on_access(&mut self, key: &K);

  /// Called when a key is inserted or its entry replaced.
  fn on_admit(&mut self, key: &K);

  /// Called when a key leaves the cache for any reason other than `evict`.
  fn on_remove(&mut self, key: &K);

  /// Picks and forgets up to `count` victims, best candidates first.
  fn evict(&mut self, count: usize) -> Vec<K>;

  /// Clears all state from the policy.
  fn clear(&mut self);
}
