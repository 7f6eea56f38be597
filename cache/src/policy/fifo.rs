use super::lru_list::LruList;
use super::CachePolicy;

use std::hash::Hash;

/// An eviction policy that evicts entries in creation order, ignoring reads.
#[derive(Debug)]
pub struct Fifo<K: Eq + Hash + Clone> {
  list: LruList<K>,
}

impl<K: Eq + Hash + Clone> Fifo<K> {
  pub fn new() -> Self {
    Self {
      list: LruList::new(),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Fifo<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> CachePolicy<K> for Fifo<K>
where
  K: Eq + Hash + Clone + Send + std::fmt::Debug,
{
  /// A FIFO policy does not care about access patterns.
  fn on_access(&mut self, _key: &K) {}

  /// A replaced entry gets a fresh creation time, so it moves to the front
  /// like a new one.
  fn on_admit(&mut self, key: &K) {
    self.list.push_front(key.clone());
  }

  fn on_remove(&mut self, key: &K) {
    self.list.remove(key);
  }

  fn evict(&mut self, count: usize) -> Vec<K> {
    let mut victims = Vec::with_capacity(count.min(self.list.len()));
    while victims.len() < count {
      match self.list.pop_back() {
        Some(key) => victims.push(key),
        None => break,
      }
    }
    victims
  }

  fn clear(&mut self) {
    self.list.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn access_is_a_noop() {
    let mut policy = Fifo::new();
    policy.on_admit(&1);
    policy.on_admit(&2);

    let keys_before = policy.list.keys_as_vec();
    policy.on_access(&1);
    assert_eq!(keys_before, policy.list.keys_as_vec());
  }

  #[test]
  fn evict_removes_oldest_items() {
    let mut policy = Fifo::new();
    policy.on_admit(&1);
    policy.on_admit(&2);
    policy.on_admit(&3);
    policy.on_access(&1);

    assert_eq!(policy.evict(2), vec![1, 2]);
    assert_eq!(policy.list.keys_as_vec(), vec![3]);
  }

  #[test]
  fn on_remove_cleans_up_state() {
    let mut policy = Fifo::new();
    policy.on_admit(&1);
    policy.on_admit(&2);
    policy.on_remove(&1);
    assert!(!policy.list.contains(&1));
    assert_eq!(policy.evict(5), vec![2]);
  }
}
