use super::lru_list::LruList;
use super::CachePolicy;

use std::hash::Hash;

/// An eviction policy that evicts the least recently used entries.
#[derive(Debug)]
pub struct Lru<K: Eq + Hash + Clone> {
  list: LruList<K>,
}

impl<K: Eq + Hash + Clone> Lru<K> {
  pub fn new() -> Self {
    Self {
      list: LruList::new(),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Lru<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> CachePolicy<K> for Lru<K>
where
  K: Eq + Hash + Clone + Send + std::fmt::Debug,
{
  /// A read makes the key the most recently used.
  fn on_access(&mut self, key: &K) {
    self.list.move_to_front(key);
  }

  /// A write also counts as a use.
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
  fn access_protects_key_from_eviction() {
    let mut policy = Lru::new();
    policy.on_admit(&1);
    policy.on_admit(&2);
    policy.on_admit(&3);

    policy.on_access(&1);

    assert_eq!(policy.evict(1), vec![2]);
    assert_eq!(policy.list.keys_as_vec(), vec![1, 3]);
  }

  #[test]
  fn readmit_refreshes_position() {
    let mut policy = Lru::new();
    policy.on_admit(&1);
    policy.on_admit(&2);
    policy.on_admit(&1);
    assert_eq!(policy.evict(1), vec![2]);
  }

  #[test]
  fn evict_stops_when_empty() {
    let mut policy = Lru::new();
    policy.on_admit(&"a");
    assert_eq!(policy.evict(5), vec!["a"]);
    assert!(policy.evict(1).is_empty());
  }

  #[test]
  fn remove_and_clear_forget_keys() {
    let mut policy = Lru::new();
    policy.on_admit(&1);
    policy.on_admit(&2);
    policy.on_remove(&1);
    assert_eq!(policy.list.keys_as_vec(), vec![2]);
    policy.clear();
    assert!(policy.evict(1).is_empty());
  }
}
