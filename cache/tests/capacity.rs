use bidcheck_cache::{CacheBuilder, EvictionPolicy};
use pretty_assertions::assert_eq;

#[test]
fn test_size_never_exceeds_capacity() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(20)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..20 + 37 {
    cache.set(i, i);
    assert!(cache.len() <= 20, "Cache grew past capacity at insert {}", i);
  }
  assert!(cache.stats().evicted_by_capacity > 0);
}

#[test]
fn test_full_cache_evicts_a_tenth_of_capacity() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(10)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..10 {
    cache.set(i, i);
  }
  cache.set(10, 10);

  assert_eq!(cache.len(), 10);
  assert!(!cache.has(&0), "Oldest entry should have been evicted");
  assert!(cache.has(&10));
  assert_eq!(cache.stats().evicted_by_capacity, 1);
}

#[test]
fn test_replacing_a_key_does_not_evict() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(3)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..3 {
    cache.set(i, i);
  }
  cache.set(1, 100);

  assert_eq!(cache.len(), 3);
  assert_eq!(cache.stats().evicted_by_capacity, 0);
  for i in 0..3 {
    assert!(cache.has(&i), "key {} should survive an overwrite in a full cache", i);
  }
  assert_eq!(*cache.get(&1).unwrap(), 100);
  assert_eq!(cache.stats().updates, 1);

  // A new key in the same full cache does evict.
  cache.set(3, 3);
  assert_eq!(cache.len(), 3);
  assert_eq!(cache.stats().evicted_by_capacity, 1);
}

#[test]
fn test_lru_keeps_recently_read_entries() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(100)
    .eviction_policy(EvictionPolicy::Lru)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..100 {
    cache.set(i, i);
  }
  for i in 0..50 {
    assert!(cache.get(&i).is_some());
  }
  for i in 100..150 {
    cache.set(i, i);
  }

  for i in 0..25 {
    assert!(cache.has(&i), "Recently read key {} should survive", i);
  }
  assert!(cache.len() <= 100);
}

#[test]
fn test_fifo_ignores_reads() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(10)
    .eviction_policy(EvictionPolicy::Fifo)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..10 {
    cache.set(i, i);
  }
  // Reading the oldest entry does not protect it under FIFO.
  assert!(cache.get(&0).is_some());
  cache.set(10, 10);

  assert!(!cache.has(&0));
  assert!(cache.has(&1));
  assert!(cache.has(&10));
}

#[test]
fn test_lru_protects_read_entry_where_fifo_would_not() {
  let cache = CacheBuilder::<u32, u32>::new()
    .max_entries(10)
    .eviction_policy(EvictionPolicy::Lru)
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..10 {
    cache.set(i, i);
  }
  assert!(cache.get(&0).is_some());
  cache.set(10, 10);

  assert!(cache.has(&0));
  assert!(!cache.has(&1));
}
