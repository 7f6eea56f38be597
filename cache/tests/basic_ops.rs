use bidcheck_cache::{Cache, CacheBuilder};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// Helper to create a cache without a sweep thread for deterministic tests.
fn new_test_cache(max_entries: usize) -> Cache<String, i32> {
  CacheBuilder::<String, i32>::new()
    .max_entries(max_entries)
    .without_sweep()
    .build()
    .unwrap()
}

#[test]
fn test_set_and_get() {
  let cache = new_test_cache(100);
  cache.set("key1".to_string(), 10);

  assert_eq!(cache.get(&"key1".to_string()), Some(Arc::new(10)));
  assert!(cache.get(&"missing".to_string()).is_none());

  let stats = cache.stats();
  assert_eq!(stats.inserts, 1);
  assert_eq!(stats.hit_count, 1);
  assert_eq!(stats.miss_count, 1);
  assert_eq!(stats.total_entries, 1);
}

#[test]
fn test_set_replaces_existing_value() {
  let cache = new_test_cache(100);
  cache.set("key".to_string(), 1);
  cache.set("key".to_string(), 2);

  assert_eq!(cache.get(&"key".to_string()), Some(Arc::new(2)));
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.stats().updates, 1);
}

#[test]
fn test_delete_and_clear() {
  let cache = new_test_cache(100);
  cache.set("key1".to_string(), 10);
  cache.set("key2".to_string(), 20);

  assert!(cache.delete(&"key1".to_string()));
  assert!(
    !cache.delete(&"key1".to_string()),
    "Double delete should report absence"
  );
  assert!(cache.get(&"key1".to_string()).is_none());
  assert_eq!(cache.stats().invalidations, 1);

  cache.get(&"key2".to_string());
  cache.clear();
  assert!(cache.is_empty());

  let stats = cache.stats();
  assert_eq!(stats.hit_count, 0, "clear resets the hit counter");
  assert_eq!(stats.miss_count, 0, "clear resets the miss counter");
}

#[test]
fn test_has_does_not_touch_statistics() {
  let cache = new_test_cache(100);
  cache.set("key".to_string(), 1);

  assert!(cache.has(&"key".to_string()));
  assert!(!cache.has(&"other".to_string()));

  let stats = cache.stats();
  assert_eq!(stats.hit_count, 0);
  assert_eq!(stats.miss_count, 0);
}

#[test]
fn test_keys_and_entries() {
  let cache = new_test_cache(100);
  cache.set("a".to_string(), 1);
  cache.set("b".to_string(), 2);
  cache.get(&"a".to_string());
  cache.get(&"a".to_string());

  let mut keys = cache.keys();
  keys.sort();
  assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

  let entries = cache.entries();
  let (_, info) = entries
    .iter()
    .find(|(key, _)| key == "a")
    .expect("entry a should be listed");
  assert_eq!(info.access_count, 2);
  assert_eq!(*info.value, 1);
  assert!(info.last_accessed_at >= info.created_at);
  assert!(!info.expired);
}

#[test]
fn test_hit_rate_is_rounded_percentage() {
  let cache = new_test_cache(100);
  cache.set("k".to_string(), 1);
  cache.get(&"k".to_string());
  cache.get(&"k".to_string());
  cache.get(&"nope".to_string());

  assert_eq!(cache.stats().hit_rate, 66.67);
}

#[test]
fn test_hit_rate_without_lookups_is_zero() {
  let cache = new_test_cache(100);
  cache.set("k".to_string(), 1);
  assert_eq!(cache.stats().hit_rate, 0.0);
}

#[test]
fn test_memory_tracking_sums_serialized_sizes() {
  let cache = CacheBuilder::<String, String>::new()
    .track_memory(true)
    .without_sweep()
    .build()
    .unwrap();
  cache.set("a".to_string(), "abc".to_string()); // "\"abc\"" is 5 bytes
  cache.set("b".to_string(), "de".to_string()); // 4 bytes

  assert_eq!(cache.stats().estimated_memory_bytes, 9);
}

#[test]
fn test_memory_is_not_estimated_unless_enabled() {
  let cache = new_test_cache(10);
  cache.set("a".to_string(), 12345);
  assert_eq!(cache.stats().estimated_memory_bytes, 0);
}

#[test]
fn test_entry_timestamps_are_reported() {
  let cache = new_test_cache(10);
  assert_eq!(cache.stats().oldest_entry_timestamp, None);

  cache.set("first".to_string(), 1);
  std::thread::sleep(std::time::Duration::from_millis(5));
  cache.set("second".to_string(), 2);

  let stats = cache.stats();
  let oldest = stats.oldest_entry_timestamp.unwrap();
  let newest = stats.newest_entry_timestamp.unwrap();
  assert!(oldest < newest);
}

#[test]
fn test_get_or_try_insert_with_only_computes_once() {
  let cache = new_test_cache(10);
  let mut calls = 0;

  let first: Result<Arc<i32>, ()> = cache.get_or_try_insert_with("k".to_string(), || {
    calls += 1;
    Ok(7)
  });
  assert_eq!(first, Ok(Arc::new(7)));

  let second: Result<Arc<i32>, ()> = cache.get_or_try_insert_with("k".to_string(), || {
    calls += 1;
    Ok(8)
  });
  assert_eq!(second, Ok(Arc::new(7)));
  assert_eq!(calls, 1);
}

#[test]
fn test_get_or_try_insert_with_propagates_errors() {
  let cache = new_test_cache(10);
  let result = cache.get_or_try_insert_with("k".to_string(), || Err("boom"));
  assert_eq!(result, Err("boom"));
  assert!(!cache.has(&"k".to_string()));
}

#[test]
fn test_clones_share_state() {
  let cache = new_test_cache(10);
  let other = cache.clone();
  cache.set("k".to_string(), 1);
  assert_eq!(other.get(&"k".to_string()), Some(Arc::new(1)));
}

#[test]
fn test_concurrent_access_from_threads() {
  let cache = new_test_cache(1_000);
  let handles: Vec<_> = (0..4)
    .map(|t| {
      let cache = cache.clone();
      std::thread::spawn(move || {
        for i in 0..100 {
          let key = format!("{}-{}", t, i);
          cache.set(key.clone(), i);
          assert_eq!(cache.get(&key), Some(Arc::new(i)));
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }
  assert_eq!(cache.len(), 400);
  assert_eq!(cache.stats().hit_count, 400);
}
