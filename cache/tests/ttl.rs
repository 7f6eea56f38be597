use bidcheck_cache::CacheBuilder;
use std::{thread, time::Duration};

const TINY_TTL: Duration = Duration::from_millis(50);
const SLEEP_MARGIN: Duration = Duration::from_millis(50);

#[test]
fn test_item_expires_after_ttl() {
  let cache = CacheBuilder::<&str, &str>::new()
    .time_to_live(Duration::from_secs(60))
    .without_sweep()
    .build()
    .unwrap();

  cache.set_with_ttl("key", "value", TINY_TTL);
  assert!(cache.get(&"key").is_some());
  thread::sleep(TINY_TTL + SLEEP_MARGIN);
  assert!(cache.get(&"key").is_none(), "Item should have expired");

  let stats = cache.stats();
  assert_eq!(stats.hit_count, 1);
  assert_eq!(stats.miss_count, 1);
  assert_eq!(stats.evicted_by_ttl, 1);
  assert_eq!(stats.total_entries, 0, "Expired entry is purged on read");
}

#[test]
fn test_ttl_is_not_reset_on_access() {
  let cache = CacheBuilder::<&str, &str>::new()
    .time_to_live(TINY_TTL * 2)
    .without_sweep()
    .build()
    .unwrap();

  cache.set("key", "value");
  thread::sleep(TINY_TTL);
  assert!(cache.get(&"key").is_some());
  thread::sleep(TINY_TTL + SLEEP_MARGIN);
  assert!(
    cache.get(&"key").is_none(),
    "Item should have expired despite access"
  );
}

#[test]
fn test_expired_entries_are_hidden_from_has_and_keys() {
  let cache = CacheBuilder::<&str, i32>::new()
    .without_sweep()
    .build()
    .unwrap();

  cache.set_with_ttl("short", 1, TINY_TTL);
  cache.set("long", 2);
  thread::sleep(TINY_TTL + SLEEP_MARGIN);

  assert!(!cache.has(&"short"));
  assert!(cache.has(&"long"));
  assert_eq!(cache.keys(), vec!["long"]);

  let expired: Vec<_> = cache
    .entries()
    .into_iter()
    .filter(|(_, info)| info.expired)
    .map(|(key, _)| key)
    .collect();
  assert_eq!(expired, vec!["short"]);
}

#[test]
fn test_manual_cleanup_purges_expired_entries() {
  let cache = CacheBuilder::<i32, i32>::new()
    .without_sweep()
    .build()
    .unwrap();

  for i in 0..5 {
    cache.set_with_ttl(i, i, TINY_TTL);
  }
  cache.set(100, 100);
  thread::sleep(TINY_TTL + SLEEP_MARGIN);

  assert_eq!(cache.len(), 6, "Nothing is purged without a read or sweep");
  assert_eq!(cache.cleanup(), 5);
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.stats().evicted_by_ttl, 5);
}
