use bidcheck_cache::CacheBuilder;
use std::{thread, time::Duration};

const TINY_TTL: Duration = Duration::from_millis(40);
const SWEEP_TICK: Duration = Duration::from_millis(20);

#[test]
fn test_janitor_sweeps_expired_entries() {
  let cache = CacheBuilder::<i32, i32>::new()
    .name("sweep-test")
    .time_to_live(TINY_TTL)
    .sweep_interval(SWEEP_TICK)
    .build()
    .unwrap();
  assert!(cache.is_sweeping());

  for i in 0..10 {
    cache.set(i, i);
  }
  thread::sleep(TINY_TTL + SWEEP_TICK * 5);

  assert_eq!(cache.len(), 0, "Janitor should have purged every entry");
  assert_eq!(cache.stats().evicted_by_ttl, 10);
  assert_eq!(cache.stats().miss_count, 0, "Sweeps are not lookups");
}

#[test]
fn test_destroy_stops_sweeping_and_clears() {
  let cache = CacheBuilder::<i32, i32>::new()
    .time_to_live(TINY_TTL)
    .sweep_interval(SWEEP_TICK)
    .build()
    .unwrap();

  cache.set(1, 1);
  cache.destroy();
  assert!(!cache.is_sweeping());
  assert!(cache.is_empty());

  // Still usable, but nothing sweeps in the background any more.
  cache.set(2, 2);
  thread::sleep(TINY_TTL + SWEEP_TICK * 5);
  assert_eq!(cache.len(), 1);

  // Destroying twice is harmless.
  cache.destroy();
}

#[test]
fn test_dropping_last_handle_stops_janitor() {
  let cache = CacheBuilder::<i32, i32>::new()
    .sweep_interval(SWEEP_TICK)
    .build()
    .unwrap();
  cache.set(1, 1);
  drop(cache);
  // Nothing to assert beyond not hanging: the janitor is joined on drop.
  thread::sleep(SWEEP_TICK * 2);
}
