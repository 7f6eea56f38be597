//! Batch deduplication and bounded-concurrency processing.

mod gate;

pub use gate::{AcquireFuture, ConcurrencyGate, GatePermit};

use crate::hashing;

use std::future::Future;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// How two requests of a batch are recognised as the same work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
  /// Structurally identical requests (key order ignored).
  #[default]
  Exact,
  /// Requests identical in the fields that affect the outcome; cosmetic
  /// differences such as the request `id` are ignored.
  Operational,
  /// Every request is computed.
  Disabled,
}

impl DedupStrategy {
  /// The dedup key of `request`, or `None` when deduplication is off.
  pub fn key(self, request: &Value) -> Option<String> {
    match self {
      DedupStrategy::Exact => Some(hashing::hash_structure(request)),
      DedupStrategy::Operational => Some(hashing::request_dedup_key(request)),
      DedupStrategy::Disabled => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
  /// Items per chunk; progress is reported after each chunk.
  pub max_batch_size: usize,
  /// Work units in flight at once within a chunk.
  pub max_concurrency: usize,
  pub dedup: DedupStrategy,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self {
      max_batch_size: DEFAULT_MAX_BATCH_SIZE,
      max_concurrency: num_cpus::get().max(1),
      dedup: DedupStrategy::default(),
    }
  }
}

/// Reported after each chunk of [`process_batch_optimized`] completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
  pub completed: usize,
  pub total: usize,
  /// 1-based index of the chunk that just finished.
  pub chunk_index: usize,
  pub chunk_count: usize,
}

/// A first occurrence kept for processing.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueItem<T> {
  /// Position in the original batch.
  pub index: usize,
  pub key: String,
  pub item: T,
}

#[derive(Debug, Clone)]
pub struct OptimizedBatch<T> {
  /// First occurrence of every key, in input order.
  pub deduped_items: Vec<UniqueItem<T>>,
  /// Later occurrences by key, as `(original index, item)`.
  pub duplicate_groups: HashMap<String, Vec<(usize, T)>>,
}

impl<T> OptimizedBatch<T> {
  pub fn duplicate_count(&self) -> usize {
    self.duplicate_groups.values().map(Vec::len).sum()
  }
}

/// Splits `items` into first occurrences and later duplicates by `key_fn`.
pub fn optimize_batch<T, I, F>(items: I, mut key_fn: F) -> OptimizedBatch<T>
where
  I: IntoIterator<Item = T>,
  F: FnMut(&T) -> String,
{
  let mut seen: HashSet<String> = HashSet::new();
  let mut deduped_items = Vec::new();
  let mut duplicate_groups: HashMap<String, Vec<(usize, T)>> = HashMap::new();

  for (index, item) in items.into_iter().enumerate() {
    let key = key_fn(&item);
    if seen.contains(&key) {
      duplicate_groups.entry(key).or_default().push((index, item));
    } else {
      seen.insert(key.clone());
      deduped_items.push(UniqueItem { index, key, item });
    }
  }

  OptimizedBatch {
    deduped_items,
    duplicate_groups,
  }
}

/// Runs `work` over `items` in chunks of `max_batch_size`, with at most
/// `max_concurrency` calls in flight inside a chunk.
///
/// The output is in input order whatever order the work completes in.
/// Futures are polled on the caller's task, not spawned.
pub async fn process_batch_optimized<T, R, F, Fut, P>(
  items: Vec<T>,
  work: F,
  options: &BatchOptions,
  mut progress: P,
) -> Vec<R>
where
  F: Fn(T) -> Fut,
  Fut: Future<Output = R>,
  P: FnMut(BatchProgress),
{
  let total = items.len();
  let chunk_size = options.max_batch_size.max(1);
  let chunk_count = total.div_ceil(chunk_size);
  let gate = ConcurrencyGate::new(options.max_concurrency);
  let mut results = Vec::with_capacity(total);

  let mut remaining = items.into_iter();
  for chunk_index in 1..=chunk_count {
    let chunk = remaining.by_ref().take(chunk_size).map(|item| {
      let gate = &gate;
      let work = &work;
      async move {
        let _permit = gate.acquire().await;
        work(item).await
      }
    });
    results.extend(join_all(chunk).await);

    let update = BatchProgress {
      completed: results.len(),
      total,
      chunk_index,
      chunk_count,
    };
    tracing::debug!(completed = update.completed, total, chunk_index, chunk_count, "batch chunk finished");
    progress(update);
  }

  results
}
