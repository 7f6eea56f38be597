use crate::error::BuildError;
use crate::handles::Cache;
use crate::policy::fifo::Fifo;
use crate::policy::lru::Lru;
use crate::policy::CachePolicy;
use crate::shared::CacheShared;
use crate::size::estimate_size;
use crate::store::EntryStore;
use crate::task::janitor::Janitor;

use core::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The order in which entries are evicted when the cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
  /// Least recently accessed first.
  #[default]
  Lru,
  /// Oldest created first, ignoring reads.
  Fifo,
}

impl EvictionPolicy {
  fn instantiate<K>(self) -> Box<dyn CachePolicy<K>>
  where
    K: Eq + Hash + Clone + Send + fmt::Debug + 'static,
  {
    match self {
      EvictionPolicy::Lru => Box::new(Lru::new()),
      EvictionPolicy::Fifo => Box::new(Fifo::new()),
    }
  }
}

/// Immutable settings of a cache, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
  /// Upper bound on the number of entries. Must be greater than zero.
  pub max_entries: usize,
  /// TTL used when `set` is called without one. Must be greater than zero.
  pub default_ttl: Duration,
  pub eviction_policy: EvictionPolicy,
  /// Whether to estimate the serialized size of stored values.
  pub track_memory: bool,
  /// How often the janitor sweeps expired entries. `None` disables it.
  pub sweep_interval: Option<Duration>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_entries: 1_000,
      default_ttl: Duration::from_secs(5 * 60),
      eviction_policy: EvictionPolicy::Lru,
      track_memory: false,
      sweep_interval: Some(Duration::from_secs(60)),
    }
  }
}

impl CacheConfig {
  /// Checks the configuration for programmer errors.
  pub fn validate(&self) -> Result<(), BuildError> {
    if self.max_entries == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if self.default_ttl.is_zero() {
      return Err(BuildError::ZeroTtl);
    }
    Ok(())
  }
}

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K, V> {
  config: CacheConfig,
  name: String,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

// Manual Debug implementation for CacheBuilder.
impl<K, V> fmt::Debug for CacheBuilder<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("name", &self.name)
      .field("config", &self.config)
      .finish()
  }
}

impl<K, V> Default for CacheBuilder<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

// --- General Configuration Methods ---
impl<K, V> CacheBuilder<K, V> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self::from_config(CacheConfig::default())
  }

  /// Starts from an existing configuration.
  pub fn from_config(config: CacheConfig) -> Self {
    Self {
      config,
      name: "cache".to_string(),
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }

  /// Names the cache in log output and in the sweep thread's name.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Sets the maximum number of entries.
  pub fn max_entries(mut self, max_entries: usize) -> Self {
    self.config.max_entries = max_entries;
    self
  }

  /// Sets the default time-to-live for entries.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.config.default_ttl = duration;
    self
  }

  pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
    self.config.eviction_policy = policy;
    self
  }

  /// Enables the serialized-size estimate reported in `CacheStats`.
  pub fn track_memory(mut self, enabled: bool) -> Self {
    self.config.track_memory = enabled;
    self
  }

  /// Sets the sweep interval. A zero duration disables the periodic sweep.
  pub fn sweep_interval(mut self, interval: Duration) -> Self {
    self.config.sweep_interval = if interval.is_zero() {
      None
    } else {
      Some(interval)
    };
    self
  }

  /// Disables the periodic sweep. Expiry is still enforced on reads.
  pub fn without_sweep(mut self) -> Self {
    self.config.sweep_interval = None;
    self
  }
}

// --- Build Methods ---
impl<K, V> CacheBuilder<K, V>
where
  K: Eq + Hash + Clone + Send + fmt::Debug + 'static,
  V: Serialize + Send + Sync + 'static,
{
  /// Validates the configuration and builds the cache, starting its sweep
  /// thread if one is configured.
  pub fn build(self) -> Result<Cache<K, V>, BuildError> {
    self.config.validate()?;

    let store = EntryStore::new(
      self.config.max_entries,
      self.config.eviction_policy.instantiate::<K>(),
    );
    let size_estimator = if self.config.track_memory {
      Some(estimate_size::<V> as fn(&V) -> u64)
    } else {
      None
    };

    let shared = Arc::new(CacheShared {
      name: self.name,
      config: self.config,
      store: Mutex::new(store),
      janitor: Mutex::new(None),
      size_estimator,
    });

    if let Some(interval) = shared.config.sweep_interval {
      let janitor = Janitor::spawn(Arc::downgrade(&shared), interval, &shared.name)?;
      *shared.janitor.lock() = Some(janitor);
    }

    tracing::debug!(
      cache = %shared.name,
      max_entries = shared.config.max_entries,
      ttl = ?shared.config.default_ttl,
      policy = ?shared.config.eviction_policy,
      "cache built"
    );

    Ok(Cache { shared })
  }
}
