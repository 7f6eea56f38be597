//! The three purpose-specific caches and the registry that owns them.
//!
//! Each cache kind has its own key namespace so a validation key can never
//! collide with a schema or template key, even when they share a backend.

use crate::report::ValidationResult;
use crate::schema::Schema;
use crate::template::GeneratedRequest;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use bidcheck_cache::{BuildError, Cache, CacheBuilder, CacheConfig, CacheStats, EvictionPolicy};
use serde::Serialize;

/// Static description of one cache purpose.
pub trait CacheKind: Send + Sync + 'static {
  type Value: Serialize + Send + Sync + 'static;

  /// Used in logs and in the sweep thread's name.
  const NAME: &'static str;
  /// Prepended to every key.
  const NAMESPACE: &'static str;

  fn default_config() -> CacheConfig;
}

#[derive(Debug)]
pub enum ValidationKind {}

#[derive(Debug)]
pub enum SchemaKind {}

#[derive(Debug)]
pub enum TemplateKind {}

impl CacheKind for ValidationKind {
  type Value = ValidationResult;
  const NAME: &'static str = "validation";
  const NAMESPACE: &'static str = "validation:";

  /// High volume, tens of minutes, recency matters.
  fn default_config() -> CacheConfig {
    CacheConfig {
      max_entries: 10_000,
      default_ttl: Duration::from_secs(30 * 60),
      eviction_policy: EvictionPolicy::Lru,
      track_memory: false,
      sweep_interval: Some(Duration::from_secs(5 * 60)),
    }
  }
}

impl CacheKind for SchemaKind {
  type Value = Schema;
  const NAME: &'static str = "schema";
  const NAMESPACE: &'static str = "schema:";

  /// Few entries that live for hours. Loaded rarely, so no recency ordering.
  fn default_config() -> CacheConfig {
    CacheConfig {
      max_entries: 50,
      default_ttl: Duration::from_secs(6 * 60 * 60),
      eviction_policy: EvictionPolicy::Fifo,
      track_memory: false,
      sweep_interval: Some(Duration::from_secs(30 * 60)),
    }
  }
}

impl CacheKind for TemplateKind {
  type Value = GeneratedRequest;
  const NAME: &'static str = "template";
  const NAMESPACE: &'static str = "template:";

  fn default_config() -> CacheConfig {
    CacheConfig {
      max_entries: 1_000,
      default_ttl: Duration::from_secs(60 * 60),
      eviction_policy: EvictionPolicy::Lru,
      track_memory: false,
      sweep_interval: Some(Duration::from_secs(10 * 60)),
    }
  }
}

/// A cache of one [`CacheKind`], keyed by strings inside the kind's namespace.
pub struct SpecializedCache<K: CacheKind> {
  inner: Cache<String, K::Value>,
  _kind: PhantomData<K>,
}

pub type ValidationCache = SpecializedCache<ValidationKind>;
pub type SchemaCache = SpecializedCache<SchemaKind>;
pub type TemplateCache = SpecializedCache<TemplateKind>;

impl<K: CacheKind> fmt::Debug for SpecializedCache<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SpecializedCache")
      .field("name", &K::NAME)
      .field("len", &self.inner.len())
      .finish()
  }
}

impl<K: CacheKind> SpecializedCache<K> {
  pub fn new(config: CacheConfig) -> Result<Self, BuildError> {
    let inner = CacheBuilder::from_config(config).name(K::NAME).build()?;
    Ok(Self {
      inner,
      _kind: PhantomData,
    })
  }

  /// A cache with the kind's default capacity, TTL and policy.
  pub fn with_defaults() -> Result<Self, BuildError> {
    Self::new(K::default_config())
  }

  fn namespaced(key: &str) -> String {
    format!("{}{}", K::NAMESPACE, key)
  }

  pub fn get(&self, key: &str) -> Option<Arc<K::Value>> {
    self.inner.get(&Self::namespaced(key))
  }

  pub fn set(&self, key: &str, value: K::Value) {
    self.inner.set(Self::namespaced(key), value);
  }

  pub fn set_with_ttl(&self, key: &str, value: K::Value, ttl: Duration) {
    self.inner.set_with_ttl(Self::namespaced(key), value, ttl);
  }

  /// Returns the cached value or stores the one produced by `init`.
  pub fn get_or_try_insert_with<E, F>(&self, key: &str, init: F) -> Result<Arc<K::Value>, E>
  where
    F: FnOnce() -> Result<K::Value, E>,
  {
    self.inner.get_or_try_insert_with(Self::namespaced(key), init)
  }

  pub fn has(&self, key: &str) -> bool {
    self.inner.has(&Self::namespaced(key))
  }

  pub fn delete(&self, key: &str) -> bool {
    self.inner.delete(&Self::namespaced(key))
  }

  /// Live keys with the namespace stripped.
  pub fn keys(&self) -> Vec<String> {
    self
      .inner
      .keys()
      .into_iter()
      .filter_map(|key| key.strip_prefix(K::NAMESPACE).map(str::to_string))
      .collect()
  }

  pub fn clear(&self) {
    self.inner.clear();
  }

  pub fn cleanup(&self) -> usize {
    self.inner.cleanup()
  }

  pub fn destroy(&self) {
    self.inner.destroy();
  }

  pub fn stats(&self) -> CacheStats {
    self.inner.stats()
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  /// The underlying generic cache.
  pub fn as_cache(&self) -> &Cache<String, K::Value> {
    &self.inner
  }
}

/// Statistics of every cache owned by a [`CacheRegistry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRegistryStats {
  pub validation: CacheStats,
  pub schema: CacheStats,
  pub template: CacheStats,
}

/// Owns the validation, schema and template caches of one validator.
#[derive(Debug)]
pub struct CacheRegistry {
  pub validation: ValidationCache,
  pub schema: SchemaCache,
  pub template: TemplateCache,
}

impl CacheRegistry {
  pub fn new(validation: CacheConfig, schema: CacheConfig, template: CacheConfig) -> Result<Self, BuildError> {
    Ok(Self {
      validation: ValidationCache::new(validation)?,
      schema: SchemaCache::new(schema)?,
      template: TemplateCache::new(template)?,
    })
  }

  pub fn with_defaults() -> Result<Self, BuildError> {
    Self::new(
      ValidationKind::default_config(),
      SchemaKind::default_config(),
      TemplateKind::default_config(),
    )
  }

  pub fn stats(&self) -> CacheRegistryStats {
    CacheRegistryStats {
      validation: self.validation.stats(),
      schema: self.schema.stats(),
      template: self.template.stats(),
    }
  }

  pub fn clear_all(&self) {
    self.validation.clear();
    self.schema.clear();
    self.template.clear();
    tracing::debug!("cleared all caches");
  }

  /// Stops every sweep thread and empties the caches.
  pub fn destroy(&self) {
    self.validation.destroy();
    self.schema.destroy();
    self.template.destroy();
  }
}
