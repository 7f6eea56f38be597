//! The validator: memoized single validation, deduplicated batch validation
//! and template generation on top of the rule engine and the caches.

use crate::batch::{optimize_batch, process_batch_optimized, BatchOptions, BatchProgress};
use crate::caches::{CacheKind, CacheRegistry, CacheRegistryStats, SchemaCache, TemplateCache, TemplateKind};
use crate::caches::{SchemaKind, ValidationCache, ValidationKind};
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, SchemaError, TemplateError};
use crate::hashing::hash_structure;
use crate::report::{BatchSummary, BatchValidationResult, RuleOutcome, ValidationResult};
use crate::rules::RuleEngine;
use crate::schema::{BuiltinSchemaProvider, Schema, SchemaProvider};
use crate::template::{GeneratedRequest, InMemoryTemplateCatalog, TemplateCatalog};

use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use bidcheck_cache::{BuildError, CacheConfig};
use serde_json::{json, Map, Value};

/// Per-call options of [`BidValidator::validate_single`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
  /// Schema to validate against. `None` uses the configured default.
  pub schema_version: Option<String>,
  /// Look up and store results in the validation cache.
  pub use_cache: bool,
}

impl Default for ValidateOptions {
  fn default() -> Self {
    Self {
      schema_version: None,
      use_cache: true,
    }
  }
}

impl ValidateOptions {
  pub fn for_version(version: impl Into<String>) -> Self {
    Self {
      schema_version: Some(version.into()),
      ..Self::default()
    }
  }

  pub fn without_cache(mut self) -> Self {
    self.use_cache = false;
    self
  }
}

/// Validates OpenRTB bid requests.
///
/// Owns its caches; their sweep threads stop when the validator is dropped
/// or [`destroy`](Self::destroy)ed.
pub struct BidValidator {
  config: EngineConfig,
  caches: CacheRegistry,
  engine: RuleEngine,
  schemas: Arc<dyn SchemaProvider>,
  templates: Arc<dyn TemplateCatalog>,
}

impl fmt::Debug for BidValidator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BidValidator")
      .field("default_schema_version", &self.config.default_schema_version)
      .field("rule_sets", &self.engine.rule_set_names())
      .field("schemas", &self.schemas)
      .finish()
  }
}

/// A builder for [`BidValidator`] with replaceable schema provider, template
/// catalog and rule engine.
pub struct BidValidatorBuilder {
  config: EngineConfig,
  engine: Option<RuleEngine>,
  schemas: Option<Arc<dyn SchemaProvider>>,
  templates: Option<Arc<dyn TemplateCatalog>>,
}

impl fmt::Debug for BidValidatorBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BidValidatorBuilder")
      .field("config", &self.config)
      .field("custom_engine", &self.engine.is_some())
      .field("custom_schemas", &self.schemas.is_some())
      .field("custom_templates", &self.templates.is_some())
      .finish()
  }
}

fn build_cache<K, C>(config: &CacheConfig, new: fn(CacheConfig) -> Result<C, BuildError>) -> Result<C, ConfigError>
where
  K: CacheKind,
{
  new(config.clone()).map_err(|source| ConfigError::Cache {
    cache: K::NAME,
    source,
  })
}

impl BidValidatorBuilder {
  pub fn new(config: EngineConfig) -> Self {
    Self {
      config,
      engine: None,
      schemas: None,
      templates: None,
    }
  }

  pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
    self.engine = Some(engine);
    self
  }

  pub fn with_schema_provider(mut self, provider: Arc<dyn SchemaProvider>) -> Self {
    self.schemas = Some(provider);
    self
  }

  pub fn with_template_catalog(mut self, catalog: Arc<dyn TemplateCatalog>) -> Self {
    self.templates = Some(catalog);
    self
  }

  /// Builds the caches and checks that the default schema version can be
  /// loaded by the provider.
  pub fn build(self) -> Result<BidValidator, ConfigError> {
    let schemas = self
      .schemas
      .unwrap_or_else(|| Arc::new(BuiltinSchemaProvider::new()));
    let default_version = &self.config.default_schema_version;
    if !schemas.supports(default_version) {
      return Err(ConfigError::InvalidValue {
        field: "default_schema_version".to_string(),
        message: format!(
          "schema version '{}' is not available (available: {})",
          default_version,
          schemas.versions().join(", ")
        ),
      });
    }

    let caches = CacheRegistry {
      validation: build_cache::<ValidationKind, _>(&self.config.validation_cache, ValidationCache::new)?,
      schema: build_cache::<SchemaKind, _>(&self.config.schema_cache, SchemaCache::new)?,
      template: build_cache::<TemplateKind, _>(&self.config.template_cache, TemplateCache::new)?,
    };

    let validator = BidValidator {
      caches,
      engine: self.engine.unwrap_or_default(),
      schemas,
      templates: self
        .templates
        .unwrap_or_else(|| Arc::new(InMemoryTemplateCatalog::with_builtins())),
      config: self.config,
    };
    tracing::debug!(
      default_schema_version = %validator.config.default_schema_version,
      rule_sets = ?validator.engine.rule_set_names(),
      "validator built"
    );
    Ok(validator)
  }
}

/// Extracts the message of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}

/// The validation cache key of `request` under `schema_version`.
pub fn validation_key(request: &Value, schema_version: &str) -> String {
  hash_structure(&json!({
    "request": request,
    "schemaVersion": schema_version,
  }))
}

impl BidValidator {
  /// A validator with the given configuration and the built-in schemas,
  /// templates and rule sets.
  pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
    BidValidatorBuilder::new(config).build()
  }

  pub fn builder(config: EngineConfig) -> BidValidatorBuilder {
    BidValidatorBuilder::new(config)
  }

  pub fn with_defaults() -> Result<Self, ConfigError> {
    Self::new(EngineConfig::default())
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn caches(&self) -> &CacheRegistry {
    &self.caches
  }

  /// Validates one request, serving repeated requests from the validation
  /// cache.
  ///
  /// Never fails: an engine failure is reported as a single
  /// `VALIDATION_ENGINE_ERROR` finding, and such results are not cached.
  pub fn validate_single(&self, request: &Value, options: &ValidateOptions) -> ValidationResult {
    let version = options
      .schema_version
      .as_deref()
      .unwrap_or(&self.config.default_schema_version);
    let key = validation_key(request, version);

    if options.use_cache {
      if let Some(cached) = self.caches.validation.get(&key) {
        let mut result = (*cached).clone();
        result.from_cache = true;
        tracing::trace!(key = %key, validation_id = %result.validation_id, "validation cache hit");
        return result;
      }
    }

    match self.run_engine(request, version) {
      Ok(outcome) => {
        let result = ValidationResult::assemble(outcome, &self.config.scoring, version);
        if options.use_cache {
          self.caches.validation.set(&key, result.clone());
        }
        result
      }
      Err(error) => {
        tracing::warn!(error = %error, schema_version = version, "validation engine failed");
        ValidationResult::engine_failure(&error, version)
      }
    }
  }

  fn run_engine(&self, request: &Value, version: &str) -> Result<RuleOutcome, EngineError> {
    let schema = self.load_schema(version)?;
    panic::catch_unwind(AssertUnwindSafe(|| self.engine.validate(request, &schema)))
      .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(&*payload))))
  }

  /// Batch settings from the `batch:` section of the configuration.
  pub fn batch_options(&self) -> &BatchOptions {
    &self.config.batch
  }

  /// Validates a batch with the configured batch settings and default
  /// per-request options.
  pub async fn validate_batch(&self, requests: &[Value]) -> BatchValidationResult {
    self.validate_batch_with(requests, &self.config.batch).await
  }

  /// Validates a batch with explicit batch settings.
  pub async fn validate_batch_with(&self, requests: &[Value], options: &BatchOptions) -> BatchValidationResult {
    self
      .validate_batch_with_progress(requests, options, &ValidateOptions::default(), |_| {})
      .await
  }

  /// Validates a batch, computing each distinct request once.
  ///
  /// Results are in input order. A duplicate receives a copy of its first
  /// occurrence's result marked `from_cache`. `progress` is called after each
  /// chunk of distinct requests.
  pub async fn validate_batch_with_progress<P>(
    &self,
    requests: &[Value],
    batch_options: &BatchOptions,
    validate_options: &ValidateOptions,
    progress: P,
  ) -> BatchValidationResult
  where
    P: FnMut(BatchProgress),
  {
    let started = Instant::now();
    let total = requests.len();
    let dedup = batch_options.dedup;

    let optimized = optimize_batch(requests.iter().enumerate(), |(index, request)| {
      // Disabled dedup still needs a unique key per position.
      dedup.key(request).unwrap_or_else(|| format!("#{}", index))
    });
    let duplicates = optimized.duplicate_count();
    let mut duplicate_groups = optimized.duplicate_groups;

    let computed = process_batch_optimized(
      optimized.deduped_items,
      move |unique| async move {
        let result = self.validate_single(unique.item.1, validate_options);
        (unique.index, unique.key, result)
      },
      batch_options,
      progress,
    )
    .await;

    let cache_hits = computed.iter().filter(|(_, _, result)| result.from_cache).count();

    let mut slots: Vec<Option<ValidationResult>> = vec![None; total];
    for (index, key, result) in computed {
      for (duplicate_index, _) in duplicate_groups.remove(&key).unwrap_or_default() {
        let mut copy = result.clone();
        copy.from_cache = true;
        slots[duplicate_index] = Some(copy);
      }
      slots[index] = Some(result);
    }
    let results: Vec<ValidationResult> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), total);

    let summary = BatchSummary::from_results(&results, duplicates, cache_hits, started.elapsed());
    tracing::debug!(
      total = summary.total,
      valid = summary.valid,
      duplicates,
      cache_hits,
      duration_ms = summary.duration_ms,
      "batch validated"
    );
    BatchValidationResult { results, summary }
  }

  /// Loads a schema through the schema cache.
  pub fn load_schema(&self, version: &str) -> Result<Arc<Schema>, SchemaError> {
    self
      .caches
      .schema
      .get_or_try_insert_with(version, || self.schemas.load(version))
  }

  pub fn schema_versions(&self) -> Vec<String> {
    self.schemas.versions()
  }

  /// Generates a request from a catalog template with dotted-path overrides.
  ///
  /// Generations are cached per template version and override set; a cached
  /// generation is returned with `from_cache` set.
  pub fn generate_from_template(
    &self,
    template_id: &str,
    overrides: &Map<String, Value>,
  ) -> Result<GeneratedRequest, TemplateError> {
    let template = self
      .templates
      .get(template_id)
      .ok_or_else(|| TemplateError::UnknownTemplate(template_id.to_string()))?;
    let key = format!(
      "{}:{}:{}",
      template.id,
      template.version,
      hash_structure(&Value::Object(overrides.clone()))
    );

    if let Some(cached) = self.caches.template.get(&key) {
      let mut generated = (*cached).clone();
      generated.from_cache = true;
      return Ok(generated);
    }

    let generated = GeneratedRequest::generate(&template, overrides)?;
    self.caches.template.set(&key, generated.clone());
    tracing::trace!(template = template_id, overrides = overrides.len(), "request generated");
    Ok(generated)
  }

  pub fn template_ids(&self) -> Vec<String> {
    self.templates.ids()
  }

  pub fn cache_stats(&self) -> CacheRegistryStats {
    self.caches.stats()
  }

  /// Empties every cache and resets their counters.
  pub fn clear_cache(&self) {
    self.caches.clear_all();
  }

  /// Stops the sweep threads and empties the caches.
  pub fn destroy(&self) {
    self.caches.destroy();
    tracing::debug!("validator destroyed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::IssueCode;
  use crate::rules::{Findings, RuleSet};
  use crate::rules::test_support::clean_request;

  #[derive(Debug)]
  struct ExplodingRules;

  impl RuleSet for ExplodingRules {
    fn name(&self) -> &'static str {
      "exploding"
    }

    fn check(&self, _request: &Map<String, Value>, _findings: &mut Findings) {
      panic!("rule exploded");
    }
  }

  #[test]
  fn key_depends_on_schema_version() {
    let request = clean_request();
    assert_ne!(validation_key(&request, "2.5"), validation_key(&request, "2.6"));
    assert_eq!(validation_key(&request, "2.5"), validation_key(&request.clone(), "2.5"));
  }

  #[test]
  fn panicking_rule_becomes_engine_error() {
    let validator = BidValidator::builder(EngineConfig::default())
      .with_rule_engine(RuleEngine::empty().with_rule_set(ExplodingRules))
      .build()
      .unwrap();
    let result = validator.validate_single(&clean_request(), &ValidateOptions::default());

    assert!(!result.is_valid);
    assert!(result.has_code(IssueCode::ValidationEngineError));
    assert!(result.errors[0].message.contains("rule exploded"));
    assert!(validator.caches().validation.is_empty());
  }

  #[test]
  fn unknown_default_version_is_rejected() {
    let config = EngineConfig {
      default_schema_version: "3.0".to_string(),
      ..EngineConfig::default()
    };
    assert!(matches!(
      BidValidator::new(config),
      Err(ConfigError::InvalidValue { .. })
    ));
  }

  #[test]
  fn schemas_are_loaded_once() {
    let validator = BidValidator::with_defaults().unwrap();
    let first = validator.load_schema("2.6").unwrap();
    let second = validator.load_schema("2.6").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(validator.caches().schema.keys(), vec!["2.6".to_string()]);
  }
}
