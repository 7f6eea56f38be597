use crate::batch::BatchOptions;
use crate::caches::{CacheKind, SchemaKind, TemplateKind, ValidationKind};
use crate::config::raw::{BatchSettingsRaw, CacheSettingsRaw, EngineConfigRaw, ScoringRaw};
use crate::error::ConfigError;
use crate::report::ScoringConfig;

use std::time::Duration;

use bidcheck_cache::CacheConfig;
use bidcheck_logging::config::processed::process_raw_config as process_logging_config;
use bidcheck_logging::LoggingConfig;

const SUPPORTED_VERSION: u32 = 1;
const MAX_PENALTY: u32 = 100;

/// Validated configuration of a [`BidValidator`](crate::BidValidator).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
  /// Schema used when a validation does not name one.
  pub default_schema_version: String,
  pub validation_cache: CacheConfig,
  pub schema_cache: CacheConfig,
  pub template_cache: CacheConfig,
  pub batch: BatchOptions,
  pub scoring: ScoringConfig,
  pub logging: LoggingConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_schema_version: "2.5".to_string(),
      validation_cache: ValidationKind::default_config(),
      schema_cache: SchemaKind::default_config(),
      template_cache: TemplateKind::default_config(),
      batch: BatchOptions::default(),
      scoring: ScoringConfig::default(),
      logging: LoggingConfig::default(),
    }
  }
}

impl EngineConfig {
  /// Installs the global tracing subscriber described by the `logging`
  /// section.
  pub fn init_logging(&self) -> Result<(), ConfigError> {
    bidcheck_logging::init_with_config(&self.logging)?;
    Ok(())
  }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
  ConfigError::InvalidValue {
    field: field.into(),
    message: message.into(),
  }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
  humantime::parse_duration(value.trim())
    .map_err(|e| invalid(field, format!("'{}' is not a duration: {}", value, e)))
}

fn process_cache<K: CacheKind>(raw: CacheSettingsRaw) -> Result<CacheConfig, ConfigError> {
  let mut config = K::default_config();
  let field = |name: &str| format!("caches.{}.{}", K::NAME, name);

  if let Some(max_entries) = raw.max_entries {
    config.max_entries = max_entries;
  }
  if let Some(ttl) = raw.ttl {
    config.default_ttl = parse_duration(&field("ttl"), &ttl)?;
  }
  if let Some(policy) = raw.eviction_policy {
    config.eviction_policy = policy;
  }
  if let Some(track_memory) = raw.track_memory {
    config.track_memory = track_memory;
  }
  if let Some(interval) = raw.sweep_interval {
    config.sweep_interval = if interval.trim().eq_ignore_ascii_case("off") {
      None
    } else {
      Some(parse_duration(&field("sweep_interval"), &interval)?).filter(|d| !d.is_zero())
    };
  }

  config.validate().map_err(|source| ConfigError::Cache {
    cache: K::NAME,
    source,
  })?;
  Ok(config)
}

fn process_batch(raw: BatchSettingsRaw) -> Result<BatchOptions, ConfigError> {
  let mut options = BatchOptions::default();
  if let Some(size) = raw.max_batch_size {
    if size == 0 {
      return Err(invalid("batch.max_batch_size", "must be greater than zero"));
    }
    options.max_batch_size = size;
  }
  if let Some(concurrency) = raw.max_concurrency {
    if concurrency == 0 {
      return Err(invalid("batch.max_concurrency", "must be greater than zero"));
    }
    options.max_concurrency = concurrency;
  }
  if let Some(dedup) = raw.dedup {
    options.dedup = dedup;
  }
  Ok(options)
}

fn process_scoring(raw: ScoringRaw) -> Result<ScoringConfig, ConfigError> {
  let defaults = ScoringConfig::default();
  let scoring = ScoringConfig {
    error_penalty: raw.error_penalty.unwrap_or(defaults.error_penalty),
    warning_penalty: raw.warning_penalty.unwrap_or(defaults.warning_penalty),
  };
  for (field, penalty) in [
    ("scoring.error_penalty", scoring.error_penalty),
    ("scoring.warning_penalty", scoring.warning_penalty),
  ] {
    if penalty > MAX_PENALTY {
      return Err(invalid(field, format!("must be at most {}, found {}", MAX_PENALTY, penalty)));
    }
  }
  Ok(scoring)
}

/// Processes the raw, deserialized configuration into a validated `EngineConfig`.
pub fn process_raw_config(raw: EngineConfigRaw) -> Result<EngineConfig, ConfigError> {
  if raw.version != SUPPORTED_VERSION {
    return Err(invalid(
      "version",
      format!("unsupported version {}; expected {}", raw.version, SUPPORTED_VERSION),
    ));
  }
  if raw.default_schema_version.trim().is_empty() {
    return Err(invalid("default_schema_version", "must not be empty"));
  }

  let logging = match raw.logging {
    Some(raw_logging) => process_logging_config(raw_logging)?,
    None => LoggingConfig::default(),
  };

  Ok(EngineConfig {
    default_schema_version: raw.default_schema_version.trim().to_string(),
    validation_cache: process_cache::<ValidationKind>(raw.caches.validation)?,
    schema_cache: process_cache::<SchemaKind>(raw.caches.schema)?,
    template_cache: process_cache::<TemplateKind>(raw.caches.template)?,
    batch: process_batch(raw.batch)?,
    scoring: process_scoring(raw.scoring)?,
    logging,
  })
}
