use crate::batch::DedupStrategy;

use bidcheck_cache::EvictionPolicy;
use bidcheck_logging::config::raw::LoggingConfigRaw;
use serde::Deserialize;

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfigRaw {
  #[serde(default = "default_version")]
  pub version: u32,
  #[serde(default = "default_schema_version")]
  pub default_schema_version: String,
  #[serde(default)]
  pub caches: CachesRaw,
  #[serde(default)]
  pub batch: BatchSettingsRaw,
  #[serde(default)]
  pub scoring: ScoringRaw,
  /// Same shape as `bidcheck_logging.yaml`.
  #[serde(default)]
  pub logging: Option<LoggingConfigRaw>,
}

fn default_version() -> u32 {
  1
}

fn default_schema_version() -> String {
  "2.5".to_string()
}

impl Default for EngineConfigRaw {
  fn default() -> Self {
    Self {
      version: default_version(),
      default_schema_version: default_schema_version(),
      caches: CachesRaw::default(),
      batch: BatchSettingsRaw::default(),
      scoring: ScoringRaw::default(),
      logging: None,
    }
  }
}

// --- Caches ---
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CachesRaw {
  #[serde(default)]
  pub validation: CacheSettingsRaw,
  #[serde(default)]
  pub schema: CacheSettingsRaw,
  #[serde(default)]
  pub template: CacheSettingsRaw,
}

/// Every field is optional; missing ones keep the cache's own default.
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CacheSettingsRaw {
  pub max_entries: Option<usize>,
  /// A humantime duration such as "30m" or "6h".
  pub ttl: Option<String>,
  pub eviction_policy: Option<EvictionPolicy>,
  pub track_memory: Option<bool>,
  /// A humantime duration, or "off" (or a zero duration) to disable sweeping.
  pub sweep_interval: Option<String>,
}

// --- Batch ---
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BatchSettingsRaw {
  pub max_batch_size: Option<usize>,
  /// Defaults to the number of CPUs.
  pub max_concurrency: Option<usize>,
  pub dedup: Option<DedupStrategy>,
}

// --- Scoring ---
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringRaw {
  pub error_penalty: Option<u32>,
  pub warning_penalty: Option<u32>,
}
