use serde::Deserialize;
use std::collections::BTreeMap;

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfigRaw {
  #[serde(default = "default_version")]
  pub version: u32,
  /// Minimum level for every target without an override.
  #[serde(default = "default_level")]
  pub level: String,
  /// Per-target overrides, e.g. `bidcheck_cache: trace`.
  #[serde(default)]
  pub targets: BTreeMap<String, String>,
  #[serde(default)]
  pub format: FormatRaw,
  #[serde(default = "default_true")]
  pub ansi: bool,
  #[serde(default = "default_true")]
  pub with_target: bool,
  #[serde(default)]
  pub with_thread_names: bool,
  /// Route records from the `log` crate into tracing.
  #[serde(default = "default_true")]
  pub bridge_log: bool,
}

fn default_version() -> u32 {
  1
}

fn default_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatRaw {
  #[default]
  Pattern,
  Compact,
  Json,
}

impl Default for LoggingConfigRaw {
  fn default() -> Self {
    Self {
      version: default_version(),
      level: default_level(),
      targets: BTreeMap::new(),
      format: FormatRaw::default(),
      ansi: true,
      with_target: true,
      with_thread_names: false,
      bridge_log: true,
    }
  }
}
