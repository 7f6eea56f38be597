use crate::config::raw::{FormatRaw, LoggingConfigRaw};
use crate::error::{Error, Result};

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

const SUPPORTED_VERSION: u32 = 1;

/// How events are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  /// The default human-readable, multi-field line.
  Pattern,
  Compact,
  /// One JSON object per line.
  Json,
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
  pub level: LevelFilter,
  /// Target overrides in configuration order (sorted by target name).
  pub targets: Vec<(String, LevelFilter)>,
  pub format: OutputFormat,
  pub ansi: bool,
  pub with_target: bool,
  pub with_thread_names: bool,
  pub bridge_log: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    // The raw defaults are always valid.
    Self {
      level: LevelFilter::INFO,
      targets: Vec::new(),
      format: OutputFormat::Pattern,
      ansi: true,
      with_target: true,
      with_thread_names: false,
      bridge_log: true,
    }
  }
}

impl LoggingConfig {
  /// Renders the level settings as `EnvFilter` directives, e.g.
  /// `info,bidcheck_cache=trace`.
  pub fn filter_directives(&self) -> String {
    let mut directives = vec![self.level.to_string().to_lowercase()];
    for (target, level) in &self.targets {
      directives.push(format!("{}={}", target, level.to_string().to_lowercase()));
    }
    directives.join(",")
  }

  pub fn env_filter(&self) -> Result<EnvFilter> {
    EnvFilter::try_new(self.filter_directives()).map_err(|e| Error::InvalidConfigValue {
      field: "targets".to_string(),
      message: e.to_string(),
    })
  }
}

fn parse_level(field: &str, value: &str) -> Result<LevelFilter> {
  match value.trim().to_lowercase().as_str() {
    "off" => Ok(LevelFilter::OFF),
    "error" => Ok(LevelFilter::ERROR),
    "warn" | "warning" => Ok(LevelFilter::WARN),
    "info" => Ok(LevelFilter::INFO),
    "debug" => Ok(LevelFilter::DEBUG),
    "trace" => Ok(LevelFilter::TRACE),
    other => Err(Error::InvalidConfigValue {
      field: field.to_string(),
      message: format!(
        "Unknown level '{}'. Expected 'off', 'error', 'warn', 'info', 'debug', or 'trace'.",
        other
      ),
    }),
  }
}

/// Processes the raw, deserialized configuration into validated settings.
pub fn process_raw_config(raw: LoggingConfigRaw) -> Result<LoggingConfig> {
  if raw.version != SUPPORTED_VERSION {
    return Err(Error::InvalidConfigValue {
      field: "version".to_string(),
      message: format!("Unsupported version {}; expected {}.", raw.version, SUPPORTED_VERSION),
    });
  }

  let level = parse_level("level", &raw.level)?;

  let mut targets = Vec::with_capacity(raw.targets.len());
  for (target, value) in raw.targets {
    if target.trim().is_empty() || target.contains(['=', ',']) {
      return Err(Error::InvalidConfigValue {
        field: "targets".to_string(),
        message: format!("Invalid target name '{}'.", target),
      });
    }
    let target_level = parse_level(&format!("targets.{}", target), &value)?;
    targets.push((target, target_level));
  }

  let format = match raw.format {
    FormatRaw::Pattern => OutputFormat::Pattern,
    FormatRaw::Compact => OutputFormat::Compact,
    FormatRaw::Json => OutputFormat::Json,
  };

  Ok(LoggingConfig {
    level,
    targets,
    format,
    // ANSI escapes would corrupt JSON lines.
    ansi: raw.ansi && format != OutputFormat::Json,
    with_target: raw.with_target,
    with_thread_names: raw.with_thread_names,
    bridge_log: raw.bridge_log,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn defaults_process_cleanly() {
    let processed = process_raw_config(LoggingConfigRaw::default()).unwrap();
    assert_eq!(processed, LoggingConfig::default());
  }

  #[test]
  fn unknown_level_is_rejected() {
    let raw = LoggingConfigRaw {
      level: "loud".to_string(),
      ..Default::default()
    };
    let err = process_raw_config(raw).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "level"));
  }

  #[test]
  fn directives_include_target_overrides() {
    let mut raw = LoggingConfigRaw::default();
    raw.level = "warn".to_string();
    raw.targets.insert("bidcheck_cache".to_string(), "TRACE".to_string());
    let processed = process_raw_config(raw).unwrap();
    assert_eq!(processed.filter_directives(), "warn,bidcheck_cache=trace");
    assert!(processed.env_filter().is_ok());
  }

  #[test]
  fn json_format_disables_ansi() {
    let raw = LoggingConfigRaw {
      format: FormatRaw::Json,
      ..Default::default()
    };
    assert!(!process_raw_config(raw).unwrap().ansi);
  }
}
