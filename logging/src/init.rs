// Primary public initialization functions for bidcheck_logging.

use crate::config::processed::{process_raw_config, LoggingConfig, OutputFormat};
use crate::config::raw::LoggingConfigRaw;
use crate::error::{Error, Result};

use std::{
  env,
  fs::File as StdFsFile,
  io,
  path::{Path, PathBuf},
};

use tracing_subscriber::{fmt, prelude::*, registry::Registry, Layer};

const DEFAULT_CONFIG_BASE_NAME: &str = "bidcheck_logging";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Finds the configuration file in the working directory.
///
/// With an environment suffix (explicit, or from `BIDCHECK_ENV` / `APP_ENV`)
/// `bidcheck_logging.<env>.yaml` is preferred over `bidcheck_logging.yaml`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Same as [`find_config_file`], searching `dir` instead of the working directory.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("BIDCHECK_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!(
        "{}.{}.{}",
        DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
      ));
    }
  }
  files_to_check.push(format!("{}.{}", DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check BIDCHECK_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Reads and validates a logging configuration file without installing it.
pub fn load_from_file(config_path: &Path) -> Result<LoggingConfig> {
  let file = StdFsFile::open(config_path)?;
  let reader = io::BufReader::new(file);
  let raw_config: LoggingConfigRaw =
    serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?;
  process_raw_config(raw_config)
}

/// Initializes logging from a configuration file path.
pub fn init_from_file(config_path: &Path) -> Result<()> {
  let config = load_from_file(config_path)?;
  init_with_config(&config)?;
  tracing::debug!(path = ?config_path, "logging initialized from file");
  Ok(())
}

/// Installs the global subscriber described by `config`.
///
/// Fails if a global subscriber (or `log` logger, with `bridge_log`) is
/// already installed.
pub fn init_with_config(config: &LoggingConfig) -> Result<()> {
  let filter = config.env_filter()?;

  let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
    OutputFormat::Pattern => fmt::layer()
      .with_ansi(config.ansi)
      .with_target(config.with_target)
      .with_thread_names(config.with_thread_names)
      .boxed(),
    OutputFormat::Compact => fmt::layer()
      .compact()
      .with_ansi(config.ansi)
      .with_target(config.with_target)
      .with_thread_names(config.with_thread_names)
      .boxed(),
    OutputFormat::Json => fmt::layer()
      .json()
      .with_current_span(true)
      .with_ansi(false)
      .with_target(config.with_target)
      .with_thread_names(config.with_thread_names)
      .boxed(),
  };

  let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);
  tracing::subscriber::set_global_default(subscriber)
    .map_err(|e| Error::GlobalSubscriberSet(e.to_string()))?;

  if config.bridge_log {
    tracing_log::LogTracer::init().map_err(|e| Error::LogBridgeInit(e.to_string()))?;
  }
  Ok(())
}

/// Looks for a configuration file and initializes from it, falling back to
/// the defaults (info level, pattern format) when none is found.
pub fn init() -> Result<()> {
  match find_config_file(None) {
    Ok(path) => init_from_file(&path),
    Err(Error::ConfigNotFound(_)) => init_with_config(&LoggingConfig::default()),
    Err(e) => Err(e),
  }
}
