// Engine configuration: YAML file discovery, parsing and validation.

pub mod processed; // Validated settings handed to the validator
pub mod raw; // Structs directly mapping to the YAML structure

pub use processed::{process_raw_config, EngineConfig};

use crate::error::ConfigError;
use raw::EngineConfigRaw;

use std::{
  env,
  fs::File as StdFsFile,
  io,
  path::{Path, PathBuf},
};

const DEFAULT_CONFIG_BASE_NAME: &str = "bidcheck";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Finds `bidcheck.yaml` in the working directory, preferring
/// `bidcheck.<env>.yaml` when an environment suffix is given or set through
/// `BIDCHECK_ENV` / `APP_ENV`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf, ConfigError> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Same as [`find_config_file`], searching `dir` instead of the working directory.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf, ConfigError> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("BIDCHECK_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = env_from_var.as_deref().filter(|s| !s.is_empty()) {
    files_to_check.push(format!(
      "{}.{}.{}",
      DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
    ));
  }
  files_to_check.push(format!("{}.{}", DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION));

  files_to_check
    .iter()
    .map(|file_name| dir.join(file_name))
    .find(|path| path.is_file())
    .ok_or_else(|| {
      ConfigError::NotFound(format!(
        "Searched for: {:?} in {:?}. Provide a config file or check BIDCHECK_ENV/APP_ENV.",
        files_to_check, dir
      ))
    })
}

/// Reads and validates an engine configuration file.
pub fn load_from_file(config_path: &Path) -> Result<EngineConfig, ConfigError> {
  let file = StdFsFile::open(config_path)?;
  let reader = io::BufReader::new(file);
  let raw_config: EngineConfigRaw =
    serde_yaml::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))?;
  let config = process_raw_config(raw_config)?;
  tracing::debug!(path = ?config_path, "engine configuration loaded");
  Ok(config)
}

/// Parses and validates an engine configuration held in memory.
pub fn from_yaml_str(yaml: &str) -> Result<EngineConfig, ConfigError> {
  let raw_config: EngineConfigRaw = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
  process_raw_config(raw_config)
}
