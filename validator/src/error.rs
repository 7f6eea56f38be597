use bidcheck_cache::BuildError;
use thiserror::Error;

/// A failure inside the validation engine itself, as opposed to a finding
/// about the request. Converted into a synthetic result by the validator.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("request must be a JSON object, found {found}")]
  MalformedRequest { found: &'static str },

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error("validation aborted unexpectedly: {0}")]
  Panicked(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
  #[error("unsupported schema version '{version}' (available: {available})")]
  UnsupportedVersion { version: String, available: String },

  #[error("invalid field spec '{path}': {reason}")]
  InvalidFieldSpec { path: String, reason: String },
}

/// Errors from parsing or applying a dotted field path such as `imp.0.banner.w`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
  #[error("field path is empty")]
  Empty,

  #[error("field path '{path}' has an empty segment at position {position}")]
  EmptySegment { path: String, position: usize },

  #[error("field path '{path}': index {index} is past the end of an array of length {len}")]
  IndexOutOfBounds { path: String, index: usize, len: usize },

  #[error("field path '{path}': segment '{segment}' addresses into a {found}")]
  NotAContainer {
    path: String,
    segment: String,
    found: &'static str,
  },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
  #[error("unknown template '{0}'")]
  UnknownTemplate(String),

  #[error("invalid override '{path}': {source}")]
  InvalidOverride {
    path: String,
    #[source]
    source: PathError,
  },
}

/// Configuration errors. These are programmer errors and surface at setup.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Configuration file not found: {0}")]
  NotFound(String),

  #[error("Failed to read configuration file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidValue { field: String, message: String },

  #[error("Invalid cache configuration for '{cache}': {source}")]
  Cache {
    cache: &'static str,
    #[source]
    source: BuildError,
  },

  #[error(transparent)]
  Logging(#[from] bidcheck_logging::Error),
}
