use std::fmt;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The cache was configured with `max_entries` of zero.
  ZeroCapacity,
  /// The cache was configured with a default time-to-live of zero. Entries
  /// that never expire are not supported.
  ZeroTtl,
  /// The background sweep thread could not be started.
  SweeperSpawn(String),
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ZeroCapacity => write!(f, "cache max_entries cannot be zero"),
      BuildError::ZeroTtl => write!(f, "cache default time-to-live cannot be zero"),
      BuildError::SweeperSpawn(reason) => {
        write!(f, "failed to start the cache sweep thread: {}", reason)
      }
    }
  }
}

impl std::error::Error for BuildError {}
