use super::Schema;
use crate::error::SchemaError;

use std::fmt;

/// Supplies schemas by version. The validator caches what it returns.
pub trait SchemaProvider: Send + Sync + fmt::Debug {
  fn load(&self, version: &str) -> Result<Schema, SchemaError>;

  /// Versions this provider can load.
  fn versions(&self) -> Vec<String>;

  fn supports(&self, version: &str) -> bool {
    self.versions().iter().any(|v| v == version)
  }
}
