//! The structural shape of a bid request: which fields exist, their types,
//! which are required, and their bounds.

mod builtin;
mod provider;

pub use builtin::BuiltinSchemaProvider;
pub use provider::SchemaProvider;

use crate::error::SchemaError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
  String,
  Integer,
  Number,
  Object,
  Array,
  StringArray,
  IntegerArray,
}

impl FieldKind {
  pub fn matches(self, value: &Value) -> bool {
    match self {
      FieldKind::String => value.is_string(),
      FieldKind::Integer => value.is_i64() || value.is_u64(),
      FieldKind::Number => value.is_number(),
      FieldKind::Object => value.is_object(),
      FieldKind::Array => value.is_array(),
      FieldKind::StringArray => value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string)),
      FieldKind::IntegerArray => value
        .as_array()
        .is_some_and(|items| items.iter().all(|v| v.is_i64() || v.is_u64())),
    }
  }

  pub fn is_array(self) -> bool {
    matches!(self, FieldKind::Array | FieldKind::StringArray | FieldKind::IntegerArray)
  }

  pub fn name(self) -> &'static str {
    match self {
      FieldKind::String => "string",
      FieldKind::Integer => "integer",
      FieldKind::Number => "number",
      FieldKind::Object => "object",
      FieldKind::Array => "array",
      FieldKind::StringArray => "array of strings",
      FieldKind::IntegerArray => "array of integers",
    }
  }
}

/// One field of the schema.
///
/// `path` is dotted; a `*` segment stands for every element of an array, so
/// `imp.*.id` describes the `id` of each impression. A required field under
/// an optional parent is only required when the parent is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub path: String,
  pub kind: FieldKind,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_items: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub minimum: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maximum: Option<f64>,
  /// Bound and length violations are errors instead of warnings.
  #[serde(default)]
  pub strict: bool,
}

impl FieldSpec {
  pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
    Self {
      path: path.into(),
      kind,
      required: false,
      min_items: None,
      minimum: None,
      maximum: None,
      strict: false,
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn min_items(mut self, min_items: usize) -> Self {
    self.min_items = Some(min_items);
    self
  }

  pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
    self.minimum = minimum;
    self.maximum = maximum;
    self
  }

  pub fn strict(mut self) -> Self {
    self.strict = true;
    self
  }

  pub fn segments(&self) -> impl Iterator<Item = &str> {
    self.path.split('.')
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
  pub version: String,
  /// Parents are listed before their children.
  pub fields: Vec<FieldSpec>,
}

impl Schema {
  pub fn new(version: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
    let schema = Self {
      version: version.into(),
      fields,
    };
    schema.check()?;
    Ok(schema)
  }

  pub fn field(&self, path: &str) -> Option<&FieldSpec> {
    self.fields.iter().find(|f| f.path == path)
  }

  pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
    self.fields.iter().filter(|f| f.required)
  }

  fn check(&self) -> Result<(), SchemaError> {
    for spec in &self.fields {
      let invalid = |reason: &str| SchemaError::InvalidFieldSpec {
        path: spec.path.clone(),
        reason: reason.to_string(),
      };
      if spec.segments().any(str::is_empty) {
        return Err(invalid("empty path segment"));
      }
      if spec.min_items.is_some() && !spec.kind.is_array() {
        return Err(invalid("min_items on a non-array field"));
      }
      if let (Some(min), Some(max)) = (spec.minimum, spec.maximum) {
        if min > max {
          return Err(invalid("minimum exceeds maximum"));
        }
      }
    }
    Ok(())
  }
}
