//! Dotted field paths (`imp.0.banner.w`) parsed into segments and applied to
//! JSON values.

use crate::error::PathError;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
  Field(String),
  /// An all-digit segment addresses an array element.
  Index(usize),
}

impl fmt::Display for PathSegment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PathSegment::Field(name) => f.write_str(name),
      PathSegment::Index(index) => write!(f, "{}", index),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
  raw: String,
  segments: Vec<PathSegment>,
}

impl FieldPath {
  pub fn parse(path: &str) -> Result<Self, PathError> {
    if path.is_empty() {
      return Err(PathError::Empty);
    }

    let mut segments = Vec::new();
    for (position, part) in path.split('.').enumerate() {
      if part.is_empty() {
        return Err(PathError::EmptySegment {
          path: path.to_string(),
          position,
        });
      }
      let segment = if part.bytes().all(|b| b.is_ascii_digit()) {
        // Too many digits for an index: keep it as a plain key.
        part
          .parse::<usize>()
          .map_or_else(|_| PathSegment::Field(part.to_string()), PathSegment::Index)
      } else {
        PathSegment::Field(part.to_string())
      };
      segments.push(segment);
    }

    Ok(Self {
      raw: path.to_string(),
      segments,
    })
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.segments
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// Resolves the path against `root`. An `Index` segment also matches a
  /// numeric key of an object.
  pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
    self.segments.iter().try_fold(root, |current, segment| match (segment, current) {
      (PathSegment::Field(name), Value::Object(map)) => map.get(name),
      (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
      (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
      _ => None,
    })
  }

  /// Assigns `value` at the path inside `root`, creating missing objects and
  /// arrays along the way.
  ///
  /// An index equal to an array's length appends; a larger one is an error.
  /// A `null` on the way is replaced by the container the next segment needs.
  pub fn set(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = self.segments.split_last() else {
      return Err(PathError::Empty);
    };

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
      let next = &self.segments[i + 1];
      current = self.child_mut(current, segment, || empty_container_for(next))?;
    }

    match (last, current) {
      (PathSegment::Field(name), current) => {
        self.as_object_mut(current, name)?.insert(name.clone(), value);
      }
      (PathSegment::Index(index), Value::Object(map)) => {
        map.insert(index.to_string(), value);
      }
      (PathSegment::Index(index), current) => {
        let items = self.as_array_mut(current, *index)?;
        let len = items.len();
        if *index < len {
          items[*index] = value;
        } else if *index == len {
          items.push(value);
        } else {
          return Err(self.out_of_bounds(*index, len));
        }
      }
    }
    Ok(())
  }

  fn child_mut<'a>(
    &self,
    current: &'a mut Value,
    segment: &PathSegment,
    make_empty: impl Fn() -> Value,
  ) -> Result<&'a mut Value, PathError> {
    let child = match segment {
      PathSegment::Field(name) => self
        .as_object_mut(current, name)?
        .entry(name.clone())
        .or_insert_with(&make_empty),
      PathSegment::Index(index) if current.is_object() => self
        .as_object_mut(current, &index.to_string())?
        .entry(index.to_string())
        .or_insert_with(&make_empty),
      PathSegment::Index(index) => {
        let items = self.as_array_mut(current, *index)?;
        let len = items.len();
        if *index == len {
          items.push(make_empty());
        } else if *index > len {
          return Err(self.out_of_bounds(*index, len));
        }
        &mut items[*index]
      }
    };
    if child.is_null() {
      *child = make_empty();
    }
    Ok(child)
  }

  fn as_object_mut<'a>(
    &self,
    value: &'a mut Value,
    segment: &str,
  ) -> Result<&'a mut Map<String, Value>, PathError> {
    if value.is_null() {
      *value = Value::Object(Map::new());
    }
    let found = kind_name(value);
    value.as_object_mut().ok_or_else(|| PathError::NotAContainer {
      path: self.raw.clone(),
      segment: segment.to_string(),
      found,
    })
  }

  fn as_array_mut<'a>(&self, value: &'a mut Value, index: usize) -> Result<&'a mut Vec<Value>, PathError> {
    if value.is_null() {
      *value = Value::Array(Vec::new());
    }
    let found = kind_name(value);
    value.as_array_mut().ok_or_else(|| PathError::NotAContainer {
      path: self.raw.clone(),
      segment: index.to_string(),
      found,
    })
  }

  fn out_of_bounds(&self, index: usize, len: usize) -> PathError {
    PathError::IndexOutOfBounds {
      path: self.raw.clone(),
      index,
      len,
    }
  }
}

fn empty_container_for(segment: &PathSegment) -> Value {
  match segment {
    PathSegment::Field(_) => Value::Object(Map::new()),
    PathSegment::Index(_) => Value::Array(Vec::new()),
  }
}

/// Human-readable JSON type name, used in messages.
pub fn kind_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

impl FromStr for FieldPath {
  type Err = PathError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

/// Clones `base` and applies every `(path, value)` assignment to the copy.
/// `base` itself is never touched.
pub fn apply_overrides<'a, I>(base: &Value, overrides: I) -> Result<Value, (String, PathError)>
where
  I: IntoIterator<Item = (&'a String, &'a Value)>,
{
  let mut working = base.clone();
  for (path, value) in overrides {
    FieldPath::parse(path)
      .and_then(|parsed| parsed.set(&mut working, value.clone()))
      .map_err(|e| (path.clone(), e))?;
  }
  Ok(working)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn parses_fields_and_indexes() {
    let path = FieldPath::parse("imp.0.banner.w").unwrap();
    assert_eq!(
      path.segments(),
      &[
        PathSegment::Field("imp".into()),
        PathSegment::Index(0),
        PathSegment::Field("banner".into()),
        PathSegment::Field("w".into()),
      ]
    );
    assert_eq!(path.to_string(), "imp.0.banner.w");
  }

  #[test]
  fn rejects_empty_segments() {
    assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
    assert!(matches!(
      FieldPath::parse("imp..w"),
      Err(PathError::EmptySegment { position: 1, .. })
    ));
  }

  #[test]
  fn get_walks_objects_and_arrays() {
    let value = json!({"imp": [{"banner": {"w": 300}}]});
    let path: FieldPath = "imp.0.banner.w".parse().unwrap();
    assert_eq!(path.get(&value), Some(&json!(300)));
    assert_eq!(FieldPath::parse("imp.1.banner").unwrap().get(&value), None);
  }

  #[test]
  fn set_replaces_existing_leaf() {
    let mut value = json!({"imp": [{"banner": {"w": 300, "h": 250}}]});
    FieldPath::parse("imp.0.banner.w").unwrap().set(&mut value, json!(728)).unwrap();
    assert_eq!(value, json!({"imp": [{"banner": {"w": 728, "h": 250}}]}));
  }

  #[test]
  fn set_creates_missing_intermediates() {
    let mut value = json!({});
    FieldPath::parse("device.geo.country").unwrap().set(&mut value, json!("USA")).unwrap();
    FieldPath::parse("imp.0.id").unwrap().set(&mut value, json!("1")).unwrap();
    assert_eq!(value, json!({"device": {"geo": {"country": "USA"}}, "imp": [{"id": "1"}]}));
  }

  #[test]
  fn set_appends_at_len_and_rejects_gaps() {
    let mut value = json!({"cur": ["USD"]});
    FieldPath::parse("cur.1").unwrap().set(&mut value, json!("EUR")).unwrap();
    assert_eq!(value, json!({"cur": ["USD", "EUR"]}));

    let err = FieldPath::parse("cur.5").unwrap().set(&mut value, json!("GBP")).unwrap_err();
    assert_eq!(
      err,
      PathError::IndexOutOfBounds {
        path: "cur.5".into(),
        index: 5,
        len: 2
      }
    );
  }

  #[test]
  fn set_through_a_scalar_fails() {
    let mut value = json!({"tmax": 100});
    let err = FieldPath::parse("tmax.value").unwrap().set(&mut value, json!(1)).unwrap_err();
    assert!(matches!(err, PathError::NotAContainer { found: "number", .. }));
  }

  #[test]
  fn apply_overrides_leaves_base_untouched() {
    let base = json!({"imp": [{"bidfloor": 1.0}]});
    let overrides = serde_json::Map::from_iter([("imp.0.bidfloor".to_string(), json!(2.5))]);
    let result = apply_overrides(&base, &overrides).unwrap();
    assert_eq!(result, json!({"imp": [{"bidfloor": 2.5}]}));
    assert_eq!(base, json!({"imp": [{"bidfloor": 1.0}]}));
  }
}
