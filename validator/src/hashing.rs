//! Structural hashing used for cache keys and batch deduplication.
//!
//! Two values that differ only in object key order hash identically; arrays
//! keep their order. The hash is a 32-bit polynomial rolling hash, fast and
//! deliberately not cryptographic.

use serde_json::{Map, Value};
use std::fmt::Write;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Writes `value` as compact JSON with object keys sorted at every depth.
pub fn canonical_string(value: &Value) -> String {
  let mut out = String::new();
  write_canonical(value, &mut out);
  out
}

fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Object(map) => {
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort();
      out.push('{');
      for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_json_string(key, out);
        out.push(':');
        write_canonical(&map[key.as_str()], out);
      }
      out.push('}');
    }
    Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(item, out);
      }
      out.push(']');
    }
    // Scalars render through serde_json so escaping and number format match.
    scalar => {
      let _ = write!(out, "{}", scalar);
    }
  }
}

fn write_json_string(s: &str, out: &mut String) {
  let _ = write!(out, "{}", Value::String(s.to_string()));
}

/// A new value with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort();
      let mut sorted = Map::with_capacity(map.len());
      for key in keys {
        sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
      }
      Value::Object(sorted)
    }
    Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
    scalar => scalar.clone(),
  }
}

/// `h = h * 31 + unit` over the UTF-16 code units of `s`, wrapping at 32 bits.
pub fn rolling_hash(s: &str) -> i32 {
  s.encode_utf16()
    .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

pub fn to_base36(mut n: u64) -> String {
  if n == 0 {
    return "0".to_string();
  }
  let mut digits = Vec::new();
  while n > 0 {
    digits.push(BASE36_DIGITS[(n % 36) as usize]);
    n /= 36;
  }
  digits.reverse();
  digits.into_iter().map(char::from).collect()
}

/// Hashes an arbitrary string to the compact base-36 key form.
pub fn hash_str(s: &str) -> String {
  to_base36(u64::from(rolling_hash(s).unsigned_abs()))
}

/// The structural hash of a JSON value.
pub fn hash_structure(value: &Value) -> String {
  hash_str(&canonical_string(value))
}

fn copy_fields(source: &Value, fields: &[&str]) -> Option<Value> {
  let source = source.as_object()?;
  let projected: Map<String, Value> = fields
    .iter()
    .filter_map(|field| source.get(*field).map(|v| (field.to_string(), v.clone())))
    .collect();
  if projected.is_empty() {
    None
  } else {
    Some(Value::Object(projected))
  }
}

fn project_impression(imp: &Value) -> Value {
  let mut projected = Map::new();
  let formats: [(&str, &[&str]); 4] = [
    ("banner", &["w", "h", "format", "pos"]),
    ("video", &["w", "h", "mimes", "minduration", "maxduration", "protocols"]),
    ("audio", &["mimes", "minduration", "maxduration"]),
    ("native", &["request", "ver"]),
  ];
  for (format, fields) in formats {
    if let Some(sub) = imp.get(format) {
      // A format object with none of the projected fields still counts.
      let value = copy_fields(sub, fields).unwrap_or_else(|| Value::Object(Map::new()));
      projected.insert(format.to_string(), value);
    }
  }
  for field in ["bidfloor", "bidfloorcur"] {
    if let Some(v) = imp.get(field) {
      projected.insert(field.to_string(), v.clone());
    }
  }
  Value::Object(projected)
}

/// Hashes only the fields that affect the validation and bidding outcome, so
/// requests that differ cosmetically (e.g. in `id`) share a key.
pub fn request_dedup_key(request: &Value) -> String {
  let mut projected = Map::new();

  if let Some(imps) = request.get("imp").and_then(Value::as_array) {
    projected.insert(
      "imp".to_string(),
      Value::Array(imps.iter().map(project_impression).collect()),
    );
  }
  if let Some(site) = request.get("site").and_then(|s| copy_fields(s, &["id", "domain", "page"])) {
    projected.insert("site".to_string(), site);
  }
  if let Some(app) = request.get("app").and_then(|a| copy_fields(a, &["id", "bundle"])) {
    projected.insert("app".to_string(), app);
  }
  if let Some(device) = request.get("device").and_then(|d| copy_fields(d, &["devicetype"])) {
    projected.insert("device".to_string(), device);
  }
  for field in ["at", "tmax"] {
    if let Some(v) = request.get(field) {
      projected.insert(field.to_string(), v.clone());
    }
  }

  hash_structure(&Value::Object(projected))
}
