//! Schema/type checks: required fields, JSON types, array lengths and
//! numeric bounds.

use super::Findings;
use crate::path::kind_name;
use crate::report::{ErrorType, IssueCode, ValidationError, ValidationWarning};
use crate::schema::{FieldSpec, Schema};

use serde_json::Value;

/// Expands a spec path against `value`. Present fields resolve to
/// `Some(value)`; a missing (or `null`) last segment under a present parent
/// resolves to `None`. Paths through missing or mistyped parents resolve to
/// nothing at all.
fn resolve<'a>(
  value: &'a Value,
  segments: &[&str],
  prefix: &str,
  out: &mut Vec<(String, Option<&'a Value>)>,
) {
  let Some((segment, rest)) = segments.split_first() else {
    out.push((prefix.to_string(), Some(value)));
    return;
  };

  let join = |name: &str| {
    if prefix.is_empty() {
      name.to_string()
    } else {
      format!("{}.{}", prefix, name)
    }
  };

  if *segment == "*" {
    if let Value::Array(items) = value {
      for (i, item) in items.iter().enumerate() {
        resolve(item, rest, &join(&i.to_string()), out);
      }
    }
    return;
  }

  if let Value::Object(map) = value {
    match map.get(*segment) {
      Some(child) if !child.is_null() => resolve(child, rest, &join(segment), out),
      _ if rest.is_empty() => out.push((join(segment), None)),
      _ => {}
    }
  }
}

pub fn check_structure(schema: &Schema, request: &Value, findings: &mut Findings) {
  let mut matches = Vec::new();
  for spec in &schema.fields {
    let segments: Vec<&str> = spec.segments().collect();
    matches.clear();
    resolve(request, &segments, "", &mut matches);

    for (path, value) in matches.drain(..) {
      match value {
        None if spec.required => findings.error(
          ValidationError::new(
            path.as_str(),
            IssueCode::MissingRequiredField,
            ErrorType::RequiredField,
            format!("Required field '{}' is missing", path),
          )
          .expected(spec.kind.name())
          .suggest(format!("Add the '{}' field", path)),
        ),
        None => {}
        Some(value) => check_value(spec, &path, value, findings),
      }
    }
  }
}

fn check_value(spec: &FieldSpec, path: &str, value: &Value, findings: &mut Findings) {
  findings.validated(path);

  if !spec.kind.matches(value) {
    findings.error(
      ValidationError::new(
        path,
        IssueCode::InvalidFieldType,
        ErrorType::Schema,
        format!("Field '{}' must be {}, found {}", path, spec.kind.name(), kind_name(value)),
      )
      .actual(value.clone())
      .expected(spec.kind.name()),
    );
    return;
  }

  if let (Some(min_items), Some(items)) = (spec.min_items, value.as_array()) {
    if items.len() < min_items {
      let message = format!(
        "Field '{}' must contain at least {} item(s), found {}",
        path,
        min_items,
        items.len()
      );
      report_bound(spec, path, IssueCode::ArrayTooShort, message, items.len().into(), min_items.into(), findings);
    }
  }

  if let Some(number) = value.as_f64() {
    if let Some(minimum) = spec.minimum.filter(|min| number < *min) {
      let message = format!("Field '{}' must be at least {}, found {}", path, minimum, number);
      report_bound(spec, path, IssueCode::ValueBelowMinimum, message, value.clone(), minimum.into(), findings);
    }
    if let Some(maximum) = spec.maximum.filter(|max| number > *max) {
      let message = format!("Field '{}' must be at most {}, found {}", path, maximum, number);
      report_bound(spec, path, IssueCode::ValueAboveMaximum, message, value.clone(), maximum.into(), findings);
    }
  }
}

fn report_bound(
  spec: &FieldSpec,
  path: &str,
  code: IssueCode,
  message: String,
  actual: Value,
  expected: Value,
  findings: &mut Findings,
) {
  if spec.strict {
    findings.error(
      ValidationError::new(path, code, ErrorType::Value, message)
        .actual(actual)
        .expected(expected),
    );
  } else {
    findings.warning(
      ValidationWarning::new(path, code, message)
        .actual(actual)
        .recommend(expected),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::IssueCode;
  use crate::schema::{BuiltinSchemaProvider, FieldKind, SchemaProvider};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  fn run(request: &Value) -> crate::report::RuleOutcome {
    let schema = BuiltinSchemaProvider::new().load("2.5").unwrap();
    let mut findings = Findings::default();
    check_structure(&schema, request, &mut findings);
    findings.into_outcome()
  }

  #[test]
  fn missing_required_fields() {
    let outcome = run(&json!({}));
    let fields: Vec<_> = outcome.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["id", "imp"]);
    assert!(outcome
      .errors
      .iter()
      .all(|e| e.code == IssueCode::MissingRequiredField && e.error_type == ErrorType::RequiredField));
    assert!(outcome.validated_field_paths.is_empty());
  }

  #[test]
  fn wildcard_paths_are_checked_per_element() {
    let outcome = run(&json!({"id": "r", "imp": [{"id": "1"}, {"tagid": "x"}]}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "imp.1.id");
    assert!(outcome.validated_field_paths.contains(&"imp.0.id".to_string()));
    assert!(outcome.validated_field_paths.contains(&"imp.1.tagid".to_string()));
  }

  #[test]
  fn type_mismatch_is_a_schema_error() {
    let outcome = run(&json!({"id": 42, "imp": [{"id": "1"}]}));
    assert_eq!(outcome.errors.len(), 1);
    let error = &outcome.errors[0];
    assert_eq!(error.field, "id");
    assert_eq!(error.code, IssueCode::InvalidFieldType);
    assert_eq!(error.error_type, ErrorType::Schema);
    assert_eq!(error.actual_value, Some(json!(42)));
  }

  #[test]
  fn empty_impression_array_is_an_error() {
    let outcome = run(&json!({"id": "r", "imp": []}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, IssueCode::ArrayTooShort);
  }

  #[test]
  fn soft_bounds_produce_warnings() {
    let outcome = run(&json!({"id": "r", "imp": [{"id": "1"}], "device": {"geo": {"lat": 123.0}}}));
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].field, "device.geo.lat");
    assert_eq!(outcome.warnings[0].code, IssueCode::ValueAboveMaximum);
  }

  #[test]
  fn null_counts_as_missing() {
    let outcome = run(&json!({"id": null, "imp": [{"id": "1"}], "site": null}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, IssueCode::MissingRequiredField);
  }

  #[test]
  fn required_children_of_absent_parents_are_skipped() {
    let outcome = run(&json!({"id": "r", "imp": [{"id": "1", "video": {"w": 640}}]}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "imp.0.video.mimes");
  }

  #[test]
  fn custom_strict_bound() {
    let schema = Schema::new(
      "custom",
      vec![FieldSpec::new("tmax", FieldKind::Integer).range(Some(10.0), None).strict()],
    )
    .unwrap();
    let mut findings = Findings::default();
    check_structure(&schema, &json!({"tmax": 5}), &mut findings);
    assert_eq!(findings.errors().len(), 1);
    assert_eq!(findings.errors()[0].error_type, ErrorType::Value);
  }
}
