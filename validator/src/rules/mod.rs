//! The rule engine: structural checks against a [`Schema`] followed by the
//! business, cross-field, enumerated-value and constraint rule sets.
//!
//! Rules never fail; they report findings into a [`Findings`] collector.

pub mod business;
pub mod constraints;
pub mod cross_field;
pub mod enums;
pub mod structural;

use crate::error::EngineError;
use crate::path::kind_name;
use crate::report::{RuleOutcome, ValidationError, ValidationWarning};
use crate::schema::Schema;

use std::fmt;

use serde_json::{Map, Value};

/// An independently evaluable group of rules over a request object.
pub trait RuleSet: Send + Sync + fmt::Debug {
  fn name(&self) -> &'static str;

  fn check(&self, request: &Map<String, Value>, findings: &mut Findings);
}

/// Collects the errors, warnings and checked paths of one validation run.
#[derive(Debug, Default)]
pub struct Findings {
  errors: Vec<ValidationError>,
  warnings: Vec<ValidationWarning>,
  validated: Vec<String>,
}

impl Findings {
  pub fn error(&mut self, error: ValidationError) {
    self.errors.push(error);
  }

  pub fn warning(&mut self, warning: ValidationWarning) {
    self.warnings.push(warning);
  }

  /// Records that a present field was checked.
  pub fn validated(&mut self, path: impl Into<String>) {
    self.validated.push(path.into());
  }

  pub fn errors(&self) -> &[ValidationError] {
    &self.errors
  }

  pub fn warnings(&self) -> &[ValidationWarning] {
    &self.warnings
  }

  pub fn into_outcome(self) -> RuleOutcome {
    RuleOutcome {
      errors: self.errors,
      warnings: self.warnings,
      validated_field_paths: self.validated,
    }
  }
}

/// Runs the structural checks and every registered rule set.
#[derive(Debug)]
pub struct RuleEngine {
  rule_sets: Vec<Box<dyn RuleSet>>,
}

impl Default for RuleEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl RuleEngine {
  /// An engine with the standard rule sets.
  pub fn new() -> Self {
    Self::empty()
      .with_rule_set(business::BusinessRules)
      .with_rule_set(cross_field::CrossFieldRules)
      .with_rule_set(enums::EnumeratedRules)
      .with_rule_set(constraints::ConstraintRules)
  }

  /// An engine that only runs the structural checks.
  pub fn empty() -> Self {
    Self { rule_sets: Vec::new() }
  }

  pub fn with_rule_set(mut self, rule_set: impl RuleSet + 'static) -> Self {
    self.rule_sets.push(Box::new(rule_set));
    self
  }

  pub fn rule_set_names(&self) -> Vec<&'static str> {
    self.rule_sets.iter().map(|set| set.name()).collect()
  }

  pub fn validate(&self, request: &Value, schema: &Schema) -> Result<RuleOutcome, EngineError> {
    let root = request.as_object().ok_or(EngineError::MalformedRequest {
      found: kind_name(request),
    })?;

    let mut findings = Findings::default();
    structural::check_structure(schema, request, &mut findings);
    for rule_set in &self.rule_sets {
      rule_set.check(root, &mut findings);
    }

    tracing::trace!(
      errors = findings.errors.len(),
      warnings = findings.warnings.len(),
      fields = findings.validated.len(),
      "rule engine finished"
    );
    Ok(findings.into_outcome())
  }
}

// --- Accessors shared by the rule sets ---

/// The impression objects of a request with their indexes. Entries that are
/// not objects are skipped; the structural checks report them.
pub(crate) fn impressions(request: &Map<String, Value>) -> impl Iterator<Item = (usize, &Map<String, Value>)> {
  request
    .get("imp")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .enumerate()
    .filter_map(|(i, imp)| imp.as_object().map(|obj| (i, obj)))
}

pub(crate) fn object<'a>(parent: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
  parent.get(key).and_then(Value::as_object)
}

pub(crate) fn integer(parent: &Map<String, Value>, key: &str) -> Option<i64> {
  parent.get(key).and_then(Value::as_i64)
}

pub(crate) fn number(parent: &Map<String, Value>, key: &str) -> Option<f64> {
  parent.get(key).and_then(Value::as_f64)
}

/// Present and not `null`.
pub(crate) fn is_present(parent: &Map<String, Value>, key: &str) -> bool {
  parent.get(key).is_some_and(|v| !v.is_null())
}
