//! Validation findings, results and the scoring that summarizes them.

use crate::error::EngineError;
use crate::hashing;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-checkable identifier of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
  MissingRequiredField,
  InvalidFieldType,
  ArrayTooShort,
  ValueBelowMinimum,
  ValueAboveMaximum,
  DuplicateImpressionId,
  MissingAdFormat,
  InvalidCurrency,
  SiteAppConflict,
  InvalidBooleanFlag,
  InvalidBirthYear,
  TmaxTooLow,
  TmaxTooHigh,
  InvalidAuctionType,
  InvalidDeviceType,
  InvalidConnectionType,
  InvalidBannerPosition,
  NonPositiveDimension,
  NegativeBidFloor,
  NonStandardBannerSize,
  MinExceedsMax,
  ValidationEngineError,
}

impl IssueCode {
  pub fn as_str(self) -> &'static str {
    match self {
      IssueCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
      IssueCode::InvalidFieldType => "INVALID_FIELD_TYPE",
      IssueCode::ArrayTooShort => "ARRAY_TOO_SHORT",
      IssueCode::ValueBelowMinimum => "VALUE_BELOW_MINIMUM",
      IssueCode::ValueAboveMaximum => "VALUE_ABOVE_MAXIMUM",
      IssueCode::DuplicateImpressionId => "DUPLICATE_IMPRESSION_ID",
      IssueCode::MissingAdFormat => "MISSING_AD_FORMAT",
      IssueCode::InvalidCurrency => "INVALID_CURRENCY",
      IssueCode::SiteAppConflict => "SITE_APP_CONFLICT",
      IssueCode::InvalidBooleanFlag => "INVALID_BOOLEAN_FLAG",
      IssueCode::InvalidBirthYear => "INVALID_BIRTH_YEAR",
      IssueCode::TmaxTooLow => "TMAX_TOO_LOW",
      IssueCode::TmaxTooHigh => "TMAX_TOO_HIGH",
      IssueCode::InvalidAuctionType => "INVALID_AUCTION_TYPE",
      IssueCode::InvalidDeviceType => "INVALID_DEVICE_TYPE",
      IssueCode::InvalidConnectionType => "INVALID_CONNECTION_TYPE",
      IssueCode::InvalidBannerPosition => "INVALID_BANNER_POSITION",
      IssueCode::NonPositiveDimension => "NON_POSITIVE_DIMENSION",
      IssueCode::NegativeBidFloor => "NEGATIVE_BID_FLOOR",
      IssueCode::NonStandardBannerSize => "NON_STANDARD_BANNER_SIZE",
      IssueCode::MinExceedsMax => "MIN_EXCEEDS_MAX",
      IssueCode::ValidationEngineError => "VALIDATION_ENGINE_ERROR",
    }
  }
}

impl fmt::Display for IssueCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Classification of a blocking finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
  RequiredField,
  Schema,
  Value,
  Logical,
  Format,
}

/// Errors are always blocking; warnings carry no severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  #[default]
  Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceLevel {
  Compliant,
  Partial,
  NonCompliant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
  pub field: String,
  pub message: String,
  pub severity: Severity,
  pub code: IssueCode,
  #[serde(rename = "type")]
  pub error_type: ErrorType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actual_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expected_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
}

impl ValidationError {
  pub fn new(
    field: impl Into<String>,
    code: IssueCode,
    error_type: ErrorType,
    message: impl Into<String>,
  ) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
      severity: Severity::Error,
      code,
      error_type,
      actual_value: None,
      expected_value: None,
      suggestion: None,
    }
  }

  pub fn actual(mut self, value: impl Into<Value>) -> Self {
    self.actual_value = Some(value.into());
    self
  }

  pub fn expected(mut self, value: impl Into<Value>) -> Self {
    self.expected_value = Some(value.into());
    self
  }

  pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
    self.suggestion = Some(suggestion.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
  pub field: String,
  pub message: String,
  pub code: IssueCode,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actual_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expected_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub recommended_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
}

impl ValidationWarning {
  pub fn new(field: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
      code,
      actual_value: None,
      expected_value: None,
      recommended_value: None,
      suggestion: None,
    }
  }

  pub fn actual(mut self, value: impl Into<Value>) -> Self {
    self.actual_value = Some(value.into());
    self
  }

  pub fn expected(mut self, value: impl Into<Value>) -> Self {
    self.expected_value = Some(value.into());
    self
  }

  pub fn recommend(mut self, value: impl Into<Value>) -> Self {
    self.recommended_value = Some(value.into());
    self
  }

  pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
    self.suggestion = Some(suggestion.into());
    self
  }
}

/// Everything the rule engine found for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
  /// Concrete paths of every present field the structural rules checked.
  pub validated_field_paths: Vec<String>,
}

/// Point deductions per finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
  pub error_penalty: u32,
  pub warning_penalty: u32,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      error_penalty: 25,
      warning_penalty: 5,
    }
  }
}

impl ScoringConfig {
  /// `100 - errors * error_penalty - warnings * warning_penalty`, clamped to
  /// 0..=100. Zero when no field was validated at all.
  pub fn score(&self, errors: usize, warnings: usize, validated_fields: usize) -> u8 {
    if validated_fields == 0 {
      return 0;
    }
    let deduction = (errors as u64)
      .saturating_mul(u64::from(self.error_penalty))
      .saturating_add((warnings as u64).saturating_mul(u64::from(self.warning_penalty)));
    100u64.saturating_sub(deduction) as u8
  }
}

pub fn compliance_level(errors: usize, warnings: usize) -> ComplianceLevel {
  match (errors, warnings) {
    (0, 0) => ComplianceLevel::Compliant,
    (0, _) => ComplianceLevel::Partial,
    _ => ComplianceLevel::NonCompliant,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
  pub is_valid: bool,
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
  pub compliance_level: ComplianceLevel,
  pub compliance_score: u8,
  pub validated_field_paths: Vec<String>,
  pub timestamp: DateTime<Utc>,
  pub validation_id: String,
  pub schema_version: String,
  pub from_cache: bool,
}

impl ValidationResult {
  /// Scores a rule outcome and stamps it with a fresh id and timestamp.
  pub fn assemble(outcome: RuleOutcome, scoring: &ScoringConfig, schema_version: &str) -> Self {
    let errors = outcome.errors.len();
    let warnings = outcome.warnings.len();
    Self {
      is_valid: errors == 0,
      compliance_level: compliance_level(errors, warnings),
      compliance_score: scoring.score(errors, warnings, outcome.validated_field_paths.len()),
      errors: outcome.errors,
      warnings: outcome.warnings,
      validated_field_paths: outcome.validated_field_paths,
      timestamp: Utc::now(),
      validation_id: new_validation_id(),
      schema_version: schema_version.to_string(),
      from_cache: false,
    }
  }

  /// The single-error result reported when the engine itself failed.
  pub fn engine_failure(error: &EngineError, schema_version: &str) -> Self {
    let error_type = match error {
      EngineError::MalformedRequest { .. } => ErrorType::Format,
      EngineError::Schema(_) => ErrorType::Schema,
      EngineError::Panicked(_) => ErrorType::Logical,
    };
    let failure = ValidationError::new(
      "request",
      IssueCode::ValidationEngineError,
      error_type,
      format!("Validation could not be completed: {}", error),
    )
    .suggest("Ensure the request is a well-formed OpenRTB JSON object");

    Self {
      is_valid: false,
      errors: vec![failure],
      warnings: Vec::new(),
      compliance_level: ComplianceLevel::NonCompliant,
      compliance_score: 0,
      validated_field_paths: Vec::new(),
      timestamp: Utc::now(),
      validation_id: new_validation_id(),
      schema_version: schema_version.to_string(),
      from_cache: false,
    }
  }

  pub fn has_code(&self, code: IssueCode) -> bool {
    self.errors.iter().any(|e| e.code == code) || self.warnings.iter().any(|w| w.code == code)
  }

  /// Valid, but with at least one warning.
  pub fn is_warning_only(&self) -> bool {
    self.is_valid && !self.warnings.is_empty()
  }
}

/// `val_<millis>_<random>`, unique enough for log correlation.
fn new_validation_id() -> String {
  let suffix: u64 = rand::rng().random();
  format!(
    "val_{}_{}",
    hashing::to_base36(Utc::now().timestamp_millis().max(0) as u64),
    hashing::to_base36(suffix)
  )
}

/// How often a code occurred in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFrequency {
  pub code: IssueCode,
  pub count: usize,
  /// `count` relative to the number of requests in the batch, in percent.
  pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
  pub total: usize,
  pub valid: usize,
  pub invalid: usize,
  pub warning_only: usize,
  /// Results served from the validation cache.
  pub cache_hits: usize,
  /// Requests answered by another identical request of the same batch.
  pub duplicates: usize,
  pub average_score: f64,
  pub top_error_codes: Vec<CodeFrequency>,
  pub top_warning_codes: Vec<CodeFrequency>,
  pub duration_ms: u64,
}

const TOP_CODES: usize = 10;

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

fn top_codes(codes: impl Iterator<Item = IssueCode>, total: usize) -> Vec<CodeFrequency> {
  let mut counts: BTreeMap<IssueCode, usize> = BTreeMap::new();
  for code in codes {
    *counts.entry(code).or_default() += 1;
  }
  let mut ranked: Vec<(IssueCode, usize)> = counts.into_iter().collect();
  // Most frequent first; ties keep code order so the output is stable.
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
  ranked
    .into_iter()
    .take(TOP_CODES)
    .map(|(code, count)| CodeFrequency {
      code,
      count,
      percentage: if total == 0 {
        0.0
      } else {
        round2(count as f64 / total as f64 * 100.0)
      },
    })
    .collect()
}

impl BatchSummary {
  pub fn from_results(results: &[ValidationResult], duplicates: usize, cache_hits: usize, elapsed: Duration) -> Self {
    let total = results.len();
    let valid = results.iter().filter(|r| r.is_valid).count();
    let score_sum: u64 = results.iter().map(|r| u64::from(r.compliance_score)).sum();

    Self {
      total,
      valid,
      invalid: total - valid,
      warning_only: results.iter().filter(|r| r.is_warning_only()).count(),
      cache_hits,
      duplicates,
      average_score: if total == 0 {
        0.0
      } else {
        round2(score_sum as f64 / total as f64)
      },
      top_error_codes: top_codes(results.iter().flat_map(|r| r.errors.iter().map(|e| e.code)), total),
      top_warning_codes: top_codes(results.iter().flat_map(|r| r.warnings.iter().map(|w| w.code)), total),
      duration_ms: elapsed.as_millis() as u64,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationResult {
  /// One result per request, in input order.
  pub results: Vec<ValidationResult>,
  pub summary: BatchSummary,
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn outcome(errors: usize, warnings: usize, fields: usize) -> RuleOutcome {
    RuleOutcome {
      errors: (0..errors)
        .map(|i| ValidationError::new(format!("f{}", i), IssueCode::MissingAdFormat, ErrorType::RequiredField, "x"))
        .collect(),
      warnings: (0..warnings)
        .map(|i| ValidationWarning::new(format!("w{}", i), IssueCode::TmaxTooLow, "y"))
        .collect(),
      validated_field_paths: (0..fields).map(|i| format!("p{}", i)).collect(),
    }
  }

  #[test]
  fn one_error_and_one_warning_scores_70() {
    let result = ValidationResult::assemble(outcome(1, 1, 3), &ScoringConfig::default(), "2.5");
    assert_eq!(result.compliance_score, 70);
    assert_eq!(result.compliance_level, ComplianceLevel::NonCompliant);
    assert!(!result.is_valid);
  }

  #[test]
  fn score_clamps_and_zeroes_without_fields() {
    let scoring = ScoringConfig::default();
    assert_eq!(scoring.score(10, 0, 5), 0);
    assert_eq!(scoring.score(0, 0, 0), 0);
    assert_eq!(scoring.score(0, 0, 1), 100);
    assert_eq!(scoring.score(0, 3, 1), 85);
  }

  #[test]
  fn custom_penalties_apply() {
    let scoring = ScoringConfig {
      error_penalty: 40,
      warning_penalty: 1,
    };
    assert_eq!(scoring.score(1, 2, 1), 58);
  }

  #[test]
  fn level_mapping() {
    assert_eq!(compliance_level(0, 0), ComplianceLevel::Compliant);
    assert_eq!(compliance_level(0, 4), ComplianceLevel::Partial);
    assert_eq!(compliance_level(1, 0), ComplianceLevel::NonCompliant);
    assert_eq!(compliance_level(2, 7), ComplianceLevel::NonCompliant);
  }

  #[test]
  fn engine_failure_shape() {
    let result = ValidationResult::engine_failure(&EngineError::MalformedRequest { found: "null" }, "2.5");
    assert!(!result.is_valid);
    assert_eq!(result.compliance_score, 0);
    assert_eq!(result.compliance_level, ComplianceLevel::NonCompliant);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, IssueCode::ValidationEngineError);
  }

  #[test]
  fn serializes_camel_case_with_type_tag() {
    let result = ValidationResult::assemble(outcome(1, 0, 1), &ScoringConfig::default(), "2.5");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["isValid"], false);
    assert_eq!(json["complianceLevel"], "non-compliant");
    assert_eq!(json["errors"][0]["type"], "required-field");
    assert_eq!(json["errors"][0]["severity"], "error");
    assert_eq!(json["errors"][0]["code"], "MISSING_AD_FORMAT");
    assert_eq!(json["fromCache"], false);
  }

  #[test]
  fn summary_counts_and_top_codes() {
    let scoring = ScoringConfig::default();
    let results = vec![
      ValidationResult::assemble(outcome(0, 0, 1), &scoring, "2.5"),
      ValidationResult::assemble(outcome(0, 1, 1), &scoring, "2.5"),
      ValidationResult::assemble(outcome(2, 0, 1), &scoring, "2.5"),
      ValidationResult::assemble(outcome(1, 1, 1), &scoring, "2.5"),
    ];
    let summary = BatchSummary::from_results(&results, 1, 0, Duration::from_millis(12));
    assert_eq!(summary.total, 4);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.invalid, 2);
    assert_eq!(summary.warning_only, 1);
    assert_eq!(summary.duplicates, 1);
    // 100 + 95 + 50 + 70
    assert_eq!(summary.average_score, 78.75);
    assert_eq!(
      summary.top_error_codes,
      vec![CodeFrequency {
        code: IssueCode::MissingAdFormat,
        count: 3,
        percentage: 75.0
      }]
    );
    assert_eq!(summary.top_warning_codes[0].count, 2);
    assert_eq!(summary.top_warning_codes[0].percentage, 50.0);
  }

  #[test]
  fn top_codes_are_capped_and_ranked_by_count() {
    let codes = [
      IssueCode::MissingRequiredField,
      IssueCode::InvalidFieldType,
      IssueCode::ArrayTooShort,
      IssueCode::ValueBelowMinimum,
      IssueCode::ValueAboveMaximum,
      IssueCode::DuplicateImpressionId,
      IssueCode::MissingAdFormat,
      IssueCode::SiteAppConflict,
      IssueCode::InvalidAuctionType,
      IssueCode::NonPositiveDimension,
      IssueCode::NegativeBidFloor,
      IssueCode::MinExceedsMax,
    ];
    // Result `j` carries every code from index `j` on, so code `i` occurs
    // `i + 1` times: the rarest codes come first in declaration order.
    let results: Vec<ValidationResult> = (0..codes.len())
      .map(|j| {
        let outcome = RuleOutcome {
          errors: codes[j..]
            .iter()
            .map(|&code| ValidationError::new("f", code, ErrorType::Value, "x"))
            .collect(),
          warnings: Vec::new(),
          validated_field_paths: vec!["f".to_string()],
        };
        ValidationResult::assemble(outcome, &ScoringConfig::default(), "2.5")
      })
      .collect();

    let summary = BatchSummary::from_results(&results, 0, 0, Duration::ZERO);
    let total = results.len() as f64;

    assert_eq!(summary.top_error_codes.len(), TOP_CODES);
    let ranked: Vec<(IssueCode, usize)> = summary.top_error_codes.iter().map(|f| (f.code, f.count)).collect();
    let expected: Vec<(IssueCode, usize)> = (2..codes.len()).rev().map(|i| (codes[i], i + 1)).collect();
    assert_eq!(ranked, expected);
    for frequency in &summary.top_error_codes {
      assert_eq!(frequency.percentage, round2(frequency.count as f64 / total * 100.0));
    }
    assert_eq!(summary.top_error_codes[0].percentage, 100.0);
    assert!(summary.top_warning_codes.is_empty());
  }
}
