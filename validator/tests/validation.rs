use bidcheck::{BidValidator, ComplianceLevel, IssueCode, ValidateOptions};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn clean_request() -> Value {
  json!({
    "id": "req-1",
    "imp": [{
      "id": "1",
      "banner": {"w": 300, "h": 250, "pos": 1},
      "bidfloor": 0.5,
      "bidfloorcur": "USD",
      "secure": 1
    }],
    "site": {"id": "site-1", "domain": "example.com", "page": "https://example.com/news"},
    "device": {"ua": "Mozilla/5.0", "ip": "203.0.113.7", "devicetype": 2, "connectiontype": 2},
    "user": {"id": "user-1", "yob": 1988},
    "at": 2,
    "tmax": 500,
    "cur": ["USD"]
  })
}

fn validator() -> BidValidator {
  BidValidator::with_defaults().unwrap()
}

#[test]
fn clean_request_is_compliant() {
  let result = validator().validate_single(&clean_request(), &ValidateOptions::default());

  assert!(result.is_valid, "{:?}", result.errors);
  assert!(result.warnings.is_empty(), "{:?}", result.warnings);
  assert_eq!(result.compliance_level, ComplianceLevel::Compliant);
  assert_eq!(result.compliance_score, 100);
  assert_eq!(result.schema_version, "2.5");
  assert!(result.validated_field_paths.contains(&"imp.0.banner.w".to_string()));
  assert!(result.validation_id.starts_with("val_"));
}

#[test]
fn repeated_request_is_served_from_cache() {
  let validator = validator();
  let request = clean_request();

  let first = validator.validate_single(&request, &ValidateOptions::default());
  let second = validator.validate_single(&request, &ValidateOptions::default());

  assert!(!first.from_cache);
  assert!(second.from_cache);
  assert_eq!(first.errors, second.errors);
  assert_eq!(first.warnings, second.warnings);
  assert_eq!(first.compliance_score, second.compliance_score);
  assert_eq!(first.validation_id, second.validation_id);

  let stats = validator.cache_stats();
  assert_eq!(stats.validation.hit_count, 1);
  assert_eq!(stats.validation.miss_count, 1);
}

#[test]
fn key_order_does_not_defeat_the_cache() {
  let validator = validator();
  let a: Value = serde_json::from_str(r#"{"id":"x","imp":[{"id":"1","banner":{"w":300,"h":250}}],"tmax":500}"#).unwrap();
  let b: Value = serde_json::from_str(r#"{"tmax":500,"imp":[{"banner":{"h":250,"w":300},"id":"1"}],"id":"x"}"#).unwrap();

  assert!(!validator.validate_single(&a, &ValidateOptions::default()).from_cache);
  assert!(validator.validate_single(&b, &ValidateOptions::default()).from_cache);
}

#[test]
fn site_and_app_conflict() {
  let mut request = clean_request();
  request["app"] = json!({"id": "app-1", "bundle": "com.example.app"});

  let result = validator().validate_single(&request, &ValidateOptions::default());
  assert!(!result.is_valid);
  assert!(result.has_code(IssueCode::SiteAppConflict));
  assert_eq!(result.compliance_level, ComplianceLevel::NonCompliant);
}

#[test]
fn one_error_and_one_warning_score_seventy() {
  let mut request = clean_request();
  request["app"] = json!({"id": "app-1", "bundle": "com.example.app"});
  request["tmax"] = json!(50);

  let result = validator().validate_single(&request, &ValidateOptions::default());
  assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
  assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
  assert_eq!(result.warnings[0].code, IssueCode::TmaxTooLow);
  assert_eq!(result.compliance_score, 70);
}

#[test]
fn warnings_only_is_partial() {
  let mut request = clean_request();
  request["tmax"] = json!(5000);

  let result = validator().validate_single(&request, &ValidateOptions::default());
  assert!(result.is_valid);
  assert!(result.is_warning_only());
  assert_eq!(result.compliance_level, ComplianceLevel::Partial);
  assert_eq!(result.compliance_score, 95);
}

#[test]
fn empty_object_scores_zero() {
  let result = validator().validate_single(&json!({}), &ValidateOptions::default());

  assert!(!result.is_valid);
  assert!(result.has_code(IssueCode::MissingRequiredField));
  assert!(result.validated_field_paths.is_empty());
  assert_eq!(result.compliance_score, 0);
}

#[test]
fn non_object_becomes_engine_error_and_is_not_cached() {
  let validator = validator();
  for request in [Value::Null, json!([1, 2]), json!("request")] {
    let result = validator.validate_single(&request, &ValidateOptions::default());
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, IssueCode::ValidationEngineError);
    assert_eq!(result.compliance_score, 0);
    assert_eq!(result.compliance_level, ComplianceLevel::NonCompliant);
    assert!(!result.from_cache);
  }
  assert!(validator.caches().validation.is_empty());
}

#[test]
fn unknown_schema_version_becomes_engine_error() {
  let result = validator().validate_single(&clean_request(), &ValidateOptions::for_version("9.9"));

  assert!(result.has_code(IssueCode::ValidationEngineError));
  assert_eq!(result.schema_version, "9.9");
  assert!(result.errors[0].message.contains("9.9"));
}

#[test]
fn schema_version_is_part_of_the_key() {
  let validator = validator();
  let request = clean_request();

  validator.validate_single(&request, &ValidateOptions::default());
  let newer = validator.validate_single(&request, &ValidateOptions::for_version("2.6"));

  assert!(!newer.from_cache);
  assert_eq!(newer.schema_version, "2.6");
  assert!(newer.is_valid);
}

#[test]
fn cache_can_be_bypassed() {
  let validator = validator();
  let options = ValidateOptions::default().without_cache();

  assert!(!validator.validate_single(&clean_request(), &options).from_cache);
  assert!(!validator.validate_single(&clean_request(), &options).from_cache);
  assert!(validator.caches().validation.is_empty());
}

#[test]
fn clear_cache_forgets_results() {
  let validator = validator();
  let request = clean_request();
  validator.validate_single(&request, &ValidateOptions::default());

  validator.clear_cache();
  assert_eq!(validator.cache_stats().validation.hit_count, 0);
  assert!(!validator.validate_single(&request, &ValidateOptions::default()).from_cache);
}

#[test]
fn results_serialize_in_camel_case() {
  let mut request = clean_request();
  request["app"] = json!({"id": "app-1"});
  let result = validator().validate_single(&request, &ValidateOptions::default());

  let value = serde_json::to_value(&result).unwrap();
  assert_eq!(value["isValid"], json!(false));
  assert_eq!(value["complianceLevel"], json!("non-compliant"));
  assert_eq!(value["fromCache"], json!(false));
  assert_eq!(value["errors"][0]["code"], json!("SITE_APP_CONFLICT"));
  assert_eq!(value["errors"][0]["type"], json!("logical"));
  assert_eq!(value["errors"][0]["severity"], json!("error"));
}

#[test]
fn destroyed_validator_still_validates() {
  let validator = validator();
  validator.destroy();
  assert!(!validator.caches().validation.as_cache().is_sweeping());
  assert!(validator.validate_single(&clean_request(), &ValidateOptions::default()).is_valid);
}
