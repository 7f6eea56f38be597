//! Rules relating fields to each other or to sane ranges.

use super::{impressions, integer, is_present, object, Findings, RuleSet};
use crate::report::{ErrorType, IssueCode, ValidationError, ValidationWarning};

use chrono::{Datelike, Utc};
use serde_json::{json, Map, Value};

pub const TMAX_MIN_MS: i64 = 100;
pub const TMAX_MAX_MS: i64 = 3000;
pub const MIN_BIRTH_YEAR: i64 = 1900;

#[derive(Debug, Default, Clone, Copy)]
pub struct CrossFieldRules;

impl RuleSet for CrossFieldRules {
  fn name(&self) -> &'static str {
    "cross-field"
  }

  fn check(&self, request: &Map<String, Value>, findings: &mut Findings) {
    if is_present(request, "site") && is_present(request, "app") {
      findings.error(
        ValidationError::new(
          "site",
          IssueCode::SiteAppConflict,
          ErrorType::Logical,
          "A request may describe a site or an app, not both",
        )
        .suggest("Remove either the site or the app object"),
      );
    }

    check_flag(request, "test", "test", findings);
    check_flag(request, "allimps", "allimps", findings);
    for (i, imp) in impressions(request) {
      check_flag(imp, "instl", &format!("imp.{}.instl", i), findings);
      check_flag(imp, "secure", &format!("imp.{}.secure", i), findings);
    }
    if let Some(regs) = object(request, "regs") {
      check_flag(regs, "coppa", "regs.coppa", findings);
    }
    if let Some(device) = object(request, "device") {
      check_flag(device, "dnt", "device.dnt", findings);
      check_flag(device, "lmt", "device.lmt", findings);
    }

    if let Some(yob) = object(request, "user").and_then(|user| integer(user, "yob")) {
      let current_year = i64::from(Utc::now().year());
      if !(MIN_BIRTH_YEAR..=current_year).contains(&yob) {
        findings.warning(
          ValidationWarning::new(
            "user.yob",
            IssueCode::InvalidBirthYear,
            format!("Birth year {} is outside {}..={}", yob, MIN_BIRTH_YEAR, current_year),
          )
          .actual(yob)
          .expected(json!({"min": MIN_BIRTH_YEAR, "max": current_year}))
          .suggest("Send a four-digit birth year or omit the field"),
        );
      }
    }

    if let Some(tmax) = integer(request, "tmax") {
      if tmax < TMAX_MIN_MS {
        findings.warning(
          ValidationWarning::new(
            "tmax",
            IssueCode::TmaxTooLow,
            format!("tmax of {} ms leaves bidders little time and may reduce responses", tmax),
          )
          .actual(tmax)
          .recommend(TMAX_MIN_MS),
        );
      } else if tmax > TMAX_MAX_MS {
        findings.warning(
          ValidationWarning::new(
            "tmax",
            IssueCode::TmaxTooHigh,
            format!("tmax of {} ms may slow down ad serving", tmax),
          )
          .actual(tmax)
          .recommend(TMAX_MAX_MS),
        );
      }
    }
  }
}

/// Boolean-like integer flags must be 0 or 1.
fn check_flag(parent: &Map<String, Value>, key: &str, path: &str, findings: &mut Findings) {
  if let Some(value) = integer(parent, key) {
    if value != 0 && value != 1 {
      findings.warning(
        ValidationWarning::new(path, IssueCode::InvalidBooleanFlag, format!("'{}' should be 0 or 1, found {}", path, value))
          .actual(value)
          .expected(json!([0, 1])),
      );
    }
  }
}
