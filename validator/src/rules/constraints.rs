//! Numeric constraints: positive dimensions, non-negative floors, standard
//! banner sizes and min/max pairs.

use super::{impressions, number, object, Findings, RuleSet};
use crate::report::{ErrorType, IssueCode, ValidationError, ValidationWarning};

use serde_json::{json, Map, Value};

/// IAB standard display sizes, `(width, height)`.
pub const STANDARD_BANNER_SIZES: &[(i64, i64)] = &[
  (300, 250),
  (728, 90),
  (160, 600),
  (300, 600),
  (320, 50),
  (320, 100),
  (300, 50),
  (970, 90),
  (970, 250),
  (468, 60),
  (234, 60),
  (120, 600),
  (250, 250),
  (200, 200),
  (336, 280),
  (180, 150),
  (125, 125),
  (120, 240),
  (300, 1050),
  (320, 480),
  (480, 320),
  (768, 1024),
  (1024, 768),
  (88, 31),
];

const BANNER_PAIRS: [(&str, &str); 2] = [("wmin", "wmax"), ("hmin", "hmax")];
const VIDEO_PAIRS: [(&str, &str); 2] = [("minduration", "maxduration"), ("minbitrate", "maxbitrate")];
const AUDIO_PAIRS: [(&str, &str); 1] = [("minduration", "maxduration")];

pub fn is_standard_banner_size(w: i64, h: i64) -> bool {
  STANDARD_BANNER_SIZES.contains(&(w, h))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConstraintRules;

impl RuleSet for ConstraintRules {
  fn name(&self) -> &'static str {
    "constraints"
  }

  fn check(&self, request: &Map<String, Value>, findings: &mut Findings) {
    for (i, imp) in impressions(request) {
      let prefix = format!("imp.{}", i);

      if let Some(floor) = number(imp, "bidfloor") {
        if floor < 0.0 {
          findings.error(
            ValidationError::new(
              format!("{}.bidfloor", prefix),
              IssueCode::NegativeBidFloor,
              ErrorType::Value,
              format!("Bid floor must not be negative, found {}", floor),
            )
            .actual(floor)
            .expected(json!({"min": 0})),
          );
        }
      }

      if let Some(banner) = object(imp, "banner") {
        let banner_path = format!("{}.banner", prefix);
        check_dimensions(banner, &banner_path, true, findings);
        check_pairs(banner, &banner_path, &BANNER_PAIRS, findings);
        if let Some(formats) = banner.get("format").and_then(Value::as_array) {
          for (j, format) in formats.iter().enumerate() {
            if let Some(format) = format.as_object() {
              check_dimensions(format, &format!("{}.format.{}", banner_path, j), true, findings);
            }
          }
        }
      }

      if let Some(video) = object(imp, "video") {
        let video_path = format!("{}.video", prefix);
        check_dimensions(video, &video_path, false, findings);
        check_pairs(video, &video_path, &VIDEO_PAIRS, findings);
      }

      if let Some(audio) = object(imp, "audio") {
        check_pairs(audio, &format!("{}.audio", prefix), &AUDIO_PAIRS, findings);
      }
    }
  }
}

/// `w` and `h` must be positive. With `check_standard`, a positive pair that
/// is not an IAB size draws an advisory warning.
fn check_dimensions(parent: &Map<String, Value>, path: &str, check_standard: bool, findings: &mut Findings) {
  let mut all_positive = true;
  for key in ["w", "h"] {
    if let Some(value) = number(parent, key) {
      if value <= 0.0 {
        all_positive = false;
        findings.error(
          ValidationError::new(
            format!("{}.{}", path, key),
            IssueCode::NonPositiveDimension,
            ErrorType::Value,
            format!("Dimension '{}' must be positive, found {}", key, value),
          )
          .actual(parent[key].clone())
          .suggest("Use the creative size in device-independent pixels"),
        );
      }
    }
  }

  if !(check_standard && all_positive) {
    return;
  }
  let width = parent.get("w").and_then(Value::as_i64);
  let height = parent.get("h").and_then(Value::as_i64);
  if let (Some(w), Some(h)) = (width, height) {
    if !is_standard_banner_size(w, h) {
      findings.warning(
        ValidationWarning::new(
          path,
          IssueCode::NonStandardBannerSize,
          format!("{}x{} is not an IAB standard size; fewer buyers may bid", w, h),
        )
        .actual(format!("{}x{}", w, h))
        .recommend("300x250")
        .suggest("Offer a standard size through banner.format"),
      );
    }
  }
}

fn check_pairs(parent: &Map<String, Value>, path: &str, pairs: &[(&str, &str)], findings: &mut Findings) {
  for (min_key, max_key) in pairs {
    if let (Some(min), Some(max)) = (number(parent, min_key), number(parent, max_key)) {
      if min > max {
        findings.error(
          ValidationError::new(
            format!("{}.{}", path, min_key),
            IssueCode::MinExceedsMax,
            ErrorType::Logical,
            format!("'{}' ({}) is greater than '{}' ({})", min_key, min, max_key, max),
          )
          .actual(parent[*min_key].clone())
          .expected(json!({ "max": parent[*max_key] }))
          .suggest(format!("Make '{}' less than or equal to '{}'", min_key, max_key)),
        );
      }
    }
  }
}
