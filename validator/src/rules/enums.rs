//! Fields restricted to a closed set of integer codes.

use super::{impressions, integer, object, Findings, RuleSet};
use crate::report::{ErrorType, IssueCode, ValidationError, ValidationWarning};

use std::ops::RangeInclusive;

use serde_json::{json, Map, Value};

/// Codes from 500 upward are reserved for exchange-specific auction types.
pub const EXCHANGE_AUCTION_TYPES_FROM: i64 = 500;
pub const DEVICE_TYPES: RangeInclusive<i64> = 1..=7;
pub const CONNECTION_TYPES: RangeInclusive<i64> = 0..=7;
pub const BANNER_POSITIONS: RangeInclusive<i64> = 0..=7;

pub fn is_valid_auction_type(at: i64) -> bool {
  at == 1 || at == 2 || at >= EXCHANGE_AUCTION_TYPES_FROM
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnumeratedRules;

impl RuleSet for EnumeratedRules {
  fn name(&self) -> &'static str {
    "enumerated"
  }

  fn check(&self, request: &Map<String, Value>, findings: &mut Findings) {
    // The auction type changes auction semantics, so it is the one blocking code.
    if let Some(at) = integer(request, "at") {
      if !is_valid_auction_type(at) {
        findings.error(
          ValidationError::new(
            "at",
            IssueCode::InvalidAuctionType,
            ErrorType::Value,
            format!("Auction type {} is not 1 (first price), 2 (second price) or an exchange code >= 500", at),
          )
          .actual(at)
          .expected(json!([1, 2, ">=500"]))
          .suggest("Use 1 for first-price or 2 for second-price auctions"),
        );
      }
    }

    if let Some(device) = object(request, "device") {
      check_range(device, "devicetype", "device.devicetype", &DEVICE_TYPES, IssueCode::InvalidDeviceType, findings);
      check_range(
        device,
        "connectiontype",
        "device.connectiontype",
        &CONNECTION_TYPES,
        IssueCode::InvalidConnectionType,
        findings,
      );
    }

    for (i, imp) in impressions(request) {
      if let Some(banner) = object(imp, "banner") {
        check_range(
          banner,
          "pos",
          &format!("imp.{}.banner.pos", i),
          &BANNER_POSITIONS,
          IssueCode::InvalidBannerPosition,
          findings,
        );
      }
    }
  }
}

fn check_range(
  parent: &Map<String, Value>,
  key: &str,
  path: &str,
  valid: &RangeInclusive<i64>,
  code: IssueCode,
  findings: &mut Findings,
) {
  if let Some(value) = integer(parent, key) {
    if !valid.contains(&value) {
      findings.warning(
        ValidationWarning::new(
          path,
          code,
          format!("'{}' value {} is not in {}..={}", path, value, valid.start(), valid.end()),
        )
        .actual(value)
        .expected(json!({"min": valid.start(), "max": valid.end()})),
      );
    }
  }
}
