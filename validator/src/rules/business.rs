//! Business-logic rules: unique impression ids, ad formats and currencies.

use super::{impressions, is_present, Findings, RuleSet};
use crate::report::{ErrorType, IssueCode, ValidationError, ValidationWarning};

use ahash::{HashMap, HashMapExt, HashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const AD_FORMATS: [&str; 4] = ["banner", "video", "audio", "native"];

static CURRENCY_FORMAT: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$"));

/// The active ISO-4217 list (currencies, funds and precious metals).
/// Withdrawn codes such as HRK, ANG, SLL or ZWL are not accepted.
static ISO_4217: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  [
    "AED", "AFN", "ALL", "AMD", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT", "BGN", "BHD", "BIF",
    "BMD", "BND", "BOB", "BOV", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD", "CDF", "CHE", "CHF", "CHW",
    "CLF", "CLP", "CNY", "COP", "COU", "CRC", "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD", "EGP", "ERN",
    "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ", "GYD", "HKD", "HNL", "HTG",
    "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD", "JPY", "KES", "KGS", "KHR", "KMF", "KPW",
    "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR", "LRD", "LSL", "LYD", "MAD", "MDL", "MGA", "MKD", "MMK",
    "MNT", "MOP", "MRU", "MUR", "MVR", "MWK", "MXN", "MXV", "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR",
    "NZD", "OMR", "PAB", "PEN", "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "RWF", "SAR",
    "SBD", "SCR", "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SVC", "SYP", "SZL", "THB",
    "TJS", "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "USN", "UYI", "UYU", "UYW",
    "UZS", "VED", "VES", "VND", "VUV", "WST", "XAF", "XAG", "XAU", "XBA", "XBB", "XBC", "XBD", "XCD", "XCG",
    "XDR", "XOF", "XPD", "XPF", "XPT", "XSU", "XUA", "YER", "ZAR", "ZMW", "ZWG",
  ]
  .into_iter()
  .collect()
});

pub fn is_valid_currency(code: &str) -> bool {
  CURRENCY_FORMAT.as_ref().is_ok_and(|re| re.is_match(code)) && ISO_4217.contains(code)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessRules;

impl RuleSet for BusinessRules {
  fn name(&self) -> &'static str {
    "business"
  }

  fn check(&self, request: &Map<String, Value>, findings: &mut Findings) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (i, imp) in impressions(request) {
      if let Some(id) = imp.get("id").and_then(Value::as_str) {
        if let Some(first) = first_seen.get(id) {
          findings.error(
            ValidationError::new(
              format!("imp.{}.id", i),
              IssueCode::DuplicateImpressionId,
              ErrorType::Logical,
              format!("Impression id '{}' is already used by imp.{}", id, first),
            )
            .actual(id)
            .suggest("Give every impression in the request a unique id"),
          );
        } else {
          first_seen.insert(id, i);
        }
      }

      if !AD_FORMATS.iter().any(|format| is_present(imp, format)) {
        findings.error(
          ValidationError::new(
            format!("imp.{}", i),
            IssueCode::MissingAdFormat,
            ErrorType::RequiredField,
            "Impression declares no ad format",
          )
          .expected("one of banner, video, audio, native")
          .suggest("Add a banner, video, audio or native object to the impression"),
        );
      }

      if let Some(currency) = imp.get("bidfloorcur").and_then(Value::as_str) {
        check_currency(&format!("imp.{}.bidfloorcur", i), currency, findings);
      }
    }

    if let Some(currencies) = request.get("cur").and_then(Value::as_array) {
      for (i, currency) in currencies.iter().enumerate() {
        if let Some(currency) = currency.as_str() {
          check_currency(&format!("cur.{}", i), currency, findings);
        }
      }
    }
  }
}

fn check_currency(path: &str, code: &str, findings: &mut Findings) {
  if !is_valid_currency(code) {
    findings.warning(
      ValidationWarning::new(path, IssueCode::InvalidCurrency, format!("'{}' is not a valid ISO-4217 currency code", code))
        .actual(code)
        .recommend("USD")
        .suggest("Use an uppercase three-letter ISO-4217 code such as USD or EUR"),
    );
  }
}
