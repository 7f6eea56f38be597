//! OpenRTB bid-request validation.
//!
//! # Features
//! - **Rule engine**: structural checks against an OpenRTB 2.5/2.6 schema,
//!   then business, cross-field, enumerated-value and constraint rules. Every
//!   finding carries a dotted field path, a typed code and, where one exists,
//!   a remediation hint.
//! - **Scoring**: a 0..=100 compliance score and a compliance level per
//!   result.
//! - **Memoization**: results, schemas and generated requests are kept in
//!   purpose-specific TTL caches keyed by a structural hash, so key order in
//!   the request never matters.
//! - **Batches**: identical requests are validated once; distinct ones run in
//!   chunks with bounded, FIFO-fair concurrency and come back in input order
//!   with an aggregate summary.
//! - **Templates**: concrete requests generated from named skeletons with
//!   dotted-path overrides.
//!
//! ```no_run
//! use bidcheck::{BidValidator, ValidateOptions};
//! use serde_json::json;
//!
//! let validator = BidValidator::with_defaults()?;
//! let request = json!({"id": "1", "imp": [{"id": "1", "banner": {"w": 300, "h": 250}}]});
//! let result = validator.validate_single(&request, &ValidateOptions::default());
//! println!("{} ({})", result.compliance_score, result.is_valid);
//! # Ok::<(), bidcheck::ConfigError>(())
//! ```

pub mod batch;
pub mod caches;
pub mod config;
pub mod error;
pub mod hashing;
pub mod orchestrator;
pub mod path;
pub mod report;
pub mod rules;
pub mod schema;
pub mod template;

pub use batch::{BatchOptions, BatchProgress, ConcurrencyGate, DedupStrategy};
pub use caches::{CacheRegistry, CacheRegistryStats};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, PathError, SchemaError, TemplateError};
pub use orchestrator::{BidValidator, BidValidatorBuilder, ValidateOptions};
pub use report::{
  BatchSummary, BatchValidationResult, ComplianceLevel, ErrorType, IssueCode, ScoringConfig, Severity,
  ValidationError, ValidationResult, ValidationWarning,
};
pub use rules::{RuleEngine, RuleSet};
pub use schema::{BuiltinSchemaProvider, Schema, SchemaProvider};
pub use template::{GeneratedRequest, InMemoryTemplateCatalog, Template, TemplateCatalog};
