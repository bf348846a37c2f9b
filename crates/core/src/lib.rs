//! Eligor rule document model and package validator.
//!
//! A rule package is a JSON document bundling the eligibility rules for one
//! benefit program and jurisdiction, together with citations and embedded
//! test cases. This crate owns the document shapes and the structural
//! validator; it performs no rule evaluation. The evaluator (`eligor-eval`)
//! consumes `rule_logic` verbatim and keeps its own runtime types.

pub mod error;
pub mod model;
pub mod validate;

pub use error::PackageError;
pub use model::{
    Citation, PackageMetadata, RuleDefinition, RulePackage, RuleType, TestCase,
};
pub use validate::{
    validate_package, ValidationIssue, ValidationMode, ValidationReport,
};
