//! Structural validation of rule packages.
//!
//! Validation runs in two layers over the raw JSON document:
//! 1. the embedded JSON Schema (shape, required fields, enum values);
//! 2. structural checks the schema cannot express (duplicate rule ids,
//!    citation and test coverage, draft/active staging, date sanity).
//!
//! The validator never mutates its input and never aborts: a document that
//! fails the schema still yields a report, so one bad file in a batch does
//! not stop its siblings.

use std::collections::BTreeMap;

use time::format_description::well_known::Iso8601;
use time::Date;

use crate::model::RulePackage;

static PACKAGE_SCHEMA_STR: &str = include_str!("../../../docs/rule-package-schema.json");

/// Validation strictness.
///
/// Strict mode promotes the advisory coverage warnings (missing citations,
/// missing test cases) to hard errors. It is used by pre-commit and CI
/// enforcement, never at evaluation runtime. Strictness changes only the
/// severity of findings, never which findings are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Standard,
    Strict,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Rule the finding is about, if it is rule-scoped.
    pub rule_id: Option<String>,
    /// Stable machine-readable check name.
    pub check: &'static str,
    pub message: String,
}

/// Outcome of validating one package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub rule_count: usize,
}

/// Validate a rule package document.
///
/// Accepts the raw parsed JSON rather than a typed `RulePackage` so that
/// shape violations are reported as findings instead of surfacing as a
/// deserialization error upstream.
pub fn validate_package(doc: &serde_json::Value, mode: ValidationMode) -> ValidationReport {
    let mut errors: Vec<ValidationIssue> = Vec::new();
    let mut warnings: Vec<ValidationIssue> = Vec::new();

    schema_check(doc, &mut errors);

    // Structural checks need the typed model. A document that fails to
    // deserialize has already produced schema errors above; if it somehow
    // passed the schema, record the mismatch explicitly.
    let pkg = match RulePackage::from_value(doc) {
        Ok(pkg) => Some(pkg),
        Err(e) => {
            if errors.is_empty() {
                errors.push(ValidationIssue {
                    rule_id: None,
                    check: "schema",
                    message: format!("document does not match the package model: {}", e),
                });
            }
            None
        }
    };

    let rule_count = pkg.as_ref().map_or(0, |p| p.rules.len());

    if let Some(pkg) = &pkg {
        check_duplicate_ids(pkg, &mut errors);
        check_coverage(pkg, mode, &mut errors, &mut warnings);
        check_draft_active(pkg, &mut warnings);
        check_dates(pkg, &mut warnings);
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        rule_count,
    }
}

fn schema_check(doc: &serde_json::Value, errors: &mut Vec<ValidationIssue>) {
    let schema: serde_json::Value = match serde_json::from_str(PACKAGE_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            errors.push(ValidationIssue {
                rule_id: None,
                check: "schema",
                message: format!("internal error: embedded package schema is invalid: {}", e),
            });
            return;
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            errors.push(ValidationIssue {
                rule_id: None,
                check: "schema",
                message: format!("internal error: failed to compile package schema: {}", e),
            });
            return;
        }
    };
    for err in validator.iter_errors(doc) {
        errors.push(ValidationIssue {
            rule_id: None,
            check: "schema",
            message: format!("{}", err),
        });
    }
}

/// Exactly one error per duplicated id, however many times it repeats.
fn check_duplicate_ids(pkg: &RulePackage, errors: &mut Vec<ValidationIssue>) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for rule in &pkg.rules {
        *seen.entry(rule.id.as_str()).or_insert(0) += 1;
    }
    for (id, count) in seen {
        if count > 1 {
            errors.push(ValidationIssue {
                rule_id: Some(id.to_string()),
                check: "duplicate_id",
                message: format!("duplicate rule id '{}' ({} occurrences)", id, count),
            });
        }
    }
}

fn check_coverage(
    pkg: &RulePackage,
    mode: ValidationMode,
    errors: &mut Vec<ValidationIssue>,
    warnings: &mut Vec<ValidationIssue>,
) {
    for rule in &pkg.rules {
        if rule.citations.is_empty() {
            push_coverage(
                mode,
                ValidationIssue {
                    rule_id: Some(rule.id.clone()),
                    check: "missing_citations",
                    message: format!("rule '{}' has no citations", rule.id),
                },
                errors,
                warnings,
            );
        }
        if rule.test_cases.is_empty() {
            push_coverage(
                mode,
                ValidationIssue {
                    rule_id: Some(rule.id.clone()),
                    check: "missing_tests",
                    message: format!("rule '{}' has no test cases", rule.id),
                },
                errors,
                warnings,
            );
        }
    }
}

fn push_coverage(
    mode: ValidationMode,
    issue: ValidationIssue,
    errors: &mut Vec<ValidationIssue>,
    warnings: &mut Vec<ValidationIssue>,
) {
    match mode {
        ValidationMode::Strict => errors.push(issue),
        ValidationMode::Standard => warnings.push(issue),
    }
}

/// draft+active is a deliberate staging pattern during review, so it is a
/// warning in every mode.
fn check_draft_active(pkg: &RulePackage, warnings: &mut Vec<ValidationIssue>) {
    for rule in &pkg.rules {
        if rule.draft && rule.active {
            warnings.push(ValidationIssue {
                rule_id: Some(rule.id.clone()),
                check: "draft_active",
                message: format!("rule '{}' is both draft and active", rule.id),
            });
        }
    }
}

fn check_dates(pkg: &RulePackage, warnings: &mut Vec<ValidationIssue>) {
    for rule in &pkg.rules {
        let effective = parse_date(rule.effective_date.as_deref());
        let expiration = parse_date(rule.expiration_date.as_deref());

        for (field, parsed, raw) in [
            ("effectiveDate", &effective, &rule.effective_date),
            ("expirationDate", &expiration, &rule.expiration_date),
        ] {
            if raw.is_some() && parsed.is_none() {
                warnings.push(ValidationIssue {
                    rule_id: Some(rule.id.clone()),
                    check: "dates",
                    message: format!(
                        "rule '{}' has unparseable {}: '{}'",
                        rule.id,
                        field,
                        raw.as_deref().unwrap_or_default()
                    ),
                });
            }
        }

        if let (Some(eff), Some(exp)) = (effective, expiration) {
            if exp < eff {
                warnings.push(ValidationIssue {
                    rule_id: Some(rule.id.clone()),
                    check: "dates",
                    message: format!(
                        "rule '{}' expires ({}) before it takes effect ({})",
                        rule.id, exp, eff
                    ),
                });
            }
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<Date> {
    Date::parse(raw?, &Iso8601::DEFAULT).ok()
}
