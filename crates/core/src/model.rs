//! Rule package document shapes.
//!
//! These types mirror the on-disk JSON contract (camelCase field names,
//! authored by policy analysts rather than Rust code). They are plain data:
//! nothing in this workspace mutates a package after construction.
//!
//! `rule_logic` stays a raw `serde_json::Value` here. The evaluator owns the
//! parsed expression representation; the document model carries the tree
//! verbatim so validation and evaluation never disagree about what was
//! authored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// A bundle of rule definitions plus metadata for one benefit program and
/// jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePackage {
    pub metadata: PackageMetadata,
    pub rules: Vec<RuleDefinition>,
}

/// Package-level metadata: which program, where, and who published it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub program_id: String,
    pub jurisdiction: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Eligibility,
    BenefitAmount,
    DocumentRequirements,
    Conditional,
}

/// One versioned, citable rule.
///
/// `draft` and `active` are independent flags: authors sometimes stage an
/// updated rule as draft+active during review, so that combination is a
/// validation warning rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    pub program_id: String,
    pub rule_type: RuleType,
    /// Logic expression tree, consumed verbatim by the evaluator.
    pub rule_logic: serde_json::Value,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub draft: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_active() -> bool {
    true
}

/// A legal or administrative citation backing a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// An embedded test case, authored alongside the rule it exercises.
///
/// Consumed only by the test runner; never touched at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub description: String,
    /// Flat answer record the rule is evaluated against.
    pub input: serde_json::Map<String, serde_json::Value>,
    /// Expected evaluator output, compared with strict equality.
    pub expected: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Read and parse a rule package file into a raw JSON document.
///
/// Returns `serde_json::Value` rather than `RulePackage` so the validator
/// can report schema violations on documents that do not deserialize into
/// the typed model at all.
pub fn read_document(path: &Path) -> Result<serde_json::Value, PackageError> {
    let text = std::fs::read_to_string(path).map_err(|source| PackageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PackageError::Json {
        path: path.display().to_string(),
        source,
    })
}

impl RulePackage {
    /// Deserialize a package from an already-parsed JSON document.
    pub fn from_value(doc: &serde_json::Value) -> Result<RulePackage, PackageError> {
        serde_json::from_value(doc.clone())
            .map_err(|e| PackageError::Malformed(e.to_string()))
    }

    /// Look up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn package_round_trips_from_json() {
        let doc = json!({
            "metadata": {
                "programId": "snap",
                "jurisdiction": "US-WA",
                "source": "WAC 388-400"
            },
            "rules": [{
                "id": "snap_income",
                "name": "SNAP gross income limit",
                "programId": "snap",
                "ruleType": "eligibility",
                "ruleLogic": {"<=": [{"var": "householdIncome"}, 2072]},
                "citations": [{"source": "WAC 388-478-0060"}]
            }]
        });

        let pkg = RulePackage::from_value(&doc).unwrap();
        assert_eq!(pkg.metadata.program_id, "snap");
        assert_eq!(pkg.rules.len(), 1);

        let rule = pkg.rule("snap_income").unwrap();
        assert_eq!(rule.rule_type, RuleType::Eligibility);
        // Omitted fields take their authoring defaults.
        assert_eq!(rule.version, "1.0.0");
        assert!(rule.active);
        assert!(!rule.draft);
        assert!(rule.test_cases.is_empty());
    }

    #[test]
    fn malformed_package_is_an_error_not_a_panic() {
        let doc = json!({"metadata": {"programId": "snap"}, "rules": "nope"});
        assert!(RulePackage::from_value(&doc).is_err());
    }

    #[test]
    fn rule_type_wire_names() {
        let t: RuleType = serde_json::from_value(json!("benefit_amount")).unwrap();
        assert_eq!(t, RuleType::BenefitAmount);
        assert!(serde_json::from_value::<RuleType>(json!("unknown_kind")).is_err());
    }
}
