//! Embedded test-case runner.
//!
//! Every rule ships with test cases authored alongside it; this module
//! runs them through the interpreter at build/CI time so a package
//! self-verifies before it ships. One case's failure -- assertion or
//! evaluation error -- never stops sibling cases or sibling rules.

use eligor_core::{RuleDefinition, RulePackage};

use crate::expr::LogicExpr;
use crate::interp::eval_expr;
use crate::numeric::values_equal;
use crate::registry::OperatorRegistry;
use crate::value::Value;

/// One failed test case, with both values captured for diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct TestFailure {
    pub case_id: String,
    pub message: String,
    pub expected: Option<serde_json::Value>,
    pub actual: Option<serde_json::Value>,
}

/// Pass/fail counts for one rule's embedded cases.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTestReport {
    pub rule_id: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<TestFailure>,
}

/// Roll-up across a package. Deterministic: identical inputs produce
/// identical counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageTestReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub rule_reports: Vec<RuleTestReport>,
}

/// Run one rule's embedded test cases.
pub fn run_rule_tests(rule: &RuleDefinition, registry: &OperatorRegistry) -> RuleTestReport {
    let expr = LogicExpr::parse(&rule.rule_logic, registry);
    let mut report = RuleTestReport {
        rule_id: rule.id.clone(),
        total: rule.test_cases.len(),
        passed: 0,
        failed: 0,
        failures: Vec::new(),
    };

    for case in &rule.test_cases {
        match eval_expr(&expr, &case.input, registry) {
            Ok(actual) => {
                let matches = match Value::from_json(&case.expected) {
                    Ok(expected) => values_equal(&actual, &expected),
                    Err(_) => false,
                };
                if matches {
                    report.passed += 1;
                } else {
                    report.failed += 1;
                    report.failures.push(TestFailure {
                        case_id: case.id.clone(),
                        message: "expected value does not match actual".to_string(),
                        expected: Some(case.expected.clone()),
                        actual: Some(actual.to_json()),
                    });
                }
            }
            Err(e) => {
                // Evaluation errors are recorded as this case's failure and
                // do not stop the remaining cases.
                report.failed += 1;
                report.failures.push(TestFailure {
                    case_id: case.id.clone(),
                    message: format!("evaluation error: {}", e),
                    expected: Some(case.expected.clone()),
                    actual: None,
                });
            }
        }
    }

    report
}

/// Run the embedded tests of every rule in a package that has any.
pub fn run_package_tests(pkg: &RulePackage, registry: &OperatorRegistry) -> PackageTestReport {
    let rule_reports: Vec<RuleTestReport> = pkg
        .rules
        .iter()
        .filter(|r| !r.test_cases.is_empty())
        .map(|r| run_rule_tests(r, registry))
        .collect();

    PackageTestReport {
        total: rule_reports.iter().map(|r| r.total).sum(),
        passed: rule_reports.iter().map(|r| r.passed).sum(),
        failed: rule_reports.iter().map(|r| r.failed).sum(),
        rule_reports,
    }
}
