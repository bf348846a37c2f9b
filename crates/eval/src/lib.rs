//! Eligor rule evaluator -- interprets a rule's logic tree against a flat
//! answer record, entirely offline.
//!
//! The evaluator consumes the `ruleLogic` JSON verbatim, runs the boolean
//! determination and, in a parallel walk sharing the same comparison
//! helpers, reconstructs a per-criterion trace with human-readable
//! comparisons. Every call is a pure function of its explicit inputs, so
//! concurrent evaluation of many rules needs no locking.
//!
//! Errors never cross the public surface: `evaluate_rule_with_details`
//! converts them into `success:false` result data.

pub mod explain;
pub mod expr;
pub mod interp;
pub mod numeric;
pub mod registry;
pub mod runner;
pub mod trace;
pub mod types;
pub mod value;

use std::time::Instant;

use eligor_core::RuleDefinition;

pub use explain::explain;
pub use expr::{CompareOp, LogicExpr};
pub use interp::{eval_expr, DataRecord};
pub use registry::{CustomOperator, FplIncomeLimit, OperatorRegistry};
pub use runner::{run_package_tests, run_rule_tests, PackageTestReport, RuleTestReport, TestFailure};
pub use trace::trace_criteria;
pub use types::{CriterionResult, DetailedEvaluationResult, EvalError, Explanation};
pub use value::Value;

/// Evaluate a raw logic tree against an answer record.
///
/// This is the low-level entry point used by the test runner; most callers
/// want [`evaluate_rule_with_details`].
pub fn evaluate(
    logic: &serde_json::Value,
    data: &DataRecord,
    registry: &OperatorRegistry,
) -> Result<Value, EvalError> {
    let expr = LogicExpr::parse(logic, registry);
    eval_expr(&expr, data, registry)
}

/// Evaluate one rule against one answer record, producing the boolean
/// determination, the ordered criteria trace and the user-facing
/// explanation.
///
/// A malformed tree (unknown operator, wrong arity, bad operand type)
/// yields `{success: false, result: false, error: ...}` rather than an
/// error or panic.
pub fn evaluate_rule_with_details(
    rule: &RuleDefinition,
    data: &DataRecord,
    registry: &OperatorRegistry,
) -> DetailedEvaluationResult {
    let started = Instant::now();
    let expr = LogicExpr::parse(&rule.rule_logic, registry);

    match eval_expr(&expr, data, registry) {
        Ok(value) => {
            let result = value.is_truthy();
            // The trace shares the interpreter's semantics; if a custom
            // operator's trace still fails, the determination stands and
            // the explanation falls back to its generic sentence.
            let criteria = trace_criteria(&expr, data, registry).unwrap_or_default();
            let explanation = explain(&criteria, result);
            DetailedEvaluationResult {
                result,
                success: true,
                execution_time_ms: elapsed_ms(started),
                criteria_results: criteria,
                explanation: Some(explanation),
                error: None,
            }
        }
        Err(e) => DetailedEvaluationResult {
            result: false,
            success: false,
            execution_time_ms: elapsed_ms(started),
            criteria_results: Vec::new(),
            explanation: None,
            error: Some(e.to_string()),
        },
    }
}

/// Re-derive the explanation for an already-computed result.
pub fn explain_result(result: &DetailedEvaluationResult) -> Explanation {
    explain(&result.criteria_results, result.result)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(logic: serde_json::Value) -> RuleDefinition {
        serde_json::from_value(json!({
            "id": "r1",
            "name": "test rule",
            "programId": "snap",
            "ruleType": "eligibility",
            "ruleLogic": logic
        }))
        .unwrap()
    }

    fn record(v: serde_json::Value) -> DataRecord {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn details_for_an_eligible_household() {
        let registry = OperatorRegistry::with_builtins();
        let result = evaluate_rule_with_details(
            &rule(json!({"<=": [{"var": "householdIncome"}, 2072]})),
            &record(json!({"householdIncome": 1800})),
            &registry,
        );
        assert!(result.success);
        assert!(result.result);
        assert!(result.error.is_none());
        assert_eq!(result.criteria_results.len(), 1);
        let c = &result.criteria_results[0];
        assert_eq!(c.criterion, "householdIncome");
        assert!(c.met);
        assert_eq!(c.value, json!(1800));
        assert_eq!(c.threshold, json!(2072));
        assert!(result.explanation.is_some());
    }

    #[test]
    fn malformed_tree_becomes_unsuccessful_result_data() {
        let registry = OperatorRegistry::with_builtins();
        let result = evaluate_rule_with_details(
            &rule(json!({"frobnicate": [{"var": "x"}]})),
            &record(json!({})),
            &registry,
        );
        assert!(!result.success);
        assert!(!result.result);
        assert!(result.error.as_deref().unwrap_or_default().contains("frobnicate"));
        assert!(result.criteria_results.is_empty());
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let registry = OperatorRegistry::with_builtins();
        let result = evaluate_rule_with_details(
            &rule(json!(true)),
            &record(json!({})),
            &registry,
        );
        let doc = serde_json::to_value(&result).unwrap();
        assert!(doc.get("executionTimeMs").is_some());
        assert!(doc.get("criteriaResults").is_some());
    }
}
