//! Detailed criteria extraction.
//!
//! Walks the same parsed tree the interpreter sees, depth first, and
//! reconstructs one `CriterionResult` per comparison or membership node
//! that references a variable. The walk never changes the boolean outcome:
//! `met` is computed with the interpreter's own comparison helpers
//! (`numeric`), and threshold sides are resolved through full expression
//! evaluation rather than a naive literal read.

use crate::expr::{CompareOp, LogicExpr};
use crate::interp::{check_compare_arity, eval_expr, DataRecord};
use crate::numeric;
use crate::registry::OperatorRegistry;
use crate::types::{CriterionResult, EvalError};
use crate::value::Value;

/// Extract the ordered criteria trace for a parsed logic tree.
pub fn trace_criteria(
    expr: &LogicExpr,
    data: &DataRecord,
    registry: &OperatorRegistry,
) -> Result<Vec<CriterionResult>, EvalError> {
    let mut out = Vec::new();
    walk(expr, data, registry, &mut out)?;
    Ok(out)
}

fn walk(
    expr: &LogicExpr,
    data: &DataRecord,
    registry: &OperatorRegistry,
    out: &mut Vec<CriterionResult>,
) -> Result<(), EvalError> {
    match expr {
        // Leaves carry no criteria of their own.
        LogicExpr::Literal(_) | LogicExpr::Var { .. } => Ok(()),

        LogicExpr::And(operands) | LogicExpr::Or(operands) | LogicExpr::If(operands) => {
            // Every branch is walked, including branches the interpreter
            // would short-circuit past: the user should see all criteria.
            for operand in operands {
                walk(operand, data, registry, out)?;
            }
            Ok(())
        }

        LogicExpr::Not(operand) => walk(operand, data, registry, out),

        LogicExpr::Compare { op, operands } => {
            check_compare_arity(*op, operands.len())?;
            let mut values = Vec::with_capacity(operands.len());
            for operand in operands {
                values.push(eval_expr(operand, data, registry)?);
            }
            for i in 0..operands.len() - 1 {
                emit_comparison(
                    *op,
                    (&operands[i], &values[i]),
                    (&operands[i + 1], &values[i + 1]),
                    out,
                );
            }
            Ok(())
        }

        LogicExpr::In { needle, haystack } => {
            let needle_val = eval_expr(needle, data, registry)?;
            let haystack_val = eval_expr(haystack, data, registry)?;
            let met = numeric::contains(&needle_val, &haystack_val);
            // The variable can sit on either side. A variable haystack
            // flips the reading: the collection must contain the literal.
            if let Some(name) = needle.var_name() {
                out.push(CriterionResult {
                    criterion: name.to_string(),
                    met,
                    value: needle_val.to_json(),
                    threshold: haystack_val.to_json(),
                    operator: "in".to_string(),
                    comparison: format!(
                        "{} ({}) must be one of {}",
                        name,
                        display_value(name, &needle_val),
                        display_value(name, &haystack_val)
                    ),
                });
            } else if let Some(name) = haystack.var_name() {
                out.push(CriterionResult {
                    criterion: name.to_string(),
                    met,
                    value: haystack_val.to_json(),
                    threshold: needle_val.to_json(),
                    operator: "contains".to_string(),
                    comparison: format!(
                        "{} ({}) must include {}",
                        name,
                        display_value(name, &haystack_val),
                        display_value(name, &needle_val)
                    ),
                });
            }
            Ok(())
        }

        LogicExpr::Custom { name, args } => {
            let op = registry
                .get(name)
                .ok_or_else(|| EvalError::UnknownOperator { op: name.clone() })?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, data, registry)?);
            }
            out.extend(op.trace(&values, args)?);
            Ok(())
        }

        LogicExpr::Unknown { op, .. } => Err(EvalError::UnknownOperator { op: op.clone() }),
    }
}

/// Emit a criterion for one comparison pair, if either side is a variable
/// reference. A right-hand variable mirrors the operator so the criterion
/// always reads variable-first.
fn emit_comparison(
    op: CompareOp,
    left: (&LogicExpr, &Value),
    right: (&LogicExpr, &Value),
    out: &mut Vec<CriterionResult>,
) {
    let met = numeric::compare(op, left.1, right.1);
    let (name, shown_op, value, threshold) = if let Some(name) = left.0.var_name() {
        (name, op, left.1, right.1)
    } else if let Some(name) = right.0.var_name() {
        (name, op.mirrored(), right.1, left.1)
    } else {
        // Pure literal comparison: nothing user-facing to report.
        return;
    };

    out.push(CriterionResult {
        criterion: name.to_string(),
        met,
        value: value.to_json(),
        threshold: threshold.to_json(),
        operator: shown_op.symbol().to_string(),
        comparison: format!(
            "{} ({}) {} {}",
            name,
            display_value(name, value),
            shown_op.symbol(),
            display_value(name, threshold)
        ),
    });
}

// ──────────────────────────────────────────────
// Display formatting
// ──────────────────────────────────────────────

/// Variables named like dollar amounts get currency formatting.
fn looks_like_dollars(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["income", "amount", "assets", "benefit", "expense", "cost"]
        .iter()
        .any(|hint| lower.contains(hint))
}

/// Render a value for the comparison string, applying currency formatting
/// when the variable's name suggests a dollar amount.
fn display_value(name: &str, v: &Value) -> String {
    match v {
        Value::Number(d) if looks_like_dollars(name) => display_amount(*d),
        Value::Number(d) => d.normalize().to_string(),
        Value::Text(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Undefined => "no answer".to_string(),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(|i| display_value(name, i)).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Record(_) => serde_json::to_string(&v.to_json()).unwrap_or_default(),
    }
}

/// `$1,631.50` / `$2,072` -- thousands separators, cents only when the
/// amount has a fractional part.
pub(crate) fn display_amount(d: rust_decimal::Decimal) -> String {
    let negative = d.is_sign_negative();
    let normalized = d.abs().normalize();
    let rendered = normalized.to_string();
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let amount = match frac_part {
        Some(f) if f.len() == 1 => format!("{}.{}0", grouped, f),
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    };
    if negative {
        format!("-${}", amount)
    } else {
        format!("${}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn registry() -> OperatorRegistry {
        OperatorRegistry::with_builtins()
    }

    fn trace(logic: serde_json::Value, record: serde_json::Value) -> Vec<CriterionResult> {
        let reg = registry();
        let expr = LogicExpr::parse(&logic, &reg);
        let data = record.as_object().cloned().unwrap_or_default();
        trace_criteria(&expr, &data, &reg).unwrap()
    }

    #[test]
    fn single_income_criterion() {
        let criteria = trace(
            json!({"<=": [{"var": "householdIncome"}, 2072]}),
            json!({"householdIncome": 1800}),
        );
        assert_eq!(criteria.len(), 1);
        let c = &criteria[0];
        assert_eq!(c.criterion, "householdIncome");
        assert!(c.met);
        assert_eq!(c.value, json!(1800));
        assert_eq!(c.threshold, json!(2072));
        assert_eq!(c.operator, "<=");
        assert_eq!(c.comparison, "householdIncome ($1,800) <= $2,072");
    }

    #[test]
    fn variable_on_the_right_mirrors_the_operator() {
        let criteria = trace(
            json!({">=": [2072, {"var": "householdIncome"}]}),
            json!({"householdIncome": 1800}),
        );
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].criterion, "householdIncome");
        assert_eq!(criteria[0].operator, "<=");
        assert!(criteria[0].met);
    }

    #[test]
    fn nested_threshold_is_evaluated_not_read_literally() {
        let criteria = trace(
            json!({"<=": [{"var": "rentAmount"}, {"if": [
                {"==": [{"var": "region"}, "urban"]}, 1800, 1200
            ]}]}),
            json!({"rentAmount": 1500, "region": "urban"}),
        );
        // The threshold side is resolved through evaluation, not walked for
        // criteria of its own.
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].criterion, "rentAmount");
        assert_eq!(criteria[0].threshold, json!(1800));
        assert!(criteria[0].met);
    }

    #[test]
    fn all_branches_are_walked_in_order() {
        let criteria = trace(
            json!({"and": [
                {"<=": [{"var": "householdIncome"}, 2072]},
                {"or": [
                    {"==": [{"var": "hasDisability"}, true]},
                    {"<": [{"var": "age"}, 60]}
                ]}
            ]}),
            json!({"householdIncome": 1800, "hasDisability": false, "age": 45}),
        );
        let names: Vec<&str> = criteria.iter().map(|c| c.criterion.as_str()).collect();
        assert_eq!(names, vec!["householdIncome", "hasDisability", "age"]);
        assert_eq!(
            criteria.iter().map(|c| c.met).collect::<Vec<_>>(),
            vec![true, false, true]
        );
    }

    #[test]
    fn fpl_operator_emits_two_criteria() {
        let criteria = trace(
            json!({"fplIncomeLimit": [
                {"var": "householdIncome"}, {"var": "householdSize"}, 130
            ]}),
            json!({"householdIncome": 3000, "householdSize": 3}),
        );
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].criterion, "householdIncome");
        assert!(!criteria[0].met);
        assert_eq!(criteria[1].criterion, "householdSize");
        assert!(criteria[1].met);
    }

    #[test]
    fn missing_variable_criterion_is_unmet() {
        let criteria = trace(json!({"<=": [{"var": "income"}, 2000]}), json!({}));
        assert_eq!(criteria.len(), 1);
        assert!(!criteria[0].met);
        assert_eq!(criteria[0].value, json!(null));
        assert!(criteria[0].comparison.contains("no answer"));
    }

    #[test]
    fn membership_criterion() {
        let criteria = trace(
            json!({"in": [{"var": "state"}, ["WA", "OR"]]}),
            json!({"state": "CA"}),
        );
        assert_eq!(criteria.len(), 1);
        assert!(!criteria[0].met);
        assert_eq!(criteria[0].operator, "in");
        assert_eq!(criteria[0].comparison, "state (CA) must be one of [WA, OR]");
    }

    #[test]
    fn membership_with_variable_haystack() {
        let criteria = trace(
            json!({"in": ["food", {"var": "neededBenefits"}]}),
            json!({"neededBenefits": ["food", "cash"]}),
        );
        assert_eq!(criteria.len(), 1);
        let c = &criteria[0];
        assert_eq!(c.criterion, "neededBenefits");
        assert!(c.met);
        assert_eq!(c.value, json!(["food", "cash"]));
        assert_eq!(c.threshold, json!("food"));
        assert_eq!(c.operator, "contains");
        assert_eq!(c.comparison, "neededBenefits ([food, cash]) must include food");
    }

    #[test]
    fn membership_with_variable_haystack_unmet() {
        let criteria = trace(
            json!({"in": ["housing", {"var": "neededBenefits"}]}),
            json!({"neededBenefits": ["food", "cash"]}),
        );
        assert_eq!(criteria.len(), 1);
        assert!(!criteria[0].met);
        assert_eq!(criteria[0].criterion, "neededBenefits");
    }

    #[test]
    fn trace_is_deterministic() {
        let logic = json!({"and": [
            {"<=": [{"var": "householdIncome"}, 2072]},
            {"in": [{"var": "state"}, ["WA", "OR"]]}
        ]});
        let record = json!({"householdIncome": 1800, "state": "WA"});
        assert_eq!(trace(logic.clone(), record.clone()), trace(logic, record));
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(display_amount(Decimal::from(2072)), "$2,072");
        assert_eq!(
            display_amount(Decimal::from_str("1631.50").unwrap()),
            "$1,631.50"
        );
        assert_eq!(display_amount(Decimal::from(1234567)), "$1,234,567");
        assert_eq!(display_amount(Decimal::from(-25)), "-$25");
        assert_eq!(display_amount(Decimal::from(999)), "$999");
    }

    #[test]
    fn currency_formatting_only_for_dollar_like_names() {
        let criteria = trace(
            json!({"<": [{"var": "age"}, 65]}),
            json!({"age": 40}),
        );
        assert_eq!(criteria[0].comparison, "age (40) < 65");
    }
}
