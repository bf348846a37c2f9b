//! Logic tree interpreter.
//!
//! Pure and deterministic: the result is a function of the expression, the
//! answer record and the registry, with no hidden state. Errors from
//! malformed trees propagate as `EvalError` and are converted to
//! `success:false` data at the public boundary in `lib.rs`.

use crate::expr::{CompareOp, LogicExpr};
use crate::numeric;
use crate::registry::OperatorRegistry;
use crate::types::EvalError;
use crate::value::Value;

/// Flat answer record a rule is evaluated against.
pub type DataRecord = serde_json::Map<String, serde_json::Value>;

/// Evaluate a parsed logic tree against an answer record.
pub fn eval_expr(
    expr: &LogicExpr,
    data: &DataRecord,
    registry: &OperatorRegistry,
) -> Result<Value, EvalError> {
    match expr {
        LogicExpr::Literal(v) => Value::from_json(v),

        LogicExpr::Var { name, default } => match data.get(name) {
            Some(v) => Value::from_json(v),
            None => match default {
                Some(fallback) => eval_expr(fallback, data, registry),
                None => Ok(Value::Undefined),
            },
        },

        LogicExpr::And(operands) => {
            for operand in operands {
                let v = eval_expr(operand, data, registry)?;
                if !v.is_truthy() {
                    // Short-circuit: remaining operands are not evaluated.
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }

        LogicExpr::Or(operands) => {
            for operand in operands {
                let v = eval_expr(operand, data, registry)?;
                if v.is_truthy() {
                    // Short-circuit: remaining operands are not evaluated.
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }

        LogicExpr::Not(operand) => {
            let v = eval_expr(operand, data, registry)?;
            Ok(Value::Bool(!v.is_truthy()))
        }

        LogicExpr::If(args) => {
            // (cond, then) pairs with an optional trailing else.
            let mut i = 0;
            while i + 1 < args.len() {
                let cond = eval_expr(&args[i], data, registry)?;
                if cond.is_truthy() {
                    return eval_expr(&args[i + 1], data, registry);
                }
                i += 2;
            }
            match args.get(i) {
                Some(fallback) => eval_expr(fallback, data, registry),
                None => Ok(Value::Null),
            }
        }

        LogicExpr::Compare { op, operands } => {
            check_compare_arity(*op, operands.len())?;
            let mut values = Vec::with_capacity(operands.len());
            for operand in operands {
                values.push(eval_expr(operand, data, registry)?);
            }
            // Chained form: every adjacent pair must hold.
            let holds = values
                .windows(2)
                .all(|pair| numeric::compare(*op, &pair[0], &pair[1]));
            Ok(Value::Bool(holds))
        }

        LogicExpr::In { needle, haystack } => {
            let needle_val = eval_expr(needle, data, registry)?;
            let haystack_val = eval_expr(haystack, data, registry)?;
            Ok(Value::Bool(numeric::contains(&needle_val, &haystack_val)))
        }

        LogicExpr::Custom { name, args } => {
            let op = registry
                .get(name)
                .ok_or_else(|| EvalError::UnknownOperator { op: name.clone() })?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, data, registry)?);
            }
            op.evaluate(&values)
        }

        LogicExpr::Unknown { op, .. } => Err(EvalError::UnknownOperator { op: op.clone() }),
    }
}

pub(crate) fn check_compare_arity(op: CompareOp, len: usize) -> Result<(), EvalError> {
    let ok = match op {
        CompareOp::Eq | CompareOp::Neq => len == 2,
        _ => len >= 2,
    };
    if ok {
        Ok(())
    } else {
        Err(EvalError::Arity {
            op: op.symbol().to_string(),
            expected: if matches!(op, CompareOp::Eq | CompareOp::Neq) {
                "2"
            } else {
                "2 or more"
            },
            got: len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> OperatorRegistry {
        OperatorRegistry::with_builtins()
    }

    fn data(v: serde_json::Value) -> DataRecord {
        v.as_object().cloned().unwrap_or_default()
    }

    fn eval(logic: serde_json::Value, record: serde_json::Value) -> Result<Value, EvalError> {
        let reg = registry();
        let expr = LogicExpr::parse(&logic, &reg);
        eval_expr(&expr, &data(record), &reg)
    }

    #[test]
    fn income_under_limit() {
        let v = eval(
            json!({"<=": [{"var": "householdIncome"}, 2072]}),
            json!({"householdIncome": 1800}),
        )
        .unwrap();
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn missing_variable_fails_closed() {
        let v = eval(json!({"<=": [{"var": "income"}, 2000]}), json!({})).unwrap();
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn var_default_applies_when_missing() {
        let v = eval(
            json!({"==": [{"var": ["householdSize", 1]}, 1]}),
            json!({}),
        )
        .unwrap();
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn and_short_circuits() {
        // The second operand is an unknown operator; short-circuiting on the
        // false first operand means it is never evaluated.
        let v = eval(
            json!({"and": [false, {"frobnicate": [1]}]}),
            json!({}),
        )
        .unwrap();
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn or_short_circuits() {
        let v = eval(json!({"or": [true, {"frobnicate": [1]}]}), json!({})).unwrap();
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn not_negates_truthiness() {
        assert_eq!(eval(json!({"not": [0]}), json!({})).unwrap(), Value::Bool(true));
        assert_eq!(
            eval(json!({"!": [{"var": "flag"}]}), json!({"flag": true})).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn if_chain() {
        let logic = json!({"if": [
            {"<": [{"var": "age"}, 18]}, "minor",
            {"<": [{"var": "age"}, 65]}, "adult",
            "senior"
        ]});
        assert_eq!(
            eval(logic.clone(), json!({"age": 10})).unwrap(),
            Value::Text("minor".to_string())
        );
        assert_eq!(
            eval(logic.clone(), json!({"age": 40})).unwrap(),
            Value::Text("adult".to_string())
        );
        assert_eq!(
            eval(logic, json!({"age": 70})).unwrap(),
            Value::Text("senior".to_string())
        );
    }

    #[test]
    fn if_without_else_is_null() {
        let v = eval(json!({"if": [false, "x"]}), json!({})).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn membership() {
        let logic = json!({"in": [{"var": "state"}, ["WA", "OR", "ID"]]});
        assert_eq!(
            eval(logic.clone(), json!({"state": "WA"})).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(logic.clone(), json!({"state": "CA"})).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(eval(logic, json!({})).unwrap(), Value::Bool(false));
    }

    #[test]
    fn chained_ordering() {
        let logic = json!({"<": [0, {"var": "householdSize"}, 9]});
        assert_eq!(
            eval(logic.clone(), json!({"householdSize": 4})).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(logic, json!({"householdSize": 12})).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn custom_operator_dispatches_through_registry() {
        let logic = json!({"fplIncomeLimit": [
            {"var": "householdIncome"}, {"var": "householdSize"}, 130
        ]});
        assert_eq!(
            eval(logic.clone(), json!({"householdIncome": 1500, "householdSize": 3})).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(logic, json!({"householdIncome": 5000, "householdSize": 3})).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let err = eval(json!({"frobnicate": [1, 2]}), json!({})).unwrap_err();
        assert!(matches!(err, EvalError::UnknownOperator { .. }));
    }

    #[test]
    fn wrong_comparison_arity_is_an_error() {
        let err = eval(json!({"<=": [{"var": "income"}]}), json!({})).unwrap_err();
        assert!(matches!(err, EvalError::Arity { .. }));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let logic = json!({"and": [
            {"<=": [{"var": "householdIncome"}, 2072]},
            {"in": [{"var": "state"}, ["WA", "OR"]]}
        ]});
        let record = json!({"householdIncome": 1800, "state": "WA"});
        let first = eval(logic.clone(), record.clone()).unwrap();
        let second = eval(logic, record).unwrap();
        assert_eq!(first, second);
    }
}
