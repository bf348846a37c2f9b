//! Comparison and coercion semantics, shared by the interpreter and the
//! criteria trace.
//!
//! Both walkers call into this module for every comparison, so the boolean
//! determination and the per-criterion `met` flags cannot drift apart.
//!
//! All numeric work uses `rust_decimal::Decimal`. Ordering operators
//! coerce both sides to decimal (numeric strings included); equality is
//! strict by type except that numbers compare by value (`100 == 100.0`).
//! Any comparison touching `Undefined` is false -- an unanswered question
//! never satisfies a criterion, including under `!=`.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::expr::CompareOp;
use crate::value::Value;

/// Coerce a value to a decimal for ordering comparisons.
pub fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(d) => Some(*d),
        Value::Text(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Apply a comparison operator. Fail-closed: sides that are `Undefined` or
/// (for ordering operators) non-numeric make the comparison false rather
/// than an error.
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    if matches!(left, Value::Undefined) || matches!(right, Value::Undefined) {
        return false;
    }
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Neq => !values_equal(left, right),
        CompareOp::Lt | CompareOp::Gt | CompareOp::Lte | CompareOp::Gte => {
            let (Some(l), Some(r)) = (to_decimal(left), to_decimal(right)) else {
                return false;
            };
            match op {
                CompareOp::Lt => l < r,
                CompareOp::Gt => l > r,
                CompareOp::Lte => l <= r,
                CompareOp::Gte => l >= r,
                CompareOp::Eq | CompareOp::Neq => unreachable!("handled above"),
            }
        }
    }
}

/// Strict equality: same type and equal, with numbers compared by decimal
/// value. `Undefined` equals nothing, itself included.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, _) | (_, Value::Undefined) => false,
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::Text(l), Value::Text(r)) => l == r,
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Record(l), Value::Record(r)) => {
            l.len() == r.len()
                && l.iter()
                    .zip(r)
                    .all(|((lk, lv), (rk, rv))| lk == rk && values_equal(lv, rv))
        }
        _ => false,
    }
}

/// Membership: element of a list (by `values_equal`), or substring when
/// both sides are text. Anything else, `Undefined` included, is false.
pub fn contains(needle: &Value, haystack: &Value) -> bool {
    match haystack {
        Value::List(items) => items.iter().any(|item| values_equal(needle, item)),
        Value::Text(s) => match needle {
            Value::Text(sub) => s.contains(sub.as_str()),
            _ => false,
        },
        _ => false,
    }
}
