//! Runtime values for the logic interpreter.
//!
//! Distinct from `serde_json::Value` for two reasons: numbers are held as
//! `rust_decimal::Decimal` (no `f64` in the comparison path), and a missing
//! variable resolves to an explicit `Undefined` that is never conflated
//! with JSON null. Every comparison against `Undefined` fails closed.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::EvalError;

/// A value produced while interpreting a logic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of dereferencing a variable absent from the answer record.
    Undefined,
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Convert a JSON value into a runtime value.
    pub fn from_json(v: &serde_json::Value) -> Result<Value, EvalError> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => number_to_decimal(n).map(Value::Number),
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Value::from_json(item)?);
                }
                Ok(Value::List(out))
            }
            serde_json::Value::Object(fields) => {
                let mut out = BTreeMap::new();
                for (k, val) in fields {
                    out.insert(k.clone(), Value::from_json(val)?);
                }
                Ok(Value::Record(out))
            }
        }
    }

    /// Convert back to JSON for result serialization. `Undefined` maps to
    /// null, the closest JSON can express.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(d) => decimal_to_json(*d),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Truthiness for boolean composition: `Undefined`, null, `false`,
    /// zero, the empty string and the empty list are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(d) => !d.is_zero(),
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Record(_) => true,
        }
    }
}

/// JSON numbers convert through their exact decimal rendering, never
/// through `f64` arithmetic.
fn number_to_decimal(n: &serde_json::Number) -> Result<Decimal, EvalError> {
    let raw = n.to_string();
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| EvalError::InvalidNumber { raw })
}

fn decimal_to_json(d: Decimal) -> serde_json::Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return serde_json::Value::Number(serde_json::Number::from(i));
        }
    }
    match d.to_f64().and_then(serde_json::Number::from_f64) {
        Some(n) => serde_json::Value::Number(n),
        // Out of f64 range; fall back to the string rendering.
        None => serde_json::Value::String(d.to_string()),
    }
}
