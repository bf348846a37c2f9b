//! Shared evaluation result types and errors.
//!
//! These types are DISTINCT from the `eligor-core` document model. The
//! evaluator consumes the `ruleLogic` JSON verbatim and produces the result
//! shapes here; the calling layer owns their lifetime and may persist them
//! keyed by (userProfileId, programId). Nothing in this crate reads or
//! writes storage.

use std::fmt;

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur while interpreting a logic expression tree.
///
/// None of these cross the public evaluation surface: the boundary in
/// `lib.rs` converts them into `success:false` result data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An operator not in the supported set and not in the registry.
    UnknownOperator { op: String },
    /// An operator received the wrong number of operands.
    Arity {
        op: String,
        expected: &'static str,
        got: usize,
    },
    /// An operand had a type the operator cannot work with.
    TypeError { message: String },
    /// Decimal arithmetic exceeded the representable range.
    Overflow { message: String },
    /// A JSON number that cannot be represented as a decimal.
    InvalidNumber { raw: String },
    /// The expression tree itself is structurally unusable.
    MalformedLogic { message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownOperator { op } => {
                write!(f, "unknown operator: {}", op)
            }
            EvalError::Arity { op, expected, got } => {
                write!(f, "operator '{}' expects {} operands, got {}", op, expected, got)
            }
            EvalError::TypeError { message } => {
                write!(f, "type error: {}", message)
            }
            EvalError::Overflow { message } => {
                write!(f, "numeric overflow: {}", message)
            }
            EvalError::InvalidNumber { raw } => {
                write!(f, "invalid number: {}", raw)
            }
            EvalError::MalformedLogic { message } => {
                write!(f, "malformed logic: {}", message)
            }
        }
    }
}

impl std::error::Error for EvalError {}

// ──────────────────────────────────────────────
// Per-criterion trace
// ──────────────────────────────────────────────

/// One human-inspectable condition reconstructed from a rule's logic tree.
///
/// Produced fresh per evaluation call, ordered by depth-first position in
/// the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    /// Variable name the condition is about (e.g. "householdIncome").
    pub criterion: String,
    pub met: bool,
    /// Actual value resolved from the answer record.
    pub value: serde_json::Value,
    /// Threshold the value was compared against, after resolving any
    /// nested expression on the threshold side.
    pub threshold: serde_json::Value,
    /// Comparison operator as authored ("<=", "in", ...), or "info" for
    /// purely informational criteria.
    pub operator: String,
    /// Deterministic formatted comparison, suitable for end users.
    pub comparison: String,
}

// ──────────────────────────────────────────────
// Evaluation results
// ──────────────────────────────────────────────

/// Full outcome of evaluating one rule against one answer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedEvaluationResult {
    /// Boolean determination (truthiness of the evaluated tree).
    pub result: bool,
    /// False when evaluation hit an error; `result` is then false too.
    pub success: bool,
    pub execution_time_ms: f64,
    pub criteria_results: Vec<CriterionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// User-facing explanation assembled from the criteria trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}
