//! Parsed representation of the logic expression tree.
//!
//! Rule logic is authored as nested JSON: a node is a literal, a variable
//! reference `{"var": name}`, or an operator application `{op: [operands]}`.
//! Parsing is total over a closed set of operator kinds plus an explicit
//! `Unknown` fallback, so no shape is ever silently ignored: the
//! interpreter and the criteria trace both match exhaustively on this enum
//! and an unhandled operator becomes an evaluation error, not a skipped
//! node.

use crate::registry::OperatorRegistry;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
}

impl CompareOp {
    pub fn from_key(key: &str) -> Option<CompareOp> {
        match key {
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Lte),
            ">=" => Some(CompareOp::Gte),
            "==" | "===" => Some(CompareOp::Eq),
            "!=" | "!==" => Some(CompareOp::Neq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
        }
    }

    /// The operator as seen from the other side of the comparison
    /// (`a < b` is `b > a`). Used when the variable reference sits on the
    /// right-hand side.
    pub fn mirrored(&self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Lte => CompareOp::Gte,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Neq => CompareOp::Neq,
        }
    }
}

/// One node of the parsed logic tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicExpr {
    /// A literal JSON value.
    Literal(serde_json::Value),
    /// A variable dereference, with an optional default expression used
    /// when the variable is absent from the answer record.
    Var {
        name: String,
        default: Option<Box<LogicExpr>>,
    },
    And(Vec<LogicExpr>),
    Or(Vec<LogicExpr>),
    Not(Box<LogicExpr>),
    /// `[cond, then, cond, then, ..., else?]` chain.
    If(Vec<LogicExpr>),
    Compare {
        op: CompareOp,
        operands: Vec<LogicExpr>,
    },
    /// Membership: needle in list, or substring for text.
    In {
        needle: Box<LogicExpr>,
        haystack: Box<LogicExpr>,
    },
    /// An operator registered in the registry at parse time.
    Custom { name: String, args: Vec<LogicExpr> },
    /// Anything else. Kept in the tree so evaluation reports it instead of
    /// dropping it.
    Unknown {
        op: String,
        args: Vec<serde_json::Value>,
    },
}

impl LogicExpr {
    /// Parse a logic tree from its JSON wire shape. Total: every JSON
    /// value parses, with unrecognized operators landing in `Unknown`.
    pub fn parse(v: &serde_json::Value, registry: &OperatorRegistry) -> LogicExpr {
        let obj = match v.as_object() {
            Some(obj) if obj.len() == 1 => obj,
            // Multi-key objects and plain values are literals.
            _ => return LogicExpr::Literal(v.clone()),
        };
        // Single-key object: the key names the operator.
        let (key, operand) = match obj.iter().next() {
            Some(entry) => entry,
            None => return LogicExpr::Literal(v.clone()),
        };

        if key == "var" {
            return parse_var(operand, registry);
        }

        let args = operand_list(operand);

        match key.as_str() {
            "and" => LogicExpr::And(parse_all(&args, registry)),
            "or" => LogicExpr::Or(parse_all(&args, registry)),
            "not" | "!" => match args.as_slice() {
                [single] => LogicExpr::Not(Box::new(LogicExpr::parse(single, registry))),
                _ => LogicExpr::Unknown {
                    op: key.clone(),
                    args: args.into_iter().cloned().collect(),
                },
            },
            "if" => LogicExpr::If(parse_all(&args, registry)),
            "in" => match args.as_slice() {
                [needle, haystack] => LogicExpr::In {
                    needle: Box::new(LogicExpr::parse(needle, registry)),
                    haystack: Box::new(LogicExpr::parse(haystack, registry)),
                },
                _ => LogicExpr::Unknown {
                    op: key.clone(),
                    args: args.into_iter().cloned().collect(),
                },
            },
            _ => {
                if let Some(op) = CompareOp::from_key(key) {
                    LogicExpr::Compare {
                        op,
                        operands: parse_all(&args, registry),
                    }
                } else if registry.contains(key) {
                    LogicExpr::Custom {
                        name: key.clone(),
                        args: parse_all(&args, registry),
                    }
                } else {
                    LogicExpr::Unknown {
                        op: key.clone(),
                        args: args.into_iter().cloned().collect(),
                    }
                }
            }
        }
    }

    /// The variable name if this node is a plain dereference.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            LogicExpr::Var { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Operator operands: an array on the wire, or a bare value meaning a
/// one-element operand list (`{"not": {...}}`).
fn operand_list(operand: &serde_json::Value) -> Vec<&serde_json::Value> {
    match operand {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn parse_all(args: &[&serde_json::Value], registry: &OperatorRegistry) -> Vec<LogicExpr> {
    args.iter().map(|a| LogicExpr::parse(a, registry)).collect()
}

fn parse_var(operand: &serde_json::Value, registry: &OperatorRegistry) -> LogicExpr {
    match operand {
        serde_json::Value::String(name) => LogicExpr::Var {
            name: name.clone(),
            default: None,
        },
        serde_json::Value::Array(items) => match items.as_slice() {
            [serde_json::Value::String(name)] => LogicExpr::Var {
                name: name.clone(),
                default: None,
            },
            [serde_json::Value::String(name), default] => LogicExpr::Var {
                name: name.clone(),
                default: Some(Box::new(LogicExpr::parse(default, registry))),
            },
            _ => LogicExpr::Unknown {
                op: "var".to_string(),
                args: items.clone(),
            },
        },
        other => LogicExpr::Unknown {
            op: "var".to_string(),
            args: vec![other.clone()],
        },
    }
}
