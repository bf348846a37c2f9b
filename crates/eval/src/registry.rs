//! Operator registry and domain-specific custom operators.
//!
//! The registry is constructed once at process start and passed by
//! reference into every parse/evaluate call. There is no import-time global
//! registration: what the engine can evaluate is exactly what the caller
//! registered, and two registries never interfere.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::expr::LogicExpr;
use crate::numeric::to_decimal;
use crate::trace::display_amount;
use crate::types::{CriterionResult, EvalError};
use crate::value::Value;

/// A domain-specific operator, dispatched by its wire name.
///
/// `evaluate` receives the already-evaluated operand values. `trace`
/// additionally receives the operand expressions so it can name criteria
/// after the variables they dereference.
pub trait CustomOperator: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, args: &[Value]) -> Result<Value, EvalError>;

    /// Reconstruct the human-inspectable criteria this operator stands for.
    fn trace(
        &self,
        args: &[Value],
        arg_exprs: &[LogicExpr],
    ) -> Result<Vec<CriterionResult>, EvalError>;
}

/// Lookup table of custom operators, keyed by wire name.
pub struct OperatorRegistry {
    ops: BTreeMap<String, Box<dyn CustomOperator>>,
}

impl OperatorRegistry {
    /// An empty registry (no custom operators).
    pub fn new() -> OperatorRegistry {
        OperatorRegistry {
            ops: BTreeMap::new(),
        }
    }

    /// The standard registry: every operator the shipped rule packages use.
    pub fn with_builtins() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        registry.register(Box::new(FplIncomeLimit::new()));
        registry
    }

    pub fn register(&mut self, op: Box<dyn CustomOperator>) {
        self.ops.insert(op.name().to_string(), op);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CustomOperator> {
        self.ops.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        OperatorRegistry::with_builtins()
    }
}

// ──────────────────────────────────────────────
// Federal poverty level income test
// ──────────────────────────────────────────────

/// `{"fplIncomeLimit": [income, householdSize, percentage]}` --
/// true when monthly income is at or under the given percentage of the
/// federal poverty guideline for the household size.
///
/// Carries exactly one policy year's guideline table. Nothing selects a
/// table by rule effective date; rules spanning a guideline update need a
/// new package version (see DESIGN.md).
pub struct FplIncomeLimit {
    /// Annual guideline amounts for household sizes 1..=8.
    annual: [Decimal; 8],
    /// Annual increment per person above eight.
    per_additional: Decimal,
}

impl FplIncomeLimit {
    /// 2024 federal poverty guidelines, 48 contiguous states and DC.
    pub fn new() -> FplIncomeLimit {
        FplIncomeLimit {
            annual: [
                Decimal::from(15060),
                Decimal::from(20440),
                Decimal::from(25820),
                Decimal::from(31200),
                Decimal::from(36580),
                Decimal::from(41960),
                Decimal::from(47340),
                Decimal::from(52720),
            ],
            per_additional: Decimal::from(5380),
        }
    }

    /// Monthly income limit for a household size at a percentage of the
    /// guideline, rounded to cents. Arithmetic is checked: an extreme
    /// percentage or household size surfaces as `EvalError::Overflow`
    /// rather than aborting the evaluation.
    pub fn monthly_limit(
        &self,
        household_size: u32,
        percentage: Decimal,
    ) -> Result<Decimal, EvalError> {
        let annual = if household_size <= 8 {
            self.annual[household_size.saturating_sub(1) as usize]
        } else {
            self.per_additional
                .checked_mul(Decimal::from(household_size - 8))
                .and_then(|extra| self.annual[7].checked_add(extra))
                .ok_or_else(|| EvalError::Overflow {
                    message: format!(
                        "{} guideline for household of {}",
                        FPL_OP_NAME, household_size
                    ),
                })?
        };
        annual
            .checked_mul(percentage)
            .and_then(|v| v.checked_div(Decimal::from(100)))
            .and_then(|v| v.checked_div(Decimal::from(12)))
            .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
            .ok_or_else(|| EvalError::Overflow {
                message: format!("{} limit at {}%", FPL_OP_NAME, percentage),
            })
    }

    /// Coerced operands, or `None` when any operand is `Undefined`
    /// (fail-closed) or an error when an operand has the wrong type.
    fn operands(
        &self,
        args: &[Value],
    ) -> Result<Option<(Decimal, u32, Decimal)>, EvalError> {
        if args.len() != 3 {
            return Err(EvalError::Arity {
                op: FPL_OP_NAME.to_string(),
                expected: "3",
                got: args.len(),
            });
        }
        if args.iter().any(|a| matches!(a, Value::Undefined)) {
            return Ok(None);
        }
        let income = to_decimal(&args[0]).ok_or_else(|| EvalError::TypeError {
            message: format!(
                "{} income operand must be numeric, got {}",
                FPL_OP_NAME,
                args[0].type_name()
            ),
        })?;
        let size_raw = to_decimal(&args[1]).ok_or_else(|| EvalError::TypeError {
            message: format!(
                "{} household size operand must be numeric, got {}",
                FPL_OP_NAME,
                args[1].type_name()
            ),
        })?;
        if !size_raw.fract().is_zero() || size_raw < Decimal::ONE {
            return Err(EvalError::TypeError {
                message: format!(
                    "{} household size must be a positive whole number, got {}",
                    FPL_OP_NAME, size_raw
                ),
            });
        }
        let size = size_raw.to_u32().ok_or_else(|| EvalError::TypeError {
            message: format!("{} household size out of range: {}", FPL_OP_NAME, size_raw),
        })?;
        let percentage = to_decimal(&args[2]).ok_or_else(|| EvalError::TypeError {
            message: format!(
                "{} percentage operand must be numeric, got {}",
                FPL_OP_NAME,
                args[2].type_name()
            ),
        })?;
        Ok(Some((income, size, percentage)))
    }
}

impl Default for FplIncomeLimit {
    fn default() -> Self {
        FplIncomeLimit::new()
    }
}

static FPL_OP_NAME: &str = "fplIncomeLimit";

impl CustomOperator for FplIncomeLimit {
    fn name(&self) -> &str {
        FPL_OP_NAME
    }

    fn evaluate(&self, args: &[Value]) -> Result<Value, EvalError> {
        match self.operands(args)? {
            Some((income, size, percentage)) => {
                let limit = self.monthly_limit(size, percentage)?;
                Ok(Value::Bool(income <= limit))
            }
            // An unanswered income or size question fails closed.
            None => Ok(Value::Bool(false)),
        }
    }

    /// Two criteria: the income test (which can fail) and an informational
    /// household-size entry. Size alone never disqualifies, but it sets the
    /// limit, so it must stay visible to the end user.
    fn trace(
        &self,
        args: &[Value],
        arg_exprs: &[LogicExpr],
    ) -> Result<Vec<CriterionResult>, EvalError> {
        let income_name = arg_exprs
            .first()
            .and_then(LogicExpr::var_name)
            .unwrap_or("income");
        let size_name = arg_exprs
            .get(1)
            .and_then(LogicExpr::var_name)
            .unwrap_or("householdSize");

        match self.operands(args)? {
            Some((income, size, percentage)) => {
                let limit = self.monthly_limit(size, percentage)?;
                let met = income <= limit;
                Ok(vec![
                    CriterionResult {
                        criterion: income_name.to_string(),
                        met,
                        value: args[0].to_json(),
                        threshold: Value::Number(limit).to_json(),
                        operator: "<=".to_string(),
                        comparison: format!(
                            "{} ({}) <= {} ({}% of the poverty guideline for a household of {})",
                            income_name,
                            display_amount(income),
                            display_amount(limit),
                            percentage,
                            size
                        ),
                    },
                    CriterionResult {
                        criterion: size_name.to_string(),
                        met: true,
                        value: args[1].to_json(),
                        threshold: serde_json::Value::Null,
                        operator: "info".to_string(),
                        comparison: format!(
                            "household size of {} sets the income limit at {}",
                            size,
                            display_amount(limit)
                        ),
                    },
                ])
            }
            None => Ok(vec![
                CriterionResult {
                    criterion: income_name.to_string(),
                    met: false,
                    value: args[0].to_json(),
                    threshold: serde_json::Value::Null,
                    operator: "<=".to_string(),
                    comparison: format!(
                        "{} could not be checked against the poverty guideline (missing answer)",
                        income_name
                    ),
                },
                CriterionResult {
                    criterion: size_name.to_string(),
                    met: true,
                    value: args[1].to_json(),
                    threshold: serde_json::Value::Null,
                    operator: "info".to_string(),
                    comparison: "household size determines the income limit".to_string(),
                },
            ]),
        }
    }
}
