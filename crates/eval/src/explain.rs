//! Explanation assembly.
//!
//! Turns the criteria trace plus the boolean determination into summary
//! and itemized text. Templated string assembly only -- no natural
//! language generation.

use crate::types::{CriterionResult, Explanation};

const ELIGIBLE_SUMMARY: &str = "Based on your answers, you appear to meet the requirements for this program.";
const NOT_ELIGIBLE_SUMMARY: &str = "Based on your answers, you do not appear to meet the requirements for this program.";
const FAILED_LEAD_IN: &str = "The following requirements were not met: ";

/// Build the user-facing explanation for one evaluation.
///
/// When the overall determination is eligible, the summary is a single
/// affirming sentence and no "not met" text is emitted, even if a branch
/// inside an `or` evaluated false internally -- surfacing those would read
/// as a contradiction.
pub fn explain(criteria: &[CriterionResult], eligible: bool) -> Explanation {
    if criteria.is_empty() {
        // Pure boolean composition with no extractable comparisons.
        return Explanation {
            summary: if eligible {
                ELIGIBLE_SUMMARY.to_string()
            } else {
                NOT_ELIGIBLE_SUMMARY.to_string()
            },
            passed: Vec::new(),
            failed: Vec::new(),
        };
    }

    let passed: Vec<String> = criteria
        .iter()
        .filter(|c| c.met)
        .map(|c| c.comparison.clone())
        .collect();

    if eligible {
        return Explanation {
            summary: ELIGIBLE_SUMMARY.to_string(),
            passed,
            failed: Vec::new(),
        };
    }

    let failed: Vec<String> = criteria
        .iter()
        .filter(|c| !c.met)
        .map(|c| c.comparison.clone())
        .collect();

    let summary = if failed.is_empty() {
        NOT_ELIGIBLE_SUMMARY.to_string()
    } else {
        format!("{}{}", FAILED_LEAD_IN, failed.join("; "))
    };

    Explanation {
        summary,
        passed,
        failed,
    }
}
