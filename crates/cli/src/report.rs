//! Terminal report rendering for the batch checker.
//!
//! Raw ANSI escapes, no color crate. `[ok]` / `[!!]` / `[xx]` markers keep
//! the output grep-able when piped.

use eligor_core::{ValidationIssue, ValidationReport};
use eligor_eval::PackageTestReport;

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

pub fn ok_mark() -> &'static str {
    "\x1b[32m[ok]\x1b[0m"
}

pub fn warn_mark() -> &'static str {
    "\x1b[33m[!!]\x1b[0m"
}

pub fn fail_mark() -> &'static str {
    "\x1b[31m[xx]\x1b[0m"
}

/// Render the validation section for one file.
pub fn render_validation(path: &str, report: &ValidationReport, out: &mut String) {
    out.push_str(&bold(path));
    out.push('\n');
    if report.valid {
        out.push_str(&format!(
            "  {} structure valid ({} rules)\n",
            ok_mark(),
            report.rule_count
        ));
    } else {
        out.push_str(&format!(
            "  {} structure invalid ({} errors)\n",
            fail_mark(),
            report.errors.len()
        ));
    }
    for issue in &report.errors {
        render_issue(fail_mark(), issue, out);
    }
    for issue in &report.warnings {
        render_issue(warn_mark(), issue, out);
    }
}

fn render_issue(mark: &str, issue: &ValidationIssue, out: &mut String) {
    out.push_str(&format!("    {} {}: {}\n", mark, issue.check, issue.message));
}

/// Render the embedded-test section for one file.
pub fn render_tests(report: &PackageTestReport, out: &mut String) {
    if report.total == 0 {
        out.push_str(&format!("  {} no embedded tests\n", warn_mark()));
        return;
    }
    let mark = if report.failed == 0 { ok_mark() } else { fail_mark() };
    out.push_str(&format!(
        "  {} embedded tests: {} passed, {} failed\n",
        mark, report.passed, report.failed
    ));
    for rule_report in &report.rule_reports {
        for failure in &rule_report.failures {
            out.push_str(&format!(
                "    {} {}/{}: {}",
                fail_mark(),
                rule_report.rule_id,
                failure.case_id,
                failure.message
            ));
            if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
                out.push_str(&format!(" (expected {}, got {})", expected, actual));
            }
            out.push('\n');
        }
    }
}

/// Final batch summary line.
pub fn render_summary(files: usize, invalid: usize, tests_failed: usize, out: &mut String) {
    let mark = if invalid == 0 && tests_failed == 0 {
        ok_mark()
    } else {
        fail_mark()
    };
    out.push_str(&format!(
        "{} {} file(s) checked, {} invalid, {} test failure(s)\n",
        mark, files, invalid, tests_failed
    ));
}
