mod report;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use eligor_core::{model, validate_package, RulePackage, ValidationMode};
use eligor_eval::{
    evaluate_rule_with_details, run_package_tests, DataRecord, OperatorRegistry,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Eligor benefit-rules toolchain.
#[derive(Parser)]
#[command(name = "eligor", version, about = "Eligor benefit rule package toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rule package files and run their embedded tests
    Check {
        /// Package files to check; scans the rules/ directory when empty
        files: Vec<PathBuf>,
        /// Promote citation and test-coverage warnings to errors
        /// (also enabled by the STRICT environment variable)
        #[arg(long)]
        strict: bool,
    },

    /// Evaluate one rule against an answer record
    Eval {
        /// Path to the rule package file
        package: PathBuf,
        /// Rule id within the package
        #[arg(long)]
        rule: String,
        /// Path to the answer record JSON file
        #[arg(long)]
        data: PathBuf,
    },

    /// Evaluate one rule and print the human-readable explanation
    Explain {
        /// Path to the rule package file
        package: PathBuf,
        /// Rule id within the package
        #[arg(long)]
        rule: String,
        /// Path to the answer record JSON file
        #[arg(long)]
        data: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { files, strict } => {
            cmd_check(&files, strict, cli.output, cli.quiet);
        }
        Commands::Eval {
            package,
            rule,
            data,
        } => {
            cmd_eval(&package, &rule, &data, cli.output, cli.quiet, false);
        }
        Commands::Explain {
            package,
            rule,
            data,
        } => {
            cmd_eval(&package, &rule, &data, cli.output, cli.quiet, true);
        }
    }
}

// ──────────────────────────────────────────────
// check
// ──────────────────────────────────────────────

const DEFAULT_RULES_DIR: &str = "rules";

fn cmd_check(files: &[PathBuf], strict_flag: bool, output: OutputFormat, quiet: bool) {
    let mode = if strict_flag || strict_env() {
        ValidationMode::Strict
    } else {
        ValidationMode::Standard
    };

    let paths = if files.is_empty() {
        scan_rules_dir()
    } else {
        files.to_vec()
    };
    if paths.is_empty() {
        report_error(
            &format!("no package files given and no *.json under {}/", DEFAULT_RULES_DIR),
            output,
            quiet,
        );
        process::exit(1);
    }

    let registry = OperatorRegistry::with_builtins();
    let mut invalid = 0usize;
    let mut tests_failed = 0usize;
    let mut text = String::new();
    let mut json_files = Vec::new();

    for path in &paths {
        let display = path.display().to_string();

        let doc = match model::read_document(path) {
            Ok(doc) => doc,
            Err(e) => {
                // One unreadable file never aborts its siblings.
                invalid += 1;
                text.push_str(&report::bold(&display));
                text.push_str(&format!("\n  {} {}\n", report::fail_mark(), e));
                json_files.push(serde_json::json!({
                    "file": display, "valid": false, "error": e.to_string()
                }));
                continue;
            }
        };

        let validation = validate_package(&doc, mode);
        report::render_validation(&display, &validation, &mut text);
        if !validation.valid {
            invalid += 1;
        }

        let test_report = if validation.valid {
            match RulePackage::from_value(&doc) {
                Ok(pkg) => {
                    let r = run_package_tests(&pkg, &registry);
                    report::render_tests(&r, &mut text);
                    Some(r)
                }
                Err(_) => None,
            }
        } else {
            None
        };
        let failed_here = test_report.as_ref().map_or(0, |r| r.failed);
        tests_failed += failed_here;

        json_files.push(serde_json::json!({
            "file": display,
            "valid": validation.valid,
            "ruleCount": validation.rule_count,
            "errors": validation.errors.iter().map(|i| i.message.clone()).collect::<Vec<_>>(),
            "warnings": validation.warnings.iter().map(|i| i.message.clone()).collect::<Vec<_>>(),
            "testsTotal": test_report.as_ref().map_or(0, |r| r.total),
            "testsFailed": failed_here,
        }));
    }

    report::render_summary(paths.len(), invalid, tests_failed, &mut text);

    if !quiet {
        match output {
            OutputFormat::Text => print!("{}", text),
            OutputFormat::Json => {
                let summary = serde_json::json!({
                    "files": json_files,
                    "invalid": invalid,
                    "testFailures": tests_failed,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).unwrap_or_default()
                );
            }
        }
    }

    if invalid > 0 || tests_failed > 0 {
        process::exit(1);
    }
}

fn strict_env() -> bool {
    matches!(
        std::env::var("STRICT").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

fn scan_rules_dir() -> Vec<PathBuf> {
    let dir = Path::new(DEFAULT_RULES_DIR);
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(_) => Vec::new(),
    };
    paths.sort();
    paths
}

// ──────────────────────────────────────────────
// eval / explain
// ──────────────────────────────────────────────

fn cmd_eval(
    package_path: &Path,
    rule_id: &str,
    data_path: &Path,
    output: OutputFormat,
    quiet: bool,
    explain_only: bool,
) {
    let doc = match model::read_document(package_path) {
        Ok(doc) => doc,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let pkg = match RulePackage::from_value(&doc) {
        Ok(pkg) => pkg,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let Some(rule) = pkg.rule(rule_id) else {
        report_error(
            &format!("rule '{}' not found in {}", rule_id, package_path.display()),
            output,
            quiet,
        );
        process::exit(1);
    };

    let data = match read_data_record(data_path) {
        Ok(data) => data,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let registry = OperatorRegistry::with_builtins();
    let result = evaluate_rule_with_details(rule, &data, &registry);

    if !quiet {
        match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).unwrap_or_default()
                );
            }
            OutputFormat::Text => {
                if let Some(explanation) = &result.explanation {
                    println!("{}", report::bold(&rule.name));
                    println!("{}", explanation.summary);
                    if !explain_only {
                        for line in &explanation.passed {
                            println!("  {} {}", report::ok_mark(), line);
                        }
                        for line in &explanation.failed {
                            println!("  {} {}", report::fail_mark(), line);
                        }
                    }
                } else if let Some(error) = &result.error {
                    println!(
                        "{} evaluation failed, needs manual review: {}",
                        report::warn_mark(),
                        error
                    );
                }
            }
        }
    }

    // An evaluation error degrades to exit 2 so callers can distinguish
    // "not eligible" from "could not evaluate".
    if !result.success {
        process::exit(2);
    }
}

fn read_data_record(path: &Path) -> Result<DataRecord, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading '{}': {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(format!(
            "answer record in '{}' must be a JSON object",
            path.display()
        )),
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
