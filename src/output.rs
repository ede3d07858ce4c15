//! Output rendering for score, dup, and gate commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary.

use crate::lint::LintOutcome;
use crate::models::{Diagnostic, FailReason, Severity};
use crate::pipeline::{GateState, PipelineRun};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn severity_tag(sev: Severity, color: bool) -> String {
    match sev {
        Severity::Error => {
            if color {
                "⟦error⟧".red().bold().to_string()
            } else {
                "⟦error⟧".to_string()
            }
        }
        Severity::Warning => {
            if color {
                "⟦warn⟧".yellow().bold().to_string()
            } else {
                "⟦warn⟧".to_string()
            }
        }
        Severity::Refactor => {
            if color {
                "⟦refactor⟧".magenta().bold().to_string()
            } else {
                "⟦refactor⟧".to_string()
            }
        }
        Severity::Convention => {
            if color {
                "⟦convention⟧".blue().bold().to_string()
            } else {
                "⟦convention⟧".to_string()
            }
        }
    }
}

fn severity_icon(sev: Severity, color: bool) -> String {
    let (icon, colored) = match sev {
        Severity::Error => ("✖", "✖".red().to_string()),
        Severity::Warning => ("▲", "▲".yellow().to_string()),
        Severity::Refactor => ("◆", "◆".magenta().to_string()),
        Severity::Convention => ("○", "○".blue().to_string()),
    };
    if color {
        colored
    } else {
        icon.to_string()
    }
}

fn print_diagnostic(d: &Diagnostic, color: bool) {
    let location = if d.end_line > d.line {
        format!("{}:{}-{}", d.unit, d.line, d.end_line)
    } else {
        format!("{}:{}", d.unit, d.line)
    };
    let location = if color {
        location.bold().to_string()
    } else {
        location
    };
    println!(
        "{} {} {} ❲{}❳ — {}",
        severity_icon(d.severity, color),
        severity_tag(d.severity, color),
        location,
        d.rule,
        d.message
    );
}

/// Print a lint outcome in the requested format.
pub fn print_score(outcome: &LintOutcome, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_score_json(outcome)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for d in &outcome.diagnostics {
                print_diagnostic(d, color);
            }
            let verdict = if outcome.passed { "pass" } else { "fail" };
            let summary = format!(
                "— Score {:.2}/10 — errors={} warnings={} refactors={} conventions={} statements={} units={} verdict={}",
                outcome.score,
                outcome.counts.error,
                outcome.counts.warning,
                outcome.counts.refactor,
                outcome.counts.convention,
                outcome.statements,
                outcome.units,
                verdict
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print duplicate findings.
pub fn print_dup(diags: &[Diagnostic], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_dup_json(diags)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for d in diags {
                print_diagnostic(d, color);
            }
            let summary = format!("— Summary — duplicates={}", diags.len());
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print a pipeline run: one line per executed stage, then the verdict.
pub fn print_gate(run: &PipelineRun, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_gate_json(run)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for result in &run.stages {
                let line = if result.passed {
                    format!("✔ {} ({} ms)", result.stage, result.duration_ms)
                } else {
                    let why = match &result.reason {
                        Some(FailReason::Timeout) => " — timed out".to_string(),
                        Some(FailReason::ExitCode(code)) => format!(" — exit code {}", code),
                        Some(FailReason::Error(e)) => format!(" — {}", e),
                        None => String::new(),
                    };
                    format!("✘ {} ({} ms){}", result.stage, result.duration_ms, why)
                };
                if color {
                    if result.passed {
                        println!("{}", line.green());
                    } else {
                        println!("{}", line.red());
                    }
                } else {
                    println!("{}", line);
                }
                for d in &result.diagnostics {
                    print_diagnostic(d, color);
                }
            }
            let summary = match run.state {
                GateState::Passed => format!("— Gate passed — stages={}", run.stages.len()),
                GateState::Failed(i) => format!(
                    "— Gate failed at stage {} ({})",
                    i,
                    run.stages.last().map(|s| s.stage.as_str()).unwrap_or("?")
                ),
                _ => "— Gate did not reach a terminal state".to_string(),
            };
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Compose score JSON object (pure) for testing/snapshot purposes.
pub fn compose_score_json(outcome: &LintOutcome) -> JsonVal {
    serde_json::to_value(outcome).unwrap()
}

/// Compose dup JSON object (pure) for testing/snapshot purposes.
pub fn compose_dup_json(diags: &[Diagnostic]) -> JsonVal {
    json!({
        "duplicates": diags,
        "summary": { "duplicates": diags.len() },
    })
}

/// Compose gate JSON object (pure) for testing/snapshot purposes.
pub fn compose_gate_json(run: &PipelineRun) -> JsonVal {
    let failed_stage = match run.state {
        GateState::Failed(i) => Some(i),
        _ => None,
    };
    json!({
        "stages": run.stages,
        "verdict": if run.passed() { "passed" } else { "failed" },
        "failed_stage": failed_stage,
    })
}
