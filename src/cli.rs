//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "qgate",
    version,
    about = "qgate — rule-driven quality scoring and fail-fast gating",
    long_about = "qgate evaluates analyzer reports against a rule file, computes a weighted\nquality score, detects duplicated code blocks, and drives an ordered\nlint → format-check → test gate that stops at the first failure.\n\nConfiguration precedence: CLI > qgate.toml > defaults.",
    after_help = "Examples:\n  qgate score --rules lint.cfg --report analysis.json\n  qgate dup --rules lint.cfg --pattern 'src/**/*.py'\n  qgate gate --rules lint.cfg --report analysis.json --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for scoring, duplicate detection, and gating.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current qgate version.")]
    Version,
    /// Score an analyzer report
    #[command(
        about = "Compute the quality score",
        long_about = "Filter the report's diagnostics through the rule file, run threshold and\nnaming checks, detect duplicates in the configured patterns, and print the\nscore and verdict. Exits non-zero when the score is below fail-under.",
        after_help = "Examples:\n  qgate score --report analysis.json\n  qgate score --rules lint.cfg --output json"
    )]
    Score {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Path to the rule file (default: lint.cfg)")]
        rules: Option<String>,
        #[arg(long, help = "Path to the analyzer report JSON (default: analysis.json)")]
        report: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Detect duplicated code blocks
    #[command(
        about = "Find duplicated blocks",
        long_about = "Scan the sources matched by the patterns for contiguous blocks of\nidentical code at or above min-similarity-lines. Exits non-zero when any\nduplicate is found.",
        after_help = "Examples:\n  qgate dup --pattern 'src/**/*.py'\n  qgate dup --pattern 'a.py' --pattern 'b.py' --output json"
    )]
    Dup {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Path to the rule file (default: lint.cfg)")]
        rules: Option<String>,
        #[arg(long = "pattern", help = "Glob pattern for source units (repeatable)")]
        patterns: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Run the full quality gate
    #[command(
        about = "Run the fail-fast gate",
        long_about = "Run the lint stage, then each [[gate.stages]] command from qgate.toml, in\norder, stopping at the first failure. Exits non-zero unless every stage\npasses.",
        after_help = "Examples:\n  qgate gate\n  qgate gate --report target/analysis.json --output json"
    )]
    Gate {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Path to the rule file (default: lint.cfg)")]
        rules: Option<String>,
        #[arg(long, help = "Path to the analyzer report JSON (default: analysis.json)")]
        report: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
