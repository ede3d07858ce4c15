//! Error types for configuration parsing and gate execution.
//!
//! Only rule-file malformation and report/stage plumbing failures are fatal.
//! Findings against the analyzed source (threshold violations, naming
//! offences, duplicate blocks) are never errors; they travel as
//! `Diagnostic`s inside stage results.

use thiserror::Error;

#[derive(Debug, Error)]
/// Rule-file parse failures.
pub enum ConfigError {
    #[error("line {line}: expected 'key=value', got '{text}'")]
    MalformedLine { line: usize, text: String },

    #[error("unknown section [{0}]")]
    UnknownSection(String),

    #[error("unknown key '{key}' in section [{section}]")]
    UnknownKey { section: String, key: String },

    #[error("threshold '{key}' must be a non-negative integer, got '{value}'")]
    InvalidThreshold { key: String, value: String },

    #[error("flag '{key}' must be 'yes' or 'no', got '{value}'")]
    InvalidFlag { key: String, value: String },

    #[error("value '{value}' for '{key}' is not a number")]
    InvalidNumber { key: String, value: String },

    #[error("invalid naming pattern for '{kind}': {source}")]
    InvalidPattern {
        kind: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
/// Failures that abort a run.
pub enum GateError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report is not valid JSON: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
