//! Shared data models for diagnostics, severity accounting, and gate results.

pub mod report;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Diagnostic severity, in ascending order of scoring weight.
pub enum Severity {
    Convention,
    Refactor,
    Warning,
    Error,
}

impl Severity {
    /// Weight applied in the score penalty term. Errors weigh 5, all other
    /// severities weigh 1.
    pub fn weight(self) -> usize {
        match self {
            Severity::Error => 5,
            _ => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Convention => "convention",
            Severity::Refactor => "refactor",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single finding with severity and location.
///
/// Produced either by the external analyzer (via the report file) or by the
/// in-process checkers (thresholds, naming, duplicate code). Read-only once
/// created.
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    /// Source unit the finding belongs to. May be empty in a report file,
    /// in which case the loader fills it from the enclosing unit entry.
    #[serde(default)]
    pub unit: String,
    pub line: usize,
    /// Inclusive end of the affected line span; defaults to `line`.
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Per-severity counts, derived per evaluation and merged across units.
pub struct SeverityCounts {
    pub convention: usize,
    pub refactor: usize,
    pub warning: usize,
    pub error: usize,
}

impl SeverityCounts {
    /// Record one diagnostic of the given severity.
    pub fn add(&mut self, sev: Severity) {
        match sev {
            Severity::Convention => self.convention += 1,
            Severity::Refactor => self.refactor += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
        }
    }

    /// Merge another aggregate into this one.
    ///
    /// Commutative and associative, so per-unit counts can be reduced in
    /// any order (including from a parallel map) without changing the result.
    pub fn merge(&mut self, other: &SeverityCounts) {
        self.convention += other.convention;
        self.refactor += other.refactor;
        self.warning += other.warning;
        self.error += other.error;
    }

    /// Total penalty weight: `5*error + warning + refactor + convention`.
    pub fn weighted_total(&self) -> usize {
        self.error * Severity::Error.weight() + self.warning + self.refactor + self.convention
    }

    pub fn total(&self) -> usize {
        self.convention + self.refactor + self.warning + self.error
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
/// Why a stage failed. Timeouts are distinguished from ordinary failures so
/// reporters can tell an aborted stage from a rejected one.
pub enum FailReason {
    ExitCode(i32),
    Timeout,
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
/// Outcome of one gate stage.
pub struct StageResult {
    pub stage: String,
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailReason>,
}
