//! Lint evaluation: report aggregation, in-process checks, and scoring.
//!
//! Produces a `LintOutcome` with the retained diagnostics, severity counts,
//! and the quality score. Per-unit work is embarrassingly parallel and runs
//! on the rayon pool; the reduce joins all units before the score is
//! computed, since the score depends on the complete aggregate.

use crate::aggregate::{aggregate, aggregate_units, Aggregate};
use crate::checks;
use crate::error::GateError;
use crate::models::report::AnalysisReport;
use crate::models::{Diagnostic, FailReason, SeverityCounts, StageResult};
use crate::pipeline::Stage;
use crate::rules::RuleConfig;
use crate::score;
use crate::similarity::{find_duplicates, SimilarityOptions};
use crate::utils;
use glob::glob;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Serialize)]
/// Result of one lint evaluation over an analyzer report.
pub struct LintOutcome {
    pub score: f64,
    pub passed: bool,
    pub counts: SeverityCounts,
    pub statements: usize,
    pub units: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full lint evaluation.
///
/// Analyzer diagnostics, design-threshold checks, naming checks, and
/// duplicate detection all flow through the same rule filter, so disabling
/// a rule id (including `duplicate-code`) drops its findings everywhere.
pub fn run_lint(
    repo_root: &Path,
    rules: &RuleConfig,
    report_path: &Path,
    patterns: &[String],
) -> Result<LintOutcome, GateError> {
    let report = AnalysisReport::load(&repo_root.join(report_path))?;

    let mut agg = aggregate_units(&report.units, rules);

    let checker_diags: Vec<Diagnostic> = report
        .units
        .par_iter()
        .flat_map_iter(|u| {
            let mut v = checks::check_design(u, rules);
            v.extend(checks::check_names(u, rules));
            v
        })
        .collect();
    agg.merge(aggregate(&checker_diags, rules));

    let sources = collect_sources(repo_root, patterns);
    let dups = find_duplicates(&sources, &SimilarityOptions::from_rules(rules));
    agg.merge(aggregate(&dups, rules));

    let Aggregate {
        counts,
        mut retained,
    } = agg;
    retained.sort_by(|a, b| {
        a.unit
            .cmp(&b.unit)
            .then(a.line.cmp(&b.line))
            .then(a.rule.cmp(&b.rule))
    });

    let statements = report.statements();
    let value = score::score(&counts, statements);
    Ok(LintOutcome {
        score: value,
        passed: score::passes(value, rules.fail_under()),
        counts,
        statements,
        units: report.units.len(),
        diagnostics: retained,
    })
}

/// Read the source bodies matched by the glob patterns, keyed by
/// repo-relative unit name. Unreadable files and bad patterns are skipped.
pub fn collect_sources(repo_root: &Path, patterns: &[String]) -> Vec<(String, String)> {
    let mut sources = Vec::new();
    for pat in patterns {
        let abs = repo_root.join(pat);
        let Ok(entries) = glob(&abs.to_string_lossy()) else {
            continue;
        };
        for path in entries.flatten() {
            if let Ok(body) = fs::read_to_string(&path) {
                sources.push((utils::display_path(repo_root, &path), body));
            }
        }
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    sources
}

/// The in-process lint stage of the gate pipeline.
pub struct LintStage {
    pub repo_root: PathBuf,
    pub rules: RuleConfig,
    pub report: PathBuf,
    pub patterns: Vec<String>,
}

impl Stage for LintStage {
    fn name(&self) -> &str {
        "lint"
    }

    fn run(&self) -> StageResult {
        let started = Instant::now();
        match run_lint(&self.repo_root, &self.rules, &self.report, &self.patterns) {
            Ok(outcome) => StageResult {
                stage: "lint".to_string(),
                passed: outcome.passed,
                reason: if outcome.passed {
                    None
                } else {
                    Some(FailReason::Error(format!(
                        "score {:.2} is below fail-under {:.2}",
                        outcome.score,
                        self.rules.fail_under()
                    )))
                },
                diagnostics: outcome.diagnostics,
                duration_ms: started.elapsed().as_millis() as u64,
            },
            Err(e) => StageResult {
                stage: "lint".to_string(),
                passed: false,
                diagnostics: Vec::new(),
                duration_ms: started.elapsed().as_millis() as u64,
                reason: Some(FailReason::Error(e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;
    use std::fs;
    use tempfile::tempdir;

    const RULES: &str = "[MESSAGES CONTROL]\ndisable=missing-docstring\n\n[DESIGN]\nmax-branches=10\n\n[REPORTS]\nfail-under=9.0\n";

    fn write_report(root: &Path, body: &str) -> PathBuf {
        let path = root.join("analysis.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_run_lint_scores_and_filters() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_report(
            root,
            r#"{
  "units": [
    {
      "unit": "pkg/a.py",
      "statements": 100,
      "metrics": {"max-branches": 12},
      "diagnostics": [
        {"rule": "undefined-name", "severity": "error", "line": 3},
        {"rule": "missing-docstring", "severity": "convention", "line": 1}
      ]
    }
  ]
}"#,
        );
        let rules = RuleConfig::parse(RULES).unwrap();
        let outcome =
            run_lint(root, &rules, Path::new("analysis.json"), &[]).unwrap();
        // missing-docstring disabled, undefined-name kept, branch check fires.
        assert_eq!(outcome.counts.error, 1);
        assert_eq!(outcome.counts.convention, 0);
        assert_eq!(outcome.counts.refactor, 1);
        // 10 - ((5+1)/100)*10 = 9.4
        assert!((outcome.score - 9.4).abs() < 1e-9);
        assert!(outcome.passed);
        assert_eq!(outcome.statements, 100);
        assert_eq!(outcome.units, 1);
    }

    #[test]
    fn test_lint_stage_fails_below_fail_under() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_report(
            root,
            r#"{
  "units": [
    {
      "unit": "pkg/a.py",
      "statements": 10,
      "diagnostics": [
        {"rule": "undefined-name", "severity": "error", "line": 3},
        {"rule": "syntax-error", "severity": "error", "line": 9}
      ]
    }
  ]
}"#,
        );
        let stage = LintStage {
            repo_root: root.to_path_buf(),
            rules: RuleConfig::parse(RULES).unwrap(),
            report: PathBuf::from("analysis.json"),
            patterns: vec![],
        };
        // score = 10 - (10/10)*10 = 0.0, well under 9.0
        let result = stage.run();
        assert!(!result.passed);
        assert!(matches!(result.reason, Some(FailReason::Error(_))));
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn test_lint_includes_duplicates_from_sources() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let block = "a = 1\nb = 2\nc = 3\nd = 4\n";
        fs::write(root.join("one.py"), block).unwrap();
        fs::write(root.join("two.py"), block).unwrap();
        write_report(root, r#"{"units": [{"unit": "one.py", "statements": 200}]}"#);
        let rules = RuleConfig::parse("[SIMILARITIES]\nmin-similarity-lines=4\n").unwrap();
        let outcome = run_lint(
            root,
            &rules,
            Path::new("analysis.json"),
            &["*.py".to_string()],
        )
        .unwrap();
        assert_eq!(outcome.counts.refactor, 2);
        assert!(outcome
            .diagnostics
            .iter()
            .all(|d| d.rule == "duplicate-code"));
    }

    #[test]
    fn test_disabling_duplicate_code_drops_findings() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let block = "a = 1\nb = 2\nc = 3\nd = 4\n";
        fs::write(root.join("one.py"), block).unwrap();
        fs::write(root.join("two.py"), block).unwrap();
        write_report(root, r#"{"units": [{"unit": "one.py", "statements": 200}]}"#);
        let rules =
            RuleConfig::parse("[MESSAGES CONTROL]\ndisable=duplicate-code\n").unwrap();
        let outcome = run_lint(
            root,
            &rules,
            Path::new("analysis.json"),
            &["*.py".to_string()],
        )
        .unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.score, 10.0);
    }

    #[test]
    fn test_missing_report_is_fatal() {
        let dir = tempdir().unwrap();
        let rules = RuleConfig::default();
        let err = run_lint(dir.path(), &rules, Path::new("nope.json"), &[]);
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_report_scores_ten() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_report(root, r#"{"units": []}"#);
        let rules = RuleConfig::default();
        let outcome = run_lint(root, &rules, Path::new("analysis.json"), &[]).unwrap();
        // Zero statements: defined sentinel, not a division fault.
        assert_eq!(outcome.score, 10.0);
        assert!(outcome.passed);
    }
}
