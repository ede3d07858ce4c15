//! Configuration discovery and effective settings resolution.
//!
//! qgate reads `qgate.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `rules`: `lint.cfg`
//! - `report`: `analysis.json`
//! - `output`: `human`
//! - `patterns`: empty (no similarity scan)
//! - `gate.stages`: empty (the gate runs the lint stage only)
//!
//! Overrides precedence: CLI > config file > defaults.
//!
//! The rule file itself (`lint.cfg`) is a different animal: a sectioned
//! `key=value` file parsed by `rules::RuleConfig`, loaded here via
//! `load_rules`.

use crate::error::GateError;
use crate::rules::RuleConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
/// One external gate stage declared under `[[gate.stages]]`.
pub struct StageCfg {
    pub name: String,
    pub command: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Gate-related configuration section under `[gate]`.
pub struct GateCfg {
    #[serde(default)]
    pub stages: Vec<StageCfg>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `qgate.toml|yaml`.
pub struct QgateConfig {
    pub rules: Option<String>,
    pub report: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
    #[serde(default)]
    pub gate: Option<GateCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub rules_path: String,
    pub report_path: String,
    pub output: String,
    pub patterns: Vec<String>,
    pub stages: Vec<StageCfg>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `qgate.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("qgate.toml").exists()
            || cur.join("qgate.yaml").exists()
            || cur.join("qgate.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `QgateConfig` from `qgate.toml` or `qgate.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<QgateConfig> {
    let toml_path = root.join("qgate.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: QgateConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["qgate.yaml", "qgate.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: QgateConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_rules: Option<&str>,
    cli_report: Option<&str>,
    cli_output: Option<&str>,
    cli_patterns: &[String],
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let rules_path = cli_rules
        .map(|s| s.to_string())
        .or(cfg.rules)
        .unwrap_or_else(|| "lint.cfg".to_string());

    let report_path = cli_report
        .map(|s| s.to_string())
        .or(cfg.report)
        .unwrap_or_else(|| "analysis.json".to_string());

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let patterns = if cli_patterns.is_empty() {
        cfg.patterns.unwrap_or_default()
    } else {
        cli_patterns.to_vec()
    };

    let stages = cfg.gate.unwrap_or_default().stages;

    Effective {
        repo_root,
        rules_path,
        report_path,
        output,
        patterns,
        stages,
    }
}

/// Read and parse the rule file referenced by an `Effective` config.
pub fn load_rules(eff: &Effective) -> Result<RuleConfig, GateError> {
    let path = eff.repo_root.join(&eff.rules_path);
    let text = fs::read_to_string(&path).map_err(|source| GateError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    Ok(RuleConfig::parse(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("qgate.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules = "policy/lint.cfg"
report = "target/analysis.json"
output = "json"
patterns = ["src/**/*.py"]

[[gate.stages]]
name = "format-check"
command = ["black", "--check", "."]
timeout_secs = 120

[[gate.stages]]
name = "test"
command = ["pytest", "-q"]
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None, None, &[]);
        assert_eq!(eff.rules_path, "policy/lint.cfg");
        assert_eq!(eff.report_path, "target/analysis.json");
        assert_eq!(eff.output, "json");
        assert_eq!(eff.patterns, vec!["src/**/*.py".to_string()]);
        assert_eq!(eff.stages.len(), 2);
        assert_eq!(eff.stages[0].name, "format-check");
        assert_eq!(eff.stages[0].timeout_secs, Some(120));
        assert_eq!(eff.stages[1].command[0], "pytest");
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("qgate.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules: lint.cfg
output: human
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None, &[]);
        assert_eq!(eff.rules_path, "lint.cfg");
        assert_eq!(eff.report_path, "analysis.json");
        assert_eq!(eff.output, "human");
        assert!(eff.patterns.is_empty());
        assert!(eff.stages.is_empty());
    }

    #[test]
    fn test_cli_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("qgate.toml"),
            "rules = \"a.cfg\"\noutput = \"json\"\npatterns = [\"lib/**\"]\n",
        )
        .unwrap();

        let eff = resolve_effective(
            root.to_str(),
            Some("b.cfg"),
            None,
            Some("human"),
            &["src/**".to_string()],
        );
        assert_eq!(eff.rules_path, "b.cfg");
        assert_eq!(eff.output, "human");
        assert_eq!(eff.patterns, vec!["src/**".to_string()]);
    }

    #[test]
    fn test_load_rules_reports_missing_file() {
        let dir = tempdir().unwrap();
        let eff = resolve_effective(dir.path().to_str(), None, None, None, &[]);
        assert!(load_rules(&eff).is_err());
    }

    #[test]
    fn test_load_rules_round_trip() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("lint.cfg"), "[DESIGN]\nmax-args=5\n").unwrap();
        let eff = resolve_effective(root.to_str(), None, None, None, &[]);
        let rules = load_rules(&eff).unwrap();
        assert_eq!(rules.threshold("max-args"), Some(5));
    }
}
