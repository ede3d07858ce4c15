//! Rule configuration: the sectioned `key=value` rule file.
//!
//! The rule file uses the classic analyzer-rc layout: `[SECTION]` headers
//! followed by `key=value` lines, with comma-separated lists for
//! multi-valued keys. Recognized sections:
//! - `[MESSAGES CONTROL]`: `disable`, `enable` (comma lists of rule ids).
//! - `[BASIC]`: `good-names`, `bad-names`, and `<kind>-rgx` naming patterns.
//! - `[FORMAT]`: `max-line-length`.
//! - `[SIMILARITIES]`: `min-similarity-lines`, `ignore-comments`,
//!   `ignore-docstrings`, `ignore-imports`.
//! - `[DESIGN]`: structural thresholds (`max-args`, `max-branches`, ...).
//! - `[REPORTS]`: `evaluation` (formula string, kept verbatim), `fail-under`.
//!
//! The parsed value is immutable and shared by reference into every
//! component; nothing mutates it after load.

use crate::error::ConfigError;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Threshold keys accepted under `[DESIGN]`.
pub const DESIGN_KEYS: &[&str] = &[
    "max-args",
    "max-branches",
    "max-statements",
    "max-locals",
    "max-returns",
    "max-parents",
    "max-attributes",
    "min-public-methods",
    "max-public-methods",
    "max-module-lines",
];

const DEFAULT_MIN_SIMILARITY_LINES: u32 = 4;
const DEFAULT_FAIL_UNDER: f64 = 10.0;

#[derive(Debug, Clone)]
/// Typed, immutable view over the rule file.
pub struct RuleConfig {
    disabled: BTreeSet<String>,
    enabled: BTreeSet<String>,
    good_names: Vec<String>,
    bad_names: Vec<String>,
    naming: BTreeMap<String, Regex>,
    thresholds: BTreeMap<String, u32>,
    ignore_comments: bool,
    ignore_docstrings: bool,
    ignore_imports: bool,
    evaluation: Option<String>,
    fail_under: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            disabled: BTreeSet::new(),
            enabled: BTreeSet::new(),
            good_names: Vec::new(),
            bad_names: Vec::new(),
            naming: BTreeMap::new(),
            thresholds: BTreeMap::new(),
            ignore_comments: true,
            ignore_docstrings: true,
            ignore_imports: false,
            evaluation: None,
            fail_under: DEFAULT_FAIL_UNDER,
        }
    }
}

impl RuleConfig {
    /// Parse a rule file from text.
    ///
    /// Fails on a line that is neither a section header, a comment, nor a
    /// `key=value` pair; on a section or key this format does not define;
    /// and on a threshold value that is not a non-negative integer.
    pub fn parse(text: &str) -> Result<RuleConfig, ConfigError> {
        let mut cfg = RuleConfig::default();
        let mut section: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = name.trim().to_ascii_uppercase();
                if !matches!(
                    name.as_str(),
                    "MESSAGES CONTROL" | "BASIC" | "FORMAT" | "SIMILARITIES" | "DESIGN" | "REPORTS"
                ) {
                    return Err(ConfigError::UnknownSection(name));
                }
                section = Some(name);
                continue;
            }
            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim().to_string()),
                None => {
                    return Err(ConfigError::MalformedLine {
                        line: idx + 1,
                        text: line.to_string(),
                    })
                }
            };
            let section = match section.as_deref() {
                Some(s) => s,
                None => {
                    return Err(ConfigError::MalformedLine {
                        line: idx + 1,
                        text: line.to_string(),
                    })
                }
            };
            cfg.apply(section, &key, &value)?;
        }
        Ok(cfg)
    }

    fn apply(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        match section {
            "MESSAGES CONTROL" => match key {
                "disable" => self.disabled.extend(comma_list(value)),
                "enable" => self.enabled.extend(comma_list(value)),
                _ => return Err(unknown_key(section, key)),
            },
            "BASIC" => match key {
                "good-names" => self.good_names = comma_list(value),
                "bad-names" => self.bad_names = comma_list(value),
                _ => {
                    if let Some(kind) = key.strip_suffix("-rgx") {
                        let re =
                            Regex::new(value).map_err(|source| ConfigError::InvalidPattern {
                                kind: kind.to_string(),
                                source,
                            })?;
                        self.naming.insert(kind.to_string(), re);
                    } else {
                        return Err(unknown_key(section, key));
                    }
                }
            },
            "FORMAT" => match key {
                "max-line-length" => {
                    self.thresholds.insert(key.to_string(), parse_u32(key, value)?);
                }
                _ => return Err(unknown_key(section, key)),
            },
            "SIMILARITIES" => match key {
                "min-similarity-lines" => {
                    self.thresholds.insert(key.to_string(), parse_u32(key, value)?);
                }
                "ignore-comments" => self.ignore_comments = parse_yes_no(key, value)?,
                "ignore-docstrings" => self.ignore_docstrings = parse_yes_no(key, value)?,
                "ignore-imports" => self.ignore_imports = parse_yes_no(key, value)?,
                _ => return Err(unknown_key(section, key)),
            },
            "DESIGN" => {
                if DESIGN_KEYS.contains(&key) {
                    self.thresholds.insert(key.to_string(), parse_u32(key, value)?);
                } else {
                    return Err(unknown_key(section, key));
                }
            }
            "REPORTS" => match key {
                "evaluation" => self.evaluation = Some(value.to_string()),
                "fail-under" => {
                    self.fail_under =
                        value.parse::<f64>().map_err(|_| ConfigError::InvalidNumber {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?
                }
                _ => return Err(unknown_key(section, key)),
            },
            _ => return Err(ConfigError::UnknownSection(section.to_string())),
        }
        Ok(())
    }

    /// Whether a rule id is enabled.
    ///
    /// Deny-list semantics: rule ids are enabled by default, including ids
    /// this configuration has never heard of (fail-open). Only an explicit
    /// `disable=` entry turns a rule off, and `enable=` wins when the same
    /// id appears in both lists. Switching to fail-closed would silently
    /// change pass rates, so the polarity is deliberate.
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.enabled.contains(rule_id) || !self.disabled.contains(rule_id)
    }

    /// Numeric limit for a named threshold, if configured.
    pub fn threshold(&self, name: &str) -> Option<u32> {
        self.thresholds.get(name).copied()
    }

    /// Compiled naming pattern for a declaration kind (from `<kind>-rgx`).
    pub fn naming_pattern(&self, kind: &str) -> Option<&Regex> {
        self.naming.get(kind)
    }

    pub fn good_names(&self) -> &[String] {
        &self.good_names
    }

    pub fn bad_names(&self) -> &[String] {
        &self.bad_names
    }

    /// Minimum duplicated-block length; defaults to 4 lines when the file
    /// does not set `min-similarity-lines`.
    pub fn min_similarity_lines(&self) -> usize {
        self.threshold("min-similarity-lines")
            .unwrap_or(DEFAULT_MIN_SIMILARITY_LINES) as usize
    }

    pub fn ignore_comments(&self) -> bool {
        self.ignore_comments
    }

    pub fn ignore_docstrings(&self) -> bool {
        self.ignore_docstrings
    }

    pub fn ignore_imports(&self) -> bool {
        self.ignore_imports
    }

    pub fn evaluation(&self) -> Option<&str> {
        self.evaluation.as_deref()
    }

    /// Score below which the lint verdict is a failure.
    pub fn fail_under(&self) -> f64 {
        self.fail_under
    }

    /// Serialize back to rule-file text. Re-parsing the output yields an
    /// equivalent configuration (same `is_enabled`/`threshold` answers).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.disabled.is_empty() || !self.enabled.is_empty() {
            out.push_str("[MESSAGES CONTROL]\n");
            if !self.disabled.is_empty() {
                let _ = writeln!(out, "disable={}", join_list(&self.disabled));
            }
            if !self.enabled.is_empty() {
                let _ = writeln!(out, "enable={}", join_list(&self.enabled));
            }
            out.push('\n');
        }
        if !self.good_names.is_empty() || !self.bad_names.is_empty() || !self.naming.is_empty() {
            out.push_str("[BASIC]\n");
            if !self.good_names.is_empty() {
                let _ = writeln!(out, "good-names={}", self.good_names.join(","));
            }
            if !self.bad_names.is_empty() {
                let _ = writeln!(out, "bad-names={}", self.bad_names.join(","));
            }
            for (kind, re) in &self.naming {
                let _ = writeln!(out, "{}-rgx={}", kind, re.as_str());
            }
            out.push('\n');
        }
        if let Some(v) = self.threshold("max-line-length") {
            out.push_str("[FORMAT]\n");
            let _ = writeln!(out, "max-line-length={}", v);
            out.push('\n');
        }
        out.push_str("[SIMILARITIES]\n");
        if let Some(v) = self.threshold("min-similarity-lines") {
            let _ = writeln!(out, "min-similarity-lines={}", v);
        }
        let _ = writeln!(out, "ignore-comments={}", yes_no(self.ignore_comments));
        let _ = writeln!(out, "ignore-docstrings={}", yes_no(self.ignore_docstrings));
        let _ = writeln!(out, "ignore-imports={}", yes_no(self.ignore_imports));
        out.push('\n');
        let design: Vec<(&str, u32)> = DESIGN_KEYS
            .iter()
            .filter_map(|&k| self.threshold(k).map(|v| (k, v)))
            .collect();
        if !design.is_empty() {
            out.push_str("[DESIGN]\n");
            for (k, v) in design {
                let _ = writeln!(out, "{}={}", k, v);
            }
            out.push('\n');
        }
        out.push_str("[REPORTS]\n");
        if let Some(eval) = &self.evaluation {
            let _ = writeln!(out, "evaluation={}", eval);
        }
        let _ = writeln!(out, "fail-under={}", self.fail_under);
        out
    }
}

fn unknown_key(section: &str, key: &str) -> ConfigError {
    ConfigError::UnknownKey {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidThreshold {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_yes_no(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn join_list(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(",")
}
