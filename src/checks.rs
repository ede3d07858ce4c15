//! In-process checkers: design thresholds and naming policy.
//!
//! Both operate on measurements the analyzer already took (metrics and
//! declared names in the report); violations become ordinary diagnostics,
//! never errors.

use crate::models::report::{NameRecord, UnitReport};
use crate::models::{Diagnostic, Severity};
use crate::rules::{RuleConfig, DESIGN_KEYS};

/// Rule id emitted when a structural metric breaks its threshold.
fn design_rule_id(key: &str) -> &'static str {
    match key {
        "max-args" => "too-many-arguments",
        "max-branches" => "too-many-branches",
        "max-statements" => "too-many-statements",
        "max-locals" => "too-many-locals",
        "max-returns" => "too-many-return-statements",
        "max-parents" => "too-many-ancestors",
        "max-attributes" => "too-many-instance-attributes",
        "max-public-methods" => "too-many-public-methods",
        "min-public-methods" => "too-few-public-methods",
        "max-module-lines" => "too-many-lines",
        _ => "design-threshold",
    }
}

/// Compare a unit's measured metrics against configured `[DESIGN]` limits.
///
/// `min-*` keys are floors (violated when the measurement falls short),
/// `max-*` keys are ceilings. Unconfigured thresholds are not checked.
pub fn check_design(unit: &UnitReport, rules: &RuleConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for &key in DESIGN_KEYS {
        let Some(limit) = rules.threshold(key) else {
            continue;
        };
        let Some(&measured) = unit.metrics.get(key) else {
            continue;
        };
        let violated = if key.starts_with("min-") {
            measured < limit
        } else {
            measured > limit
        };
        if violated {
            out.push(Diagnostic {
                rule: design_rule_id(key).to_string(),
                severity: Severity::Refactor,
                unit: unit.unit.clone(),
                line: 1,
                end_line: 1,
                message: format!("{} is {} ({}={})", key, measured, key, limit),
            });
        }
    }
    out
}

/// Check declared names against the naming policy.
///
/// A name on `good-names` is always accepted; one on `bad-names` is flagged
/// as `disallowed-name`; otherwise the `<kind>-rgx` pattern (when configured)
/// must match or the name is flagged as `invalid-name`.
pub fn check_names(unit: &UnitReport, rules: &RuleConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for rec in &unit.names {
        if rules.good_names().iter().any(|g| g == &rec.name) {
            continue;
        }
        if rules.bad_names().iter().any(|b| b == &rec.name) {
            out.push(name_diag(unit, rec, "disallowed-name", "is on the bad-names list"));
            continue;
        }
        if let Some(re) = rules.naming_pattern(&rec.kind) {
            if !re.is_match(&rec.name) {
                out.push(name_diag(
                    unit,
                    rec,
                    "invalid-name",
                    "does not match the naming pattern",
                ));
            }
        }
    }
    out
}

fn name_diag(unit: &UnitReport, rec: &NameRecord, rule: &str, why: &str) -> Diagnostic {
    Diagnostic {
        rule: rule.to_string(),
        severity: Severity::Convention,
        unit: unit.unit.clone(),
        line: rec.line.max(1),
        end_line: rec.line.max(1),
        message: format!("{} name '{}' {}", rec.kind, rec.name, why),
    }
}
