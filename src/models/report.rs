//! Analyzer report schema: the hand-off from the external source analyzer.
//!
//! The analyzer walks the source and emits a JSON report with one entry per
//! source unit: the unit's statement count, measured structural metrics,
//! declared names, and raw diagnostics. qgate never parses source itself
//! (except line-level similarity scanning); everything semantic arrives
//! through this file.

use crate::error::GateError;
use crate::models::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A declared identifier with its kind (function, variable, class, ...),
/// checked against the naming policy.
pub struct NameRecord {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Per-unit analyzer output.
pub struct UnitReport {
    pub unit: String,
    /// Executable logical units in this source unit; the score denominator.
    #[serde(default)]
    pub statements: usize,
    /// Worst measured value per structural metric, keyed by threshold name
    /// (e.g. `max-branches` -> highest branch count of any function).
    #[serde(default)]
    pub metrics: BTreeMap<String, u32>,
    #[serde(default)]
    pub names: Vec<NameRecord>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Full analyzer report for one run.
pub struct AnalysisReport {
    #[serde(default)]
    pub units: Vec<UnitReport>,
}

impl AnalysisReport {
    /// Load a report from disk, filling in per-diagnostic unit names and
    /// line spans left implicit by the analyzer.
    pub fn load(path: &Path) -> Result<AnalysisReport, GateError> {
        let data = fs::read_to_string(path).map_err(|source| GateError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        let mut report: AnalysisReport = serde_json::from_str(&data)?;
        for u in report.units.iter_mut() {
            for d in u.diagnostics.iter_mut() {
                if d.unit.is_empty() {
                    d.unit = u.unit.clone();
                }
                if d.end_line == 0 {
                    d.end_line = d.line;
                }
            }
        }
        Ok(report)
    }

    /// Total statement count across all units.
    pub fn statements(&self) -> usize {
        self.units.iter().map(|u| u.statements).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_fills_unit_and_span() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(
            f,
            "{}",
            r#"{
  "units": [
    {
      "unit": "src/app.py",
      "statements": 40,
      "diagnostics": [
        {"rule": "unused-variable", "severity": "warning", "line": 7}
      ]
    }
  ]
}"#
        )
        .unwrap();

        let report = AnalysisReport::load(&path).unwrap();
        assert_eq!(report.units.len(), 1);
        assert_eq!(report.statements(), 40);
        let d = &report.units[0].diagnostics[0];
        assert_eq!(d.unit, "src/app.py");
        assert_eq!(d.end_line, 7);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        fs::write(&path, "{not json").unwrap();
        assert!(AnalysisReport::load(&path).is_err());
    }
}
