//! Duplicate-code detection across source units.
//!
//! Matching is exact token-sequence equality, not fuzzy similarity: each line
//! is reduced to its whitespace-split tokens after the configured exclusions
//! (comments, docstrings, imports, blank lines), and maximal contiguous runs
//! of identical filtered lines appearing at two or more locations are
//! reported once per occurrence under the `duplicate-code` rule. Runs shorter
//! than `min-similarity-lines` are never reported.

use crate::models::{Diagnostic, Severity};
use crate::rules::RuleConfig;
use std::collections::{BTreeSet, HashMap};

/// Rule id attached to duplicate-block findings.
pub const DUPLICATE_RULE: &str = "duplicate-code";

#[derive(Debug, Clone, Copy)]
/// Exclusion flags and the minimum reportable block length.
pub struct SimilarityOptions {
    pub min_lines: usize,
    pub ignore_comments: bool,
    pub ignore_docstrings: bool,
    pub ignore_imports: bool,
}

impl SimilarityOptions {
    pub fn from_rules(rules: &RuleConfig) -> Self {
        SimilarityOptions {
            min_lines: rules.min_similarity_lines(),
            ignore_comments: rules.ignore_comments(),
            ignore_docstrings: rules.ignore_docstrings(),
            ignore_imports: rules.ignore_imports(),
        }
    }
}

#[derive(Debug, Clone)]
struct FilteredLine {
    /// 1-based line number in the original source.
    line_no: usize,
    /// Whitespace-normalized token text used for comparison.
    text: String,
}

fn is_docstring_delim(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("\"\"\"") {
        Some("\"\"\"")
    } else if trimmed.starts_with("'''") {
        Some("'''")
    } else {
        None
    }
}

/// Reduce a source body to comparable lines, applying the exclusions.
fn filter_lines(source: &str, opts: &SimilarityOptions) -> Vec<FilteredLine> {
    let mut out = Vec::new();
    let mut in_doc: Option<&'static str> = None;
    for (idx, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if let Some(delim) = in_doc {
            if trimmed.contains(delim) {
                in_doc = None;
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if opts.ignore_docstrings {
            if let Some(delim) = is_docstring_delim(trimmed) {
                // One-line docstring closes on the same line.
                let rest = &trimmed[delim.len()..];
                if !rest.contains(delim) {
                    in_doc = Some(delim);
                }
                continue;
            }
        }
        if opts.ignore_comments && trimmed.starts_with('#') {
            continue;
        }
        if opts.ignore_imports
            && (trimmed.starts_with("import ") || trimmed.starts_with("from "))
        {
            continue;
        }
        out.push(FilteredLine {
            line_no: idx + 1,
            text: trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
        });
    }
    out
}

fn line_at(filtered: &[Vec<FilteredLine>], u: usize, i: usize) -> Option<&str> {
    filtered[u].get(i).map(|l| l.text.as_str())
}

/// Find duplicated blocks across `(unit name, source body)` pairs.
///
/// Emits one diagnostic per occurrence of each maximal duplicated block,
/// with the message naming every copy so reporters can fold them into a
/// single finding. Output is sorted by unit then start line.
pub fn find_duplicates(units: &[(String, String)], opts: &SimilarityOptions) -> Vec<Diagnostic> {
    if opts.min_lines == 0 {
        return Vec::new();
    }
    let filtered: Vec<Vec<FilteredLine>> =
        units.iter().map(|(_, src)| filter_lines(src, opts)).collect();

    // Index every window of exactly min_lines filtered lines.
    let min = opts.min_lines;
    let mut windows: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
    for (u, lines) in filtered.iter().enumerate() {
        if lines.len() < min {
            continue;
        }
        for start in 0..=lines.len() - min {
            let key = lines[start..start + min]
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            windows.entry(key).or_default().push((u, start));
        }
    }

    let mut seen: BTreeSet<Vec<(usize, usize, usize)>> = BTreeSet::new();
    let mut out = Vec::new();
    let mut groups: Vec<&Vec<(usize, usize)>> =
        windows.values().filter(|occs| occs.len() >= 2).collect();
    groups.sort();

    for occs in groups {
        // Keep only the leftmost window of each run: if every occurrence has
        // an identical preceding line, a wider group covers this one.
        let extends_left = occs.iter().all(|&(_, s)| s > 0)
            && occs
                .iter()
                .map(|&(u, s)| line_at(&filtered, u, s - 1))
                .collect::<BTreeSet<_>>()
                .len()
                == 1;
        if extends_left {
            continue;
        }
        // Grow to the right while all occurrences stay identical.
        let mut len = min;
        loop {
            let nexts: BTreeSet<Option<&str>> =
                occs.iter().map(|&(u, s)| line_at(&filtered, u, s + len)).collect();
            if nexts.len() == 1 && !nexts.contains(&None) {
                len += 1;
            } else {
                break;
            }
        }
        let extent: Vec<(usize, usize, usize)> =
            occs.iter().map(|&(u, s)| (u, s, len)).collect();
        if !seen.insert(extent) {
            continue;
        }
        let copies = occs
            .iter()
            .map(|&(u, s)| {
                format!("{}:{}", units[u].0, filtered[u][s].line_no)
            })
            .collect::<Vec<_>>()
            .join(", ");
        for &(u, s) in occs {
            let first = &filtered[u][s];
            let last = &filtered[u][s + len - 1];
            out.push(Diagnostic {
                rule: DUPLICATE_RULE.to_string(),
                severity: Severity::Refactor,
                unit: units[u].0.clone(),
                line: first.line_no,
                end_line: last.line_no,
                message: format!("{} duplicated lines in: {}", len, copies),
            });
        }
    }
    out.sort_by(|a, b| a.unit.cmp(&b.unit).then(a.line.cmp(&b.line)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(min: usize) -> SimilarityOptions {
        SimilarityOptions {
            min_lines: min,
            ignore_comments: true,
            ignore_docstrings: true,
            ignore_imports: false,
        }
    }

    fn unit(name: &str, body: &str) -> (String, String) {
        (name.to_string(), body.to_string())
    }

    #[test]
    fn test_block_at_threshold_is_reported() {
        let block = "a = 1\nb = 2\nc = 3\nd = 4\n";
        let units = vec![
            unit("a.py", &format!("{}x = 0\n", block)),
            unit("b.py", &format!("y = 9\n{}", block)),
        ];
        let diags = find_duplicates(&units, &opts(4));
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().any(|d| d.unit == "a.py" && d.line == 1));
        assert!(diags.iter().any(|d| d.unit == "b.py" && d.line == 2));
        assert!(diags.iter().all(|d| d.rule == DUPLICATE_RULE));
        assert!(diags.iter().all(|d| d.severity == Severity::Refactor));
    }

    #[test]
    fn test_block_below_threshold_is_not_reported() {
        let block = "a = 1\nb = 2\nc = 3\n";
        let units = vec![unit("a.py", block), unit("b.py", block)];
        assert!(find_duplicates(&units, &opts(4)).is_empty());
    }

    #[test]
    fn test_block_grows_to_maximal_extent() {
        let block = "a = 1\nb = 2\nc = 3\nd = 4\ne = 5\nf = 6\n";
        let units = vec![
            unit("a.py", &format!("pre = 0\n{}", block)),
            unit("b.py", &format!("other = 1\n{}", block)),
        ];
        let diags = find_duplicates(&units, &opts(4));
        // One maximal 6-line block per occurrence, not a ladder of windows.
        assert_eq!(diags.len(), 2);
        let a = diags.iter().find(|d| d.unit == "a.py").unwrap();
        assert_eq!((a.line, a.end_line), (2, 7));
        assert!(a.message.starts_with("6 duplicated lines"));
    }

    #[test]
    fn test_duplicate_within_single_unit() {
        let block = "x = compute()\ny = x + 1\nz = y * 2\nemit(z)\n";
        let body = format!("{}gap = 1\n{}", block, block);
        let units = vec![unit("only.py", &body)];
        let diags = find_duplicates(&units, &opts(4));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[1].line, 6);
    }

    #[test]
    fn test_comments_and_blanks_are_excluded() {
        let a = "a = 1\n# noise here\nb = 2\n\nc = 3\nd = 4\n";
        let b = "a = 1\nb = 2\n# different noise\nc = 3\nd = 4\n";
        let units = vec![unit("a.py", a), unit("b.py", b)];
        let diags = find_duplicates(&units, &opts(4));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_comments_kept_when_flag_off() {
        let a = "a = 1\n# noise here\nb = 2\nc = 3\nd = 4\n";
        let b = "a = 1\n# different noise\nb = 2\nc = 3\nd = 4\n";
        let units = vec![unit("a.py", a), unit("b.py", b)];
        let mut o = opts(4);
        o.ignore_comments = false;
        // Comment lines differ, so only the 3-line tail matches; below min.
        assert!(find_duplicates(&units, &o).is_empty());
    }

    #[test]
    fn test_docstrings_are_excluded() {
        let a = "def f():\n    \"\"\"first doc\"\"\"\n    a = 1\n    b = 2\n    c = 3\n";
        let b = "def f():\n    \"\"\"second\n    doc body\n    \"\"\"\n    a = 1\n    b = 2\n    c = 3\n";
        let units = vec![unit("a.py", a), unit("b.py", b)];
        let diags = find_duplicates(&units, &opts(4));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_imports_excluded_when_configured() {
        let a = "import os\na = 1\nb = 2\nc = 3\nd = 4\n";
        let b = "import sys\na = 1\nb = 2\nc = 3\nd = 4\n";
        let units = vec![unit("a.py", a), unit("b.py", b)];
        let mut o = opts(5);
        o.ignore_imports = true;
        // With imports stripped only 4 lines remain; min is 5.
        assert!(find_duplicates(&units, &o).is_empty());
        o.min_lines = 4;
        assert_eq!(find_duplicates(&units, &o).len(), 2);
    }

    #[test]
    fn test_message_names_all_copies() {
        let block = "a = 1\nb = 2\nc = 3\nd = 4\n";
        let units = vec![unit("a.py", block), unit("b.py", block), unit("c.py", block)];
        let diags = find_duplicates(&units, &opts(4));
        assert_eq!(diags.len(), 3);
        for d in &diags {
            assert!(d.message.contains("a.py:1"));
            assert!(d.message.contains("b.py:1"));
            assert!(d.message.contains("c.py:1"));
        }
    }
}
