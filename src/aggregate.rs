//! Diagnostic aggregation: rule filtering and severity bucketing.
//!
//! Aggregation is commutative and associative over the input multiset, so
//! per-unit results can be merged in any order. `aggregate_units` exploits
//! this with a rayon map-reduce; the reduce is a barrier, so the caller sees
//! the complete counts before scoring.

use crate::models::report::UnitReport;
use crate::models::{Diagnostic, SeverityCounts};
use crate::rules::RuleConfig;
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
/// Filtered diagnostics plus their severity buckets.
pub struct Aggregate {
    pub counts: SeverityCounts,
    pub retained: Vec<Diagnostic>,
}

impl Aggregate {
    pub fn merge(&mut self, mut other: Aggregate) {
        self.counts.merge(&other.counts);
        self.retained.append(&mut other.retained);
    }
}

/// Bucket a batch of diagnostics, dropping any whose rule is disabled.
///
/// Inputs are not mutated; the result owns clones of the retained entries.
pub fn aggregate(diags: &[Diagnostic], rules: &RuleConfig) -> Aggregate {
    let mut agg = Aggregate::default();
    for d in diags {
        if !rules.is_enabled(&d.rule) {
            continue;
        }
        agg.counts.add(d.severity);
        agg.retained.push(d.clone());
    }
    agg
}

/// Aggregate analyzer diagnostics across units in parallel.
///
/// Unit order is preserved in `retained` (the parallel collect keeps input
/// order); the counts are order-independent either way.
pub fn aggregate_units(units: &[UnitReport], rules: &RuleConfig) -> Aggregate {
    units
        .par_iter()
        .map(|u| aggregate(&u.diagnostics, rules))
        .reduce(Aggregate::default, |mut a, b| {
            a.merge(b);
            a
        })
}
