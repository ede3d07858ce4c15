//! qgate core library.
//!
//! This crate exposes programmatic APIs for scoring analyzer reports,
//! detecting duplicated code, and running a fail-fast quality gate.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `rules`: The sectioned `key=value` rule file (enable/disable, naming,
//!   thresholds, similarity flags, report settings).
//! - `aggregate`: Severity bucketing with rule filtering.
//! - `checks`: Design-threshold and naming-policy checkers.
//! - `similarity`: Exact-match duplicate block detection.
//! - `score`: The weighted quality score formula.
//! - `lint`: The lint evaluation tying the above together.
//! - `pipeline`: Fail-fast stage orchestration (lint, format-check, test).
//! - `models`: Data models for diagnostics, reports, and stage results.
//! - `output`: Human/JSON printers for score/dup/gate.
//! - `utils`: Supporting helpers.
//! - `error`: Error types for configuration and gate failures.
pub mod aggregate;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod score;
pub mod similarity;
pub mod utils;
