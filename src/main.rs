//! qgate CLI binary entry point.
//! Delegates to modules for score/dup/gate and prints results.

mod aggregate;
mod checks;
mod cli;
mod config;
mod error;
mod lint;
mod models;
mod output;
mod pipeline;
mod rules;
mod score;
mod similarity;
mod utils;

use clap::Parser;
use cli::{Cli, Commands};
use config::Effective;
use pipeline::{CommandStage, GateOrchestrator, Stage};
use rules::RuleConfig;
use similarity::{find_duplicates, SimilarityOptions};
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Score {
            repo_root,
            rules,
            report,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                rules.as_deref(),
                report.as_deref(),
                output.as_deref(),
                &[],
            );
            let rule_cfg = load_rules_or_exit(&eff);
            let report_path = eff.repo_root.join(&eff.report_path);
            if !report_path.exists() {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!(
                        "Analyzer report not found: {} (pass --report or configure qgate.toml)",
                        report_path.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }
            let outcome = match lint::run_lint(
                &eff.repo_root,
                &rule_cfg,
                &PathBuf::from(&eff.report_path),
                &eff.patterns,
            ) {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("{} {}", utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            output::print_score(&outcome, &eff.output);
            if !outcome.passed {
                std::process::exit(1);
            }
        }
        Commands::Dup {
            repo_root,
            rules,
            patterns,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                rules.as_deref(),
                None,
                output.as_deref(),
                &patterns,
            );
            if eff.patterns.is_empty() {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    "No source patterns. Pass --pattern or set patterns in qgate.toml."
                );
                std::process::exit(2);
            }
            let rule_cfg = load_rules_or_exit(&eff);
            let sources = lint::collect_sources(&eff.repo_root, &eff.patterns);
            if eff.output != "json" {
                eprintln!(
                    "{} {}",
                    utils::info_prefix(),
                    format!("Scanning {} source unit(s) for duplicates", sources.len())
                );
            }
            let dups = find_duplicates(&sources, &SimilarityOptions::from_rules(&rule_cfg));
            output::print_dup(&dups, &eff.output);
            if !dups.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Gate {
            repo_root,
            rules,
            report,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                rules.as_deref(),
                report.as_deref(),
                output.as_deref(),
                &[],
            );
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    utils::note_prefix(),
                    "No qgate.toml found; running the lint stage only."
                );
            }
            let rule_cfg = load_rules_or_exit(&eff);
            let orch = GateOrchestrator::new(build_stages(&eff, rule_cfg));
            let run = orch.run();
            output::print_gate(&run, &eff.output);
            if !run.passed() {
                std::process::exit(1);
            }
        }
    }
}

/// Load the rule file, exiting with a friendly message when it is missing
/// or malformed.
fn load_rules_or_exit(eff: &Effective) -> RuleConfig {
    match config::load_rules(eff) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    }
}

/// The ordered gate: the in-process lint stage first, then each external
/// stage declared under `[[gate.stages]]`.
fn build_stages(eff: &Effective, rule_cfg: RuleConfig) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(lint::LintStage {
        repo_root: eff.repo_root.clone(),
        rules: rule_cfg,
        report: PathBuf::from(&eff.report_path),
        patterns: eff.patterns.clone(),
    })];
    for s in &eff.stages {
        stages.push(Box::new(CommandStage::new(
            s.name.clone(),
            s.command.clone(),
            s.timeout_secs.map(Duration::from_secs),
            eff.repo_root.clone(),
        )));
    }
    stages
}
