//! Fail-fast gate orchestration.
//!
//! The orchestrator walks an ordered list of stages through a small state
//! machine: Pending -> Running(i) -> Running(i+1) ... -> Passed, or
//! Failed(i) the moment stage `i` reports failure. Later stages are never
//! started and appear in the run as absent, not failed. No retries.
//!
//! The orchestrator is agnostic to what a stage does; it only inspects the
//! pass/fail boolean on the returned `StageResult`.

use crate::models::{Diagnostic, FailReason, Severity, StageResult};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// One unit of the quality gate.
pub trait Stage {
    fn name(&self) -> &str;
    fn run(&self) -> StageResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "stage")]
/// Orchestrator state. `Passed` and `Failed` are terminal.
pub enum GateState {
    Pending,
    Running(usize),
    Passed,
    Failed(usize),
}

#[derive(Debug, Serialize)]
/// Results of the stages that actually executed, plus the terminal state.
pub struct PipelineRun {
    pub stages: Vec<StageResult>,
    pub state: GateState,
}

impl PipelineRun {
    /// Overall verdict: true iff every configured stage ran and passed.
    pub fn passed(&self) -> bool {
        self.state == GateState::Passed
    }
}

/// Runs stages strictly in order, stopping at the first failure.
pub struct GateOrchestrator {
    stages: Vec<Box<dyn Stage>>,
    state: GateState,
}

impl GateOrchestrator {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        GateOrchestrator {
            stages,
            state: GateState::Pending,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Execute the pipeline to a terminal state.
    pub fn run(mut self) -> PipelineRun {
        let mut results = Vec::with_capacity(self.stages.len());
        for i in 0..self.stages.len() {
            self.state = GateState::Running(i);
            let result = self.stages[i].run();
            let ok = result.passed;
            results.push(result);
            if !ok {
                self.state = GateState::Failed(i);
                return PipelineRun {
                    stages: results,
                    state: self.state,
                };
            }
        }
        self.state = GateState::Passed;
        PipelineRun {
            stages: results,
            state: self.state,
        }
    }
}

/// A stage backed by an external command, judged by its exit code.
///
/// Used for the format-check and test stages, which qgate does not
/// implement itself. An optional timeout aborts the stage; an aborted stage
/// fails with the distinguished `Timeout` reason and halts the pipeline
/// exactly like any other failure.
pub struct CommandStage {
    name: String,
    command: Vec<String>,
    timeout: Option<Duration>,
    cwd: PathBuf,
}

impl CommandStage {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        timeout: Option<Duration>,
        cwd: PathBuf,
    ) -> Self {
        CommandStage {
            name: name.into(),
            command,
            timeout,
            cwd,
        }
    }

    fn failure(&self, reason: FailReason, message: String, started: Instant) -> StageResult {
        StageResult {
            stage: self.name.clone(),
            passed: false,
            diagnostics: vec![Diagnostic {
                rule: "stage-failure".to_string(),
                severity: Severity::Error,
                unit: self.name.clone(),
                line: 1,
                end_line: 1,
                message,
            }],
            duration_ms: started.elapsed().as_millis() as u64,
            reason: Some(reason),
        }
    }

    /// Wait for the child, killing it at the deadline. `None` means timeout.
    fn wait(&self, child: &mut Child) -> std::io::Result<Option<ExitStatus>> {
        let Some(timeout) = self.timeout else {
            return child.wait().map(Some);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(20));
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut r) = pipe {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    })
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> StageResult {
        let started = Instant::now();
        if self.command.is_empty() {
            return self.failure(
                FailReason::Error("empty command".to_string()),
                format!("stage '{}' has no command configured", self.name),
                started,
            );
        }
        let mut child = match Command::new(&self.command[0])
            .args(&self.command[1..])
            .current_dir(&self.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                return self.failure(
                    FailReason::Error(e.to_string()),
                    format!("stage '{}' failed to start: {}", self.name, e),
                    started,
                )
            }
        };
        // Drain pipes on background threads so a chatty child cannot block
        // on a full pipe while we poll for exit.
        let out_handle = drain(child.stdout.take());
        let err_handle = drain(child.stderr.take());

        let status = match self.wait(&mut child) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = out_handle.join();
                let _ = err_handle.join();
                let secs = self.timeout.map(|t| t.as_secs_f64()).unwrap_or(0.0);
                return self.failure(
                    FailReason::Timeout,
                    format!("stage '{}' timed out after {:.1}s", self.name, secs),
                    started,
                );
            }
            Err(e) => {
                return self.failure(
                    FailReason::Error(e.to_string()),
                    format!("stage '{}' wait failed: {}", self.name, e),
                    started,
                )
            }
        };
        let stdout = out_handle.join().unwrap_or_default();
        let stderr = err_handle.join().unwrap_or_default();

        if status.success() {
            StageResult {
                stage: self.name.clone(),
                passed: true,
                diagnostics: Vec::new(),
                duration_ms: started.elapsed().as_millis() as u64,
                reason: None,
            }
        } else {
            let code = status.code().unwrap_or(-1);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            let message = if detail.is_empty() {
                format!("stage '{}' exited with code {}", self.name, code)
            } else {
                format!("stage '{}' exited with code {}: {}", self.name, code, detail)
            };
            self.failure(FailReason::ExitCode(code), message, started)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedStage {
        name: String,
        pass: bool,
        runs: Arc<AtomicUsize>,
    }

    impl FixedStage {
        fn boxed(name: &str, pass: bool, runs: Arc<AtomicUsize>) -> Box<dyn Stage> {
            Box::new(FixedStage {
                name: name.to_string(),
                pass,
                runs,
            })
        }
    }

    impl Stage for FixedStage {
        fn name(&self) -> &str {
            &self.name
        }

        fn run(&self) -> StageResult {
            self.runs.fetch_add(1, Ordering::SeqCst);
            StageResult {
                stage: self.name.clone(),
                passed: self.pass,
                diagnostics: Vec::new(),
                duration_ms: 0,
                reason: if self.pass {
                    None
                } else {
                    Some(FailReason::ExitCode(1))
                },
            }
        }
    }

    #[test]
    fn test_all_passing_yields_passed_with_all_results() {
        let runs = Arc::new(AtomicUsize::new(0));
        let orch = GateOrchestrator::new(vec![
            FixedStage::boxed("lint", true, runs.clone()),
            FixedStage::boxed("format-check", true, runs.clone()),
            FixedStage::boxed("test", true, runs.clone()),
        ]);
        let run = orch.run();
        assert_eq!(run.state, GateState::Passed);
        assert!(run.passed());
        assert_eq!(run.stages.len(), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fail_fast_skips_later_stages() {
        let runs = Arc::new(AtomicUsize::new(0));
        let test_runs = Arc::new(AtomicUsize::new(0));
        let orch = GateOrchestrator::new(vec![
            FixedStage::boxed("lint", true, runs.clone()),
            FixedStage::boxed("format-check", false, runs.clone()),
            FixedStage::boxed("test", true, test_runs.clone()),
        ]);
        let run = orch.run();
        assert_eq!(run.state, GateState::Failed(1));
        assert!(!run.passed());
        // Later stages are absent from the run, not failed.
        assert_eq!(run.stages.len(), 2);
        assert_eq!(test_runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_pipeline_passes() {
        let run = GateOrchestrator::new(Vec::new()).run();
        assert_eq!(run.state, GateState::Passed);
        assert!(run.stages.is_empty());
    }

    #[test]
    fn test_command_stage_success() {
        let stage = CommandStage::new(
            "echo",
            vec!["echo".to_string(), "ok".to_string()],
            None,
            std::env::temp_dir(),
        );
        let result = stage.run();
        assert!(result.passed);
        assert!(result.reason.is_none());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_command_stage_nonzero_exit() {
        let stage = CommandStage::new(
            "fail",
            vec!["false".to_string()],
            None,
            std::env::temp_dir(),
        );
        let result = stage.run();
        assert!(!result.passed);
        assert_eq!(result.reason, Some(FailReason::ExitCode(1)));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].rule, "stage-failure");
    }

    #[test]
    fn test_command_stage_spawn_error() {
        let stage = CommandStage::new(
            "missing",
            vec!["qgate-no-such-binary".to_string()],
            None,
            std::env::temp_dir(),
        );
        let result = stage.run();
        assert!(!result.passed);
        assert!(matches!(result.reason, Some(FailReason::Error(_))));
    }

    #[test]
    fn test_command_stage_timeout() {
        let stage = CommandStage::new(
            "slow",
            vec!["sleep".to_string(), "5".to_string()],
            Some(Duration::from_millis(100)),
            std::env::temp_dir(),
        );
        let result = stage.run();
        assert!(!result.passed);
        assert_eq!(result.reason, Some(FailReason::Timeout));
    }

    #[test]
    fn test_timed_out_stage_halts_pipeline() {
        let runs = Arc::new(AtomicUsize::new(0));
        let orch = GateOrchestrator::new(vec![
            Box::new(CommandStage::new(
                "slow",
                vec!["sleep".to_string(), "5".to_string()],
                Some(Duration::from_millis(100)),
                std::env::temp_dir(),
            )) as Box<dyn Stage>,
            FixedStage::boxed("test", true, runs.clone()),
        ]);
        let run = orch.run();
        assert_eq!(run.state, GateState::Failed(0));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
