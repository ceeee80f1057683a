//! Phase runners. Each one shells out to its collaborators and returns a
//! [`PhaseResult`]; none of them touches the run log directly.

pub mod autofix;
pub mod backend;
pub mod e2e;
pub mod frontend;
pub mod health;
pub mod static_analysis;
pub mod subsystems;

use crate::core::adapters::{GenericAdapter, ToolAdapter, ToolVerdict};
use crate::core::metrics::CheckStatus;
use crate::core::process::{self, Capture, CommandOutcome, CommandSpec};
use crate::core::run_log::{Phase, PhaseOutcome, PhaseResult, SubReport};
use crate::core::{normalize, time};
use crate::pipeline::NOT_CONFIGURED;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// One finished collaborator invocation, already interpreted by its adapter.
#[derive(Debug)]
pub struct ToolRun {
    pub started_at: u64,
    pub outcome: CommandOutcome,
    pub verdict: ToolVerdict,
    /// Output with escape sequences stripped.
    pub output: String,
}

impl ToolRun {
    pub fn into_result(self, phase: Phase) -> PhaseResult {
        let outcome = PhaseOutcome::from_verdict(phase.policy(), self.verdict);
        PhaseResult::new(phase, self.started_at, self.outcome.duration, outcome)
            .with_output(self.output)
    }
}

pub fn run_tool(spec: &CommandSpec, capture: &Capture, adapter: &dyn ToolAdapter) -> ToolRun {
    let started_at = time::epoch_secs(SystemTime::now());
    let outcome = process::run_command(spec, capture);
    let verdict = adapter.interpret(&outcome);
    tracing::debug!(tool = adapter.name(), verdict = ?verdict, "collaborator finished");

    let mut output = normalize::strip(&outcome.output);
    if let Some(err) = &outcome.spawn_error {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(err);
        output.push('\n');
    }
    process::discard_transient(capture);

    ToolRun {
        started_at,
        outcome,
        verdict,
        output,
    }
}

/// A titled best-effort sub-step (lint pass, compliance check, generator).
pub struct SubStep<'a> {
    pub title: &'a str,
    pub argv: &'a [String],
    pub cwd: PathBuf,
}

/// Run best-effort sub-steps in order. Returns the sub-reports, the total
/// time spent, and whether any of them failed.
pub fn run_substeps(steps: &[SubStep], echo: bool) -> (Vec<SubReport>, Duration, bool) {
    let mut reports = Vec::with_capacity(steps.len());
    let mut total = Duration::ZERO;
    for step in steps {
        let Some(spec) = CommandSpec::from_argv(step.argv, &step.cwd) else {
            reports.push(SubReport {
                title: step.title.to_string(),
                output: String::new(),
                status: CheckStatus::Skipped,
                status_line: format!("⏭ {} skipped ({})", step.title, NOT_CONFIGURED),
            });
            continue;
        };
        let run = run_tool(&spec, &Capture { echo, transient: None }, &GenericAdapter);
        total += run.outcome.duration;
        let (status, status_line) = match &run.verdict {
            ToolVerdict::Failure(reason) => {
                tracing::warn!(step = step.title, %reason, "best-effort step failed");
                (
                    CheckStatus::Failed,
                    format!("❌ {} failed ({})", step.title, reason),
                )
            }
            _ if run.output.to_ascii_lowercase().contains("warning") => (
                CheckStatus::Warning,
                format!("⚠️ {} passed with warnings", step.title),
            ),
            _ => (CheckStatus::Passed, format!("✅ {} passed", step.title)),
        };
        reports.push(SubReport {
            title: step.title.to_string(),
            output: run.output,
            status,
            status_line,
        });
    }
    let any_failed = reports.iter().any(|r| r.status == CheckStatus::Failed);
    (reports, total, any_failed)
}

/// Titles of the sub-reports that failed, in run order.
pub fn failed_titles(reports: &[SubReport]) -> Vec<String> {
    reports
        .iter()
        .filter(|r| r.status == CheckStatus::Failed)
        .map(|r| r.title.clone())
        .collect()
}

/// Result for a phase made only of best-effort sub-steps.
pub fn substeps_result(phase: Phase, started_at: u64, steps: &[SubStep]) -> PhaseResult {
    let (reports, elapsed, any_failed) = run_substeps(steps, false);
    let outcome = if any_failed {
        PhaseOutcome::BestEffortFailed(failed_titles(&reports).join(", "))
    } else {
        PhaseOutcome::Passed
    };
    let mut result = PhaseResult::new(phase, started_at, elapsed, outcome);
    result.subreports = reports;
    result
}

pub fn now_secs() -> u64 {
    time::epoch_secs(SystemTime::now())
}
