//! Static analysis: a test-collection pass over the validation tests, then
//! the contrast, CSS and path-integrity compliance checks.
//!
//! Everything here is best-effort.

use crate::core::adapters::PytestAdapter;
use crate::core::metrics::StaticCheck;
use crate::core::process::{Capture, CommandSpec};
use crate::core::run_log::{Phase, PhaseOutcome, PhaseResult};
use crate::pipeline::PhaseContext;
use crate::plugins::{SubStep, failed_titles, now_secs, run_substeps, run_tool};
use std::time::Duration;

fn check_argv<'a>(ctx: &'a PhaseContext, check: StaticCheck) -> &'a [String] {
    let commands = &ctx.config.commands;
    match check {
        StaticCheck::Contrast => &commands.contrast_check,
        StaticCheck::Css => &commands.css_check,
        StaticCheck::PathIntegrity => &commands.path_check,
    }
}

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let started_at = now_secs();
    let mut output = String::new();
    let mut elapsed = Duration::ZERO;
    let mut failures = Vec::new();

    let validation_dir = ctx.config.paths.validation_tests.display().to_string();
    if let Some(spec) = CommandSpec::from_argv(&ctx.config.commands.static_analysis, ctx.root) {
        let spec = spec.arg(validation_dir);
        let tool = run_tool(&spec, &Capture::default(), &PytestAdapter);
        elapsed += tool.outcome.duration;
        if !tool.verdict.is_success() {
            failures.push("validation tests".to_string());
        }
        output = tool.output;
    }

    let steps: Vec<SubStep> = StaticCheck::ALL
        .iter()
        .map(|check| SubStep {
            title: check.report_title(),
            argv: check_argv(ctx, *check),
            cwd: ctx.root.to_path_buf(),
        })
        .collect();
    let (reports, checks_elapsed, _) = run_substeps(&steps, ctx.run.verbose);
    elapsed += checks_elapsed;
    failures.extend(failed_titles(&reports));

    let outcome = if failures.is_empty() {
        PhaseOutcome::Passed
    } else {
        PhaseOutcome::BestEffortFailed(failures.join(", "))
    };
    let mut result = PhaseResult::new(Phase::StaticAnalysis, started_at, elapsed, outcome)
        .with_output(output);
    result.subreports = reports;
    result
}
