//! End-to-end scenarios (playwright).

use crate::core::adapters::PlaywrightAdapter;
use crate::core::metrics::{self, TestCounts};
use crate::core::process::{Capture, CommandSpec};
use crate::core::run_log::{Phase, PhaseResult};
use crate::core::tier::RunConfig;
use crate::pipeline::{NOT_CONFIGURED, PhaseContext};
use crate::plugins::run_tool;

pub fn build_e2e_args(run: &RunConfig, timeout_secs: u64) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(filter) = &run.e2e_filter {
        args.push(filter.clone());
    }
    if run.update_snapshots {
        args.push("--update-snapshots".to_string());
    }
    if run.parallel {
        args.push("--fully-parallel".to_string());
    }
    args.push("--reporter=list".to_string());
    args.push(format!("--timeout={}", timeout_secs * 1000));
    args
}

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let e2e_dir = ctx.root.join(ctx.config.paths.e2e_dir());
    let Some(spec) = CommandSpec::from_argv(&ctx.config.commands.e2e_tests, &e2e_dir) else {
        return PhaseResult::skipped(Phase::E2eTests, NOT_CONFIGURED);
    };
    let spec = spec.args(build_e2e_args(ctx.run, ctx.config.timeouts.test_timeout_secs));
    let capture = Capture {
        echo: true,
        transient: Some(ctx.logs.transient("e2e")),
    };

    let tool = run_tool(&spec, &capture, &PlaywrightAdapter);
    let summary = metrics::e2e_status_in(&tool.output);
    let mut result = tool.into_result(Phase::E2eTests);
    if summary.passed.is_some() || summary.failed.is_some() {
        result.counts = Some(TestCounts {
            passed: summary.passed,
            failed: summary.failed,
            ..TestCounts::default()
        });
    }
    result.e2e = Some(summary);
    result
}
