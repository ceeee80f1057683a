//! Backend test runner (pytest).

use crate::core::adapters::PytestAdapter;
use crate::core::cache::{BackendSelection, LogPaths};
use crate::core::config::ValidateConfig;
use crate::core::metrics;
use crate::core::process::{Capture, CommandSpec};
use crate::core::run_log::{Phase, PhaseResult};
use crate::core::tier::{RunConfig, TestSelection};
use crate::pipeline::{NOT_CONFIGURED, PhaseContext};
use crate::plugins::run_tool;

/// `-m` expression: live tests and disabled features are deselected.
pub fn marker_expression(config: &ValidateConfig, run: &RunConfig) -> Option<String> {
    let mut terms = Vec::new();
    if !run.include_live {
        terms.push("not live".to_string());
    }
    terms.extend(
        config
            .excluded_markers()
            .into_iter()
            .map(|m| format!("not {}", m)),
    );
    (!terms.is_empty()).then(|| terms.join(" and "))
}

/// Arguments appended to the configured backend test command.
pub fn build_backend_args(
    config: &ValidateConfig,
    run: &RunConfig,
    selection: Option<BackendSelection>,
) -> Vec<String> {
    let mut args = vec![config.paths.backend_tests.display().to_string()];
    if let Some(expr) = marker_expression(config, run) {
        args.push("-m".to_string());
        args.push(expr);
    }
    if run.selection == TestSelection::ChangedOnly {
        let mode = selection.unwrap_or(BackendSelection::BuildIndex);
        args.push(mode.runner_flag().to_string());
    }
    if run.coverage {
        args.push(format!("--cov={}", config.paths.backend_src.display()));
        args.push("--cov-report=term".to_string());
    }
    if run.parallel {
        args.push("-n".to_string());
        args.push("auto".to_string());
    }
    args.push(format!("--timeout={}", config.timeouts.test_timeout_secs));
    if run.verbose {
        args.push("-v".to_string());
    }
    args
}

/// Cache locations handed to the runner so they land in the logs directory.
pub fn backend_env(logs: &LogPaths) -> [(&'static str, String); 2] {
    [
        ("COVERAGE_FILE", logs.coverage_data().display().to_string()),
        ("TESTMON_DATAFILE", logs.testmon_data().display().to_string()),
    ]
}

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let Some(spec) = CommandSpec::from_argv(&ctx.config.commands.backend_tests, ctx.root) else {
        return PhaseResult::skipped(Phase::BackendTests, NOT_CONFIGURED);
    };
    let mut spec = spec.args(build_backend_args(ctx.config, ctx.run, ctx.backend_selection));
    for (key, value) in backend_env(ctx.logs) {
        spec = spec.env(key, value);
    }
    let capture = Capture {
        echo: true,
        transient: Some(ctx.logs.transient("backend")),
    };

    let tool = run_tool(&spec, &capture, &PytestAdapter);
    let counts = metrics::backend_counts_in(&tool.output);
    let coverage = if ctx.run.coverage {
        metrics::backend_coverage(&tool.output)
    } else {
        None
    };
    let mut result = tool.into_result(Phase::BackendTests);
    result.counts = counts;
    result.coverage = coverage;
    result
}
