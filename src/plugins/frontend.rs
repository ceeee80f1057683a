//! Frontend unit tests (vitest).
//!
//! vitest writes a JSON report (and, with coverage, a `json-summary`
//! coverage file) into the logs directory; those are preferred over scraping
//! console text.

use crate::core::adapters::VitestAdapter;
use crate::core::cache::LogPaths;
use crate::core::metrics::{self, TestCounts};
use crate::core::process::{Capture, CommandSpec};
use crate::core::run_log::{Phase, PhaseResult};
use crate::core::tier::{RunConfig, Tier};
use crate::pipeline::{NOT_CONFIGURED, PhaseContext};
use crate::plugins::run_tool;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub fn build_frontend_args(run: &RunConfig, logs: &LogPaths) -> Vec<String> {
    let mut args = Vec::new();
    match run.tier {
        Tier::Fast => args.push("--changed".to_string()),
        Tier::Full | Tier::Exhaustive => {
            args.push("--coverage".to_string());
            args.push("--coverage.reporter=text".to_string());
            args.push("--coverage.reporter=json-summary".to_string());
            args.push(format!(
                "--coverage.reportsDirectory={}",
                logs.frontend_coverage_dir().display()
            ));
        }
        _ => {}
    }
    args.push("--reporter=default".to_string());
    args.push("--reporter=json".to_string());
    args.push(format!("--outputFile={}", logs.frontend_report().display()));
    args
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VitestReport {
    num_passed_tests: Option<u32>,
    num_failed_tests: Option<u32>,
    num_pending_tests: Option<u32>,
}

/// Counts from a vitest JSON report; `None` if missing or unreadable.
pub fn read_report(path: &Path) -> Option<TestCounts> {
    let text = fs::read_to_string(path).ok()?;
    let report: VitestReport = match serde_json::from_str(&text) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable vitest report");
            return None;
        }
    };
    Some(TestCounts {
        passed: report.num_passed_tests,
        failed: report.num_failed_tests,
        skipped: report.num_pending_tests,
        ..TestCounts::default()
    })
    .filter(|c| !c.is_empty())
}

#[derive(Debug, Deserialize)]
struct CoverageSummary {
    total: CoverageTotals,
}

#[derive(Debug, Deserialize)]
struct CoverageTotals {
    lines: CoverageMetric,
}

#[derive(Debug, Deserialize)]
struct CoverageMetric {
    pct: f64,
}

/// Line coverage from a `json-summary` file, rounded to nearest.
pub fn read_coverage_summary(path: &Path) -> Option<u32> {
    let text = fs::read_to_string(path).ok()?;
    let summary: CoverageSummary = serde_json::from_str(&text).ok()?;
    Some(summary.total.lines.pct.round().clamp(0.0, 100.0) as u32)
}

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let frontend_dir = ctx.root.join(&ctx.config.paths.frontend_dir);
    let Some(spec) = CommandSpec::from_argv(&ctx.config.commands.frontend_tests, &frontend_dir)
    else {
        return PhaseResult::skipped(Phase::FrontendTests, NOT_CONFIGURED);
    };
    let spec = spec.args(build_frontend_args(ctx.run, ctx.logs));
    let capture = Capture {
        echo: true,
        transient: Some(ctx.logs.transient("frontend")),
    };

    let tool = run_tool(&spec, &capture, &VitestAdapter);
    let counts =
        read_report(&ctx.logs.frontend_report()).or_else(|| metrics::frontend_counts(&tool.output));
    let coverage = if ctx.run.coverage {
        read_coverage_summary(&ctx.logs.frontend_coverage_summary())
            .or_else(|| metrics::frontend_coverage(&tool.output))
    } else {
        None
    };
    let mut result = tool.into_result(Phase::FrontendTests);
    result.counts = counts;
    result.coverage = coverage;
    result
}
