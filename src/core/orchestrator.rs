//! The orchestration loop: environment sync, the phase table in order, then
//! the summary.
//!
//! Phase results are the source of truth. The markdown log is rendered from
//! them as they arrive, and the summary is built from the same records.

use crate::core::adapters::{GenericAdapter, ToolAdapter, ToolVerdict};
use crate::core::cache::{self, BackendSelection, LogPaths};
use crate::core::config::ValidateConfig;
use crate::core::error::ValidateError;
use crate::core::metrics::MetricSummary;
use crate::core::process::{self, Capture, CommandSpec};
use crate::core::run_log::{
    FailurePolicy, LogHeader, PhaseOutcome, PhaseResult, RunLog, SUMMARY_HEADING,
};
use crate::core::summary::{self, SummaryReport};
use crate::core::tier::{RunConfig, TestSelection};
use crate::core::tui::{self, BoxStyle, ItemStatus};
use crate::core::{failures, normalize};
use crate::pipeline::{PHASES, PhaseContext};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub log_path: PathBuf,
    pub report: SummaryReport,
}

#[derive(Serialize)]
struct SummaryExport<'a> {
    run_id: &'a str,
    tier: &'a str,
    exit_code: i32,
    metrics: &'a MetricSummary,
    phases: &'a [PhaseResult],
}

/// Environment-sync argv: the configured command plus `--extra` per
/// enabled feature. `None` when sync does not apply.
pub fn env_sync_command(config: &ValidateConfig, root: &Path) -> Option<CommandSpec> {
    if !config.python_enabled() {
        return None;
    }
    let spec = CommandSpec::from_argv(&config.commands.env_sync, root)?;
    Some(
        config
            .enabled_extras()
            .into_iter()
            .fold(spec, |spec, extra| spec.arg("--extra").arg(extra)),
    )
}

fn sync_environment(config: &ValidateConfig, root: &Path) -> Result<(), ValidateError> {
    let Some(spec) = env_sync_command(config, root) else {
        tracing::debug!("environment sync not applicable");
        return Ok(());
    };
    tui::print_phase_banner("Environment Sync");
    let outcome = process::run_command(&spec, &Capture::default());
    let ToolVerdict::Failure(reason) = GenericAdapter.interpret(&outcome) else {
        tracing::info!(command = %spec.display(), "environment synced");
        return Ok(());
    };
    let detail = normalize::strip(&outcome.output);
    let last_line = detail
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    Err(ValidateError::EnvSyncFailed(format!(
        "`{}` {}: {}",
        spec.display(),
        reason,
        last_line.trim()
    )))
}

fn backend_selection(
    config: &ValidateConfig,
    run: &RunConfig,
    logs: &LogPaths,
    root: &Path,
) -> Result<Option<BackendSelection>, ValidateError> {
    let applies = run.selection == TestSelection::ChangedOnly
        && !run.fast_path()
        && config.python_enabled()
        && run.tier.runs_backend_tests();
    if !applies {
        return Ok(None);
    }
    cache::select_backend_mode(logs, &root.join(&config.paths.backend_tests)).map(Some)
}

fn item_status(outcome: &PhaseOutcome) -> ItemStatus {
    match outcome {
        PhaseOutcome::Passed => ItemStatus::Pass,
        PhaseOutcome::BestEffortFailed(_) => ItemStatus::Warn,
        PhaseOutcome::Skipped(_) => ItemStatus::Skipped,
        PhaseOutcome::Failed(_) | PhaseOutcome::Fatal(_) => ItemStatus::Fail,
    }
}

fn aborted_summary(phase: &str, reason: &str) -> String {
    format!(
        "{}\n\n**Result:** ❌ ABORTED ({} failed: {})\n\n",
        SUMMARY_HEADING, phase, reason
    )
}

/// Execute one validation run rooted at `root`.
///
/// `baseline` is read before the logs directory is cleaned, so a previous
/// run's log inside `logs/` can be compared against.
pub fn execute(
    root: &Path,
    config: &ValidateConfig,
    run: &RunConfig,
    baseline: Option<&Path>,
) -> Result<RunOutcome, ValidateError> {
    let logs = LogPaths::new(root, &config.paths.logs_dir);
    let baseline_text = match baseline {
        Some(path) if !path.is_file() => {
            return Err(ValidateError::NotFound(path.display().to_string()));
        }
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };

    cache::clean_session(&logs)?;
    let selection = backend_selection(config, run, &logs, root)?;

    let mut header = LogHeader::new(run.tier);
    header.mode = selection.and_then(|s| s.header_mode()).map(str::to_string);
    header.e2e_filter = run.e2e_filter.clone();
    let mut log = RunLog::create(&logs.summary_log(), header)?;
    tracing::info!(tier = %run.tier, run_id = %log.header().run_id, "validation started");
    tui::render_box(
        &format!("Validation: {}", run.tier),
        log.header().mode.as_deref().unwrap_or(""),
        BoxStyle::Info,
    );

    sync_environment(config, root)?;

    let ctx = PhaseContext {
        root,
        config,
        run,
        logs: &logs,
        backend_selection: selection,
    };

    let mut reported_failure = false;
    for entry in PHASES {
        let title = entry.phase.title();
        if let Some(reason) = (entry.skip_reason)(&ctx) {
            tracing::info!(phase = title, %reason, "phase skipped");
            if run.verbose {
                tui::print_status_line(
                    &format!("{} skipped ({})", title, reason),
                    ItemStatus::Skipped,
                );
            }
            log.append(PhaseResult::skipped(entry.phase, reason))?;
            continue;
        }

        tui::print_phase_banner(title);
        let result = (entry.run)(&ctx);
        tracing::info!(
            phase = title,
            outcome = %result.outcome.label(),
            elapsed_secs = result.elapsed_secs(),
            "phase finished"
        );
        tui::print_status_line(
            &format!("{} {}", title, result.outcome.label()),
            item_status(&result.outcome),
        );

        if let PhaseOutcome::Fatal(reason) = &result.outcome {
            let reason = reason.clone();
            log.append(result)?;
            log.append_markdown(&aborted_summary(title, &reason))?;
            return Err(ValidateError::GateFailed {
                phase: title.to_string(),
                reason,
            });
        }
        if entry.phase.policy() == FailurePolicy::Reported
            && matches!(result.outcome, PhaseOutcome::Failed(_))
        {
            reported_failure = true;
        }
        log.append(result)?;
    }

    let metrics = MetricSummary::from_results(run.tier, log.results());
    let baseline_metrics = baseline_text.as_deref().map(MetricSummary::from_log_text);
    let report = summary::render_metrics(metrics, baseline_metrics.as_ref());
    log.append_markdown(&report.markdown)?;

    let found = failures::analyze(&log.render());
    log.append_markdown(&failures::render_markdown(&found))?;

    let exit_code = if reported_failure { 1 } else { report.exit_code };

    let export = SummaryExport {
        run_id: &log.header().run_id,
        tier: run.tier.as_str(),
        exit_code,
        metrics: &report.metrics,
        phases: log.results(),
    };
    fs::write(logs.summary_json(), serde_json::to_string_pretty(&export)?)?;

    println!();
    print!("{}", report.ascii);
    if !found.is_empty() {
        eprintln!();
        eprint!("{}", failures::render_ascii(&found));
    }
    let tolerated = log
        .results()
        .iter()
        .any(|r| matches!(r.outcome, PhaseOutcome::BestEffortFailed(_)));
    if exit_code == 0 && tolerated {
        tui::render_box(
            "VALIDATION PASSED WITH WARNINGS",
            &run.tier.to_string(),
            BoxStyle::Warning,
        );
    } else if exit_code == 0 {
        tui::render_box("VALIDATION PASSED", &run.tier.to_string(), BoxStyle::Success);
    } else {
        tui::render_box("VALIDATION FAILED", &run.tier.to_string(), BoxStyle::Error);
    }
    tracing::info!(exit_code, log = %log.path().display(), "validation finished");

    Ok(RunOutcome {
        exit_code,
        log_path: log.path().to_path_buf(),
        report,
    })
}

/// Re-render the summary of an existing log without running anything.
pub fn analyze(log_path: &Path, baseline: Option<&Path>) -> Result<SummaryReport, ValidateError> {
    let read = |path: &Path| -> Result<String, ValidateError> {
        if !path.is_file() {
            return Err(ValidateError::NotFound(path.display().to_string()));
        }
        Ok(fs::read_to_string(path)?)
    };
    let text = read(log_path)?;
    let baseline_text = baseline.map(read).transpose()?;
    let report = summary::render(&text, baseline_text.as_deref());

    print!("{}", report.ascii);
    let found = failures::analyze(&text);
    if !found.is_empty() {
        eprintln!();
        eprint!("{}", failures::render_ascii(&found));
    }
    Ok(report)
}
