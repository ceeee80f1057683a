//! Summary printer: renders a [`MetricSummary`] as a markdown table for the
//! log and a plain table for the terminal, and decides the exit code.

use crate::core::metrics::{
    CheckStatus, CoverageDelta, MetricSummary, StaticCheck, SuiteMetrics, SuiteStatus,
};
use crate::core::output::pad;
use crate::core::run_log::SUMMARY_HEADING;
use crate::core::time::format_secs;
use colored::{Color, Colorize};

pub const COVERAGE_DELTA_HEADING: &str = "### Coverage Delta";
pub const ABSENT: &str = "-";

#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub markdown: String,
    pub ascii: String,
    pub exit_code: i32,
    pub metrics: MetricSummary,
    pub delta: Option<CoverageDelta>,
}

/// Re-derive everything from log text, optionally against a baseline log.
pub fn render(log_text: &str, baseline_text: Option<&str>) -> SummaryReport {
    let metrics = MetricSummary::from_log_text(log_text);
    let baseline = baseline_text.map(MetricSummary::from_log_text);
    render_metrics(metrics, baseline.as_ref())
}

pub fn render_metrics(metrics: MetricSummary, baseline: Option<&MetricSummary>) -> SummaryReport {
    let delta = baseline.map(|b| CoverageDelta::between(&metrics, b));
    let mut markdown = render_markdown(&metrics);
    if let (Some(d), Some(b)) = (&delta, baseline) {
        markdown.push_str(&render_delta_markdown(&metrics, b, d));
    }
    let mut ascii = render_ascii(&metrics);
    if let Some(d) = &delta {
        ascii.push_str(&render_delta_ascii(d));
    }
    SummaryReport {
        markdown,
        ascii,
        exit_code: metrics.exit_code(),
        metrics,
        delta,
    }
}

/// `80%`, or `70.5%` when the mean is not whole.
pub fn format_pct(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}%", value as i64)
    } else {
        format!("{:.1}%", value)
    }
}

fn format_delta(value: f64) -> String {
    let body = format_pct(value.abs());
    if value > 0.0 {
        format!("+{}", body)
    } else if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn opt_num(value: Option<u32>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| v.to_string())
}

fn opt_pct(value: Option<u32>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| format!("{}%", v))
}

fn opt_time(value: Option<u64>) -> String {
    value.map_or_else(|| ABSENT.to_string(), format_secs)
}

fn suite_cell(status: SuiteStatus) -> &'static str {
    match status {
        SuiteStatus::Passed => "✅ Passed",
        SuiteStatus::Failed => "❌ Failed",
        SuiteStatus::Partial => "⚠️ Partial",
        SuiteStatus::TimedOut => "⏱ Timed Out",
        SuiteStatus::NoResults => "⚪ No Results",
        SuiteStatus::Skipped => "⏭ Skipped",
    }
}

fn check_cell(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Passed => "✅ Passed",
        CheckStatus::Warning => "⚠️ Warning",
        CheckStatus::Failed => "❌ Failed",
        CheckStatus::Skipped => "⏭ Skipped",
    }
}

fn suite_word(status: SuiteStatus) -> (&'static str, Color) {
    match status {
        SuiteStatus::Passed => ("PASS", Color::BrightGreen),
        SuiteStatus::Failed => ("FAIL", Color::BrightRed),
        SuiteStatus::Partial => ("PARTIAL", Color::BrightYellow),
        SuiteStatus::TimedOut => ("TIMEOUT", Color::BrightRed),
        SuiteStatus::NoResults => ("NO RESULTS", Color::BrightBlack),
        SuiteStatus::Skipped => ("SKIP", Color::BrightBlack),
    }
}

fn check_word(status: CheckStatus) -> (&'static str, Color) {
    match status {
        CheckStatus::Passed => ("PASS", Color::BrightGreen),
        CheckStatus::Warning => ("WARN", Color::BrightYellow),
        CheckStatus::Failed => ("FAIL", Color::BrightRed),
        CheckStatus::Skipped => ("SKIP", Color::BrightBlack),
    }
}

struct Row {
    suite: String,
    md_status: &'static str,
    word: (&'static str, Color),
    passed: String,
    failed: String,
    coverage: String,
    time: String,
}

fn suite_row(name: &str, suite: &SuiteMetrics) -> Row {
    let skipped = suite.status == SuiteStatus::Skipped;
    Row {
        suite: name.to_string(),
        md_status: suite_cell(suite.status),
        word: suite_word(suite.status),
        passed: opt_num(suite.passed_count()),
        failed: if skipped {
            ABSENT.to_string()
        } else {
            suite.failed_count().to_string()
        },
        coverage: opt_pct(suite.coverage),
        time: opt_time(suite.elapsed_secs),
    }
}

fn check_row(name: &str, status: CheckStatus) -> Row {
    Row {
        suite: name.to_string(),
        md_status: check_cell(status),
        word: check_word(status),
        passed: ABSENT.to_string(),
        failed: ABSENT.to_string(),
        coverage: ABSENT.to_string(),
        time: ABSENT.to_string(),
    }
}

fn rows(metrics: &MetricSummary) -> Vec<Row> {
    let mut rows = vec![
        suite_row("Frontend", &metrics.frontend),
        suite_row("E2E", &metrics.e2e),
        suite_row("Backend", &metrics.backend),
    ];
    for check in StaticCheck::ALL {
        rows.push(check_row(check.label(), metrics.check(check)));
    }
    for (title, status) in &metrics.subsystems {
        rows.push(check_row(title, *status));
    }
    rows
}

fn total_row(metrics: &MetricSummary) -> Row {
    let failed = metrics.failed_total();
    let (md_status, word) = if failed > 0 {
        ("❌ Failed", ("FAIL", Color::BrightRed))
    } else {
        ("✅ Passed", ("PASS", Color::BrightGreen))
    };
    Row {
        suite: "TOTAL".to_string(),
        md_status,
        word,
        passed: metrics.passed_total().to_string(),
        failed: failed.to_string(),
        coverage: metrics
            .overall_coverage
            .map_or_else(|| ABSENT.to_string(), format_pct),
        time: format_secs(metrics.total_elapsed_secs()),
    }
}

pub fn render_markdown(metrics: &MetricSummary) -> String {
    let mut out = format!("{}\n\n", SUMMARY_HEADING);
    out.push_str("| Suite | Status | Passed | Failed | Coverage | Time |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for row in rows(metrics) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            row.suite, row.md_status, row.passed, row.failed, row.coverage, row.time
        ));
    }
    let total = total_row(metrics);
    out.push_str(&format!(
        "| **{}** | {} | {} | {} | {} | {} |\n\n",
        total.suite, total.md_status, total.passed, total.failed, total.coverage, total.time
    ));
    let verdict = if metrics.exit_code() == 0 {
        "✅ PASSED"
    } else {
        "❌ FAILED"
    };
    out.push_str(&format!("**Result:** {}\n\n", verdict));
    out
}

const WIDTHS: [usize; 6] = [16, 11, 7, 7, 9, 7];

fn ascii_line(cells: [&str; 6], status_color: Option<Color>) -> String {
    let mut parts = Vec::with_capacity(6);
    for (i, cell) in cells.iter().enumerate() {
        let padded = pad(cell, WIDTHS[i]);
        match (i, status_color) {
            (1, Some(color)) => parts.push(padded.color(color).bold().to_string()),
            _ => parts.push(padded),
        }
    }
    format!("{}\n", parts.join(" ").trim_end())
}

pub fn render_ascii(metrics: &MetricSummary) -> String {
    let mut out = ascii_line(
        ["Suite", "Status", "Passed", "Failed", "Coverage", "Time"],
        None,
    );
    let rule_len = WIDTHS.iter().sum::<usize>() + WIDTHS.len() - 1;
    out.push_str(&format!("{}\n", "─".repeat(rule_len)));
    for row in rows(metrics) {
        out.push_str(&ascii_line(
            [
                row.suite.as_str(),
                row.word.0,
                row.passed.as_str(),
                row.failed.as_str(),
                row.coverage.as_str(),
                row.time.as_str(),
            ],
            Some(row.word.1),
        ));
    }
    out.push_str(&format!("{}\n", "─".repeat(rule_len)));
    let total = total_row(metrics);
    out.push_str(&ascii_line(
        [
            total.suite.as_str(),
            total.word.0,
            total.passed.as_str(),
            total.failed.as_str(),
            total.coverage.as_str(),
            total.time.as_str(),
        ],
        Some(total.word.1),
    ));
    out
}

fn delta_row(suite: &str, base: Option<f64>, current: Option<f64>, delta: Option<f64>) -> String {
    let show = |v: Option<f64>| v.map_or_else(|| ABSENT.to_string(), format_pct);
    format!(
        "| {} | {} | {} | {} |\n",
        suite,
        show(base),
        show(current),
        delta.map_or_else(|| ABSENT.to_string(), format_delta)
    )
}

fn render_delta_markdown(
    current: &MetricSummary,
    baseline: &MetricSummary,
    delta: &CoverageDelta,
) -> String {
    let as_f = |v: Option<u32>| v.map(f64::from);
    let mut out = format!("{}\n\n", COVERAGE_DELTA_HEADING);
    out.push_str("| Suite | Baseline | Current | Delta |\n");
    out.push_str("|---|---|---|---|\n");
    out.push_str(&delta_row(
        "Backend",
        as_f(baseline.backend.coverage),
        as_f(current.backend.coverage),
        delta.backend.map(|d| d as f64),
    ));
    out.push_str(&delta_row(
        "Frontend",
        as_f(baseline.frontend.coverage),
        as_f(current.frontend.coverage),
        delta.frontend.map(|d| d as f64),
    ));
    out.push_str(&delta_row(
        "Overall",
        baseline.overall_coverage,
        current.overall_coverage,
        delta.overall,
    ));
    out.push('\n');
    out
}

fn render_delta_ascii(delta: &CoverageDelta) -> String {
    let line = |suite: &str, value: Option<f64>| -> String {
        match value {
            Some(v) if v > 0.0 => format!(
                "  {} {}\n",
                pad(suite, 9),
                format!("{} improvement", format_delta(v)).bright_green()
            ),
            Some(v) if v < 0.0 => format!(
                "  {} {}\n",
                pad(suite, 9),
                format!("{} regression", format_delta(v)).bright_red()
            ),
            Some(_) => format!("  {} unchanged\n", pad(suite, 9)),
            None => format!("  {} {}\n", pad(suite, 9), ABSENT),
        }
    };
    let mut out = String::from("\nCoverage vs baseline:\n");
    out.push_str(&line("Backend", delta.backend.map(|d| d as f64)));
    out.push_str(&line("Frontend", delta.frontend.map(|d| d as f64)));
    out.push_str(&line("Overall", delta.overall));
    out
}
