//! Metric extractors and the derived [`MetricSummary`].
//!
//! Every extractor is a total function over arbitrary text: no match means
//! `None`, never zero, and when a pattern matches more than once the last
//! occurrence wins.

use crate::core::adapters::FailureReason;
use crate::core::run_log::{
    BACKEND_HEADING, E2E_FILTER_PREFIX, E2E_HEADING, FRONTEND_HEADING, OUTCOME_PREFIX, Phase,
    PhaseOutcome, PhaseResult, STATIC_ANALYSIS_HEADING, SUBSYSTEMS_HEADING,
};
use crate::core::tier::Tier;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

macro_rules! static_regex {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("static regex"));
    };
}

static_regex!(PASSED_N, r"\b(\d+) passed\b");
static_regex!(FAILED_N, r"\b(\d+) failed\b");
static_regex!(SKIPPED_N, r"\b(\d+) skipped\b");
static_regex!(DESELECTED_N, r"\b(\d+) deselected\b");
static_regex!(ERRORS_N, r"\b(\d+) errors?\b");
static_regex!(
    PYTEST_SUMMARY,
    r"\b\d+ (?:passed|skipped|deselected|failed|errors?)\b.* in \d+(?:\.\d+)?s\b"
);
static_regex!(E2E_PASSED_TIMED, r"\b(\d+) passed \((\d+(?:\.\d+)?)(ms|s|m)\)");
static_regex!(E2E_PASSED_LOOSE, r"\b(\d+) passed\b.*?(\d+(?:\.\d+)?)s\b");
static_regex!(E2E_TIMEOUT, r"(?i)timed out|timeout of \d+ms exceeded");
static_regex!(E2E_FAILURE, r"(?i)\bfailed\b|\bError:|✘");
static_regex!(TIER_LINE, r"\*\*Tier:\*\*\s*([A-Za-z0-9_]+)");
static_regex!(TIMING_LINE, r"TIMING_METRIC:\s*([A-Za-z0-9_]+)=(\d+)s");

fn round_pct(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}

fn last_capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lines of `text` that sit outside fenced code blocks, with their byte
/// offsets. Fence delimiter lines themselves are left out.
fn unfenced_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    let mut fence: Option<usize> = None;
    text.split_inclusive('\n').filter_map(move |line| {
        let at = offset;
        offset += line.len();
        let ticks = line.chars().take_while(|c| *c == '`').count();
        match fence {
            Some(open) => {
                if ticks >= open && line[ticks..].trim().is_empty() {
                    fence = None;
                }
                None
            }
            None if ticks >= 3 => {
                fence = Some(ticks);
                None
            }
            None => Some((at, line)),
        }
    })
}

/// Slice after the last unfenced `heading` line up to the first unfenced
/// line for which `ends` holds.
fn heading_window<'a>(text: &'a str, heading: &str, ends: fn(&str) -> bool) -> Option<&'a str> {
    let start = unfenced_lines(text)
        .filter(|(_, line)| line.trim_end() == heading)
        .last()
        .map(|(at, line)| at + line.len())?;
    let rest = &text[start..];
    let end = unfenced_lines(rest)
        .find(|(_, line)| ends(line))
        .map_or(rest.len(), |(at, _)| at);
    Some(&rest[..end])
}

/// Slice of `text` from the line `heading` up to (not including) the next
/// level-two heading, or end of text. Last occurrence of the heading wins;
/// headings inside fenced tool output are ignored.
pub fn section<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    heading_window(text, heading, |line| line.starts_with("## "))
}

/// Pass/fail/skip tallies; any subset may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    pub passed: Option<u32>,
    pub failed: Option<u32>,
    pub skipped: Option<u32>,
    pub deselected: Option<u32>,
    pub errors: Option<u32>,
}

impl TestCounts {
    /// Parse every `<n> <kind>` token on a single summary line.
    pub fn from_line(line: &str) -> Self {
        Self {
            passed: last_capture_u32(&PASSED_N, line),
            failed: last_capture_u32(&FAILED_N, line),
            skipped: last_capture_u32(&SKIPPED_N, line),
            deselected: last_capture_u32(&DESELECTED_N, line),
            errors: last_capture_u32(&ERRORS_N, line),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn failures(&self) -> u32 {
        self.failed.unwrap_or(0) + self.errors.unwrap_or(0)
    }
}

/// Backend coverage: last line starting with `TOTAL` that carries a `%`.
pub fn backend_coverage(text: &str) -> Option<u32> {
    text.lines()
        .filter(|l| l.starts_with("TOTAL") && l.contains('%'))
        .last()
        .and_then(|line| {
            line.split_whitespace()
                .rev()
                .find(|tok| tok.ends_with('%'))
                .and_then(|tok| tok.trim_end_matches('%').parse::<f64>().ok())
        })
        .map(round_pct)
}

/// Frontend coverage: second pipe-delimited field of the last `All files` row.
pub fn frontend_coverage(text: &str) -> Option<u32> {
    text.lines()
        .filter(|l| l.trim_start().starts_with("All files"))
        .last()
        .and_then(|line| line.split('|').nth(1))
        .and_then(|field| field.trim().trim_end_matches('%').parse::<f64>().ok())
        .map(round_pct)
}

/// Frontend counts from the last line mentioning both `Tests` and `passed`.
pub fn frontend_counts(text: &str) -> Option<TestCounts> {
    text.lines()
        .filter(|l| l.contains("Tests") && l.contains("passed"))
        .last()
        .map(TestCounts::from_line)
        .filter(|c| !c.is_empty())
}

/// Backend counts from the last runner summary line in the backend section.
pub fn backend_counts(text: &str) -> Option<TestCounts> {
    backend_counts_in(section(text, BACKEND_HEADING)?)
}

/// Backend counts over raw runner output (no section scoping).
pub fn backend_counts_in(output: &str) -> Option<TestCounts> {
    output
        .lines()
        .filter(|l| PYTEST_SUMMARY.is_match(l))
        .last()
        .map(TestCounts::from_line)
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum E2eState {
    Passed,
    /// Some scenarios passed, some failed.
    Partial,
    Failed,
    TimedOut,
    NoResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct E2eSummary {
    pub state: E2eState,
    pub passed: Option<u32>,
    pub failed: Option<u32>,
    pub seconds: Option<f64>,
}

/// E2E status from the E2E section of a log.
pub fn e2e_status(text: &str) -> Option<E2eSummary> {
    section(text, E2E_HEADING).map(e2e_status_in)
}

/// E2E status over raw runner output.
///
/// Failure or timeout markers always outrank a `passed` count.
pub fn e2e_status_in(output: &str) -> E2eSummary {
    let timed = E2E_PASSED_TIMED.captures_iter(output).last().map(|c| {
        let n = c[1].parse::<u32>().ok();
        let value = c[2].parse::<f64>().ok();
        let secs = value.map(|v| match &c[3] {
            "ms" => v / 1000.0,
            "m" => v * 60.0,
            _ => v,
        });
        (n, secs)
    });
    let (passed, seconds) = match timed {
        Some(found) => found,
        None => E2E_PASSED_LOOSE
            .captures_iter(output)
            .last()
            .map(|c| (c[1].parse().ok(), c[2].parse().ok()))
            .unwrap_or((None, None)),
    };
    let failed = last_capture_u32(&FAILED_N, output);

    let state = if E2E_TIMEOUT.is_match(output) {
        E2eState::TimedOut
    } else if failed.is_some_and(|n| n > 0) || E2E_FAILURE.is_match(output) {
        if passed.is_some_and(|n| n > 0) {
            E2eState::Partial
        } else {
            E2eState::Failed
        }
    } else if passed.is_some() {
        E2eState::Passed
    } else {
        E2eState::NoResults
    };

    E2eSummary {
        state,
        passed,
        failed,
        seconds,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticCheck {
    Contrast,
    Css,
    PathIntegrity,
}

impl StaticCheck {
    pub const ALL: [StaticCheck; 3] = [
        StaticCheck::Contrast,
        StaticCheck::Css,
        StaticCheck::PathIntegrity,
    ];

    /// Sub-report title inside the static-analysis section.
    pub fn report_title(&self) -> &'static str {
        match self {
            StaticCheck::Contrast => "Contrast Compliance",
            StaticCheck::Css => "CSS Compliance",
            StaticCheck::PathIntegrity => "Path Integrity",
        }
    }

    /// Row label in the summary table.
    pub fn label(&self) -> &'static str {
        match self {
            StaticCheck::Contrast => "Contrast",
            StaticCheck::Css => "CSS",
            StaticCheck::PathIntegrity => "Path Integrity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
    Skipped,
}

pub const SUCCESS_MARK: &str = "✅";
pub const WARNING_MARK: &str = "⚠";
pub const FAILURE_MARK: &str = "❌";
pub const SKIP_MARK: &str = "⏭";

/// Classify a sub-report window by marker glyph: failure outranks warning,
/// warning outranks success, and no marker at all is a failure.
pub fn classify_marks(window: &str) -> CheckStatus {
    if window.contains(FAILURE_MARK) {
        CheckStatus::Failed
    } else if window.contains(WARNING_MARK) {
        CheckStatus::Warning
    } else if window.contains(SUCCESS_MARK) {
        CheckStatus::Passed
    } else if window.contains(SKIP_MARK) {
        CheckStatus::Skipped
    } else {
        CheckStatus::Failed
    }
}

/// Text following a `#### <title>` line up to the next `####`/`##` heading.
fn subreport_window<'a>(scope: &'a str, title: &str) -> Option<&'a str> {
    heading_window(scope, &format!("#### {}", title), |line| {
        line.starts_with("#### ") || line.starts_with("## ")
    })
}

fn static_scope(text: &str) -> Option<&str> {
    section(text, STATIC_ANALYSIS_HEADING)
}

/// Static-check status. An absent sub-report is `Skipped` when the tier does
/// not run static analysis, `Failed` otherwise.
pub fn static_check(text: &str, check: StaticCheck, tier: Option<Tier>) -> CheckStatus {
    static_scope(text)
        .and_then(|scope| subreport_window(scope, check.report_title()))
        .map(classify_marks)
        .unwrap_or_else(|| match tier {
            Some(t) if !t.runs_static_analysis() => CheckStatus::Skipped,
            _ => CheckStatus::Failed,
        })
}

pub const SUBSYSTEM_TITLES: [&str; 2] = ["Coverage Matrix", "Token Usage"];

/// Subsystem rows present in the subsystems section, in fixed order.
pub fn subsystem_statuses(text: &str) -> Vec<(String, CheckStatus)> {
    let Some(scope) = section(text, SUBSYSTEMS_HEADING) else {
        return Vec::new();
    };
    SUBSYSTEM_TITLES
        .iter()
        .filter_map(|title| {
            subreport_window(scope, title).map(|w| (title.to_string(), classify_marks(w)))
        })
        .collect()
}

/// Value of the last `TIMING_METRIC: <key>=<n>s` line for `key`.
pub fn timing(text: &str, key: &str) -> Option<u64> {
    TIMING_LINE
        .captures_iter(text)
        .filter(|c| &c[1] == key)
        .last()
        .and_then(|c| c[2].parse().ok())
}

/// All timing metrics, last occurrence per key.
pub fn timings(text: &str) -> BTreeMap<String, u64> {
    let mut out = BTreeMap::new();
    for c in TIMING_LINE.captures_iter(text) {
        if let Ok(v) = c[2].parse() {
            out.insert(c[1].to_string(), v);
        }
    }
    out
}

pub fn extract_tier(text: &str) -> Option<Tier> {
    TIER_LINE
        .captures_iter(text)
        .last()
        .and_then(|c| c[1].parse().ok())
}

/// Coverage cell of a rendered summary-table row (`| <suite> | ... | 80% | ...`).
pub fn table_coverage(text: &str, suite: &str) -> Option<u32> {
    let prefix = format!("| {} |", suite);
    text.lines()
        .filter(|l| l.starts_with(&prefix))
        .last()
        .and_then(|line| line.split('|').nth(5))
        .and_then(|cell| cell.trim().trim_end_matches('%').parse::<f64>().ok())
        .map(round_pct)
}

/// Combined coverage: mean of both when present, backend alone otherwise.
pub fn overall_coverage(backend: Option<u32>, frontend: Option<u32>) -> Option<f64> {
    match (backend, frontend) {
        (Some(b), Some(f)) => Some((b as f64 + f as f64) / 2.0),
        (Some(b), None) => Some(b as f64),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Passed,
    Failed,
    Partial,
    TimedOut,
    NoResults,
    Skipped,
}

impl SuiteStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SuiteStatus::Failed | SuiteStatus::Partial | SuiteStatus::TimedOut
        )
    }
}

impl From<E2eState> for SuiteStatus {
    fn from(state: E2eState) -> Self {
        match state {
            E2eState::Passed => SuiteStatus::Passed,
            E2eState::Partial => SuiteStatus::Partial,
            E2eState::Failed => SuiteStatus::Failed,
            E2eState::TimedOut => SuiteStatus::TimedOut,
            E2eState::NoResults => SuiteStatus::NoResults,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuiteMetrics {
    pub status: SuiteStatus,
    pub counts: Option<TestCounts>,
    pub coverage: Option<u32>,
    pub elapsed_secs: Option<u64>,
}

impl SuiteMetrics {
    pub fn skipped() -> Self {
        Self {
            status: SuiteStatus::Skipped,
            counts: None,
            coverage: None,
            elapsed_secs: None,
        }
    }

    /// Failed tests; a failed suite without parsed counts counts as one.
    pub fn failed_count(&self) -> u32 {
        let counted = self.counts.map(|c| c.failures()).unwrap_or(0);
        if counted == 0 && self.status.is_failure() {
            1
        } else {
            counted
        }
    }

    pub fn passed_count(&self) -> Option<u32> {
        self.counts.and_then(|c| c.passed)
    }
}

fn status_from_counts(counts: Option<TestCounts>) -> SuiteStatus {
    match counts {
        Some(c) if c.failures() > 0 => SuiteStatus::Failed,
        Some(_) => SuiteStatus::Passed,
        None => SuiteStatus::NoResults,
    }
}

/// Suite status recorded on a section's `**Outcome:**` line, if any.
pub fn section_outcome(scope: &str) -> Option<SuiteStatus> {
    let label = unfenced_lines(scope)
        .filter_map(|(_, line)| line.trim_end().strip_prefix(OUTCOME_PREFIX))
        .last()?;
    if label.starts_with("failed (timed out") {
        Some(SuiteStatus::TimedOut)
    } else if label.starts_with("failed") || label.starts_with("fatal") {
        Some(SuiteStatus::Failed)
    } else {
        None
    }
}

/// Parsed status, overridden by a recorded failure when the text alone
/// looks clean. A recorded timeout always wins.
fn with_outcome(parsed: SuiteStatus, scope: &str) -> SuiteStatus {
    match section_outcome(scope) {
        Some(SuiteStatus::TimedOut) => SuiteStatus::TimedOut,
        Some(recorded) if !parsed.is_failure() => recorded,
        _ => parsed,
    }
}

/// Status of one titled sub-report of a structured phase result.
fn subreport_status(result: &PhaseResult, title: &str) -> Option<CheckStatus> {
    result
        .subreports
        .iter()
        .find(|r| r.title == title)
        .map(|r| r.status)
}

/// Read-only projection of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub tier: Option<Tier>,
    pub frontend: SuiteMetrics,
    pub e2e: SuiteMetrics,
    pub backend: SuiteMetrics,
    pub checks: BTreeMap<String, CheckStatus>,
    pub subsystems: Vec<(String, CheckStatus)>,
    pub overall_coverage: Option<f64>,
    pub timings: BTreeMap<String, u64>,
}

impl MetricSummary {
    pub fn check(&self, check: StaticCheck) -> CheckStatus {
        self.checks
            .get(check.label())
            .copied()
            .unwrap_or(CheckStatus::Skipped)
    }

    pub fn failed_total(&self) -> u32 {
        self.backend.failed_count() + self.frontend.failed_count() + self.e2e.failed_count()
    }

    pub fn passed_total(&self) -> u32 {
        [&self.backend, &self.frontend, &self.e2e]
            .iter()
            .filter_map(|s| s.passed_count())
            .sum()
    }

    /// Static-check failures are reported but never flip the exit code.
    pub fn exit_code(&self) -> i32 {
        if self.failed_total() > 0 { 1 } else { 0 }
    }

    pub fn total_elapsed_secs(&self) -> u64 {
        self.timings.values().sum()
    }

    /// Re-derive metrics from a persisted log (or a rendered summary table).
    pub fn from_log_text(text: &str) -> Self {
        let tier = extract_tier(text);
        let timings = timings(text);

        let backend = match section(text, BACKEND_HEADING) {
            Some(scope) => {
                let counts = backend_counts_in(scope);
                SuiteMetrics {
                    status: with_outcome(status_from_counts(counts), scope),
                    counts,
                    coverage: backend_coverage(text).or_else(|| table_coverage(text, "Backend")),
                    elapsed_secs: timing(text, Phase::BackendTests.timing_key()),
                }
            }
            None => SuiteMetrics {
                coverage: backend_coverage(text).or_else(|| table_coverage(text, "Backend")),
                ..SuiteMetrics::skipped()
            },
        };

        let frontend = match section(text, FRONTEND_HEADING) {
            Some(scope) => {
                let counts = frontend_counts(scope);
                SuiteMetrics {
                    status: with_outcome(status_from_counts(counts), scope),
                    counts,
                    coverage: frontend_coverage(text)
                        .or_else(|| table_coverage(text, "Frontend")),
                    elapsed_secs: timing(text, Phase::FrontendTests.timing_key()),
                }
            }
            None => SuiteMetrics {
                coverage: frontend_coverage(text).or_else(|| table_coverage(text, "Frontend")),
                ..SuiteMetrics::skipped()
            },
        };

        let e2e = match section(text, E2E_HEADING) {
            Some(scope) => {
                let summary = e2e_status_in(scope);
                SuiteMetrics {
                    status: with_outcome(summary.state.into(), scope),
                    counts: Some(TestCounts {
                        passed: summary.passed,
                        failed: summary.failed,
                        ..TestCounts::default()
                    }),
                    coverage: None,
                    elapsed_secs: timing(text, Phase::E2eTests.timing_key()),
                }
            }
            None => SuiteMetrics::skipped(),
        };

        // A fast-path run never reaches static analysis.
        let fast_path = unfenced_lines(text).any(|(_, line)| line.starts_with(E2E_FILTER_PREFIX));
        let checks = StaticCheck::ALL
            .iter()
            .map(|c| {
                let status = if fast_path && static_scope(text).is_none() {
                    CheckStatus::Skipped
                } else {
                    static_check(text, *c, tier)
                };
                (c.label().to_string(), status)
            })
            .collect();

        Self {
            tier,
            overall_coverage: overall_coverage(backend.coverage, frontend.coverage),
            frontend,
            e2e,
            backend,
            checks,
            subsystems: subsystem_statuses(text),
            timings,
        }
    }

    /// Build metrics from structured phase results.
    pub fn from_results(tier: Tier, results: &[PhaseResult]) -> Self {
        let find = |phase: Phase| results.iter().find(|r| r.phase == phase);

        let suite = |phase: Phase| -> SuiteMetrics {
            let Some(result) = find(phase) else {
                return SuiteMetrics::skipped();
            };
            let status = match &result.outcome {
                PhaseOutcome::Skipped(_) => return SuiteMetrics::skipped(),
                PhaseOutcome::Passed => SuiteStatus::Passed,
                PhaseOutcome::Failed(FailureReason::TimedOut) => SuiteStatus::TimedOut,
                PhaseOutcome::Failed(_) | PhaseOutcome::Fatal(_) => {
                    match result.e2e.map(|e| e.state) {
                        Some(E2eState::Partial) => SuiteStatus::Partial,
                        _ => SuiteStatus::Failed,
                    }
                }
                PhaseOutcome::BestEffortFailed(_) => SuiteStatus::Failed,
            };
            SuiteMetrics {
                status,
                counts: result.counts,
                coverage: result.coverage,
                elapsed_secs: Some(result.elapsed_secs()),
            }
        };

        let backend = suite(Phase::BackendTests);
        let frontend = suite(Phase::FrontendTests);
        let e2e = suite(Phase::E2eTests);

        let static_result = find(Phase::StaticAnalysis);
        let checks = StaticCheck::ALL
            .iter()
            .map(|c| {
                let status = match static_result {
                    Some(r) if r.outcome.is_skipped() => CheckStatus::Skipped,
                    Some(r) => {
                        subreport_status(r, c.report_title()).unwrap_or(CheckStatus::Failed)
                    }
                    None if !tier.runs_static_analysis() => CheckStatus::Skipped,
                    None => CheckStatus::Failed,
                };
                (c.label().to_string(), status)
            })
            .collect();

        let subsystems = find(Phase::Subsystems)
            .map(|r| {
                SUBSYSTEM_TITLES
                    .iter()
                    .filter_map(|title| {
                        subreport_status(r, title).map(|status| (title.to_string(), status))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let timings = results
            .iter()
            .filter(|r| !r.outcome.is_skipped())
            .map(|r| (r.phase.timing_key().to_string(), r.elapsed_secs()))
            .collect();

        Self {
            tier: Some(tier),
            overall_coverage: overall_coverage(backend.coverage, frontend.coverage),
            frontend,
            e2e,
            backend,
            checks,
            subsystems,
            timings,
        }
    }
}

/// Per-suite coverage movement against a baseline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageDelta {
    pub backend: Option<i64>,
    pub frontend: Option<i64>,
    pub overall: Option<f64>,
}

impl CoverageDelta {
    pub fn between(current: &MetricSummary, baseline: &MetricSummary) -> Self {
        let diff = |a: Option<u32>, b: Option<u32>| match (a, b) {
            (Some(a), Some(b)) => Some(a as i64 - b as i64),
            _ => None,
        };
        Self {
            backend: diff(current.backend.coverage, baseline.backend.coverage),
            frontend: diff(current.frontend.coverage, baseline.frontend.coverage),
            overall: match (current.overall_coverage, baseline.overall_coverage) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_stops_at_next_level_two_heading() {
        let text = "## Backend Tests\nA\n### Sub\nB\n## Frontend Tests\nC\n";
        assert_eq!(section(text, "## Backend Tests"), Some("A\n### Sub\nB\n"));
        assert_eq!(section(text, "## Frontend Tests"), Some("C\n"));
        assert_eq!(section(text, "## E2E Tests"), None);
    }

    #[test]
    fn headings_inside_fences_do_not_end_a_section() {
        let text = "## Subsystems\n\n#### Coverage Matrix\n\n```text\n## Matrix\n#### Rows\n```\n\n\
                    ✅ Coverage Matrix passed\n\n#### Token Usage\n\n✅ Token Usage passed\n";
        assert_eq!(
            subsystem_statuses(text),
            vec![
                ("Coverage Matrix".to_string(), CheckStatus::Passed),
                ("Token Usage".to_string(), CheckStatus::Passed),
            ]
        );
    }

    #[test]
    fn longer_fence_survives_inner_backticks() {
        let text = "## Backend Tests\n````text\n```\n## Not a heading\n```\n````\nafter\n## E2E Tests\n";
        let scope = section(text, "## Backend Tests").unwrap();
        assert!(scope.ends_with("after\n"));
    }

    #[test]
    fn outcome_line_maps_to_suite_status() {
        assert_eq!(
            section_outcome("**Outcome:** failed (exit code 2)\n"),
            Some(SuiteStatus::Failed)
        );
        assert_eq!(
            section_outcome("**Outcome:** failed (timed out)\n"),
            Some(SuiteStatus::TimedOut)
        );
        assert_eq!(section_outcome("```text\n**Outcome:** failed (x)\n```\n"), None);
        assert_eq!(section_outcome("TIMING_METRIC: Backend=1s\n"), None);
    }

    #[test]
    fn counts_parse_independently() {
        let c = TestCounts::from_line(" Tests  2 failed | 40 passed (42)");
        assert_eq!(c.passed, Some(40));
        assert_eq!(c.failed, Some(2));
        assert_eq!(c.skipped, None);
    }

    #[test]
    fn xfailed_is_not_failed() {
        let c = TestCounts::from_line("=== 3 passed, 1 xfailed in 0.50s ===");
        assert_eq!(c.passed, Some(3));
        assert_eq!(c.failed, None);
    }

    #[test]
    fn rounding_is_to_nearest() {
        assert_eq!(backend_coverage("TOTAL  10  1  89.5%\n"), Some(90));
        assert_eq!(frontend_coverage("All files | 59.4 | 1 |\n"), Some(59));
    }

    #[test]
    fn classify_marks_precedence() {
        assert_eq!(classify_marks("✅ ok\n❌ bad"), CheckStatus::Failed);
        assert_eq!(classify_marks("✅ ok\n⚠️ meh"), CheckStatus::Warning);
        assert_eq!(classify_marks("✅ ok"), CheckStatus::Passed);
        assert_eq!(classify_marks("⏭ not configured"), CheckStatus::Skipped);
        assert_eq!(classify_marks("nothing"), CheckStatus::Failed);
    }

    #[test]
    fn e2e_ms_duration_is_converted() {
        let s = e2e_status_in("  4 passed (850ms)\n");
        assert_eq!(s.state, E2eState::Passed);
        assert_eq!(s.passed, Some(4));
        assert_eq!(s.seconds, Some(0.85));
    }

    #[test]
    fn table_coverage_reads_fifth_column() {
        let row = "| Backend | ✅ Passed | 120 | 0 | 80% | 12s |";
        assert_eq!(table_coverage(row, "Backend"), Some(80));
        assert_eq!(table_coverage("| Backend | ⏭ Skipped | - | - | - | - |", "Backend"), None);
    }
}
