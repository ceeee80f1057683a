//! The run log: ordered phase results for one validation run, rendered to
//! `logs/validation_summary_log.md` as they arrive.
//!
//! Results are kept in memory as the source of truth; the markdown file is
//! an append-only rendering of them. Skipped phases are recorded in memory
//! but never rendered, so a skipped suite has no section in the file.

use crate::core::adapters::{FailureReason, ToolVerdict};
use crate::core::error::ValidateError;
use crate::core::metrics::{CheckStatus, E2eSummary, TestCounts};
use crate::core::tier::Tier;
use crate::core::time;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_HEADING: &str = "## Backend Tests";
pub const FRONTEND_HEADING: &str = "## Frontend Tests";
pub const E2E_HEADING: &str = "## E2E Tests";
pub const COMPLIANCE_HEADING: &str = "## Compliance Checks";
pub const STATIC_ANALYSIS_HEADING: &str = "### Static Analysis";
pub const SUBSYSTEMS_HEADING: &str = "## Subsystems";
pub const SUMMARY_HEADING: &str = "## Validation Summary";
pub const FAILURE_SUMMARY_HEADING: &str = "## Failure Summary";
pub const OUTCOME_PREFIX: &str = "**Outcome:** ";
pub const E2E_FILTER_PREFIX: &str = "**E2E Filter:** ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    HealthCheck,
    SmokeTest,
    AutoFix,
    BackendTests,
    FrontendTests,
    E2eTests,
    StaticAnalysis,
    ConfigTests,
    Subsystems,
}

/// How a phase failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run.
    Gate,
    /// Continue, but fail the final exit code.
    Reported,
    /// Log and continue.
    BestEffort,
}

impl Phase {
    pub fn heading(&self) -> &'static str {
        match self {
            Phase::HealthCheck => "## System Health Check",
            Phase::SmokeTest => "## Smoke Test",
            Phase::AutoFix => "## Auto-fix",
            Phase::BackendTests => BACKEND_HEADING,
            Phase::FrontendTests => FRONTEND_HEADING,
            Phase::E2eTests => E2E_HEADING,
            Phase::StaticAnalysis => COMPLIANCE_HEADING,
            Phase::ConfigTests => "## Configuration Tests",
            Phase::Subsystems => SUBSYSTEMS_HEADING,
        }
    }

    pub fn title(&self) -> &'static str {
        self.heading().trim_start_matches('#').trim()
    }

    /// Key used in `TIMING_METRIC: <key>=<n>s` lines.
    pub fn timing_key(&self) -> &'static str {
        match self {
            Phase::HealthCheck => "Health",
            Phase::SmokeTest => "Smoke",
            Phase::AutoFix => "AutoFix",
            Phase::BackendTests => "Backend",
            Phase::FrontendTests => "Frontend",
            Phase::E2eTests => "E2E",
            Phase::StaticAnalysis => "StaticAnalysis",
            Phase::ConfigTests => "ConfigTests",
            Phase::Subsystems => "Subsystems",
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        match self {
            Phase::HealthCheck | Phase::SmokeTest => FailurePolicy::Gate,
            Phase::BackendTests | Phase::FrontendTests | Phase::E2eTests => {
                FailurePolicy::Reported
            }
            Phase::AutoFix | Phase::StaticAnalysis | Phase::ConfigTests | Phase::Subsystems => {
                FailurePolicy::BestEffort
            }
        }
    }

    /// Heading written between the section heading and its sub-reports.
    pub fn subheading(&self) -> Option<&'static str> {
        match self {
            Phase::StaticAnalysis => Some(STATIC_ANALYSIS_HEADING),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PhaseOutcome {
    Passed,
    Failed(FailureReason),
    BestEffortFailed(String),
    Skipped(String),
    Fatal(String),
}

impl PhaseOutcome {
    /// Apply a phase's failure policy to a tool verdict.
    pub fn from_verdict(policy: FailurePolicy, verdict: ToolVerdict) -> Self {
        match verdict {
            ToolVerdict::Success | ToolVerdict::NoTests => PhaseOutcome::Passed,
            ToolVerdict::Failure(reason) => match policy {
                FailurePolicy::Gate => PhaseOutcome::Fatal(reason.to_string()),
                FailurePolicy::Reported => PhaseOutcome::Failed(reason),
                FailurePolicy::BestEffort => PhaseOutcome::BestEffortFailed(reason.to_string()),
            },
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PhaseOutcome::Skipped(_))
    }

    pub fn label(&self) -> String {
        match self {
            PhaseOutcome::Passed => "passed".to_string(),
            PhaseOutcome::Failed(reason) => format!("failed ({})", reason),
            PhaseOutcome::BestEffortFailed(reason) => format!("failed, continuing ({})", reason),
            PhaseOutcome::Skipped(reason) => format!("skipped ({})", reason),
            PhaseOutcome::Fatal(reason) => format!("fatal ({})", reason),
        }
    }
}

/// A titled block inside a phase section (e.g. one compliance check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubReport {
    pub title: String,
    pub output: String,
    pub status: CheckStatus,
    /// Marker line (`✅ ...`, `⚠️ ...`, `❌ ...`, `⏭ ...`) written after the output.
    pub status_line: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub started_at: u64,
    pub ended_at: u64,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub outcome: PhaseOutcome,
    /// Captured output with escape sequences stripped.
    #[serde(skip)]
    pub output: String,
    #[serde(skip)]
    pub subreports: Vec<SubReport>,
    pub counts: Option<TestCounts>,
    pub coverage: Option<u32>,
    pub e2e: Option<E2eSummary>,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

impl PhaseResult {
    pub fn new(phase: Phase, started_at: u64, duration: Duration, outcome: PhaseOutcome) -> Self {
        Self {
            phase,
            started_at,
            ended_at: started_at + duration.as_secs(),
            duration,
            outcome,
            output: String::new(),
            subreports: Vec::new(),
            counts: None,
            coverage: None,
            e2e: None,
        }
    }

    pub fn skipped(phase: Phase, reason: impl Into<String>) -> Self {
        let now = time::epoch_secs(std::time::SystemTime::now());
        Self::new(phase, now, Duration::ZERO, PhaseOutcome::Skipped(reason.into()))
    }

    pub fn with_output(mut self, output: String) -> Self {
        self.output = output;
        self
    }

    pub fn elapsed_secs(&self) -> u64 {
        time::whole_secs(self.duration)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogHeader {
    pub date: String,
    pub tier: Tier,
    pub run_id: String,
    /// Set when the incremental test index is being rebuilt.
    pub mode: Option<String>,
    /// Scenario filter of an E2E fast-path run.
    pub e2e_filter: Option<String>,
}

impl LogHeader {
    pub fn new(tier: Tier) -> Self {
        Self {
            date: time::local_timestamp(),
            tier,
            run_id: time::new_run_id(),
            mode: None,
            e2e_filter: None,
        }
    }
}

pub fn render_header(header: &LogHeader) -> String {
    let mut out = String::from("# Validation Summary Log\n\n");
    out.push_str(&format!("**Date:** {}\n", header.date));
    out.push_str(&format!("**Tier:** {}\n", header.tier));
    out.push_str(&format!("**Run:** {}\n", header.run_id));
    if let Some(mode) = &header.mode {
        out.push_str(&format!("**Mode:** {}\n", mode));
    }
    if let Some(filter) = &header.e2e_filter {
        out.push_str(&format!("{}{}\n", E2E_FILTER_PREFIX, filter));
    }
    out.push('\n');
    out
}

/// Fence `body` with one more backtick than its longest line-leading run,
/// so captured output can never close the block early.
fn push_fenced(out: &mut String, body: &str) {
    let longest = body
        .lines()
        .map(|l| l.chars().take_while(|c| *c == '`').count())
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    out.push_str(&format!("{}text\n", fence));
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out.push_str("\n\n");
}

/// Render one phase section. Skipped phases render to nothing.
pub fn render_section(result: &PhaseResult) -> String {
    if result.outcome.is_skipped() {
        return String::new();
    }
    let mut out = format!("{}\n\n", result.phase.heading());
    if let Some(sub) = result.phase.subheading() {
        out.push_str(sub);
        out.push_str("\n\n");
    }
    if !result.output.trim().is_empty() {
        push_fenced(&mut out, &result.output);
    }
    for report in &result.subreports {
        out.push_str(&format!("#### {}\n\n", report.title));
        if !report.output.trim().is_empty() {
            push_fenced(&mut out, &report.output);
        }
        out.push_str(&report.status_line);
        out.push_str("\n\n");
    }
    match &result.outcome {
        PhaseOutcome::Passed | PhaseOutcome::Skipped(_) => {}
        other => out.push_str(&format!("{}{}\n\n", OUTCOME_PREFIX, other.label())),
    }
    out.push_str(&format!(
        "TIMING_METRIC: {}={}s\n\n",
        result.phase.timing_key(),
        result.elapsed_secs()
    ));
    out
}

/// Append-only run log backed by a markdown file.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    header: LogHeader,
    results: Vec<PhaseResult>,
}

impl RunLog {
    /// Start a fresh log file containing only the header.
    pub fn create(path: &Path, header: LogHeader) -> Result<Self, ValidateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, render_header(&header))?;
        Ok(Self {
            path: path.to_path_buf(),
            header,
            results: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    pub fn results(&self) -> &[PhaseResult] {
        &self.results
    }

    /// Record a finished phase and append its section to the file.
    pub fn append(&mut self, result: PhaseResult) -> Result<(), ValidateError> {
        let section = render_section(&result);
        if !section.is_empty() {
            self.write(&section)?;
        }
        self.results.push(result);
        Ok(())
    }

    /// Append free-form markdown (summary and failure tables).
    pub fn append_markdown(&mut self, text: &str) -> Result<(), ValidateError> {
        self.write(text)
    }

    fn write(&self, text: &str) -> Result<(), ValidateError> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Full in-memory rendering: header plus every non-skipped section.
    pub fn render(&self) -> String {
        let mut out = render_header(&self.header);
        for result in &self.results {
            out.push_str(&render_section(result));
        }
        out
    }
}
