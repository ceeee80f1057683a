//! Per-tool interpretation of collaborator exit codes.
//!
//! Each test runner has its own conventions for "nothing to run" and
//! "ran out of time". They are decided here and nowhere else.

use crate::core::process::CommandOutcome;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Why a suite did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    ExitCode(i32),
    TimedOut,
    Signaled,
    SpawnFailed(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ExitCode(code) => write!(f, "exit code {}", code),
            FailureReason::TimedOut => write!(f, "timed out"),
            FailureReason::Signaled => write!(f, "terminated by signal"),
            FailureReason::SpawnFailed(msg) => write!(f, "could not start: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolVerdict {
    Success,
    /// The runner found nothing to execute; counts as success.
    NoTests,
    Failure(FailureReason),
}

impl ToolVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolVerdict::Success | ToolVerdict::NoTests)
    }
}

pub trait ToolAdapter {
    fn name(&self) -> &'static str;
    fn interpret(&self, outcome: &CommandOutcome) -> ToolVerdict;
}

fn base_verdict(outcome: &CommandOutcome) -> Result<i32, ToolVerdict> {
    if let Some(err) = &outcome.spawn_error {
        return Err(ToolVerdict::Failure(FailureReason::SpawnFailed(err.clone())));
    }
    match outcome.exit_code {
        Some(0) => Err(ToolVerdict::Success),
        Some(code) => Ok(code),
        None => Err(ToolVerdict::Failure(FailureReason::Signaled)),
    }
}

/// Plain exit-code semantics.
pub struct GenericAdapter;

impl ToolAdapter for GenericAdapter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn interpret(&self, outcome: &CommandOutcome) -> ToolVerdict {
        match base_verdict(outcome) {
            Ok(code) => ToolVerdict::Failure(FailureReason::ExitCode(code)),
            Err(verdict) => verdict,
        }
    }
}

/// pytest: exit 5 means no tests were collected.
pub struct PytestAdapter;

pub const PYTEST_NO_TESTS_COLLECTED: i32 = 5;

impl ToolAdapter for PytestAdapter {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn interpret(&self, outcome: &CommandOutcome) -> ToolVerdict {
        match base_verdict(outcome) {
            Ok(PYTEST_NO_TESTS_COLLECTED) => ToolVerdict::NoTests,
            Ok(code) if outcome.output.contains("Timeout") && outcome.output.contains("+++++") => {
                tracing::debug!(code, "pytest-timeout marker found");
                ToolVerdict::Failure(FailureReason::TimedOut)
            }
            Ok(code) => ToolVerdict::Failure(FailureReason::ExitCode(code)),
            Err(verdict) => verdict,
        }
    }
}

/// vitest: exits 1 with "No test files found" when a changed-only run
/// selects nothing.
pub struct VitestAdapter;

impl ToolAdapter for VitestAdapter {
    fn name(&self) -> &'static str {
        "vitest"
    }

    fn interpret(&self, outcome: &CommandOutcome) -> ToolVerdict {
        match base_verdict(outcome) {
            Ok(_) if outcome.output.contains("No test files found") => ToolVerdict::NoTests,
            Ok(code) => ToolVerdict::Failure(FailureReason::ExitCode(code)),
            Err(verdict) => verdict,
        }
    }
}

static PLAYWRIGHT_TIMEOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)timed out|timeout of \d+ms exceeded|Timeout \d+ms exceeded")
        .expect("static regex")
});

/// Exit status used by `timeout(1)` wrappers.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// playwright: timeouts are distinguished from ordinary failures.
pub struct PlaywrightAdapter;

impl ToolAdapter for PlaywrightAdapter {
    fn name(&self) -> &'static str {
        "playwright"
    }

    fn interpret(&self, outcome: &CommandOutcome) -> ToolVerdict {
        match base_verdict(outcome) {
            Ok(TIMEOUT_EXIT_CODE) => ToolVerdict::Failure(FailureReason::TimedOut),
            Ok(_) if PLAYWRIGHT_TIMEOUT.is_match(&outcome.output) => {
                ToolVerdict::Failure(FailureReason::TimedOut)
            }
            Ok(_) if outcome.output.contains("No tests found") => ToolVerdict::NoTests,
            Ok(code) => ToolVerdict::Failure(FailureReason::ExitCode(code)),
            Err(verdict) => verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(code: Option<i32>, output: &str) -> CommandOutcome {
        CommandOutcome {
            exit_code: code,
            output: output.to_string(),
            ..CommandOutcome::default()
        }
    }

    #[test]
    fn pytest_no_tests_is_success() {
        let v = PytestAdapter.interpret(&outcome(Some(5), "no tests ran in 0.01s"));
        assert_eq!(v, ToolVerdict::NoTests);
        assert!(v.is_success());
    }

    #[test]
    fn pytest_failures_keep_exit_code() {
        let v = PytestAdapter.interpret(&outcome(Some(1), "1 failed in 0.2s"));
        assert_eq!(v, ToolVerdict::Failure(FailureReason::ExitCode(1)));
    }

    #[test]
    fn generic_does_not_special_case_five() {
        let v = GenericAdapter.interpret(&outcome(Some(5), ""));
        assert_eq!(v, ToolVerdict::Failure(FailureReason::ExitCode(5)));
    }

    #[test]
    fn vitest_no_files_is_success() {
        let v =
            VitestAdapter.interpret(&outcome(Some(1), "No test files found, exiting with code 1"));
        assert_eq!(v, ToolVerdict::NoTests);
    }

    #[test]
    fn playwright_timeout_is_distinguished() {
        let by_code = PlaywrightAdapter.interpret(&outcome(Some(124), ""));
        assert_eq!(by_code, ToolVerdict::Failure(FailureReason::TimedOut));
        let by_text =
            PlaywrightAdapter.interpret(&outcome(Some(1), "Test timeout of 30000ms exceeded."));
        assert_eq!(by_text, ToolVerdict::Failure(FailureReason::TimedOut));
    }

    #[test]
    fn spawn_failure_wins() {
        let mut o = outcome(None, "");
        o.spawn_error = Some("npx: not found".to_string());
        assert!(matches!(
            PlaywrightAdapter.interpret(&o),
            ToolVerdict::Failure(FailureReason::SpawnFailed(_))
        ));
    }

    #[test]
    fn signal_is_failure() {
        assert_eq!(
            GenericAdapter.interpret(&outcome(None, "")),
            ToolVerdict::Failure(FailureReason::Signaled)
        );
    }
}
