//! Failure analysis: individual failing tests pulled out of the run log.

use crate::core::metrics::section;
use crate::core::output::{compact_line, md_cell, pad};
use crate::core::run_log::{
    BACKEND_HEADING, E2E_HEADING, FAILURE_SUMMARY_HEADING, FRONTEND_HEADING,
};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PYTEST_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^FAILED\s+(.*?)::(.*?)\s+-\s+(.*)$").expect("static regex")
});
static VITEST_FAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:FAIL|×)\s+(\S+)\s+>\s+(.*?)(?:\s+\d+ms)?$").expect("static regex")
});
static PLAYWRIGHT_FAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\)\s+)?[xX✘✕]\s+.*?\[(\w+)\].*?›\s+(.*)$").expect("static regex")
});
static E2E_TIMEOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)timed out|timeout of \d+ms exceeded").expect("static regex")
});

pub const ERROR_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub suite: &'static str,
    pub location: String,
    pub test: String,
    pub error: String,
}

pub fn backend_failures(text: &str) -> Vec<FailureRecord> {
    let Some(scope) = section(text, BACKEND_HEADING) else {
        return Vec::new();
    };
    scope
        .lines()
        .filter_map(|line| PYTEST_FAILED.captures(line.trim_end()))
        .map(|c| FailureRecord {
            suite: "Backend",
            location: c[1].to_string(),
            test: c[2].to_string(),
            error: c[3].trim().to_string(),
        })
        .collect()
}

pub fn frontend_failures(text: &str) -> Vec<FailureRecord> {
    let Some(scope) = section(text, FRONTEND_HEADING) else {
        return Vec::new();
    };
    let lines: Vec<&str> = scope.lines().collect();
    let mut out: Vec<FailureRecord> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(c) = VITEST_FAIL.captures(line) else {
            continue;
        };
        let error = lines[i + 1..]
            .iter()
            .take(5)
            .find(|l| l.contains("Error"))
            .map(|l| l.trim().to_string())
            .unwrap_or_default();
        let location = c[1].to_string();
        let test = c[2].trim().to_string();
        // vitest lists a failing test twice: `×` while running, `FAIL` in the recap.
        match out.iter_mut().find(|r| r.location == location && r.test == test) {
            Some(existing) if existing.error.is_empty() => existing.error = error,
            Some(_) => {}
            None => out.push(FailureRecord {
                suite: "Frontend",
                location,
                test,
                error,
            }),
        }
    }
    out
}

pub fn e2e_failures(text: &str) -> Vec<FailureRecord> {
    let Some(scope) = section(text, E2E_HEADING) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if E2E_TIMEOUT.is_match(scope) {
        out.push(FailureRecord {
            suite: "E2E",
            location: "-".to_string(),
            test: "(suite)".to_string(),
            error: "timed out".to_string(),
        });
    }
    for line in scope.lines() {
        if let Some(c) = PLAYWRIGHT_FAIL.captures(line) {
            let tail = &c[2];
            let test = tail.rsplit('›').next().unwrap_or(tail).trim().to_string();
            out.push(FailureRecord {
                suite: "E2E",
                location: c[1].to_string(),
                test,
                error: String::new(),
            });
        }
    }
    out
}

/// Every failure found in the log, backend first.
pub fn analyze(text: &str) -> Vec<FailureRecord> {
    let mut all = backend_failures(text);
    all.extend(frontend_failures(text));
    all.extend(e2e_failures(text));
    all
}

/// `## Failure Summary` table; empty when nothing failed.
pub fn render_markdown(records: &[FailureRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut out = format!("{}\n\n", FAILURE_SUMMARY_HEADING);
    out.push_str("| Suite | Location | Test | Error |\n");
    out.push_str("|---|---|---|---|\n");
    for r in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            r.suite,
            md_cell(&r.location),
            md_cell(&r.test),
            md_cell(&compact_line(&r.error, ERROR_PREVIEW_CHARS))
        ));
    }
    out.push('\n');
    out
}

pub fn render_ascii(records: &[FailureRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let test_width = records
        .iter()
        .map(|r| r.test.chars().count().min(48))
        .max()
        .unwrap_or(4)
        .max(4);
    let mut out = format!("{} {} Error\n", pad("Suite", 9), pad("Test", test_width));
    for r in records {
        out.push_str(&format!(
            "{} {} {}\n",
            pad(r.suite, 9),
            pad(&compact_line(&r.test, 48), test_width),
            compact_line(&r.error, ERROR_PREVIEW_CHARS)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
## Backend Tests

```text
FAILED tests/test_api.py::test_login - AssertionError: expected 200 | got 500
=== 1 failed, 3 passed in 1.20s ===
```

## Frontend Tests

```text
 FAIL  src/App.test.tsx > App > renders header
AssertionError: expected 'Hi' to be 'Hello'
```

## E2E Tests

```text
  ✘  2 [chromium] › tests/login.spec.ts:12:5 › Login › rejects bad password (3.1s)
```
";

    #[test]
    fn extracts_each_suite() {
        let records = analyze(LOG);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].test, "test_login");
        assert_eq!(records[1].location, "src/App.test.tsx");
        assert!(records[1].error.starts_with("AssertionError"));
        assert_eq!(records[2].location, "chromium");
        assert_eq!(records[2].test, "rejects bad password (3.1s)");
    }

    #[test]
    fn markdown_escapes_pipes() {
        let md = render_markdown(&backend_failures(LOG));
        assert!(md.starts_with(FAILURE_SUMMARY_HEADING));
        assert!(md.contains("expected 200 \\| got 500"));
    }

    #[test]
    fn vitest_running_and_recap_lines_merge() {
        let text = "\
## Frontend Tests

 × src/cart.test.ts > Cart > totals 12ms
 FAIL  src/cart.test.ts > Cart > totals
TypeError: Cannot read properties of undefined
";
        let records = frontend_failures(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].test, "Cart > totals");
        assert!(records[0].error.starts_with("TypeError"));
    }

    #[test]
    fn nothing_failed_renders_nothing() {
        assert!(render_markdown(&[]).is_empty());
        assert!(render_ascii(&[]).is_empty());
    }
}
