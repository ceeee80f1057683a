use ade_validate::core::adapters::FailureReason;
use ade_validate::core::metrics::{
    CheckStatus, E2eState, E2eSummary, MetricSummary, StaticCheck, SuiteStatus, TestCounts,
};
use ade_validate::core::run_log::{self, Phase, PhaseOutcome, PhaseResult, SubReport};
use ade_validate::core::summary;
use ade_validate::core::tier::Tier;
use std::time::Duration;

const FULL_LOG: &str = include_str!("fixtures/full_run_log.md");

fn result(phase: Phase, secs: u64, outcome: PhaseOutcome) -> PhaseResult {
    PhaseResult::new(phase, 0, Duration::from_secs(secs), outcome)
}

#[test]
fn test_full_log_renders_expected_rows() {
    let report = summary::render(FULL_LOG, None);
    let md = &report.markdown;
    assert!(md.starts_with("## Validation Summary\n"));
    assert!(md.contains("| Frontend | ✅ Passed | 40 | 0 | 60% | 4s |"));
    assert!(md.contains("| E2E | ✅ Passed | 12 | 0 | - | 47s |"));
    assert!(md.contains("| Backend | ✅ Passed | 118 | 0 | 80% | 14s |"));
    assert!(md.contains("| Contrast | ✅ Passed |"));
    assert!(md.contains("| CSS | ⚠️ Warning |"));
    assert!(md.contains("| Path Integrity | ❌ Failed |"));
    assert!(md.contains("| Coverage Matrix | ✅ Passed |"));
    assert!(md.contains("| Token Usage | ⏭ Skipped |"));
    assert!(md.contains("| **TOTAL** | ✅ Passed | 170 | 0 | 70% | 1m18s |"));
    assert!(md.contains("**Result:** ✅ PASSED"));
}

#[test]
fn test_static_failures_do_not_flip_exit_code() {
    let report = summary::render(FULL_LOG, None);
    assert_eq!(report.metrics.check(StaticCheck::PathIntegrity), CheckStatus::Failed);
    assert_eq!(report.exit_code, 0);
}

#[test]
fn test_backend_failure_flips_exit_code() {
    let log = FULL_LOG.replace(
        "118 passed, 2 skipped, 3 deselected in 12.34s",
        "2 failed, 116 passed, 2 skipped in 12.34s",
    );
    let report = summary::render(&log, None);
    assert_eq!(report.metrics.backend.status, SuiteStatus::Failed);
    assert_eq!(report.metrics.failed_total(), 2);
    assert_eq!(report.exit_code, 1);
    assert!(report.markdown.contains("**Result:** ❌ FAILED"));
}

#[test]
fn test_rendered_table_round_trips_coverage() {
    let first = summary::render(FULL_LOG, None);
    let reparsed = MetricSummary::from_log_text(&first.markdown);
    assert_eq!(reparsed.backend.coverage, first.metrics.backend.coverage);
    assert_eq!(reparsed.frontend.coverage, first.metrics.frontend.coverage);
    assert_eq!(reparsed.overall_coverage, Some(70.0));
}

#[test]
fn test_baseline_delta_against_previous_run() {
    let baseline = FULL_LOG
        .replace(
            "TOTAL                 1200    240    80%",
            "TOTAL                 1200    300    75%",
        )
        .replace("All files  |    60.2 |", "All files  |    64.0 |");
    let report = summary::render(FULL_LOG, Some(&baseline));
    let delta = report.delta.expect("delta");
    assert_eq!(delta.backend, Some(5));
    assert_eq!(delta.frontend, Some(-4));
    assert_eq!(delta.overall, Some(0.5));
    assert!(report.markdown.contains("### Coverage Delta"));
    assert!(report.markdown.contains("| Backend | 75% | 80% | +5% |"));
    assert!(report.markdown.contains("| Frontend | 64% | 60% | -4% |"));
}

#[test]
fn test_baseline_can_be_a_rendered_summary() {
    let previous = summary::render(FULL_LOG, None).markdown;
    let report = summary::render(FULL_LOG, Some(&previous));
    let delta = report.delta.unwrap();
    assert_eq!(delta.backend, Some(0));
    assert_eq!(delta.frontend, Some(0));
}

#[test]
fn test_screen_results_show_suites_skipped() {
    let results = vec![
        result(Phase::HealthCheck, 1, PhaseOutcome::Passed),
        result(Phase::SmokeTest, 1, PhaseOutcome::Passed),
        PhaseResult::skipped(Phase::BackendTests, "tier screen"),
        PhaseResult::skipped(Phase::FrontendTests, "tier screen"),
        PhaseResult::skipped(Phase::E2eTests, "E2E not selected"),
        PhaseResult::skipped(Phase::StaticAnalysis, "tier screen"),
    ];
    let metrics = MetricSummary::from_results(Tier::Screen, &results);
    assert_eq!(metrics.backend.status, SuiteStatus::Skipped);
    assert_eq!(metrics.frontend.status, SuiteStatus::Skipped);
    assert_eq!(metrics.e2e.status, SuiteStatus::Skipped);
    for check in StaticCheck::ALL {
        assert_eq!(metrics.check(check), CheckStatus::Skipped);
    }
    let report = summary::render_metrics(metrics, None);
    assert_eq!(report.exit_code, 0);
    assert!(report.markdown.contains("| Backend | ⏭ Skipped | - | - | - | - |"));
    assert!(!report.markdown.contains("❌"));
}

#[test]
fn test_structured_results_feed_summary() {
    let mut backend = result(Phase::BackendTests, 20, PhaseOutcome::Passed);
    backend.counts = Some(TestCounts {
        passed: Some(50),
        ..TestCounts::default()
    });
    backend.coverage = Some(81);
    let mut frontend = result(Phase::FrontendTests, 5, PhaseOutcome::Passed);
    frontend.counts = Some(TestCounts {
        passed: Some(10),
        ..TestCounts::default()
    });
    frontend.coverage = Some(60);
    let mut e2e = result(
        Phase::E2eTests,
        30,
        PhaseOutcome::Failed(FailureReason::ExitCode(1)),
    );
    e2e.e2e = Some(E2eSummary {
        state: E2eState::Partial,
        passed: Some(3),
        failed: Some(1),
        seconds: Some(21.0),
    });
    e2e.counts = Some(TestCounts {
        passed: Some(3),
        failed: Some(1),
        ..TestCounts::default()
    });
    let mut statics = result(Phase::StaticAnalysis, 2, PhaseOutcome::Passed);
    statics.subreports = StaticCheck::ALL
        .iter()
        .map(|c| SubReport {
            title: c.report_title().to_string(),
            output: String::new(),
            status: CheckStatus::Passed,
            status_line: format!("✅ {} passed", c.report_title()),
        })
        .collect();

    let metrics = MetricSummary::from_results(Tier::Full, &[backend, frontend, e2e, statics]);
    assert_eq!(metrics.e2e.status, SuiteStatus::Partial);
    assert_eq!(metrics.overall_coverage, Some(70.5));
    assert_eq!(metrics.check(StaticCheck::Css), CheckStatus::Passed);

    let report = summary::render_metrics(metrics, None);
    assert_eq!(report.exit_code, 1);
    assert!(report.markdown.contains("| E2E | ⚠️ Partial | 3 | 1 | - | 30s |"));
    assert!(report.markdown.contains("| **TOTAL** | ❌ Failed | 63 | 1 | 70.5% | 57s |"));
}

#[test]
fn test_timed_out_suite_counts_as_failure() {
    let e2e = result(Phase::E2eTests, 300, PhaseOutcome::Failed(FailureReason::TimedOut));
    let metrics = MetricSummary::from_results(Tier::E2e, &[e2e]);
    assert_eq!(metrics.e2e.status, SuiteStatus::TimedOut);
    assert_eq!(metrics.failed_total(), 1);
    let report = summary::render_metrics(metrics, None);
    assert!(report.markdown.contains("| E2E | ⏱ Timed Out | - | 1 | - | 5m00s |"));
    assert_eq!(report.exit_code, 1);
}

#[test]
fn test_ascii_table_has_every_row() {
    let report = summary::render(FULL_LOG, None);
    for label in ["Frontend", "E2E", "Backend", "Contrast", "CSS", "Path Integrity", "TOTAL"] {
        assert!(report.ascii.contains(label), "missing {}", label);
    }
    assert!(!report.ascii.contains('|'));
}

fn passed_report(title: &str, output: &str) -> SubReport {
    SubReport {
        title: title.to_string(),
        output: output.to_string(),
        status: CheckStatus::Passed,
        status_line: format!("✅ {} passed", title),
    }
}

#[test]
fn test_markdown_headings_in_subsystem_output_keep_every_row() {
    let mut subsystems = result(Phase::Subsystems, 3, PhaseOutcome::Passed);
    subsystems.subreports = vec![
        passed_report("Coverage Matrix", "## Matrix\n| a | b |\n"),
        passed_report("Token Usage", "#### Totals\n1200 tokens\n"),
    ];
    let metrics = MetricSummary::from_results(Tier::Full, &[subsystems]);
    assert_eq!(
        metrics.subsystems,
        vec![
            ("Coverage Matrix".to_string(), CheckStatus::Passed),
            ("Token Usage".to_string(), CheckStatus::Passed),
        ]
    );
}

#[test]
fn test_markdown_headings_in_check_output_keep_statuses() {
    let mut statics = result(Phase::StaticAnalysis, 2, PhaseOutcome::Passed);
    statics.subreports = StaticCheck::ALL
        .iter()
        .map(|c| passed_report(c.report_title(), "## Contrast report\nall ratios ok\n"))
        .collect();
    let metrics = MetricSummary::from_results(Tier::Full, &[statics.clone()]);
    for check in StaticCheck::ALL {
        assert_eq!(metrics.check(check), CheckStatus::Passed, "{:?}", check);
    }

    // Re-reading the rendered section gives the same answer.
    let text = format!("**Tier:** full\n\n{}", run_log::render_section(&statics));
    let reread = MetricSummary::from_log_text(&text);
    for check in StaticCheck::ALL {
        assert_eq!(reread.check(check), CheckStatus::Passed, "{:?}", check);
    }
}

#[test]
fn test_rendered_subsystems_reread_with_headings_in_output() {
    let mut subsystems = result(Phase::Subsystems, 3, PhaseOutcome::Passed);
    subsystems.subreports = vec![
        passed_report("Coverage Matrix", "## Matrix\n| a | b |\n"),
        passed_report("Token Usage", "ok\n"),
    ];
    let text = run_log::render_section(&subsystems);
    assert_eq!(
        MetricSummary::from_log_text(&text).subsystems,
        MetricSummary::from_results(Tier::Full, &[subsystems]).subsystems
    );
}

#[test]
fn test_skipped_static_phase_reports_skipped_checks() {
    let statics = PhaseResult::skipped(Phase::StaticAnalysis, "E2E fast path");
    let metrics = MetricSummary::from_results(Tier::Full, &[statics]);
    for check in StaticCheck::ALL {
        assert_eq!(metrics.check(check), CheckStatus::Skipped);
    }
    let report = summary::render_metrics(metrics, None);
    assert!(!report.markdown.contains("| Contrast | ❌ Failed |"));
}
