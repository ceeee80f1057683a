use ade_validate::core::cache::{LogPaths, clean_session};
use ade_validate::core::tier::{Flags, resolve};
use ade_validate::plugins::frontend::{build_frontend_args, read_coverage_summary, read_report};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn logs() -> LogPaths {
    LogPaths::new(Path::new("/project"), Path::new("logs"))
}

fn args_for(tier: &str) -> Vec<String> {
    build_frontend_args(&resolve(tier, &Flags::default()).unwrap(), &logs())
}

#[test]
fn test_fast_runs_changed_only() {
    let args = args_for("fast");
    assert_eq!(args[0], "--changed");
    assert!(!args.iter().any(|a| a.starts_with("--coverage")));
}

#[test]
fn test_frontend_tier_runs_everything_without_coverage() {
    let args = args_for("frontend");
    assert!(!args.contains(&"--changed".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--coverage")));
}

#[test]
fn test_full_and_exhaustive_collect_coverage() {
    for tier in ["full", "exhaustive"] {
        let args = args_for(tier);
        assert!(args.contains(&"--coverage".to_string()), "{}", tier);
        assert!(args.contains(&"--coverage.reporter=json-summary".to_string()));
    }
}

#[test]
fn test_coverage_reports_land_in_logs_dir() {
    let args = args_for("full");
    let dir = args
        .iter()
        .find_map(|a| a.strip_prefix("--coverage.reportsDirectory="))
        .expect("reports directory set");
    assert_eq!(Path::new(dir), logs().frontend_coverage_dir());
    assert!(Path::new(dir).starts_with("/project/logs"));
}

#[test]
fn test_stale_coverage_summary_removed_by_cleanup() {
    let tmp = tempdir().unwrap();
    let paths = LogPaths::new(tmp.path(), Path::new("logs"));
    fs::create_dir_all(paths.frontend_coverage_dir()).unwrap();
    fs::write(
        paths.frontend_coverage_summary(),
        r#"{"total": {"lines": {"pct": 91.0}}}"#,
    )
    .unwrap();
    assert_eq!(read_coverage_summary(&paths.frontend_coverage_summary()), Some(91));

    clean_session(&paths).unwrap();
    assert_eq!(read_coverage_summary(&paths.frontend_coverage_summary()), None);
}

#[test]
fn test_json_report_always_requested() {
    let args = args_for("screen");
    assert!(args.contains(&"--reporter=json".to_string()));
    let out = args.last().unwrap();
    assert!(out.starts_with("--outputFile="));
    assert!(out.ends_with("logs/frontend_report.json"));
}

#[test]
fn test_read_report_counts() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("report.json");
    fs::write(
        &path,
        r#"{"numTotalTests": 9, "numPassedTests": 7, "numFailedTests": 1, "numPendingTests": 1, "success": false}"#,
    )
    .unwrap();
    let counts = read_report(&path).unwrap();
    assert_eq!(counts.passed, Some(7));
    assert_eq!(counts.failed, Some(1));
    assert_eq!(counts.skipped, Some(1));
}

#[test]
fn test_read_report_missing_or_garbage() {
    let tmp = tempdir().unwrap();
    assert!(read_report(&tmp.path().join("absent.json")).is_none());
    let path = tmp.path().join("bad.json");
    fs::write(&path, "not json").unwrap();
    assert!(read_report(&path).is_none());
}

#[test]
fn test_read_coverage_summary_rounds_line_pct() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("coverage-summary.json");
    fs::write(
        &path,
        r#"{"total": {"lines": {"total": 200, "covered": 121, "pct": 60.5}, "statements": {"pct": 58}}}"#,
    )
    .unwrap();
    assert_eq!(read_coverage_summary(&path), Some(61));
}
