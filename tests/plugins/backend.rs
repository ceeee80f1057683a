use ade_validate::core::cache::{BackendSelection, LogPaths};
use ade_validate::core::config::ValidateConfig;
use ade_validate::core::tier::{Flags, RunConfig, resolve};
use ade_validate::plugins::backend::{backend_env, build_backend_args, marker_expression};
use std::path::Path;

const FEATURES: &str = r#"
[features.processing]
enabled = false
marker = "processing"

[features.renderer]
enabled = true
marker = "renderer"

[features.vision]
enabled = false
marker = "vision"
"#;

fn run(tier: &str, flags: Flags) -> RunConfig {
    resolve(tier, &flags).unwrap()
}

#[test]
fn test_marker_expression_excludes_live_and_disabled_features() {
    let config = ValidateConfig::parse(FEATURES).unwrap();
    let expr = marker_expression(&config, &run("fast", Flags::default()));
    assert_eq!(
        expr.as_deref(),
        Some("not live and not processing and not vision")
    );
}

#[test]
fn test_marker_expression_with_live_tests() {
    let config = ValidateConfig::default();
    let live = Flags {
        live: true,
        ..Flags::default()
    };
    assert_eq!(marker_expression(&config, &run("full", live)), None);

    let config = ValidateConfig::parse(FEATURES).unwrap();
    let live = Flags {
        live: true,
        ..Flags::default()
    };
    assert_eq!(
        marker_expression(&config, &run("full", live)).as_deref(),
        Some("not processing and not vision")
    );
}

#[test]
fn test_fast_tier_uses_incremental_selection() {
    let config = ValidateConfig::default();
    let fast = run("fast", Flags::default());

    let args = build_backend_args(&config, &fast, Some(BackendSelection::ChangedOnly));
    assert_eq!(args[0], "tests");
    assert_eq!(args[1], "-m");
    assert_eq!(args[2], "not live");
    assert!(args.contains(&"--testmon".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--cov")));

    let args = build_backend_args(&config, &fast, None);
    assert!(args.contains(&"--testmon-noselect".to_string()));
}

#[test]
fn test_full_tier_adds_coverage_not_selection() {
    let config = ValidateConfig::default();
    let args = build_backend_args(
        &config,
        &run("full", Flags::default()),
        Some(BackendSelection::ChangedOnly),
    );
    assert!(args.contains(&"--cov=src".to_string()));
    assert!(args.contains(&"--cov-report=term".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--testmon")));
    assert!(!args.contains(&"-n".to_string()));
}

#[test]
fn test_parallel_timeout_and_verbose() {
    let config = ValidateConfig::default();
    let flags = Flags {
        parallel: true,
        verbose: true,
        ..Flags::default()
    };
    let args = build_backend_args(&config, &run("full", flags), None);
    let n = args.iter().position(|a| a == "-n").expect("-n present");
    assert_eq!(args[n + 1], "auto");
    assert!(args.contains(&"--timeout=300".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("-v"));
}

#[test]
fn test_backend_env_points_into_logs() {
    let logs = LogPaths::new(Path::new("/project"), Path::new("logs"));
    let env = backend_env(&logs);
    assert_eq!(env[0].0, "COVERAGE_FILE");
    assert!(env[0].1.ends_with("logs/.coverage"));
    assert_eq!(env[1].0, "TESTMON_DATAFILE");
    assert!(env[1].1.ends_with("logs/.testmondata"));
}
