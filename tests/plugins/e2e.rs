use ade_validate::core::tier::{Flags, resolve};
use ade_validate::plugins::e2e::build_e2e_args;

#[test]
fn test_default_e2e_args() {
    let run = resolve("e2e", &Flags::default()).unwrap();
    assert_eq!(
        build_e2e_args(&run, 300),
        vec!["--reporter=list".to_string(), "--timeout=300000".to_string()]
    );
}

#[test]
fn test_filter_comes_first() {
    let flags = Flags {
        e2e_select: Some("login".to_string()),
        update_snapshots: true,
        ..Flags::default()
    };
    let run = resolve("fast", &flags).unwrap();
    let args = build_e2e_args(&run, 60);
    assert_eq!(args[0], "login");
    assert_eq!(args[1], "--update-snapshots");
    assert!(args.contains(&"--timeout=60000".to_string()));
}

#[test]
fn test_exhaustive_runs_fully_parallel() {
    let run = resolve("exhaustive", &Flags::default()).unwrap();
    assert!(build_e2e_args(&run, 300).contains(&"--fully-parallel".to_string()));
    let run = resolve("full", &Flags::default()).unwrap();
    assert!(!build_e2e_args(&run, 300).contains(&"--fully-parallel".to_string()));
}
