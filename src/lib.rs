//! ade-validate: a tiered validation orchestrator.
//!
//! Runs a project's environment sync, health gates, auto-fix, backend,
//! frontend and E2E suites, static analysis and auxiliary generators in a
//! fixed order, then reports one summary table and one exit code.
//!
//! # Tiers
//!
//! | Tier | Runs |
//! |---|---|
//! | `screen` | health check, smoke test |
//! | `fast` | gates, auto-fix, changed-only backend and frontend tests |
//! | `frontend` | auto-fix, frontend unit tests |
//! | `e2e` | auto-fix, E2E suite |
//! | `full` | everything, with coverage |
//! | `exhaustive` | everything after the gates, with coverage, in parallel |
//!
//! # Outputs
//!
//! - `logs/validation_summary_log.md`: one section per executed phase,
//!   then the summary and failure tables.
//! - `logs/validation_summary.json`: the same metrics as data.
//!
//! # Crate Structure
//!
//! - [`core`]: tier selection, collaborator plumbing, the run log, metric
//!   extraction and summary rendering.
//! - [`plugins`]: one runner per phase.
//! - [`pipeline`]: the ordered phase table.

pub mod core;
pub mod pipeline;
pub mod plugins;

use crate::core::config::{self, ValidateConfig};
use crate::core::error::ValidateError;
use crate::core::tier::{self, Flags, Tier};
use crate::core::tui::{self, BoxStyle, ItemStatus};
use crate::core::{logging, orchestrator};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIER: Tier = Tier::Fast;

#[derive(Parser, Debug)]
#[clap(
    name = "validate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Tiered validation: health gates, test suites, static analysis, one summary"
)]
struct Cli {
    /// Health check and smoke test only.
    #[clap(long, overrides_with_all = ["fast", "frontend", "e2e", "full", "exhaustive", "tier"])]
    screen: bool,
    /// Changed-code-only tests with auto-fix (default).
    #[clap(long, overrides_with_all = ["screen", "frontend", "e2e", "full", "exhaustive", "tier"])]
    fast: bool,
    /// All frontend unit tests.
    #[clap(long, overrides_with_all = ["screen", "fast", "e2e", "full", "exhaustive", "tier"])]
    frontend: bool,
    /// E2E suite only.
    #[clap(long, overrides_with_all = ["screen", "fast", "frontend", "full", "exhaustive", "tier"])]
    e2e: bool,
    /// All suites with coverage.
    #[clap(long, overrides_with_all = ["screen", "fast", "frontend", "e2e", "exhaustive", "tier"])]
    full: bool,
    /// All suites with coverage, in parallel.
    #[clap(long, overrides_with_all = ["screen", "fast", "frontend", "e2e", "full", "tier"])]
    exhaustive: bool,
    /// Tier by name (screen, fast, frontend, e2e, full, exhaustive).
    #[clap(
        long,
        value_name = "NAME",
        overrides_with_all = ["screen", "fast", "frontend", "e2e", "full", "exhaustive"]
    )]
    tier: Option<String>,

    /// Include tests marked `live` (real network calls).
    #[clap(long)]
    live: bool,
    /// Run only the matching E2E scenario and skip straight to the summary.
    #[clap(long, value_name = "NAME", overrides_with = "skip_e2e")]
    e2e_select: Option<String>,
    /// Never run E2E, whatever the tier says.
    #[clap(long, overrides_with = "e2e_select")]
    skip_e2e: bool,
    /// Let the E2E runner rewrite snapshots.
    #[clap(long)]
    update_snapshots: bool,
    /// Skip lint/format auto-fix.
    #[clap(long)]
    no_fix: bool,
    /// Ask the test runners to parallelize.
    #[clap(long)]
    parallel: bool,
    /// Write config.toml if missing and show enabled languages/features.
    #[clap(long)]
    configure: bool,
    /// Also run the configuration-matrix tests.
    #[clap(long)]
    config_tests: bool,
    /// Echo more while running and log at debug level.
    #[clap(short, long)]
    verbose: bool,

    /// Summarize an existing log instead of running anything.
    #[clap(long, value_name = "LOG")]
    analyze: Option<PathBuf>,
    /// Compare coverage against a previous run's log.
    #[clap(long, value_name = "LOG")]
    baseline: Option<PathBuf>,
}

impl Cli {
    fn tier_name(&self) -> Option<String> {
        if let Some(name) = &self.tier {
            return Some(name.clone());
        }
        [
            (self.screen, Tier::Screen),
            (self.fast, Tier::Fast),
            (self.frontend, Tier::Frontend),
            (self.e2e, Tier::E2e),
            (self.full, Tier::Full),
            (self.exhaustive, Tier::Exhaustive),
        ]
        .into_iter()
        .find(|(set, _)| *set)
        .map(|(_, tier)| tier.as_str().to_string())
    }

    fn flags(&self) -> Flags {
        Flags {
            live: self.live,
            parallel: self.parallel,
            verbose: self.verbose,
            no_fix: self.no_fix,
            skip_e2e: self.skip_e2e,
            update_snapshots: self.update_snapshots,
            e2e_select: self.e2e_select.clone(),
            config_tests: self.config_tests,
        }
    }
}

fn configure(root: &Path) -> Result<(), ValidateError> {
    match config::init_config(root)? {
        Some(path) => tui::render_box(
            "Configuration created",
            &path.display().to_string(),
            BoxStyle::Success,
        ),
        None => tui::render_box("Configuration", "existing config kept", BoxStyle::Info),
    }
    let cfg = ValidateConfig::load(root)?;
    for (name, lang) in &cfg.languages {
        let status = if lang.enabled {
            ItemStatus::Pass
        } else {
            ItemStatus::Skipped
        };
        tui::print_status_line(&format!("language {}", name), status);
    }
    for (name, feature) in &cfg.features {
        let status = if feature.enabled {
            ItemStatus::Pass
        } else {
            ItemStatus::Skipped
        };
        tui::print_status_line(&format!("feature {}", name), status);
    }
    let excluded = cfg.excluded_markers();
    if !excluded.is_empty() {
        tui::print_status_line("deselected test markers:", ItemStatus::Info);
        tui::print_list(&excluded);
    }
    Ok(())
}

/// Entry point for the binary: parses `std::env::args_os()`.
pub fn run() -> Result<i32, ValidateError> {
    run_from(std::env::args_os())
}

/// Parse `args` (program name first) and run. Returns the process exit code.
pub fn run_from<I, T>(args: I) -> Result<i32, ValidateError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        Cli::command().print_help()?;
        println!();
        return Ok(0);
    }

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return Ok(code);
        }
    };

    logging::init(cli.verbose);
    let root = std::env::current_dir()?;

    if let Some(log) = &cli.analyze {
        let report = orchestrator::analyze(log, cli.baseline.as_deref())?;
        return Ok(report.exit_code);
    }

    if cli.configure {
        configure(&root)?;
        if cli.tier_name().is_none() {
            return Ok(0);
        }
    }

    let tier_name = cli
        .tier_name()
        .unwrap_or_else(|| DEFAULT_TIER.as_str().to_string());
    let run = tier::resolve(&tier_name, &cli.flags())?;
    let config = ValidateConfig::load(&root)?;
    let outcome = orchestrator::execute(&root, &config, &run, cli.baseline.as_deref())?;
    Ok(outcome.exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("validate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn last_tier_flag_wins() {
        assert_eq!(parse(&["--full", "--screen"]).tier_name().as_deref(), Some("screen"));
        assert_eq!(parse(&["--tier", "e2e", "--full"]).tier_name().as_deref(), Some("full"));
        assert_eq!(parse(&["--live"]).tier_name(), None);
    }

    #[test]
    fn skip_e2e_and_select_override_each_other() {
        let cli = parse(&["--e2e-select", "login", "--skip-e2e"]);
        assert!(cli.skip_e2e);
        assert!(cli.e2e_select.is_none());

        let cli = parse(&["--skip-e2e", "--e2e-select", "login"]);
        assert!(!cli.skip_e2e);
        assert_eq!(cli.e2e_select.as_deref(), Some("login"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Cli::try_parse_from(["validate", "--medium"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
