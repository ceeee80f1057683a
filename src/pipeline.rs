//! Phase registration: the fixed execution order of the validation pipeline.
//!
//! Adding a phase: append one entry to `PHASES`.

use crate::core::cache::{BackendSelection, LogPaths};
use crate::core::config::ValidateConfig;
use crate::core::run_log::{Phase, PhaseResult};
use crate::core::tier::RunConfig;
use crate::plugins::{
    autofix, backend, config_tests, e2e, frontend, health, static_analysis, subsystems,
};
use std::path::Path;

pub const FAST_PATH: &str = "E2E fast path";
pub const NOT_CONFIGURED: &str = "not configured";

/// Everything a runner may read. Runners never mutate shared state; they
/// return a [`PhaseResult`] and the orchestrator records it.
pub struct PhaseContext<'a> {
    pub root: &'a Path,
    pub config: &'a ValidateConfig,
    pub run: &'a RunConfig,
    pub logs: &'a LogPaths,
    pub backend_selection: Option<BackendSelection>,
}

impl PhaseContext<'_> {
    fn tier_reason(&self) -> Option<String> {
        Some(format!("tier {}", self.run.tier))
    }

    fn fast_path_reason(&self) -> Option<String> {
        self.run.fast_path().then(|| FAST_PATH.to_string())
    }
}

pub struct PhaseEntry {
    pub phase: Phase,
    pub skip_reason: fn(&PhaseContext) -> Option<String>,
    pub run: fn(&PhaseContext) -> PhaseResult,
}

fn unconfigured(argv: &[String]) -> Option<String> {
    argv.is_empty().then(|| NOT_CONFIGURED.to_string())
}

fn skip_health(ctx: &PhaseContext) -> Option<String> {
    if !ctx.run.tier.runs_health_gates() {
        return ctx.tier_reason();
    }
    unconfigured(&ctx.config.commands.health_check)
}

fn skip_smoke(ctx: &PhaseContext) -> Option<String> {
    if !ctx.run.tier.runs_health_gates() {
        return ctx.tier_reason();
    }
    ctx.fast_path_reason()
        .or_else(|| unconfigured(&ctx.config.commands.smoke_test))
}

fn skip_autofix(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    if ctx.run.skip_auto_fix {
        return Some("--no-fix".to_string());
    }
    if !ctx.run.auto_fix_enabled() {
        return ctx.tier_reason();
    }
    None
}

fn skip_backend(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    if !ctx.config.python_enabled() {
        return Some("python disabled".to_string());
    }
    if !ctx.run.tier.runs_backend_tests() {
        return ctx.tier_reason();
    }
    unconfigured(&ctx.config.commands.backend_tests)
}

fn skip_frontend(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    if !ctx.config.typescript_enabled() {
        return Some("typescript disabled".to_string());
    }
    if !ctx.run.tier.runs_frontend_tests() {
        return ctx.tier_reason();
    }
    if !ctx.config.frontend_detected(ctx.root) {
        return Some("no frontend project".to_string());
    }
    unconfigured(&ctx.config.commands.frontend_tests)
}

fn skip_e2e(ctx: &PhaseContext) -> Option<String> {
    if !ctx.run.include_e2e {
        return Some("E2E not selected".to_string());
    }
    unconfigured(&ctx.config.commands.e2e_tests)
}

fn skip_static_analysis(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    (!ctx.run.tier.runs_static_analysis())
        .then(|| ctx.tier_reason())
        .flatten()
}

fn skip_config_tests(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    if !ctx.run.run_config_tests {
        return Some("not requested".to_string());
    }
    unconfigured(&ctx.config.commands.config_tests)
}

fn skip_subsystems(ctx: &PhaseContext) -> Option<String> {
    if let Some(reason) = ctx.fast_path_reason() {
        return Some(reason);
    }
    (!ctx.run.tier.runs_subsystems())
        .then(|| ctx.tier_reason())
        .flatten()
}

/// Execution order is the slice order.
pub const PHASES: &[PhaseEntry] = &[
    PhaseEntry {
        phase: Phase::HealthCheck,
        skip_reason: skip_health,
        run: health::run_health_check,
    },
    PhaseEntry {
        phase: Phase::SmokeTest,
        skip_reason: skip_smoke,
        run: health::run_smoke_test,
    },
    PhaseEntry {
        phase: Phase::AutoFix,
        skip_reason: skip_autofix,
        run: autofix::run,
    },
    PhaseEntry {
        phase: Phase::BackendTests,
        skip_reason: skip_backend,
        run: backend::run,
    },
    PhaseEntry {
        phase: Phase::FrontendTests,
        skip_reason: skip_frontend,
        run: frontend::run,
    },
    PhaseEntry {
        phase: Phase::E2eTests,
        skip_reason: skip_e2e,
        run: e2e::run,
    },
    PhaseEntry {
        phase: Phase::StaticAnalysis,
        skip_reason: skip_static_analysis,
        run: static_analysis::run,
    },
    PhaseEntry {
        phase: Phase::ConfigTests,
        skip_reason: skip_config_tests,
        run: config_tests::run,
    },
    PhaseEntry {
        phase: Phase::Subsystems,
        skip_reason: skip_subsystems,
        run: subsystems::run,
    },
];

/// Phases that would execute for this context, in order.
pub fn planned_phases(ctx: &PhaseContext) -> Vec<Phase> {
    PHASES
        .iter()
        .filter(|entry| (entry.skip_reason)(ctx).is_none())
        .map(|entry| entry.phase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tier::{Flags, resolve};

    fn plan(tier: &str, flags: Flags) -> Vec<Phase> {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("frontend")).unwrap();
        std::fs::write(tmp.path().join("frontend/package.json"), "{}").unwrap();
        let config = ValidateConfig::default();
        let run = resolve(tier, &flags).unwrap();
        let logs = LogPaths::new(tmp.path(), &config.paths.logs_dir);
        let ctx = PhaseContext {
            root: tmp.path(),
            config: &config,
            run: &run,
            logs: &logs,
            backend_selection: None,
        };
        planned_phases(&ctx)
    }

    #[test]
    fn screen_runs_only_gates() {
        assert_eq!(
            plan("screen", Flags::default()),
            vec![Phase::HealthCheck, Phase::SmokeTest]
        );
    }

    #[test]
    fn fast_runs_fix_backend_frontend() {
        assert_eq!(
            plan("fast", Flags::default()),
            vec![
                Phase::HealthCheck,
                Phase::SmokeTest,
                Phase::AutoFix,
                Phase::BackendTests,
                Phase::FrontendTests
            ]
        );
    }

    #[test]
    fn e2e_filter_takes_fast_path() {
        let flags = Flags {
            e2e_select: Some("login".to_string()),
            ..Flags::default()
        };
        assert_eq!(plan("fast", flags), vec![Phase::HealthCheck, Phase::E2eTests]);
    }

    #[test]
    fn full_runs_everything_but_config_tests() {
        let phases = plan("full", Flags::default());
        assert!(phases.contains(&Phase::StaticAnalysis));
        assert!(phases.contains(&Phase::Subsystems));
        assert!(!phases.contains(&Phase::ConfigTests));
        assert_eq!(phases.len(), 8);
    }

    #[test]
    fn no_fix_drops_autofix() {
        let flags = Flags {
            no_fix: true,
            ..Flags::default()
        };
        assert!(!plan("full", flags).contains(&Phase::AutoFix));
    }
}
