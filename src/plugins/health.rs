//! Health gates: the system health check and the smoke test.
//!
//! Both are fatal on any non-zero exit. There is no retry.

use crate::core::adapters::GenericAdapter;
use crate::core::process::{Capture, CommandSpec};
use crate::core::run_log::{Phase, PhaseResult};
use crate::pipeline::{NOT_CONFIGURED, PhaseContext};
use crate::plugins::run_tool;

fn run_gate(ctx: &PhaseContext, phase: Phase, argv: &[String]) -> PhaseResult {
    let Some(spec) = CommandSpec::from_argv(argv, ctx.root) else {
        return PhaseResult::skipped(phase, NOT_CONFIGURED);
    };
    let capture = Capture {
        echo: true,
        transient: None,
    };
    run_tool(&spec, &capture, &GenericAdapter).into_result(phase)
}

pub fn run_health_check(ctx: &PhaseContext) -> PhaseResult {
    run_gate(ctx, Phase::HealthCheck, &ctx.config.commands.health_check)
}

pub fn run_smoke_test(ctx: &PhaseContext) -> PhaseResult {
    run_gate(ctx, Phase::SmokeTest, &ctx.config.commands.smoke_test)
}
