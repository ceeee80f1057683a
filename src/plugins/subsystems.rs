//! Coverage matrix generation and token-usage analysis (full tiers only).

use crate::core::metrics::SUBSYSTEM_TITLES;
use crate::core::run_log::{Phase, PhaseResult};
use crate::pipeline::PhaseContext;
use crate::plugins::{SubStep, now_secs, substeps_result};

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let [matrix, tokens] = SUBSYSTEM_TITLES;
    let steps = [
        SubStep {
            title: matrix,
            argv: &ctx.config.commands.coverage_matrix,
            cwd: ctx.root.to_path_buf(),
        },
        SubStep {
            title: tokens,
            argv: &ctx.config.commands.token_usage,
            cwd: ctx.root.to_path_buf(),
        },
    ];
    substeps_result(Phase::Subsystems, now_secs(), &steps)
}
