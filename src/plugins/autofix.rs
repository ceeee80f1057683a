//! Auto-fix: linters and formatters over the backend and frontend trees.
//!
//! Exit codes are reported in the log but never stop the run.

use crate::core::run_log::{Phase, PhaseResult};
use crate::pipeline::PhaseContext;
use crate::plugins::{SubStep, now_secs, substeps_result};

pub fn run(ctx: &PhaseContext) -> PhaseResult {
    let started_at = now_secs();
    let commands = &ctx.config.commands;
    let mut steps = Vec::new();
    if ctx.config.python_enabled() {
        steps.push(SubStep {
            title: "Backend Lint",
            argv: &commands.backend_lint,
            cwd: ctx.root.to_path_buf(),
        });
        steps.push(SubStep {
            title: "Backend Format",
            argv: &commands.backend_format,
            cwd: ctx.root.to_path_buf(),
        });
    }
    if ctx.config.typescript_enabled() && ctx.config.frontend_detected(ctx.root) {
        steps.push(SubStep {
            title: "Frontend Lint",
            argv: &commands.frontend_lint,
            cwd: ctx.root.join(&ctx.config.paths.frontend_dir),
        });
    }
    substeps_result(Phase::AutoFix, started_at, &steps)
}
