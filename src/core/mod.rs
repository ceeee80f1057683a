//! Core modules: run configuration, collaborator plumbing, the run log and
//! everything that reads it back.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod failures;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod output;
pub mod process;
pub mod run_log;
pub mod summary;
pub mod tier;
pub mod time;
pub mod tui;
