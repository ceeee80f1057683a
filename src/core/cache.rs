//! Logs directory layout, session cleanup, and the incremental test cache.
//!
//! Two files survive between runs: the test-selection database and the
//! coverage database. Everything else in the logs directory belongs to a
//! single run and is removed when the next one starts.

use crate::core::error::ValidateError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const TESTMON_FILE: &str = ".testmondata";
pub const COVERAGE_FILE: &str = ".coverage";
pub const PRESERVED_PREFIXES: [&str; 2] = [TESTMON_FILE, COVERAGE_FILE];

pub const SUMMARY_LOG: &str = "validation_summary_log.md";
pub const SUMMARY_JSON: &str = "validation_summary.json";
pub const FRONTEND_REPORT: &str = "frontend_report.json";
pub const FRONTEND_COVERAGE_DIR: &str = "frontend_coverage";

#[derive(Debug, Clone)]
pub struct LogPaths {
    pub dir: PathBuf,
}

impl LogPaths {
    pub fn new(root: &Path, logs_dir: &Path) -> Self {
        Self {
            dir: root.join(logs_dir),
        }
    }

    pub fn summary_log(&self) -> PathBuf {
        self.dir.join(SUMMARY_LOG)
    }

    pub fn summary_json(&self) -> PathBuf {
        self.dir.join(SUMMARY_JSON)
    }

    pub fn testmon_data(&self) -> PathBuf {
        self.dir.join(TESTMON_FILE)
    }

    pub fn coverage_data(&self) -> PathBuf {
        self.dir.join(COVERAGE_FILE)
    }

    pub fn frontend_report(&self) -> PathBuf {
        self.dir.join(FRONTEND_REPORT)
    }

    /// vitest coverage reports; inside the logs directory so each run starts
    /// without a previous run's summary.
    pub fn frontend_coverage_dir(&self) -> PathBuf {
        self.dir.join(FRONTEND_COVERAGE_DIR)
    }

    pub fn frontend_coverage_summary(&self) -> PathBuf {
        self.frontend_coverage_dir().join("coverage-summary.json")
    }

    /// `backend_output.tmp` and friends.
    pub fn transient(&self, suite: &str) -> PathBuf {
        self.dir.join(format!("{}_output.tmp", suite))
    }
}

fn is_preserved(name: &str) -> bool {
    PRESERVED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Remove last run's artifacts, keeping the two cache files.
pub fn clean_session(paths: &LogPaths) -> Result<usize, ValidateError> {
    fs::create_dir_all(&paths.dir)?;
    let mut removed = 0;
    for entry in fs::read_dir(&paths.dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_preserved(&name) {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    tracing::debug!(dir = %paths.dir.display(), removed, "cleaned logs directory");
    Ok(removed)
}

/// How the incremental backend selection runs this time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Cache missing or stale: run everything and rebuild the index.
    BuildIndex,
    ChangedOnly,
}

impl BackendSelection {
    pub fn runner_flag(&self) -> &'static str {
        match self {
            BackendSelection::BuildIndex => "--testmon-noselect",
            BackendSelection::ChangedOnly => "--testmon",
        }
    }

    pub fn header_mode(&self) -> Option<&'static str> {
        match self {
            BackendSelection::BuildIndex => Some("initializing (building test index)"),
            BackendSelection::ChangedOnly => None,
        }
    }
}

fn newest_test_file(dir: &Path) -> Option<SystemTime> {
    let mut newest: Option<SystemTime> = None;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|e| e == "py") {
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    newest = Some(newest.map_or(modified, |n| n.max(modified)));
                }
            }
        }
    }
    newest
}

/// Pick the backend selection mode. A cache older than any test source is
/// deleted so the runner rebuilds it from scratch.
pub fn select_backend_mode(
    paths: &LogPaths,
    tests_dir: &Path,
) -> Result<BackendSelection, ValidateError> {
    let cache = paths.testmon_data();
    let Ok(cache_modified) = fs::metadata(&cache).and_then(|m| m.modified()) else {
        tracing::info!("no incremental test cache; building index");
        return Ok(BackendSelection::BuildIndex);
    };
    if newest_test_file(tests_dir).is_some_and(|newest| newest > cache_modified) {
        tracing::info!(cache = %cache.display(), "test sources newer than cache; rebuilding");
        fs::remove_file(&cache)?;
        return Ok(BackendSelection::BuildIndex);
    }
    Ok(BackendSelection::ChangedOnly)
}
