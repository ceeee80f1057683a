//! Project configuration (`config.toml`).
//!
//! Languages gate which suites exist at all, features contribute test
//! markers and environment extras, and `[commands]` names the external
//! collaborators each phase shells out to.

use crate::core::error::ValidateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";

/// Template written by `--configure` when the project has no config yet.
pub const CONFIG_TEMPLATE: &str = include_str!("templates/config.toml");

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ValidateConfig {
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageConfig>,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureConfig>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub backend_tests: PathBuf,
    pub backend_src: PathBuf,
    pub frontend_dir: PathBuf,
    pub e2e_dir: Option<PathBuf>,
    pub validation_tests: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            backend_tests: PathBuf::from("tests"),
            backend_src: PathBuf::from("src"),
            frontend_dir: PathBuf::from("frontend"),
            e2e_dir: None,
            validation_tests: PathBuf::from("tests/validation"),
        }
    }
}

impl PathsConfig {
    pub fn e2e_dir(&self) -> &Path {
        self.e2e_dir.as_deref().unwrap_or(&self.frontend_dir)
    }
}

/// Argv arrays for every collaborator. An empty array disables it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub env_sync: Vec<String>,
    pub health_check: Vec<String>,
    pub smoke_test: Vec<String>,
    pub backend_lint: Vec<String>,
    pub backend_format: Vec<String>,
    pub frontend_lint: Vec<String>,
    pub backend_tests: Vec<String>,
    pub frontend_tests: Vec<String>,
    pub e2e_tests: Vec<String>,
    pub static_analysis: Vec<String>,
    pub contrast_check: Vec<String>,
    pub css_check: Vec<String>,
    pub path_check: Vec<String>,
    pub coverage_matrix: Vec<String>,
    pub token_usage: Vec<String>,
    pub config_tests: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            env_sync: argv(&["uv", "sync"]),
            health_check: argv(&["uv", "run", "python", "bin/ADE_health_check.py"]),
            smoke_test: argv(&["uv", "run", "pytest", "tests/smoke", "-x", "-q"]),
            backend_lint: argv(&["uv", "run", "ruff", "check", "--fix", "."]),
            backend_format: argv(&["uv", "run", "ruff", "format", "."]),
            frontend_lint: argv(&["npm", "run", "lint", "--", "--fix"]),
            backend_tests: argv(&["uv", "run", "pytest"]),
            frontend_tests: argv(&["npx", "vitest", "run"]),
            e2e_tests: argv(&["npx", "playwright", "test"]),
            static_analysis: argv(&["uv", "run", "pytest"]),
            contrast_check: argv(&["uv", "run", "python", "bin/ADE_check_contrast.py"]),
            css_check: argv(&["uv", "run", "python", "bin/ADE_check_css_compliance.py"]),
            path_check: argv(&["uv", "run", "python", "bin/ADE_enforce_relative_paths.py"]),
            coverage_matrix: argv(&["uv", "run", "python", "bin/ADE_coverage_matrix.py"]),
            token_usage: argv(&["uv", "run", "python", "bin/ADE_token_usage.py"]),
            config_tests: argv(&["uv", "run", "python", "tests/test_configurations.py"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub test_timeout_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            test_timeout_secs: 300,
        }
    }
}

/// Locate the config file: project root first, then submodule layouts.
pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    [
        root.join(CONFIG_FILE),
        root.join("agent_env").join(CONFIG_FILE),
        root.join(".agent").join(CONFIG_FILE),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

impl ValidateConfig {
    /// Load the project config, falling back to defaults when none exists.
    pub fn load(root: &Path) -> Result<Self, ValidateError> {
        match find_config_path(root) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                let content = fs::read_to_string(&path)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self, ValidateError> {
        Ok(toml::from_str(content)?)
    }

    /// A language missing from the table counts as enabled.
    pub fn language_enabled(&self, name: &str) -> bool {
        self.languages.get(name).is_none_or(|l| l.enabled)
    }

    pub fn python_enabled(&self) -> bool {
        self.language_enabled("python")
    }

    pub fn typescript_enabled(&self) -> bool {
        self.language_enabled("typescript")
    }

    /// Environment extras of enabled features, in table order.
    pub fn enabled_extras(&self) -> Vec<&str> {
        self.features
            .values()
            .filter(|f| f.enabled)
            .filter_map(|f| f.extra.as_deref())
            .collect()
    }

    /// Markers of disabled features; their tests are deselected.
    pub fn excluded_markers(&self) -> Vec<&str> {
        self.features
            .values()
            .filter(|f| !f.enabled)
            .filter_map(|f| f.marker.as_deref())
            .collect()
    }

    pub fn frontend_detected(&self, root: &Path) -> bool {
        root.join(&self.paths.frontend_dir)
            .join("package.json")
            .is_file()
    }
}

/// Write the template config if the project has none. Returns the path
/// written, or `None` when a config already existed.
pub fn init_config(root: &Path) -> Result<Option<PathBuf>, ValidateError> {
    if find_config_path(root).is_some() {
        return Ok(None);
    }
    let path = root.join(CONFIG_FILE);
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(Some(path))
}
