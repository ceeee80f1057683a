//! Tier selection: maps a tier name plus CLI flags to an immutable [`RunConfig`].
//!
//! The tier table is the contract every phase gate reads from. Flags layer
//! on top of the tier defaults; `resolve` is a pure function.

use crate::core::error::ValidateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Screen,
    Fast,
    Frontend,
    E2e,
    Full,
    Exhaustive,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Screen,
        Tier::Fast,
        Tier::Frontend,
        Tier::E2e,
        Tier::Full,
        Tier::Exhaustive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Screen => "screen",
            Tier::Fast => "fast",
            Tier::Frontend => "frontend",
            Tier::E2e => "e2e",
            Tier::Full => "full",
            Tier::Exhaustive => "exhaustive",
        }
    }

    pub fn defaults(&self) -> TierDefaults {
        match self {
            Tier::Screen => TierDefaults {
                include_e2e: false,
                auto_fix: false,
                selection: TestSelection::None,
                coverage: false,
                parallel: false,
            },
            Tier::Fast => TierDefaults {
                include_e2e: false,
                auto_fix: true,
                selection: TestSelection::ChangedOnly,
                coverage: false,
                parallel: false,
            },
            Tier::Frontend => TierDefaults {
                include_e2e: false,
                auto_fix: true,
                selection: TestSelection::FrontendUnit,
                coverage: false,
                parallel: false,
            },
            Tier::E2e => TierDefaults {
                include_e2e: true,
                auto_fix: true,
                selection: TestSelection::E2eOnly,
                coverage: false,
                parallel: false,
            },
            Tier::Full => TierDefaults {
                include_e2e: true,
                auto_fix: true,
                selection: TestSelection::AllSuites,
                coverage: true,
                parallel: false,
            },
            Tier::Exhaustive => TierDefaults {
                include_e2e: true,
                auto_fix: true,
                selection: TestSelection::AllSuites,
                coverage: true,
                parallel: true,
            },
        }
    }

    /// Health check and smoke test run for every tier except these.
    pub fn runs_health_gates(&self) -> bool {
        !matches!(self, Tier::E2e | Tier::Exhaustive | Tier::Frontend)
    }

    pub fn runs_backend_tests(&self) -> bool {
        !matches!(
            self,
            Tier::Screen | Tier::E2e | Tier::Exhaustive | Tier::Frontend
        )
    }

    pub fn runs_frontend_tests(&self) -> bool {
        !matches!(self, Tier::Screen | Tier::E2e | Tier::Exhaustive)
    }

    pub fn runs_static_analysis(&self) -> bool {
        !matches!(self, Tier::Fast | Tier::Screen | Tier::E2e | Tier::Frontend)
    }

    pub fn runs_subsystems(&self) -> bool {
        matches!(self, Tier::Full | Tier::Exhaustive)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidateError::UnknownTier(s.to_string()))
    }
}

/// Which tests a tier asks the suites to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSelection {
    /// Health and smoke gates only.
    None,
    /// Tests affected by changed code, backed by the incremental cache.
    ChangedOnly,
    FrontendUnit,
    E2eOnly,
    AllSuites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDefaults {
    pub include_e2e: bool,
    pub auto_fix: bool,
    pub selection: TestSelection,
    pub coverage: bool,
    pub parallel: bool,
}

/// Independent CLI switches layered over the tier defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    pub live: bool,
    pub parallel: bool,
    pub verbose: bool,
    pub no_fix: bool,
    pub skip_e2e: bool,
    pub update_snapshots: bool,
    pub e2e_select: Option<String>,
    pub config_tests: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    pub tier: Tier,
    pub include_live: bool,
    pub include_e2e: bool,
    pub skip_auto_fix: bool,
    pub parallel: bool,
    pub verbose: bool,
    pub e2e_filter: Option<String>,
    pub update_snapshots: bool,
    pub run_config_tests: bool,
    pub coverage: bool,
    pub selection: TestSelection,
}

impl RunConfig {
    pub fn auto_fix_enabled(&self) -> bool {
        !self.skip_auto_fix && self.tier.defaults().auto_fix
    }

    /// A scenario filter short-circuits the pipeline to health check + E2E + summary.
    pub fn fast_path(&self) -> bool {
        self.e2e_filter.is_some()
    }
}

/// Resolve a tier name and flags into the run configuration.
///
/// `--skip-e2e` overrides a tier that includes E2E by default; a scenario
/// filter forces E2E on regardless of tier. The CLI makes the two mutually
/// overriding, so at most one of them reaches this function.
pub fn resolve(tier_name: &str, flags: &Flags) -> Result<RunConfig, ValidateError> {
    let tier: Tier = tier_name.trim().to_ascii_lowercase().parse()?;
    let defaults = tier.defaults();

    let e2e_filter = flags
        .e2e_select
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let include_e2e = if e2e_filter.is_some() {
        true
    } else if flags.skip_e2e {
        false
    } else {
        defaults.include_e2e
    };

    Ok(RunConfig {
        tier,
        include_live: flags.live,
        include_e2e,
        skip_auto_fix: flags.no_fix,
        parallel: defaults.parallel || flags.parallel,
        verbose: flags.verbose,
        e2e_filter,
        update_snapshots: flags.update_snapshots,
        run_config_tests: flags.config_tests,
        coverage: defaults.coverage,
        selection: defaults.selection,
    })
}
