use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error(
        "Unknown tier: '{0}' (expected one of screen, fast, frontend, e2e, full, exhaustive)"
    )]
    UnknownTier(String),
    #[error("Environment sync failed: {0}")]
    EnvSyncFailed(String),
    #[error("{phase} failed: {reason}")]
    GateFailed { phase: String, reason: String },
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<toml::de::Error> for ValidateError {
    fn from(err: toml::de::Error) -> Self {
        ValidateError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ValidateError {
    fn from(err: serde_json::Error) -> Self {
        ValidateError::IoError(io::Error::new(io::ErrorKind::InvalidData, err))
    }
}
