//! Console configuration.
//!
//! Loaded from a TOML file when one is given; every field has a default,
//! so an empty file (or no file) is a valid configuration.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taxonomy_kernel::engine::EnginePolicy;
use taxonomy_kernel::inactive::DEFAULT_RETENTION_DAYS;

/// Upper bound for `retention_days`, a hundred years.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Days an inactive item stays in the bin before it may be purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Recorded as `inactivated_by` when a caller names no actor.
    #[serde(default = "default_actor")]
    pub default_actor: String,

    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// New skills without levels get Beginner..Expert.
    #[serde(default = "default_true")]
    pub seed_default_levels: bool,
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

fn default_actor() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            default_actor: default_actor(),
            log_level: default_log_level(),
            seed_default_levels: default_true(),
        }
    }
}

impl ConsoleConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ConsoleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(ConfigError::Validation(format!(
                "retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, self.retention_days
            )));
        }
        if self.default_actor.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_actor must not be empty".to_string(),
            ));
        }
        tracing::Level::from_str(&self.log_level).map_err(|_| {
            ConfigError::Validation(format!("unknown log_level {:?}", self.log_level))
        })?;
        Ok(())
    }

    /// Clamped to the validated range, so an unvalidated value cannot panic.
    pub fn retention(&self) -> Duration {
        Duration::days(self.retention_days.clamp(1, MAX_RETENTION_DAYS))
    }

    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            seed_default_levels: self.seed_default_levels,
            default_actor: self.default_actor.trim().to_string(),
        }
    }
}
