//! Planner configuration with environment variable and TOML file support.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Enables exhaustive verification of synthesized divisors.
pub const ENV_VERIFY_DIVISORS: &str = "FLEXGEMM_VERIFY_DIVISORS";
/// Largest bound verification will walk.
pub const ENV_VERIFY_LIMIT: &str = "FLEXGEMM_VERIFY_LIMIT";

/// Knobs for [`crate::Planner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Check every synthesized divisor against integer division before returning a plan.
    pub verify_divisors: bool,
    /// Divisors whose bound exceeds this are not checked.
    pub verify_limit: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { verify_divisors: false, verify_limit: 1 << 20 }
    }
}

/// Keys present in a config file; absent keys leave the current value alone.
#[derive(Debug, Default, Deserialize)]
struct PlannerOverrides {
    verify_divisors: Option<bool>,
    verify_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    planner: PlannerOverrides,
}

/// Layered [`PlannerConfig`] construction. Later layers win.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: PlannerConfig,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `FLEXGEMM_*` environment variables.
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(value) = env::var(ENV_VERIFY_DIVISORS) {
            self.config.verify_divisors = parse_flag(ENV_VERIFY_DIVISORS, &value)?;
        }
        if let Ok(value) = env::var(ENV_VERIFY_LIMIT) {
            self.config.verify_limit = value.trim().parse().map_err(|_| {
                PlanError::Config(format!("{ENV_VERIFY_LIMIT} must be an unsigned integer, got '{value}'"))
            })?;
        }
        Ok(self)
    }

    /// Apply the `[planner]` table of a TOML file.
    pub fn from_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| PlanError::ConfigIo { path: path.to_path_buf(), source })?;
        self.from_toml_str(&content)
    }

    /// Apply the `[planner]` table of TOML text.
    pub fn from_toml_str(mut self, content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        if let Some(verify) = file.planner.verify_divisors {
            self.config.verify_divisors = verify;
        }
        if let Some(limit) = file.planner.verify_limit {
            self.config.verify_limit = limit;
        }
        Ok(self)
    }

    #[must_use]
    pub fn verify_divisors(mut self, enabled: bool) -> Self {
        self.config.verify_divisors = enabled;
        self
    }

    #[must_use]
    pub fn verify_limit(mut self, limit: u32) -> Self {
        self.config.verify_limit = limit;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<PlannerConfig> {
        if self.config.verify_divisors && self.config.verify_limit == 0 {
            return Err(PlanError::Config(
                "verify_limit must be at least 1 when divisor verification is enabled".to_string(),
            ));
        }
        Ok(self.config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(PlanError::Config(format!("{name} must be 1/true or 0/false, got '{value}'"))),
    }
}
