//! CLI configuration: planner knobs plus logging, loaded from TOML and overridden by flags.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use flexgemm_plan::{ConfigBuilder, PlanError, PlannerConfig};
use serde::{Deserialize, Serialize};

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::default() }
    }
}

/// Everything the `flexgemm` binary reads from its config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub planner: PlannerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingFile {
    #[serde(default)]
    logging: LoggingConfig,
}

impl CliConfig {
    /// Load from the environment and, when given, a TOML file.
    ///
    /// Planner settings layer `FLEXGEMM_*` variables under the file's
    /// `[planner]` table; logging comes from the file's `[logging]` table.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::new().from_env().context("Invalid planner environment")?;
        let mut logging = LoggingConfig::default();

        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .map_err(|source| PlanError::ConfigIo { path: path.to_path_buf(), source })?;
            builder = builder
                .from_toml_str(&content)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            let file: LoggingFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse [logging] in {}", path.display()))?;
            logging = file.logging;
        }

        let planner = builder.build().context("Invalid planner configuration")?;
        Ok(Self { planner, logging })
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(
        mut self,
        log_level: Option<&str>,
        log_format: Option<LogFormat>,
        verify_divisors: bool,
    ) -> Self {
        if let Some(level) = log_level {
            self.logging.level = level.to_string();
        }
        if let Some(format) = log_format {
            self.logging.format = format;
        }
        if verify_divisors {
            self.planner.verify_divisors = true;
        }
        self
    }
}
