//! Planner error types.

use std::path::PathBuf;

use flexgemm_math::DivisorError;
use thiserror::Error;

/// Errors produced while building a plan or loading planner configuration.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("fast-division synthesis failed for {context}")]
    Divisor {
        context: &'static str,
        #[source]
        source: DivisorError,
    },

    #[error(
        "divisor pair (m={multiplier}, s={shift}) for {divisor} disagrees with integer division at {dividend} (bound {bound})"
    )]
    DivisorMismatch { divisor: u32, bound: u32, dividend: u32, multiplier: u32, shift: u32 },

    #[error("{quantity} overflows 32 bits")]
    Overflow { quantity: &'static str },

    #[error("{quantity} {value} does not fit its packed lane (max {max})")]
    LaneOverflow { quantity: &'static str, value: u32, max: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl PlanError {
    /// `true` when the failure came from fast-division synthesis or verification.
    #[must_use]
    pub fn is_divisor_failure(&self) -> bool {
        matches!(self, Self::Divisor { .. } | Self::DivisorMismatch { .. })
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, PlanError>;
