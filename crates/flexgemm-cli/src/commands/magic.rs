//! `flexgemm magic`: synthesize a bounded fast-division pair.

use anyhow::{Context, Result};
use clap::Args;
use flexgemm_math::MagicDivisor;
use flexgemm_plan::PlanError;
use serde::Serialize;
use tracing::info;

use crate::output::{OutputFormat, emit};

/// Synthesize the multiply/shift pair dividing by DIVISOR over 0..=BOUND.
#[derive(Debug, Clone, Args)]
pub struct MagicCommand {
    /// Divisor
    #[arg(short, long)]
    pub divisor: u32,

    /// Largest dividend (inclusive)
    #[arg(short, long)]
    pub bound: u32,

    /// Check every dividend in 0..=BOUND against integer division
    #[arg(long)]
    pub verify: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct MagicReport {
    divisor: u32,
    bound: u32,
    multiplier: u32,
    shift: u32,
    verified: bool,
}

impl MagicCommand {
    pub fn execute(&self) -> Result<()> {
        let magic = MagicDivisor::synthesize(self.divisor, self.bound)
            .with_context(|| format!("No divisor pair for {} over 0..={}", self.divisor, self.bound))?;

        if self.verify {
            if let Some(dividend) = magic.counterexample(self.divisor, self.bound) {
                return Err(PlanError::DivisorMismatch {
                    divisor: self.divisor,
                    bound: self.bound,
                    dividend,
                    multiplier: magic.multiplier,
                    shift: magic.shift,
                }
                .into());
            }
            info!("Verified {} over {} dividends", magic, u64::from(self.bound) + 1);
        }

        let report = MagicReport {
            divisor: self.divisor,
            bound: self.bound,
            multiplier: magic.multiplier,
            shift: magic.shift,
            verified: self.verify,
        };
        emit(self.format, &report, |r| format!("multiplier={} shift={}\n", r.multiplier, r.shift))
    }
}
