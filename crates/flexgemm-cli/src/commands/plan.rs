//! `flexgemm plan` and `flexgemm aux-size`.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use flexgemm_plan::{Plan, Planner, RoutineFamily, aux_buffer_size};
use serde::Serialize;
use tracing::info;

use super::descriptor::DescriptorArgs;
use crate::config::CliConfig;
use crate::output::{OutputFormat, emit, render_plan};

/// Which routine family to plan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FamilyArg {
    /// Unit-filter routines when the descriptor qualifies, generic otherwise
    #[default]
    Auto,
    /// Unit-filter routines regardless of kernel geometry
    UnitFilter,
    /// Generic forward/backward-data routines
    Conv,
}

/// Build and print the execution plan for a convolution.
#[derive(Debug, Clone, Args)]
pub struct PlanCommand {
    #[command(flatten)]
    pub descriptor: DescriptorArgs,

    /// Routine family
    #[arg(long, value_enum, default_value_t = FamilyArg::Auto)]
    pub family: FamilyArg,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl PlanCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let desc = self.descriptor.resolve()?;
        let planner = Planner::new(config.planner);

        let plan = match self.family {
            FamilyArg::Auto => planner.plan(&desc),
            FamilyArg::UnitFilter => planner.plan_unit_filter(&desc).map(Plan::UnitFilter),
            FamilyArg::Conv => planner.plan_conv(&desc).map(Plan::Conv),
        }
        .context("Failed to build plan")?;

        info!("Planned {} routine {}", plan.family(), plan.routine_id());
        emit(self.format, &plan, render_plan)
    }
}

/// Print the scratch bytes a generic routine needs.
#[derive(Debug, Clone, Args)]
pub struct AuxSizeCommand {
    #[command(flatten)]
    pub descriptor: DescriptorArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct AuxSize {
    family: RoutineFamily,
    bytes: u64,
}

impl AuxSizeCommand {
    pub fn execute(&self) -> Result<()> {
        let desc = self.descriptor.resolve()?;
        let bytes = aux_buffer_size(&desc).context("Failed to size scratch buffers")?;
        let report = AuxSize { family: RoutineFamily::generic(desc.direction), bytes };
        emit(self.format, &report, |r| format!("{}\n", r.bytes))
    }
}
