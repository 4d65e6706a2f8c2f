//! flexgemm CLI library
//!
//! Exposes the argument model and command implementations for testing.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
pub mod config;
pub mod exit;
pub mod output;

use commands::{AuxSizeCommand, MagicCommand, PlanCommand};
use config::LogFormat;

/// flexgemm - execution planner for GEMM-lowered convolutions
#[derive(Debug, Parser)]
#[command(name = "flexgemm")]
#[command(about = "Execution planner for GEMM-lowered convolutions")]
#[command(long_about = r#"
Plans convolutions for the flexgemm compute routines: picks the routine,
the tiled problem dimensions, the scratch-buffer sizes and the fast-division
constants the routine needs. Nothing is executed.

Examples:
  # Plan a padded 3x3 forward convolution
  flexgemm plan --in-channels 3 --out-channels 64 --input 32 --kernel 3 --pad 1

  # Same problem, JSON output
  flexgemm plan --in-channels 3 --out-channels 64 --input 32 --kernel 3 --pad 1 --format json

  # Plan from a descriptor file
  flexgemm plan --descriptor layer.json

  # Scratch bytes for a backward-data convolution
  flexgemm aux-size --in-channels 16 --out-channels 128 --input 14 --kernel 5 --pad 1 --direction backward

  # Fast-division pair for 196 over 0..=512
  flexgemm magic --divisor 196 --bound 512 --verify
"#)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum, value_name = "FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Verify every synthesized divisor exhaustively
    #[arg(long, global = true)]
    pub verify_divisors: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build and print the execution plan for a convolution
    Plan(PlanCommand),

    /// Print the scratch bytes a generic routine needs
    #[command(alias = "aux")]
    AuxSize(AuxSizeCommand),

    /// Synthesize a bounded fast-division pair
    Magic(MagicCommand),
}

/// The `flexgemm` clap command.
pub fn build_cli() -> clap::Command {
    Cli::command()
}
