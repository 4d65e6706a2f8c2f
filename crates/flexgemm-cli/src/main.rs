//! flexgemm CLI application
//!
//! Command-line front end for the convolution execution planner.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::error;
use tracing_subscriber::EnvFilter;

use flexgemm_cli::config::{CliConfig, LogFormat};
use flexgemm_cli::exit::code_for;
use flexgemm_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())
        .context("Failed to build configuration")?
        .with_overrides(cli.log_level.as_deref(), cli.log_format, cli.verify_divisors);

    setup_logging(&config)?;

    let result = match &cli.command {
        Some(Commands::Plan(cmd)) => cmd.execute(&config),
        Some(Commands::AuxSize(cmd)) => cmd.execute(),
        Some(Commands::Magic(cmd)) => cmd.execute(),
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        for cause in e.chain().skip(1) {
            error!("  Caused by: {}", cause);
        }
        std::process::exit(code_for(&e));
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn setup_logging(config: &CliConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .with_context(|| format!("Invalid log level '{}'", config.logging.level))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        LogFormat::Compact => {
            subscriber.compact().init();
        }
        LogFormat::Pretty => {
            subscriber.pretty().init();
        }
    }

    Ok(())
}
