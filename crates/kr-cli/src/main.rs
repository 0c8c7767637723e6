use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use kr_cli::commands::{palettes, report};
use kr_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    anyhow::ensure!(config.bar_width > 0, "bar_width must be at least 1");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Logs go to stderr so stdout stays a clean report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Report(args)) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(args, &config)?;
        }
        Some(Commands::Palettes { no_color }) => {
            let config = load_config(cli.config.as_deref())?;
            palettes::run(&config, *no_color)?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
