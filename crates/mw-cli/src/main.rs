use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mw_cli::commands::{load_manifest, reset, run, status, upcoming};
use mw_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Run(args)) => {
            let config = load_config(cli.config.as_deref())?;
            run::run(&mut stdout, args, &config)?;
        }
        Some(Commands::LoadManifest(args)) => {
            let config = load_config(cli.config.as_deref())?;
            load_manifest::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Upcoming(args)) => {
            let config = load_config(cli.config.as_deref())?;
            upcoming::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut stdout, &config)?;
        }
        Some(Commands::Reset) => {
            let config = load_config(cli.config.as_deref())?;
            reset::run(&mut stdout, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
