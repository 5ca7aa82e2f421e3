//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::load_manifest::LoadManifestArgs;
use crate::commands::run::RunArgs;
use crate::commands::upcoming::UpcomingArgs;

/// Scheduled activity watcher.
///
/// Caches the game manifest and the live milestone schedule, and reports
/// raids, dungeons and grandmaster activities coming up in the next week.
#[derive(Debug, Parser)]
#[command(name = "mw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch everything, update the cache and send the upcoming activities.
    Run(RunArgs),

    /// Populate the catalog from a local manifest database.
    LoadManifest(LoadManifestArgs),

    /// Populate the schedule from a saved milestone feed and print matches.
    Upcoming(UpcomingArgs),

    /// Show cache status.
    Status,

    /// Clear the cache so the next run repopulates it.
    Reset,
}
