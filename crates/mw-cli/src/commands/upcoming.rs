//! Upcoming command for matching a saved milestone feed against the cache.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::Config;
use crate::commands::util;

#[derive(Debug, Args)]
pub struct UpcomingArgs {
    /// Milestone feed JSON, either the full response or the bare map.
    #[arg(long)]
    pub feed: PathBuf,

    /// Evaluate the window at this time instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &UpcomingArgs, config: &Config) -> Result<()> {
    let now = util::resolve_now(args.now.as_deref())?;
    let body = std::fs::read_to_string(&args.feed)
        .with_context(|| format!("failed to read {}", args.feed.display()))?;
    let milestones = mw_api::parse_milestones(&body)
        .with_context(|| format!("invalid milestone feed {}", args.feed.display()))?;

    let mut db = util::open_database(config)?;
    db.populate_schedule(&mw_core::extract(&milestones))?;
    let matches = db.find_upcoming(&mw_core::live_event_ids(&milestones), now)?;

    let report = mw_core::render_matches(&matches);
    if report.is_empty() {
        writeln!(writer, "No upcoming activities found.")?;
    } else {
        writeln!(writer, "{report}")?;
    }
    Ok(())
}
