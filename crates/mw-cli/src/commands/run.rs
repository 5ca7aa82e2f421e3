//! Run command: the full fetch, cache, match and notify pipeline.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;

use mw_api::Client;
use mw_db::{ManifestFile, PopulateOutcome};

use crate::Config;
use crate::commands::util;
use crate::notify::{CommandNotifier, Notifier, WriterNotifier, sms_recipient};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Phone number to text the report to.
    #[arg(long, requires = "carrier")]
    pub phone: Option<String>,

    /// Carrier email-to-SMS gateway domain (e.g. txt.att.net).
    #[arg(long, requires = "phone")]
    pub carrier: Option<String>,

    /// Print the report instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &RunArgs, config: &Config) -> Result<()> {
    let api_key = config
        .api_key()
        .ok_or_else(|| anyhow::anyhow!("missing API key (set MW_API_KEY or config.toml)"))?;
    let client = Client::new(api_key, config.api_base_url.as_str())
        .context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let mut db = util::open_database(config)?;

    if db.cache_state()?.catalog_populated {
        tracing::debug!("catalog cached, skipping manifest download");
    } else {
        let content_path = runtime
            .block_on(client.manifest_content_path(&config.manifest_index_path))
            .context("failed to fetch manifest index")?;
        let archive = runtime
            .block_on(client.download(&content_path))
            .context("failed to download manifest")?;
        let manifest_path = mw_api::extract_manifest(&archive, &config.manifest_dir)
            .context("failed to extract manifest")?;
        let manifest = ManifestFile::open(&manifest_path)
            .with_context(|| format!("failed to open manifest {}", manifest_path.display()))?;
        let outcome = db.populate_catalog(&manifest)?;
        log_outcome("catalog", outcome);
    }

    let milestones = runtime
        .block_on(client.milestones(&config.milestone_path))
        .context("failed to fetch milestones")?;
    let outcome = db.populate_schedule(&mw_core::extract(&milestones))?;
    log_outcome("schedule", outcome);

    let live = mw_core::live_event_ids(&milestones);
    let matches = db.find_upcoming(&live, Local::now().naive_local())?;
    let report = mw_core::render_matches(&matches);
    if report.is_empty() {
        writeln!(writer, "No upcoming activities found.")?;
        return Ok(());
    }

    let recipient = match (&args.phone, &args.carrier) {
        (Some(phone), Some(carrier)) => Some(sms_recipient(phone, carrier)),
        _ => config.recipient.clone(),
    };
    match recipient {
        Some(recipient) if !args.dry_run => {
            CommandNotifier::new(config.notify_command.as_str(), recipient).send(&report)?;
            writeln!(writer, "Sent {} upcoming activities.", matches.len())?;
        }
        _ => WriterNotifier::new(writer).send(&report)?,
    }
    Ok(())
}

fn log_outcome(table: &str, outcome: PopulateOutcome) {
    match outcome {
        PopulateOutcome::Populated { inserted, skipped } => {
            tracing::info!(table, inserted, skipped, "cache populated");
        }
        PopulateOutcome::AlreadyPopulated => {
            tracing::debug!(table, "cache already populated");
        }
    }
}
