//! Load-manifest command for populating the catalog from a local file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mw_db::{ManifestFile, PopulateOutcome};

use crate::Config;
use crate::commands::util;

#[derive(Debug, Args)]
pub struct LoadManifestArgs {
    /// Path to an extracted manifest database.
    pub path: PathBuf,
}

pub fn run<W: Write>(writer: &mut W, args: &LoadManifestArgs, config: &Config) -> Result<()> {
    let manifest = ManifestFile::open(&args.path)
        .with_context(|| format!("failed to open manifest {}", args.path.display()))?;
    let mut db = util::open_database(config)?;

    match db.populate_catalog(&manifest)? {
        PopulateOutcome::Populated { inserted, skipped } => {
            writeln!(
                writer,
                "Catalog populated: {inserted} activities ({skipped} blank rows skipped)"
            )?;
        }
        PopulateOutcome::AlreadyPopulated => {
            writeln!(writer, "Catalog already populated.")?;
        }
    }
    Ok(())
}
