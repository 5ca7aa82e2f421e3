//! Reset command for clearing the cache.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::util;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let mut db = util::open_database(config)?;
    db.reset()?;
    writeln!(writer, "Cache cleared: {}", config.database_path.display())?;
    Ok(())
}
