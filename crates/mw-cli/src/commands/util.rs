//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use mw_db::Database;

use crate::Config;

/// Opens the cache database, ensuring its parent directory exists.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Parses an explicit "now", or reads the local clock.
///
/// Accepts the same formats as feed timestamps, e.g. `2026-01-15T10:30:00`.
pub fn resolve_now(value: Option<&str>) -> Result<NaiveDateTime> {
    let Some(value) = value else {
        return Ok(Local::now().naive_local());
    };
    mw_core::parse_feed_timestamp(value).ok_or_else(|| {
        anyhow::anyhow!("Invalid datetime: {value}. Use ISO 8601 (e.g., 2026-01-15T10:30:00)")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_now_parses_explicit_value() {
        let now = resolve_now(Some("2026-01-15T10:30:00Z")).unwrap();
        assert_eq!(now.to_string(), "2026-01-15 10:30:00");
    }

    #[test]
    fn resolve_now_rejects_garbage() {
        let err = resolve_now(Some("yesterday")).unwrap_err();
        assert!(err.to_string().contains("Invalid datetime: yesterday"));
    }

    #[test]
    fn open_database_creates_parent_directory() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("nested/dir/cache.db"),
            ..Config::default()
        };
        open_database(&config).unwrap();
        assert!(config.database_path.exists());
    }
}
