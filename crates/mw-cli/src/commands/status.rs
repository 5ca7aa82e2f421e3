//! Status command for showing what the cache holds.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::util;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = util::open_database(config)?;
    let state = db.cache_state()?;

    writeln!(writer, "Milestone watcher status")?;
    writeln!(writer, "Cache: {}", config.database_path.display())?;
    writeln!(
        writer,
        "Catalog: {} ({} activities)",
        describe(state.catalog_populated, state.catalog_populated_at.as_deref()),
        state.catalog_rows
    )?;
    writeln!(
        writer,
        "Schedule: {} ({} occurrences)",
        describe(state.schedule_populated, state.schedule_populated_at.as_deref()),
        state.schedule_rows
    )?;
    Ok(())
}

fn describe(populated: bool, at: Option<&str>) -> String {
    match (populated, at) {
        (true, Some(at)) => format!("populated at {at}"),
        (true, None) => "populated".to_string(),
        (false, _) => "not populated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use mw_core::ScheduledEvent;

    #[test]
    fn status_reports_empty_cache() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("cache.db"),
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&config.database_path.display().to_string(), "[TEMP]/cache.db");
        assert_snapshot!(output, @r"
        Milestone watcher status
        Cache: [TEMP]/cache.db
        Catalog: not populated (0 activities)
        Schedule: not populated (0 occurrences)
        ");
    }

    #[test]
    fn status_reports_populated_schedule() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("cache.db"),
            ..Config::default()
        };
        let event = ScheduledEvent {
            event_id: 5,
            start_time: "2026-10-19T17:00:00Z".to_string(),
            end_time: "2026-10-26T17:00:00Z".to_string(),
            activity_ids: vec![100, 200],
            modifier_id_groups: vec![vec![], vec![1]],
        };
        util::open_database(&config)
            .unwrap()
            .populate_schedule(&[event])
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Catalog: not populated (0 activities)"));
        assert!(output.contains("Schedule: populated at "));
        assert!(output.contains("(2 occurrences)"));
    }
}
