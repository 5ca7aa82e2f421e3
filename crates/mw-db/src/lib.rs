//! Storage layer for the milestone watcher.
//!
//! Caches the normalized reference catalog and the live schedule in a local
//! `rusqlite` database, and answers the upcoming-activity query by joining
//! the two.
//!
//! # Population
//!
//! Both tables are filled once per cache lifetime. Whether that has happened
//! is recorded in the single-row `cache_state` table, which is updated in the
//! same `IMMEDIATE` transaction as the bulk insert, so two overlapping runs
//! cannot both populate. A table that already has rows (for example from a
//! cache written before `cache_state` existed) also counts as populated.
//! Only an explicit [`Database::reset`] clears the cache.
//!
//! # Schema
//!
//! Sequences (`modifier_ids`, `modifier_names`) are stored as JSON arrays in
//! TEXT columns. `updated_at` values are ISO 8601 UTC. Feed timestamps in
//! `schedule.start_time` / `schedule.end_time` are stored verbatim.
//!
//! `schedule.activity_id` refers to `catalog.activity_id` but is not a
//! declared foreign key: rows without a catalog match simply drop out of the
//! join.

mod manifest;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use mw_core::{
    CatalogEntry, CatalogLookup, Definition, DefinitionTable, MatchRecord, ScheduledActivity,
    ScheduledEvent, UpcomingWindow, match_activities,
};
use rusqlite::{
    Connection, OptionalExtension, Transaction, TransactionBehavior, params, params_from_iter,
};
use thiserror::Error;

pub use manifest::{BATCH_SIZE, CatalogSource, ManifestFile, RawCatalog};

/// Version of the `cache_state` record layout.
pub const CACHE_STATE_VERSION: i64 = 1;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The manifest is missing one of the definition tables.
    #[error("manifest is missing table {table}")]
    MissingManifestTable { table: &'static str },
}

/// Database connection wrapper.
///
/// The wrapped `rusqlite::Connection` is `Send` but not `Sync`; give each
/// thread its own `Database`.
pub struct Database {
    conn: Connection,
}

/// Result of a populate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Rows were written. `skipped` counts source records that were dropped
    /// (blank catalog rows, malformed schedule events).
    Populated { inserted: usize, skipped: usize },
    /// The table was already populated; nothing was read or written.
    AlreadyPopulated,
}

/// Snapshot of the cache for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheState {
    pub version: i64,
    pub catalog_populated: bool,
    pub catalog_populated_at: Option<String>,
    pub catalog_rows: usize,
    pub schedule_populated: bool,
    pub schedule_populated_at: Option<String>,
    pub schedule_rows: usize,
}

#[derive(Debug, Clone, Copy)]
enum CacheTable {
    Catalog,
    Schedule,
}

impl CacheTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Schedule => "schedule",
        }
    }

    const fn flag_column(self) -> &'static str {
        match self {
            Self::Catalog => "catalog_populated",
            Self::Schedule => "schedule_populated",
        }
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS catalog (
                activity_id INTEGER PRIMARY KEY,
                activity_name TEXT NOT NULL,
                destination_id INTEGER NOT NULL,
                destination_name TEXT NOT NULL,
                original_name TEXT NOT NULL,
                modifier_ids TEXT NOT NULL,
                modifier_names TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- One row per event x activity x modifier set.
            -- start_time / end_time: verbatim feed timestamps
            CREATE TABLE IF NOT EXISTS schedule (
                event_id INTEGER NOT NULL,
                activity_id INTEGER NOT NULL,
                modifier_ids TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (event_id, activity_id, modifier_ids)
            );

            CREATE INDEX IF NOT EXISTS idx_schedule_activity ON schedule(activity_id);

            CREATE TABLE IF NOT EXISTS cache_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                catalog_populated INTEGER NOT NULL DEFAULT 0,
                catalog_populated_at TEXT,
                schedule_populated INTEGER NOT NULL DEFAULT 0,
                schedule_populated_at TEXT
            );
            ",
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO cache_state (id, version) VALUES (1, ?)",
            [CACHE_STATE_VERSION],
        )?;
        Ok(())
    }

    /// Returns the populated flags and row counts.
    pub fn cache_state(&self) -> Result<CacheState, DbError> {
        let mut state = self.conn.query_row(
            "
            SELECT version, catalog_populated, catalog_populated_at,
                   schedule_populated, schedule_populated_at
            FROM cache_state
            WHERE id = 1
            ",
            [],
            |row| {
                Ok(CacheState {
                    version: row.get(0)?,
                    catalog_populated: row.get(1)?,
                    catalog_populated_at: row.get(2)?,
                    catalog_rows: 0,
                    schedule_populated: row.get(3)?,
                    schedule_populated_at: row.get(4)?,
                    schedule_rows: 0,
                })
            },
        )?;
        state.catalog_rows = count_rows(&self.conn, CacheTable::Catalog)?;
        state.schedule_rows = count_rows(&self.conn, CacheTable::Schedule)?;
        state.catalog_populated |= state.catalog_rows > 0;
        state.schedule_populated |= state.schedule_rows > 0;
        Ok(state)
    }

    /// Normalizes the reference catalog into the `catalog` table.
    ///
    /// Does nothing if the catalog is already populated.
    pub fn populate_catalog<S>(&mut self, source: &S) -> Result<PopulateOutcome, DbError>
    where
        S: CatalogSource + ?Sized,
    {
        self.populate_catalog_at(source, Utc::now())
    }

    fn populate_catalog_at<S>(
        &mut self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<PopulateOutcome, DbError>
    where
        S: CatalogSource + ?Sized,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if is_populated(&tx, CacheTable::Catalog)? {
            tracing::info!("catalog already populated");
            return Ok(PopulateOutcome::AlreadyPopulated);
        }

        let mut lookup = CatalogLookup::new();
        manifest::for_each_batch(source, DefinitionTable::Destination, |batch| {
            for raw in batch {
                lookup.add_destination(&Definition::decode(raw));
            }
            Ok(())
        })?;
        manifest::for_each_batch(source, DefinitionTable::ActivityModifier, |batch| {
            for raw in batch {
                lookup.add_modifier(&Definition::decode(raw));
            }
            Ok(())
        })?;
        tracing::debug!(
            destinations = lookup.destination_count(),
            modifiers = lookup.modifier_count(),
            "built catalog lookups"
        );

        let updated_at = format_timestamp(now);
        let mut inserted = 0;
        let mut skipped = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO catalog
                (activity_id, activity_name, destination_id, destination_name, original_name,
                 modifier_ids, modifier_names, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            manifest::for_each_batch(source, DefinitionTable::Activity, |batch| {
                for raw in batch {
                    let Some(entry) = lookup.resolve(&Definition::decode(raw)) else {
                        skipped += 1;
                        continue;
                    };
                    inserted += stmt.execute(params![
                        entry.activity_id,
                        entry.activity_name,
                        entry.destination_id,
                        entry.destination_name,
                        entry.original_name,
                        encode_ids(&entry.modifier_ids),
                        encode_names(&entry.modifier_names),
                        updated_at,
                    ])?;
                }
                Ok(())
            })?;
        }
        mark_populated(&tx, CacheTable::Catalog, &updated_at)?;
        tx.commit()?;

        tracing::info!(inserted, skipped, "populated catalog");
        Ok(PopulateOutcome::Populated { inserted, skipped })
    }

    /// Stores the extracted schedule, one row per activity occurrence.
    ///
    /// Does nothing if the schedule is already populated, even when `events`
    /// differs from what was stored. Events whose activity and modifier
    /// arrays disagree in length are skipped.
    pub fn populate_schedule(
        &mut self,
        events: &[ScheduledEvent],
    ) -> Result<PopulateOutcome, DbError> {
        self.populate_schedule_at(events, Utc::now())
    }

    fn populate_schedule_at(
        &mut self,
        events: &[ScheduledEvent],
        now: DateTime<Utc>,
    ) -> Result<PopulateOutcome, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if is_populated(&tx, CacheTable::Schedule)? {
            tracing::info!("schedule already populated");
            return Ok(PopulateOutcome::AlreadyPopulated);
        }

        let updated_at = format_timestamp(now);
        let mut inserted = 0;
        let mut skipped = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO schedule
                (event_id, activity_id, modifier_ids, start_time, end_time, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for event in events {
                let entries = match event.entries() {
                    Ok(entries) => entries,
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping malformed event");
                        skipped += 1;
                        continue;
                    }
                };
                for entry in entries {
                    inserted += stmt.execute(params![
                        entry.event_id,
                        entry.activity_id,
                        encode_ids(&entry.modifier_ids),
                        entry.start_time,
                        entry.end_time,
                        updated_at,
                    ])?;
                }
            }
        }
        mark_populated(&tx, CacheTable::Schedule, &updated_at)?;
        tx.commit()?;

        tracing::info!(inserted, skipped, "populated schedule");
        Ok(PopulateOutcome::Populated { inserted, skipped })
    }

    /// Lists scheduled occurrences of the given events joined with their
    /// catalog entries, in insertion order.
    pub fn scheduled_activities(
        &self,
        event_ids: &BTreeSet<i64>,
    ) -> Result<Vec<ScheduledActivity>, DbError> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; event_ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT s.event_id, c.activity_name, c.destination_name, c.modifier_names,
                   s.start_time, s.end_time
            FROM schedule s
            JOIN catalog c ON c.activity_id = s.activity_id
            WHERE s.event_id IN ({placeholders})
            ORDER BY s.rowid ASC
            "
        ))?;
        let rows = stmt.query_map(params_from_iter(event_ids.iter()), |row| {
            let modifier_names: String = row.get(3)?;
            Ok(ScheduledActivity {
                event_id: row.get(0)?,
                activity_name: row.get(1)?,
                destination_name: row.get(2)?,
                modifier_names: decode_names(&modifier_names),
                start_time: row.get(4)?,
                end_time: row.get(5)?,
            })
        })?;
        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Finds classified activities of the live events that fall inside the
    /// rolling window anchored at `now`.
    pub fn find_upcoming(
        &self,
        event_ids: &BTreeSet<i64>,
        now: NaiveDateTime,
    ) -> Result<Vec<MatchRecord>, DbError> {
        let window = UpcomingWindow::at(now);
        let activities = self.scheduled_activities(event_ids)?;
        let considered = activities.len();
        let matches = match_activities(activities, &window);
        tracing::debug!(considered, matched = matches.len(), "matched upcoming activities");
        Ok(matches)
    }

    /// Looks up one catalog entry by activity id.
    pub fn catalog_entry(&self, activity_id: i64) -> Result<Option<CatalogEntry>, DbError> {
        let entry = self
            .conn
            .query_row(
                "
                SELECT activity_id, activity_name, destination_id, destination_name,
                       original_name, modifier_ids, modifier_names
                FROM catalog
                WHERE activity_id = ?
                ",
                [activity_id],
                |row| {
                    let modifier_ids: String = row.get(5)?;
                    let modifier_names: String = row.get(6)?;
                    Ok(CatalogEntry {
                        activity_id: row.get(0)?,
                        activity_name: row.get(1)?,
                        destination_id: row.get(2)?,
                        destination_name: row.get(3)?,
                        original_name: row.get(4)?,
                        modifier_ids: decode_ids(&modifier_ids),
                        modifier_names: decode_names(&modifier_names),
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Clears the cache so the next run repopulates both tables.
    pub fn reset(&mut self) -> Result<(), DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "
            DELETE FROM schedule;
            DELETE FROM catalog;
            UPDATE cache_state
            SET catalog_populated = 0, catalog_populated_at = NULL,
                schedule_populated = 0, schedule_populated_at = NULL
            WHERE id = 1;
            ",
        )?;
        tx.commit()?;
        tracing::info!("cache reset");
        Ok(())
    }
}

fn is_populated(tx: &Transaction<'_>, table: CacheTable) -> Result<bool, DbError> {
    let flagged: bool = tx.query_row(
        &format!("SELECT {} FROM cache_state WHERE id = 1", table.flag_column()),
        [],
        |row| row.get(0),
    )?;
    Ok(flagged || count_rows(tx, table)? > 0)
}

fn mark_populated(tx: &Transaction<'_>, table: CacheTable, at: &str) -> Result<(), DbError> {
    let flag = table.flag_column();
    tx.execute(
        &format!("UPDATE cache_state SET {flag} = 1, {flag}_at = ?, version = ? WHERE id = 1"),
        params![at, CACHE_STATE_VERSION],
    )?;
    Ok(())
}

fn count_rows(conn: &Connection, table: CacheTable) -> Result<usize, DbError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.name()),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn encode_ids(ids: &[i64]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn encode_names(names: &[String]) -> String {
    serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string())
}

fn decode_ids(value: &str) -> Vec<i64> {
    serde_json::from_str(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "unreadable modifier id list");
        Vec::new()
    })
}

fn decode_names(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "unreadable modifier name list");
        Vec::new()
    })
}
