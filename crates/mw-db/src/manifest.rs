//! Sources of raw catalog definitions.

use std::path::Path;

use mw_core::{DefinitionTable, RawDefinition};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params};

use crate::DbError;

/// Number of definitions read per page.
pub const BATCH_SIZE: usize = 50;

/// Something the catalog can be populated from, read page by page.
pub trait CatalogSource {
    /// Returns up to `limit` rows of `table` starting at `offset`, in a
    /// stable order. An empty page ends the table.
    fn page(
        &self,
        table: DefinitionTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawDefinition>, DbError>;
}

/// Feeds every row of `table` to `f`, [`BATCH_SIZE`] rows at a time.
pub(crate) fn for_each_batch<S, F>(
    source: &S,
    table: DefinitionTable,
    mut f: F,
) -> Result<(), DbError>
where
    S: CatalogSource + ?Sized,
    F: FnMut(&[RawDefinition]) -> Result<(), DbError>,
{
    let mut offset = 0;
    loop {
        let batch = source.page(table, offset, BATCH_SIZE)?;
        if batch.is_empty() {
            return Ok(());
        }
        tracing::debug!(%table, offset, rows = batch.len(), "read definition batch");
        f(&batch)?;
        if batch.len() < BATCH_SIZE {
            return Ok(());
        }
        offset += batch.len();
    }
}

/// A downloaded manifest database, opened read-only.
pub struct ManifestFile {
    conn: Connection,
}

impl ManifestFile {
    /// Opens a manifest and checks that every definition table is present.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        for table in DefinitionTable::all() {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
                [table.table_name()],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(DbError::MissingManifestTable {
                    table: table.table_name(),
                });
            }
        }
        Ok(Self { conn })
    }
}

impl CatalogSource for ManifestFile {
    fn page(
        &self,
        table: DefinitionTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawDefinition>, DbError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT id, json FROM {} ORDER BY id ASC LIMIT ? OFFSET ?",
            table.table_name()
        ))?;
        let rows = stmt.query_map(params![to_sql_count(limit), to_sql_count(offset)], |row| {
            let id: i64 = row.get(0)?;
            let json = match row.get_ref(1)? {
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    String::from_utf8_lossy(bytes).into_owned()
                }
                _ => String::new(),
            };
            Ok(RawDefinition { id, json })
        })?;
        let mut definitions = Vec::new();
        for row in rows {
            definitions.push(row?);
        }
        Ok(definitions)
    }
}

fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// An in-memory catalog, mainly for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct RawCatalog {
    pub destinations: Vec<RawDefinition>,
    pub modifiers: Vec<RawDefinition>,
    pub activities: Vec<RawDefinition>,
}

impl RawCatalog {
    fn table(&self, table: DefinitionTable) -> &[RawDefinition] {
        match table {
            DefinitionTable::Destination => &self.destinations,
            DefinitionTable::ActivityModifier => &self.modifiers,
            DefinitionTable::Activity => &self.activities,
        }
    }
}

impl CatalogSource for RawCatalog {
    fn page(
        &self,
        table: DefinitionTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawDefinition>, DbError> {
        Ok(self
            .table(table)
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
