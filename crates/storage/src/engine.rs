//! The engine under test behind the `Store` trait
//!
//! `EngineStore` owns a table and the two standing cursors the harness
//! drives: an overwrite cursor for keyed reads and writes, and an append
//! cursor for column-store inserts.

use std::sync::Arc;

use tracing::{debug, info};

use kvformat_core::{
    BulkSink, CursorRole, FileType, Presence, PutMode, RecordKey, RowNumber, Store, StoreError,
    StoreResult,
};

use crate::cursor::{BulkCursor, Cursor, CursorConfig};
use crate::schema::TableSchema;
use crate::table::Table;

/// In-memory engine with two standing cursors.
#[derive(Debug)]
pub struct EngineStore {
    table: Arc<Table>,
    cursor: Option<Cursor>,
    cursor_insert: Option<Cursor>,
}

impl EngineStore {
    /// Create a table for `schema` and open both standing cursors.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid.
    pub fn open(schema: TableSchema) -> StoreResult<Self> {
        info!(target: "kvformat::engine", descriptor = %schema, "Opening engine table");
        let table = Arc::new(Table::create(schema)?);
        let cursor = Cursor::open(&table, CursorConfig::overwrite());
        let cursor_insert = Cursor::open(&table, CursorConfig::append());
        Ok(EngineStore {
            table,
            cursor: Some(cursor),
            cursor_insert: Some(cursor_insert),
        })
    }

    /// Shared table.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Close the engine.
    ///
    /// # Errors
    ///
    /// `StoreError::CursorsOpen` if cursors are still open on the table.
    pub fn close(mut self) -> StoreResult<()> {
        let open = self.table.open_cursors();
        if open > 0 {
            return Err(StoreError::CursorsOpen(open));
        }
        self.cursor = None;
        self.cursor_insert = None;
        debug!(target: "kvformat::engine", records = self.table.len(), "Engine closed");
        Ok(())
    }

    fn cursor(&mut self, role: CursorRole) -> StoreResult<&mut Cursor> {
        let slot = match role {
            CursorRole::Overwrite => &mut self.cursor,
            CursorRole::Insert => &mut self.cursor_insert,
        };
        slot.as_mut().ok_or_else(|| {
            StoreError::InvalidArgument(format!("{:?} cursor is closed", role).to_lowercase())
        })
    }
}

impl Store for EngineStore {
    fn name(&self) -> &str {
        "engine"
    }

    fn file_type(&self) -> FileType {
        self.table.schema().file_type
    }

    fn get(&mut self, key: &RecordKey) -> StoreResult<Option<Vec<u8>>> {
        self.cursor(CursorRole::Overwrite)?.search(key)
    }

    fn put(&mut self, key: &RecordKey, value: &[u8], mode: PutMode) -> StoreResult<()> {
        self.cursor(CursorRole::Overwrite)?.insert(key, value, mode)
    }

    fn delete(&mut self, key: &RecordKey) -> StoreResult<Presence> {
        self.cursor(CursorRole::Overwrite)?.remove(key)
    }

    fn next(&mut self, role: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        Ok(self.cursor(role)?.next())
    }

    fn prev(&mut self, role: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        Ok(self.cursor(role)?.prev())
    }

    fn reset(&mut self, role: CursorRole) -> StoreResult<()> {
        self.cursor(role)?.reset();
        Ok(())
    }

    fn append(&mut self, value: &[u8]) -> StoreResult<RowNumber> {
        self.cursor(CursorRole::Insert)?.append(value)
    }

    fn bulk(&mut self) -> StoreResult<Box<dyn BulkSink + '_>> {
        Ok(Box::new(BulkCursor::open(&self.table)?))
    }

    fn sync(&mut self) -> StoreResult<()> {
        let open = self.table.open_cursors();
        if open > 0 {
            return Err(StoreError::Busy(format!(
                "sync with {} cursor(s) open",
                open
            )));
        }
        self.table.note_sync();
        debug!(target: "kvformat::engine", generation = self.table.write_generation(), "Synced");
        Ok(())
    }

    fn verify(&mut self) -> StoreResult<()> {
        self.table.verify()
    }

    fn statistics(&self) -> Vec<(String, u64)> {
        self.table.statistics()
    }

    fn close_cursors(&mut self) -> StoreResult<()> {
        self.cursor = None;
        self.cursor_insert = None;
        Ok(())
    }
}
