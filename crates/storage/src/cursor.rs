//! Cursor handles on an engine table
//!
//! A cursor holds the shared table and its own position. Opening one bumps
//! the table's open-cursor count and dropping it releases the count, so a
//! cursor is closed on every exit path.

use std::sync::Arc;

use kvformat_core::{BulkSink, Presence, PutMode, RecordKey, RowNumber, StoreError, StoreResult};

use crate::table::{Position, Table};

/// Behaviour fixed when a cursor is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorConfig {
    /// Inserts may replace existing records
    pub overwrite: bool,
    /// The cursor may append column-store records
    pub append: bool,
}

impl CursorConfig {
    /// Cursor for keyed reads and writes of possibly existing records.
    pub fn overwrite() -> Self {
        CursorConfig {
            overwrite: true,
            append: false,
        }
    }

    /// Cursor for column-store appends.
    pub fn append() -> Self {
        CursorConfig {
            overwrite: false,
            append: true,
        }
    }
}

/// Positioned cursor on a [`Table`].
#[derive(Debug)]
pub struct Cursor {
    table: Arc<Table>,
    config: CursorConfig,
    position: Option<Position>,
}

impl Cursor {
    /// Open a cursor on `table`.
    pub fn open(table: &Arc<Table>, config: CursorConfig) -> Self {
        table.cursor_opened();
        Cursor {
            table: Arc::clone(table),
            config,
            position: None,
        }
    }

    /// Behaviour this cursor was opened with.
    pub fn config(&self) -> CursorConfig {
        self.config
    }

    /// Key the cursor is positioned on, if any.
    pub fn key(&self) -> Option<RecordKey> {
        self.position.as_ref().map(Position::record_key)
    }

    /// Point lookup. A hit positions the cursor on the record; a miss
    /// leaves it unpositioned.
    pub fn search(&mut self, key: &RecordKey) -> StoreResult<Option<Vec<u8>>> {
        let pos = self.table.position_for(key)?;
        let value = self.table.search(&pos);
        self.position = value.as_ref().map(|_| pos);
        Ok(value)
    }

    /// Write `value` at `key` and position the cursor there.
    ///
    /// `PutMode::Upsert` only replaces an existing record on a cursor
    /// opened with `overwrite`; otherwise the write fails with
    /// `StoreError::DuplicateKey`.
    pub fn insert(&mut self, key: &RecordKey, value: &[u8], mode: PutMode) -> StoreResult<()> {
        let pos = self.table.position_for(key)?;
        let overwrite = self.config.overwrite && mode == PutMode::Upsert;
        self.table.insert(&pos, value, overwrite)?;
        self.position = Some(pos);
        Ok(())
    }

    /// Remove the record at `key`. The cursor stays on the removed slot
    /// when the record existed.
    pub fn remove(&mut self, key: &RecordKey) -> StoreResult<Presence> {
        let pos = self.table.position_for(key)?;
        let presence = self.table.remove(&pos)?;
        self.position = presence.is_found().then_some(pos);
        Ok(presence)
    }

    /// Append a column-store record and position the cursor on it.
    pub fn append(&mut self, value: &[u8]) -> StoreResult<RowNumber> {
        if !self.config.append {
            return Err(StoreError::InvalidArgument(
                "cursor was not opened for appends".to_string(),
            ));
        }
        let recno = self.table.append(value)?;
        self.position = Some(Position::Recno(recno));
        Ok(recno)
    }

    /// Step forward. Returns `None` and unpositions the cursor at the end.
    pub fn next(&mut self) -> Option<(RecordKey, Vec<u8>)> {
        let step = self.table.step_next(self.position.as_ref());
        self.settle(step)
    }

    /// Step backward. Returns `None` and unpositions the cursor at the start.
    pub fn prev(&mut self) -> Option<(RecordKey, Vec<u8>)> {
        let step = self.table.step_prev(self.position.as_ref());
        self.settle(step)
    }

    /// Unposition the cursor.
    pub fn reset(&mut self) {
        self.position = None;
    }

    fn settle(&mut self, step: Option<(Position, Vec<u8>)>) -> Option<(RecordKey, Vec<u8>)> {
        match step {
            Some((pos, value)) => {
                let key = pos.record_key();
                self.position = Some(pos);
                Some((key, value))
            }
            None => {
                self.position = None;
                None
            }
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.table.cursor_closed();
    }
}

/// Ordered-load cursor. Opens only on an empty table.
#[derive(Debug)]
pub struct BulkCursor {
    table: Arc<Table>,
    loaded: u64,
}

impl BulkCursor {
    /// Open a bulk cursor.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidArgument` if the table already holds records.
    pub fn open(table: &Arc<Table>) -> StoreResult<Self> {
        if !table.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "bulk load requires an empty table ({} records present)",
                table.len()
            )));
        }
        table.cursor_opened();
        Ok(BulkCursor {
            table: Arc::clone(table),
            loaded: 0,
        })
    }

    /// Records loaded through this cursor.
    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

impl BulkSink for BulkCursor {
    fn append(&mut self, key: Option<&[u8]>, value: &[u8]) -> StoreResult<RowNumber> {
        let recno = self.table.bulk_append(key, value)?;
        self.loaded += 1;
        Ok(recno)
    }
}

impl Drop for BulkCursor {
    fn drop(&mut self) {
        self.table.cursor_closed();
    }
}
