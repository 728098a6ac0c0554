//! Store abstraction shared by the engine under test and the reference store
//!
//! The harness drives both stores through this one trait, so every
//! comparison sees results of the same shape. A missing record is a normal
//! outcome (`None` / `Presence::NotFound`), never an error.

use crate::error::StoreResult;
use crate::types::{CursorRole, FileType, Presence, PutMode, RecordKey, RowNumber};

/// A key/value store with two standing cursors.
///
/// Keyed operations (`get`, `put`, `delete`) run on the
/// [`CursorRole::Overwrite`] cursor and leave it positioned on the key they
/// touched; `append` runs on the [`CursorRole::Insert`] cursor and leaves it
/// on the new record. `next`/`prev` move the chosen cursor from that
/// position; an unpositioned cursor starts from the first/last record.
pub trait Store {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Schema variant of the table.
    fn file_type(&self) -> FileType;

    /// Point read. Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn get(&mut self, key: &RecordKey) -> StoreResult<Option<Vec<u8>>>;

    /// Point write.
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateKey` for `PutMode::Insert` on an existing key,
    /// or any other store failure.
    fn put(&mut self, key: &RecordKey, value: &[u8], mode: PutMode) -> StoreResult<()>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn delete(&mut self, key: &RecordKey) -> StoreResult<Presence>;

    /// Step `cursor` forward. `None` means the end of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn next(&mut self, cursor: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>>;

    /// Step `cursor` backward. `None` means the start of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn prev(&mut self, cursor: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>>;

    /// Unposition `cursor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor has been closed.
    fn reset(&mut self, cursor: CursorRole) -> StoreResult<()>;

    /// Append a column-store record, returning its assigned record number.
    /// The number exceeds every record number the table has assigned.
    ///
    /// # Errors
    ///
    /// `StoreError::Unsupported` for row-stores, or any other store failure.
    fn append(&mut self, value: &[u8]) -> StoreResult<RowNumber>;

    /// Open an ordered-load cursor on an empty table.
    ///
    /// The cursor is closed when the returned sink is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is not empty.
    fn bulk(&mut self) -> StoreResult<Box<dyn BulkSink + '_>>;

    /// Flush the table.
    ///
    /// # Errors
    ///
    /// `StoreError::Busy` while cursors are open.
    fn sync(&mut self) -> StoreResult<()>;

    /// Check the table's internal invariants.
    ///
    /// # Errors
    ///
    /// `StoreError::Corruption` describing the first violation found.
    fn verify(&mut self) -> StoreResult<()>;

    /// Named counters describing the table and the work done on it.
    fn statistics(&self) -> Vec<(String, u64)>;

    /// Close both standing cursors. Further cursor use is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a cursor fails to close.
    fn close_cursors(&mut self) -> StoreResult<()>;
}

/// Ordered-load cursor.
pub trait BulkSink {
    /// Append the next record. Row-stores pass the key, which must sort
    /// after every key loaded so far; column-stores pass `None` and receive
    /// the next record number.
    ///
    /// # Errors
    ///
    /// `StoreError::OutOfOrder` if the key does not extend the table.
    fn append(&mut self, key: Option<&[u8]>, value: &[u8]) -> StoreResult<RowNumber>;
}
