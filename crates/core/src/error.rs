//! Error types for the harness and the stores it drives
//!
//! Two layers, both built with `thiserror`:
//! - `StoreError`: failures returned by a store (engine or reference).
//!   A missing record is never a `StoreError`; stores report it as
//!   `Option::None` or `Presence::NotFound`.
//! - `Error`: fatal run failures. Every variant names the operation and,
//!   where known, the row and the side that produced the unexpected state.

use std::io;

use thiserror::Error;

use crate::types::{RowNumber, Side};

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned by a store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The resource is in use (e.g. sync while cursors are open)
    #[error("resource busy: {0}")]
    Busy(String),

    /// Insert of a key that already exists
    #[error("duplicate key")]
    DuplicateKey,

    /// Bulk load received a key that does not extend the table in order
    #[error("bulk load out of order: {0}")]
    OutOfOrder(String),

    /// A row-store key was used against a column-store or vice versa
    #[error("wrong key kind: expected a {expected} key")]
    WrongKeyKind {
        /// Kind the table is keyed by
        expected: &'static str,
    },

    /// The operation does not exist for this table shape
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Invalid argument or schema
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal inconsistency detected by verify
    #[error("data corruption: {0}")]
    Corruption(String),

    /// The store was closed with cursors still open
    #[error("{0} cursor(s) still open")]
    CursorsOpen(usize),
}

/// Fatal run failures
#[derive(Debug, Error)]
pub enum Error {
    /// A store returned an error other than not-found
    #[error("{op}:{} {side}: {source}", row_tag(.row))]
    Engine {
        /// Operation label
        op: &'static str,
        /// Target row, when known
        row: Option<RowNumber>,
        /// Store that failed
        side: Side,
        /// Error text from the store
        source: StoreError,
    },

    /// One store found the record, the other did not
    #[error("{op}:{} not found in {}, found in {found_in}", row_tag(.row), .found_in.other())]
    Presence {
        /// Operation label
        op: &'static str,
        /// Target row, when known
        row: Option<RowNumber>,
        /// Store that reported the record
        found_in: Side,
    },

    /// Values differ
    #[error("{op}:{} value mismatch:\n{reference}\n{engine}", row_tag(.row))]
    ValueMismatch {
        /// Operation label
        op: &'static str,
        /// Target row, when known
        row: Option<RowNumber>,
        /// Dump of the reference value
        reference: String,
        /// Dump of the engine value
        engine: String,
    },

    /// Keys differ during traversal
    #[error("{op}: key mismatch:\n{reference}\n{engine}")]
    KeyMismatch {
        /// Operation label
        op: &'static str,
        /// Dump of the reference key
        reference: String,
        /// Dump of the engine key
        engine: String,
    },

    /// An append did not create a row beyond the current row count
    #[error("append: inserted row {assigned} did not create a new row (row count {rows})")]
    AppendNotNew {
        /// Row number assigned by the engine
        assigned: RowNumber,
        /// Row count before the append
        rows: RowNumber,
    },

    /// The two stores assigned different row numbers to the same append
    #[error("append: engine assigned row {engine}, reference store assigned row {reference}")]
    AppendDiverged {
        /// Row number assigned by the engine
        engine: RowNumber,
        /// Row number assigned by the reference store
        reference: RowNumber,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (configuration and log files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap a store error with the operation, row and side it came from.
    pub fn engine(
        op: &'static str,
        row: Option<RowNumber>,
        side: Side,
        source: StoreError,
    ) -> Self {
        Error::Engine {
            op,
            row,
            side,
            source,
        }
    }

    /// True for disagreements between the two stores, as opposed to store
    /// failures or setup problems.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Presence { .. }
                | Error::ValueMismatch { .. }
                | Error::KeyMismatch { .. }
                | Error::AppendDiverged { .. }
        )
    }
}

fn row_tag(row: &Option<RowNumber>) -> String {
    match row {
        Some(r) => format!(" row {}:", r),
        None => String::new(),
    }
}
