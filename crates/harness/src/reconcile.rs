//! Not-found reconciliation and result comparison
//!
//! Every result pair from the two stores passes through here before the
//! driver moves on. Outcomes:
//! - both stores found the record: compare the bytes
//! - neither found it: the row is absent, nothing to compare
//! - only the reference store found it: fatal, except for a fixed-length
//!   row past every written row, where the engine's not-found stands for
//!   the zero value
//! - only the engine found it: fatal

use kvformat_core::dump::{stream_item, stream_key};
use kvformat_core::{Error, FileType, RecordKey, Result, RowNumber, Side, StoreError, StoreResult};

/// Result of reconciling not-found status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Both sides hold the record; compare them
    Continue,
    /// Neither side holds the record
    AbsentRow,
}

/// Reconcile point-read results.
///
/// `zero_fill` is the value the engine's not-found stands for, when the
/// row qualifies (see `RunContext::zero_fill`). When it applies, `engine`
/// is replaced by it.
pub fn reconcile(
    op: &'static str,
    row: Option<RowNumber>,
    engine: &mut Option<Vec<u8>>,
    reference_found: bool,
    zero_fill: Option<Vec<u8>>,
) -> Result<Reconciled> {
    match (engine.is_some(), reference_found) {
        (true, true) => Ok(Reconciled::Continue),
        (false, false) => Ok(Reconciled::AbsentRow),
        (true, false) => Err(Error::Presence {
            op,
            row,
            found_in: Side::Engine,
        }),
        (false, true) => match zero_fill {
            Some(zero) => {
                *engine = Some(zero);
                Ok(Reconciled::Continue)
            }
            None => Err(Error::Presence {
                op,
                row,
                found_in: Side::Reference,
            }),
        },
    }
}

/// Reconcile presence-only results (deletes, cursor steps).
pub fn reconcile_presence(
    op: &'static str,
    row: Option<RowNumber>,
    engine_found: bool,
    reference_found: bool,
) -> Result<Reconciled> {
    match (engine_found, reference_found) {
        (true, true) => Ok(Reconciled::Continue),
        (false, false) => Ok(Reconciled::AbsentRow),
        (true, false) => Err(Error::Presence {
            op,
            row,
            found_in: Side::Engine,
        }),
        (false, true) => Err(Error::Presence {
            op,
            row,
            found_in: Side::Reference,
        }),
    }
}

/// Compare two values byte for byte.
pub fn compare_values(
    op: &'static str,
    row: Option<RowNumber>,
    file_type: FileType,
    reference: &[u8],
    engine: &[u8],
) -> Result<()> {
    if reference == engine {
        return Ok(());
    }
    Err(Error::ValueMismatch {
        op,
        row,
        reference: stream_item("reference", file_type, reference),
        engine: stream_item("engine", file_type, engine),
    })
}

/// Compare two traversal keys.
pub fn compare_keys(op: &'static str, reference: &RecordKey, engine: &RecordKey) -> Result<()> {
    if reference == engine {
        return Ok(());
    }
    Err(Error::KeyMismatch {
        op,
        reference: stream_key("reference", reference),
        engine: stream_key("engine", engine),
    })
}

/// Attach the operation, row and side to a store result.
pub(crate) trait Tagged<T> {
    fn tagged(self, op: &'static str, row: Option<RowNumber>, side: Side) -> Result<T>;
}

impl<T> Tagged<T> for StoreResult<T> {
    fn tagged(self, op: &'static str, row: Option<RowNumber>, side: Side) -> Result<T> {
        self.map_err(|e: StoreError| Error::engine(op, row, side, e))
    }
}
