//! Operation driver
//!
//! Each step picks a row uniformly in `[1, rows]` and an operation by
//! drawing `0..100` against the delete, insert and write percentages;
//! whatever is left over reads. A modification is followed by a few cursor
//! probes from wherever it left the cursor, then by a confirming read of the
//! same row. The first disagreement or store error ends the run.

use rand::Rng;

use kvformat_core::{
    CursorRole, Error, EventHandler, FileType, OpKind, OpRecord, PutMode, RecordKey, Result,
    RowNumber, Side, Store,
};

use crate::context::RunContext;
use crate::reconcile::{
    compare_keys, compare_values, reconcile, reconcile_presence, Reconciled, Tagged,
};

/// Operations performed by one `run_ops` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Point reads, confirming reads included
    pub reads: u64,
    /// Appends and row-store inserts
    pub inserts: u64,
    /// Overwrites
    pub writes: u64,
    /// Removes
    pub deletes: u64,
    /// Cursor steps
    pub probes: u64,
}

/// Read `row` from both stores and compare.
///
/// Returns the agreed value, or `None` when both stores lack the row.
pub fn read_row<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    row: RowNumber,
) -> Result<Option<Vec<u8>>> {
    const OP: &str = "read";
    let key = ctx.generator().record_key(row, false);
    let expected = reference.get(&key).tagged(OP, Some(row), Side::Reference)?;
    let mut found = engine.get(&key).tagged(OP, Some(row), Side::Engine)?;

    let zero_fill = ctx.zero_fill(Some(row));
    let outcome = reconcile(OP, Some(row), &mut found, expected.is_some(), zero_fill)?;
    let record = OpRecord::new(OpKind::Read, Some(row));
    if outcome == Reconciled::AbsentRow {
        ctx.log_op(&record.with_not_found(true));
        return Ok(None);
    }
    match (expected, found) {
        (Some(expected), Some(found)) => {
            compare_values(OP, Some(row), ctx.file_type(), &expected, &found)?;
            ctx.log_op(&record.with_value(expected.clone()));
            Ok(Some(expected))
        }
        _ => Ok(None),
    }
}

/// Step both stores' `role` cursor forward (`next`) or backward and compare.
pub fn next_prev<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    next: bool,
    role: CursorRole,
) -> Result<Reconciled> {
    let op = if next { "np(next)" } else { "np(prev)" };
    let (expected, found) = if next {
        (
            reference.next(role).tagged(op, None, Side::Reference)?,
            engine.next(role).tagged(op, None, Side::Engine)?,
        )
    } else {
        (
            reference.prev(role).tagged(op, None, Side::Reference)?,
            engine.prev(role).tagged(op, None, Side::Engine)?,
        )
    };

    let outcome = reconcile_presence(op, None, found.is_some(), expected.is_some())?;
    if outcome == Reconciled::AbsentRow {
        return Ok(outcome);
    }
    if let (Some((ref_key, ref_value)), Some((key, value))) = (expected, found) {
        compare_keys(op, &ref_key, &key)?;
        compare_values(op, key.recno(), ctx.file_type(), &ref_value, &value)?;

        let kind = if next { OpKind::Next } else { OpKind::Prev };
        let record = OpRecord::new(kind, key.recno()).with_key(key).with_value(value);
        ctx.log_op(&record);
    }
    Ok(Reconciled::Continue)
}

/// Write the generated value for `row` into a row-store.
///
/// With `insert` the append key for `row` is used, a key that sorts
/// between `row` and `row + 1`. Writes overwrite unconditionally: the
/// driver does not track which rows currently exist.
pub fn row_put<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    row: RowNumber,
    insert: bool,
) -> Result<()> {
    const OP: &str = "row_put";
    let key = ctx.generator().record_key(row, insert);
    let value = ctx.generator().generate_value(row);

    let kind = if insert { OpKind::Insert } else { OpKind::Update };
    let record = OpRecord::new(kind, Some(row))
        .with_key(key.clone())
        .with_value(value.clone());
    ctx.log_op(&record);

    reference
        .put(&key, &value, PutMode::Upsert)
        .tagged(OP, Some(row), Side::Reference)?;
    engine
        .put(&key, &value, PutMode::Upsert)
        .tagged(OP, Some(row), Side::Engine)
}

/// Overwrite `row` of a column-store with its generated value.
pub fn col_put<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    row: RowNumber,
) -> Result<()> {
    const OP: &str = "col_put";
    let key = RecordKey::Recno(row);
    let value = ctx.generator().generate_value(row);
    ctx.log_op(&OpRecord::new(OpKind::Update, Some(row)).with_value(value.clone()));

    engine
        .put(&key, &value, PutMode::Upsert)
        .tagged(OP, Some(row), Side::Engine)?;
    reference
        .put(&key, &value, PutMode::Upsert)
        .tagged(OP, Some(row), Side::Reference)?;
    ctx.note_write(row);
    Ok(())
}

/// Append a record to a column-store and return its row number, which
/// becomes the new row count.
pub fn col_insert<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<RowNumber> {
    const OP: &str = "col_insert";
    let value = ctx.generator().generate_value(ctx.rows + 1);

    let assigned = engine.append(&value).tagged(OP, None, Side::Engine)?;
    if assigned <= ctx.rows {
        return Err(Error::AppendNotNew {
            assigned,
            rows: ctx.rows,
        });
    }
    ctx.rows = assigned;
    ctx.log_op(&OpRecord::new(OpKind::Insert, Some(assigned)).with_value(value.clone()));

    let mirrored = reference
        .append(&value)
        .tagged(OP, Some(assigned), Side::Reference)?;
    if mirrored != assigned {
        return Err(Error::AppendDiverged {
            engine: assigned,
            reference: mirrored,
        });
    }
    ctx.note_write(assigned);
    Ok(assigned)
}

/// Remove `row` from a row-store.
pub fn row_del<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    row: RowNumber,
) -> Result<Reconciled> {
    const OP: &str = "row_del";
    let key = ctx.generator().record_key(row, false);

    let expected = reference.delete(&key).tagged(OP, Some(row), Side::Reference)?;
    let found = engine.delete(&key).tagged(OP, Some(row), Side::Engine)?;
    let outcome = reconcile_presence(OP, Some(row), found.is_found(), expected.is_found())?;
    log_delete(ctx, row, outcome);
    Ok(outcome)
}

/// Remove `row` from a column-store.
///
/// Removing a fixed-length record sets it to zero, so the reference store
/// is written a zero value rather than asked to remove anything.
pub fn col_del<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
    row: RowNumber,
) -> Result<Reconciled> {
    const OP: &str = "col_del";
    let key = RecordKey::Recno(row);

    let expected = if ctx.file_type() == FileType::Fix {
        let zero = ctx.generator().zero_value();
        reference
            .put(&key, &zero, PutMode::Upsert)
            .tagged(OP, Some(row), Side::Reference)?;
        true
    } else {
        reference
            .delete(&key)
            .tagged(OP, Some(row), Side::Reference)?
            .is_found()
    };
    let found = engine.delete(&key).tagged(OP, Some(row), Side::Engine)?;
    let outcome = reconcile_presence(OP, Some(row), found.is_found(), expected)?;
    log_delete(ctx, row, outcome);
    Ok(outcome)
}

fn log_delete<H: EventHandler>(ctx: &mut RunContext<H>, row: RowNumber, outcome: Reconciled) {
    let record = OpRecord::new(OpKind::Delete, Some(row))
        .with_not_found(outcome == Reconciled::AbsentRow);
    ctx.log_op(&record);
}

/// Run the configured number of operations.
pub fn run_ops<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<OpCounts> {
    let mut counts = OpCounts::default();
    let file_type = ctx.file_type();
    let delete_pct = ctx.config().delete_pct;
    let insert_pct = delete_pct + ctx.config().insert_pct;
    let write_pct = insert_pct + ctx.config().write_pct;

    for cnt in 0..ctx.config().ops {
        if cnt % 10 == 0 {
            ctx.progress("read/write ops", cnt);
        }

        let mut row = ctx.random_row();
        let mut role = CursorRole::Overwrite;
        let mut absent = false;

        let op = ctx.rng().gen_range(0..100u32);
        if op < delete_pct {
            let outcome = match file_type {
                FileType::Row => row_del(ctx, engine, reference, row)?,
                FileType::Var | FileType::Fix => col_del(ctx, engine, reference, row)?,
            };
            absent = outcome == Reconciled::AbsentRow;
            counts.deletes += 1;
        } else if op < insert_pct {
            match file_type {
                FileType::Row => row_put(ctx, engine, reference, row, true)?,
                FileType::Var | FileType::Fix => {
                    row = col_insert(ctx, engine, reference)?;
                    role = CursorRole::Insert;
                }
            }
            counts.inserts += 1;
        } else if op < write_pct {
            match file_type {
                FileType::Row => row_put(ctx, engine, reference, row, false)?,
                FileType::Var | FileType::Fix => col_put(ctx, engine, reference, row)?,
            }
            counts.writes += 1;
        } else {
            read_row(ctx, engine, reference, row)?;
            counts.reads += 1;
            continue;
        }

        // The modification left the cursor positioned: probe around it.
        let probes = ctx.random_between(1, 4);
        for _ in 0..probes {
            if absent {
                break;
            }
            let next = ctx.rng().gen_bool(0.5);
            absent = next_prev(ctx, engine, reference, next, role)? == Reconciled::AbsentRow;
            counts.probes += 1;
        }

        read_row(ctx, engine, reference, row)?;
        counts.reads += 1;
    }
    Ok(counts)
}
