//! Whole-table verification
//!
//! `read_scan` point-reads a random subset of rows `1..=rows`, stepping by
//! 1..=17 so successive runs cover different rows. Rows appended during the
//! operation phase are included and the last row is always read.
//! `dump_compare` walks both stores end to end and requires identical keys,
//! values and length.

use rand::Rng;
use tracing::info;

use kvformat_core::{CursorRole, EventHandler, Result, Side, Store};

use crate::context::RunContext;
use crate::ops::read_row;
use crate::reconcile::{compare_keys, compare_values, reconcile_presence, Reconciled, Tagged};

/// Largest stride of the read scan.
pub const MAX_STRIDE: u64 = 17;

/// Rows between read scan progress notifications.
pub const SCAN_PROGRESS_EVERY: u64 = 1000;

/// Point-read rows up to the current row count in random strides.
/// Returns the number of rows read.
pub fn read_scan<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<u64> {
    let mut reads = 0;
    let mut cnt = 0;
    let mut last_cnt = 0;
    while cnt < ctx.rows {
        cnt += ctx.rng().gen_range(1..=MAX_STRIDE);
        cnt = cnt.min(ctx.rows);
        if cnt - last_cnt > SCAN_PROGRESS_EVERY {
            ctx.progress("read row scan", cnt);
            last_cnt = cnt;
        }

        read_row(ctx, engine, reference, cnt)?;
        reads += 1;
    }
    Ok(reads)
}

/// Walk both stores from the first record to the last and compare every
/// record. Returns the number of records compared.
pub fn dump_compare<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<u64> {
    const OP: &str = "dump compare";
    ctx.progress(OP, 0);

    let role = CursorRole::Overwrite;
    reference.reset(role).tagged(OP, None, Side::Reference)?;
    engine.reset(role).tagged(OP, None, Side::Engine)?;

    let mut compared = 0;
    loop {
        let expected = reference.next(role).tagged(OP, None, Side::Reference)?;
        let found = engine.next(role).tagged(OP, None, Side::Engine)?;
        let outcome = reconcile_presence(OP, None, found.is_some(), expected.is_some())?;
        if outcome == Reconciled::AbsentRow {
            break;
        }
        if let (Some((ref_key, ref_value)), Some((key, value))) = (expected, found) {
            compare_keys(OP, &ref_key, &key)?;
            compare_values(OP, key.recno(), ctx.file_type(), &ref_value, &value)?;
        }
        compared += 1;
    }

    ctx.progress(OP, compared);
    info!(target: "kvformat::run", records = compared, "Traversal compare complete");
    Ok(compared)
}
