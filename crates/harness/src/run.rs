//! Run lifecycle
//!
//! A run opens the engine with a schema derived from the configuration,
//! then goes through its phases in order:
//!
//! 1. bulk load
//! 2. read scan
//! 3. operations
//! 4. read scan
//! 5. traversal compare
//!
//! Teardown always runs, on failure too: both stores' cursors are closed,
//! then the stores are synced (a busy engine is tolerated here and nowhere
//! else) and verified.

use tracing::{debug, info, warn};

use kvformat_core::{Error, EventHandler, FileType, Result, RowNumber, Side, Store, StoreError};
use kvformat_storage::{EngineStore, ReferenceStore, TableSchema};

use crate::bulk::bulk_load;
use crate::context::RunContext;
use crate::ops::{run_ops, OpCounts};
use crate::reconcile::Tagged;
use crate::scan::{dump_compare, read_scan};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Seed the run used
    pub seed: u64,
    /// Schema variant
    pub file_type: FileType,
    /// Rows bulk-loaded
    pub loaded: RowNumber,
    /// Row count at the end of the run
    pub rows: RowNumber,
    /// Driver operations
    pub ops: OpCounts,
    /// Rows point-read by the two read scans
    pub scanned: u64,
    /// Records compared by the traversal compare
    pub compared: u64,
    /// Engine statistics at teardown
    pub engine_stats: Vec<(String, u64)>,
}

/// Run against a fresh engine and reference store.
///
/// # Errors
///
/// The first mismatch or store failure, or a failure to tear down.
pub fn run<H: EventHandler>(ctx: &mut RunContext<H>) -> Result<RunSummary> {
    let config = ctx.config().clone();
    let schema = TableSchema::from_config(&config, ctx.rng());
    let mut engine = EngineStore::open(schema).tagged("open", None, Side::Engine)?;
    let mut reference = ReferenceStore::new(config.file_type, config.collator());

    let summary = run_with(ctx, &mut engine, &mut reference)?;
    engine.close().tagged("close", None, Side::Engine)?;
    Ok(summary)
}

/// Run against the given stores, which must be empty.
///
/// # Errors
///
/// The first mismatch or store failure, or a failure to tear down.
pub fn run_with<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<RunSummary> {
    info!(
        target: "kvformat::run",
        seed = ctx.seed(),
        file_type = %ctx.file_type(),
        rows = ctx.rows,
        ops = ctx.config().ops,
        "Starting run"
    );
    if ctx.config().logging {
        ctx.message("===============\nengine start\n===============");
    }

    let outcome = phases(ctx, engine, reference);
    if let Err(e) = &outcome {
        warn!(target: "kvformat::run", seed = ctx.seed(), error = %e, "Run failed");
    }

    // Teardown runs on both paths; a run failure takes precedence.
    let closed = teardown(ctx, engine, reference);
    let mut summary = outcome?;
    closed?;

    summary.engine_stats = engine.statistics();
    for (name, value) in &summary.engine_stats {
        debug!(target: "kvformat::stats", stat = name.as_str(), value, "engine statistic");
    }
    info!(
        target: "kvformat::run",
        seed = summary.seed,
        rows = summary.rows,
        reads = summary.ops.reads,
        compared = summary.compared,
        "Run complete"
    );
    Ok(summary)
}

fn phases<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<RunSummary> {
    let loaded = bulk_load(ctx, engine, reference)?;
    let mut scanned = read_scan(ctx, engine, reference)?;
    let ops = run_ops(ctx, engine, reference)?;
    scanned += read_scan(ctx, engine, reference)?;
    let compared = dump_compare(ctx, engine, reference)?;

    Ok(RunSummary {
        seed: ctx.seed(),
        file_type: ctx.file_type(),
        loaded,
        rows: ctx.rows,
        ops,
        scanned,
        compared,
        engine_stats: Vec::new(),
    })
}

fn teardown<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<()> {
    if ctx.config().logging {
        ctx.message("===============\nengine stop\n===============");
    }

    engine.close_cursors().tagged("cursor close", None, Side::Engine)?;
    reference
        .close_cursors()
        .tagged("cursor close", None, Side::Reference)?;

    ctx.progress("sync", 0);
    sync(engine, Side::Engine)?;
    sync(reference, Side::Reference)?;

    ctx.progress("verify", 0);
    engine.verify().tagged("verify", None, Side::Engine)?;
    reference.verify().tagged("verify", None, Side::Reference)?;
    Ok(())
}

fn sync(store: &mut dyn Store, side: Side) -> Result<()> {
    match store.sync() {
        Ok(()) => Ok(()),
        Err(StoreError::Busy(reason)) => {
            debug!(target: "kvformat::run", %side, %reason, "Sync busy, ignored");
            Ok(())
        }
        Err(e) => Err(Error::engine("sync", None, side, e)),
    }
}
