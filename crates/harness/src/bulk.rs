//! Initial population of both stores
//!
//! Rows `1..=rows` are loaded into the engine through its ordered-load
//! cursor and mirrored into the reference store through ordinary writes.
//! A row-store ordered by the reverse collator cannot take generated keys
//! in row order through the ordered path, so it is loaded by keyed inserts.

use tracing::info;

use kvformat_core::{
    BulkSink, EventHandler, FileType, PutMode, RecordKey, Result, RowNumber, Side, Store,
    StoreResult,
};

use crate::context::RunContext;
use crate::reconcile::Tagged;

const OP: &str = "bulk load";

/// Rows between progress notifications.
pub const BULK_PROGRESS_EVERY: u64 = 100;

enum Loader<'a> {
    Ordered(Box<dyn BulkSink + 'a>),
    Keyed(&'a mut dyn Store),
}

impl Loader<'_> {
    fn load(&mut self, key: &RecordKey, value: &[u8]) -> StoreResult<()> {
        match self {
            Loader::Ordered(sink) => sink.append(key.as_bytes(), value).map(|_| ()),
            Loader::Keyed(store) => store.put(key, value, PutMode::Insert),
        }
    }
}

/// Load rows `1..=rows` into both stores. Returns the number loaded.
pub fn bulk_load<H: EventHandler>(
    ctx: &mut RunContext<H>,
    engine: &mut dyn Store,
    reference: &mut dyn Store,
) -> Result<RowNumber> {
    let ordered = !(ctx.file_type() == FileType::Row && ctx.config().reverse);
    let mut loader = if ordered {
        Loader::Ordered(engine.bulk().tagged(OP, None, Side::Engine)?)
    } else {
        Loader::Keyed(engine)
    };

    let rows = ctx.rows;
    for row in 1..=rows {
        if row % BULK_PROGRESS_EVERY == 0 {
            ctx.progress(OP, row);
        }

        let key = ctx.generator().record_key(row, false);
        let value = ctx.generator().generate_value(row);
        ctx.log_bulk(row, key.as_bytes(), &value);

        loader
            .load(&key, &value)
            .tagged(OP, Some(row), Side::Engine)?;
        reference
            .put(&key, &value, PutMode::Upsert)
            .tagged(OP, Some(row), Side::Reference)?;

        ctx.key_cnt = row;
        ctx.note_write(row);
    }
    drop(loader);

    info!(target: "kvformat::run", rows = ctx.key_cnt, ordered, "Bulk load complete");
    Ok(ctx.key_cnt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvformat_core::{Collator, CursorRole, FormatConfig, RecordingHandler};
    use kvformat_storage::{EngineStore, ReferenceStore, TableSchema};

    fn load(file_type: FileType, reverse: bool, rows: u64) -> (EngineStore, ReferenceStore) {
        let config = FormatConfig {
            file_type,
            rows,
            reverse,
            seed: Some(5),
            ..Default::default()
        };
        let mut ctx = RunContext::with_handler(config, RecordingHandler::default()).unwrap();
        let mut schema = TableSchema::new(file_type);
        schema.collator = ctx.config().collator();
        let mut engine = EngineStore::open(schema).unwrap();
        let mut reference = ReferenceStore::new(file_type, ctx.config().collator());

        let loaded = bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();
        assert_eq!(loaded, rows);
        assert_eq!(ctx.key_cnt, rows);
        let progress = &ctx.handler().progress;
        assert_eq!(progress.len() as u64, rows / BULK_PROGRESS_EVERY);
        (engine, reference)
    }

    #[test]
    fn test_load_every_variant() {
        for file_type in [FileType::Row, FileType::Var, FileType::Fix] {
            let (engine, reference) = load(file_type, false, 250);
            assert_eq!(engine.table().len(), 250);
            assert_eq!(reference.len(), 250);
            assert_eq!(engine.table().open_cursors(), 2);
        }
    }

    #[test]
    fn test_reverse_collator_uses_keyed_inserts() {
        let (mut engine, _) = load(FileType::Row, true, 30);
        engine.reset(CursorRole::Overwrite).unwrap();
        let (first, _) = engine.next(CursorRole::Overwrite).unwrap().unwrap();
        let bytes = first.as_bytes().unwrap_or_default();
        assert!(bytes.starts_with(b"0000000030.00"));
    }

    #[test]
    fn test_load_into_non_empty_engine_fails() {
        let config = FormatConfig {
            file_type: FileType::Var,
            rows: 10,
            seed: Some(5),
            ..Default::default()
        };
        let mut ctx = RunContext::new(config).unwrap();
        let mut engine = EngineStore::open(TableSchema::new(FileType::Var)).unwrap();
        let mut reference = ReferenceStore::new(FileType::Var, Collator::Default);
        engine.append(b"x").unwrap();
        let err = bulk_load(&mut ctx, &mut engine, &mut reference).unwrap_err();
        assert_eq!(err.to_string().split(':').next(), Some("bulk load"));
    }
}
