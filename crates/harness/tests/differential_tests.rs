//! End-to-end tests of the differential driver
//!
//! - full runs for every schema variant
//! - the fixed-length, append and delete conventions
//! - faulty engines are caught with the right diagnostic

use kvformat_core::{
    BulkSink, Collator, CursorRole, Error, FileType, FormatConfig, Presence, PutMode, RecordKey,
    RecordingHandler, RowNumber, Side, Store, StoreResult,
};
use kvformat_harness::ops::{col_del, col_insert, next_prev, read_row, row_del};
use kvformat_harness::{
    bulk_load, dump_compare, read_scan, run, run_ops, run_with, Reconciled, RunContext,
};
use kvformat_storage::{EngineStore, ReferenceStore, TableSchema};

// ============================================================================
// Helper Functions
// ============================================================================

fn config(file_type: FileType, rows: u64, ops: u64) -> FormatConfig {
    FormatConfig {
        file_type,
        rows,
        ops,
        seed: Some(20240601),
        ..Default::default()
    }
}

fn stores(config: &FormatConfig) -> (EngineStore, ReferenceStore) {
    let mut schema = TableSchema::new(config.file_type);
    schema.collator = config.collator();
    schema.bit_width = config.bit_width;
    (
        EngineStore::open(schema).unwrap(),
        ReferenceStore::new(config.file_type, config.collator()),
    )
}

/// Engine wrapper that misbehaves on one row.
struct FaultyEngine {
    inner: EngineStore,
    row: RowNumber,
    fault: Fault,
}

#[derive(Clone, Copy)]
enum Fault {
    /// Reads and steps onto the row return a flipped first byte
    CorruptValue,
    /// Reads and steps onto the row report not-found
    LoseRecord,
}

impl FaultyEngine {
    fn targets(&self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Recno(r) => *r == self.row,
            RecordKey::Row(k) => k.starts_with(format!("{:010}.00", self.row).as_bytes()),
        }
    }

    fn step(
        &self,
        found: Option<(RecordKey, Vec<u8>)>,
    ) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        Ok(match found {
            Some((key, mut value)) if self.targets(&key) => match self.fault {
                Fault::CorruptValue => {
                    value[0] ^= 0x01;
                    Some((key, value))
                }
                Fault::LoseRecord => None,
            },
            other => other,
        })
    }
}

impl Store for FaultyEngine {
    fn name(&self) -> &str {
        "faulty engine"
    }

    fn file_type(&self) -> FileType {
        self.inner.file_type()
    }

    fn get(&mut self, key: &RecordKey) -> StoreResult<Option<Vec<u8>>> {
        let value = self.inner.get(key)?;
        if !self.targets(key) {
            return Ok(value);
        }
        Ok(match self.fault {
            Fault::CorruptValue => value.map(|mut v| {
                v[0] ^= 0x01;
                v
            }),
            Fault::LoseRecord => None,
        })
    }

    fn put(&mut self, key: &RecordKey, value: &[u8], mode: PutMode) -> StoreResult<()> {
        self.inner.put(key, value, mode)
    }

    fn delete(&mut self, key: &RecordKey) -> StoreResult<Presence> {
        self.inner.delete(key)
    }

    fn next(&mut self, cursor: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        let found = self.inner.next(cursor)?;
        self.step(found)
    }

    fn prev(&mut self, cursor: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        let found = self.inner.prev(cursor)?;
        self.step(found)
    }

    fn reset(&mut self, cursor: CursorRole) -> StoreResult<()> {
        self.inner.reset(cursor)
    }

    fn append(&mut self, value: &[u8]) -> StoreResult<RowNumber> {
        self.inner.append(value)
    }

    fn bulk(&mut self) -> StoreResult<Box<dyn BulkSink + '_>> {
        self.inner.bulk()
    }

    fn sync(&mut self) -> StoreResult<()> {
        self.inner.sync()
    }

    fn verify(&mut self) -> StoreResult<()> {
        self.inner.verify()
    }

    fn statistics(&self) -> Vec<(String, u64)> {
        self.inner.statistics()
    }

    fn close_cursors(&mut self) -> StoreResult<()> {
        self.inner.close_cursors()
    }
}

// ============================================================================
// Full Runs
// ============================================================================

mod full_runs {
    use super::*;

    #[test]
    fn test_row_scenario_scan_after_ops() {
        let mut config = config(FileType::Row, 1000, 500);
        config.delete_pct = 10;
        config.insert_pct = 0;
        config.write_pct = 40;
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);

        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();
        let counts = run_ops(&mut ctx, &mut engine, &mut reference).unwrap();
        assert_eq!(counts.inserts, 0);
        read_scan(&mut ctx, &mut engine, &mut reference).unwrap();
    }

    #[test]
    fn test_every_variant_runs_clean() {
        for file_type in [FileType::Row, FileType::Var, FileType::Fix] {
            let mut ctx = RunContext::new(config(file_type, 500, 1000)).unwrap();
            let summary = run(&mut ctx).unwrap();
            assert_eq!(summary.file_type, file_type);
            assert_eq!(summary.loaded, 500);
        }
    }

    #[test]
    fn test_reverse_row_store_runs_clean() {
        let mut config = config(FileType::Row, 400, 800);
        config.reverse = true;
        let mut ctx = RunContext::new(config).unwrap();
        let summary = run(&mut ctx).unwrap();
        assert!(summary.compared >= 400 - summary.ops.deletes);
    }

    #[test]
    fn test_narrow_fixed_width_runs_clean() {
        let mut config = config(FileType::Fix, 300, 600);
        config.bit_width = 3;
        config.insert_pct = 30;
        let mut ctx = RunContext::new(config).unwrap();
        let summary = run(&mut ctx).unwrap();
        assert!(summary.rows > 300);
        assert_eq!(summary.compared, summary.rows);
    }

    #[test]
    fn test_same_seed_same_summary() {
        let a = run(&mut RunContext::new(config(FileType::Var, 200, 400)).unwrap()).unwrap();
        let b = run(&mut RunContext::new(config(FileType::Var, 200, 400)).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_operation_log_lines() {
        let mut config = config(FileType::Var, 20, 20);
        config.logging = true;
        let mut ctx = RunContext::with_handler(config, RecordingHandler::default()).unwrap();
        run(&mut ctx).unwrap();
        let messages = &ctx.handler().messages;
        assert!(messages.iter().any(|m| m.starts_with("bulk V     1 {0000000001.VALUE.")));
        assert!(messages.iter().any(|m| m.starts_with("read      ")));
        assert!(messages.first().is_some_and(|m| m.contains("engine start")));
        assert!(messages.last().is_some_and(|m| m.contains("engine stop")));
    }
}

// ============================================================================
// Conventions
// ============================================================================

mod conventions {
    use super::*;

    #[test]
    fn test_fix_read_beyond_max_is_zero() {
        let config = config(FileType::Fix, 100, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let value = read_row(&mut ctx, &mut engine, &mut reference, 150).unwrap();
        assert_eq!(value, Some(vec![0x00]));
    }

    #[test]
    fn test_var_appends_are_consecutive() {
        let config = config(FileType::Var, 50, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let first = col_insert(&mut ctx, &mut engine, &mut reference).unwrap();
        let second = col_insert(&mut ctx, &mut engine, &mut reference).unwrap();
        assert!(first > 50);
        assert_eq!(second, first + 1);
        assert_eq!(ctx.rows, second);
    }

    #[test]
    fn test_appends_after_trailing_delete_skip_number() {
        let config = config(FileType::Var, 10, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        col_del(&mut ctx, &mut engine, &mut reference, 10).unwrap();
        assert_eq!(col_insert(&mut ctx, &mut engine, &mut reference).unwrap(), 11);
    }

    #[test]
    fn test_delete_absent_row_is_not_fatal() {
        let config = config(FileType::Row, 10, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        assert_eq!(
            row_del(&mut ctx, &mut engine, &mut reference, 7).unwrap(),
            Reconciled::Continue
        );
        assert_eq!(
            row_del(&mut ctx, &mut engine, &mut reference, 7).unwrap(),
            Reconciled::AbsentRow
        );
        assert_eq!(read_row(&mut ctx, &mut engine, &mut reference, 7).unwrap(), None);
    }

    #[test]
    fn test_bulk_round_trip_every_variant() {
        for file_type in [FileType::Row, FileType::Var, FileType::Fix] {
            let config = config(file_type, 3000, 0);
            let mut ctx = RunContext::new(config.clone()).unwrap();
            let (mut engine, mut reference) = stores(&config);
            bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();
            let reads = read_scan(&mut ctx, &mut engine, &mut reference).unwrap();
            assert!(reads > 0);
        }
    }
}

// ============================================================================
// Faulty Engines
// ============================================================================

mod faults {
    use super::*;

    fn faulty(file_type: FileType, fault: Fault, row: RowNumber) -> (FaultyEngine, ReferenceStore) {
        let config = config(file_type, 50, 0);
        let (engine, reference) = stores(&config);
        (
            FaultyEngine {
                inner: engine,
                row,
                fault,
            },
            reference,
        )
    }

    #[test]
    fn test_corrupt_value_is_caught() {
        let (mut engine, mut reference) = faulty(FileType::Var, Fault::CorruptValue, 17);
        let mut ctx = RunContext::new(config(FileType::Var, 50, 0)).unwrap();
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let err = read_row(&mut ctx, &mut engine, &mut reference, 17).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { row: Some(17), .. }));
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_lost_record_is_caught() {
        let (mut engine, mut reference) = faulty(FileType::Row, Fault::LoseRecord, 5);
        let mut ctx = RunContext::new(config(FileType::Row, 50, 0)).unwrap();
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let err = read_row(&mut ctx, &mut engine, &mut reference, 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "read: row 5: not found in engine, found in reference store"
        );
    }

    #[test]
    fn test_lost_fix_record_within_range_is_caught() {
        let (mut engine, mut reference) = faulty(FileType::Fix, Fault::LoseRecord, 20);
        let mut ctx = RunContext::new(config(FileType::Fix, 50, 0)).unwrap();
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let err = read_row(&mut ctx, &mut engine, &mut reference, 20).unwrap_err();
        assert!(matches!(
            err,
            Error::Presence {
                found_in: Side::Reference,
                ..
            }
        ));
    }

    #[test]
    fn test_full_run_fails_and_still_closes_cursors() {
        let mut config = config(FileType::Var, 50, 200);
        config.delete_pct = 0;
        config.insert_pct = 0;
        config.write_pct = 0;
        let (mut engine, mut reference) = faulty(FileType::Var, Fault::CorruptValue, 1);
        let mut ctx = RunContext::new(config).unwrap();

        let err = run_with(&mut ctx, &mut engine, &mut reference).unwrap_err();
        assert!(err.is_mismatch());
        assert_eq!(engine.inner.table().open_cursors(), 0);
        engine.inner.sync().unwrap();
    }

    #[test]
    fn test_append_below_row_count_is_rejected() {
        let config = config(FileType::Var, 10, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        // The driver believes in more rows than the engine holds.
        ctx.rows = 50;
        let err = col_insert(&mut ctx, &mut engine, &mut reference).unwrap_err();
        assert!(matches!(
            err,
            Error::AppendNotNew {
                assigned: 11,
                rows: 50
            }
        ));
        assert_eq!(
            err.to_string(),
            "append: inserted row 11 did not create a new row (row count 50)"
        );
    }

    #[test]
    fn test_extra_engine_key_is_caught_by_cursor_step() {
        let config = config(FileType::Row, 10, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let stray = RecordKey::Row(b"0000000003.05".to_vec());
        engine.put(&stray, b"stray", PutMode::Upsert).unwrap();
        // Position both overwrite cursors on row 3.
        read_row(&mut ctx, &mut engine, &mut reference, 3).unwrap();

        let err = next_prev(
            &mut ctx,
            &mut engine,
            &mut reference,
            true,
            CursorRole::Overwrite,
        )
        .unwrap_err();
        assert!(matches!(err, Error::KeyMismatch { op: "np(next)", .. }));
        assert!(err.to_string().contains("{0000000003.05}"));
    }

    #[test]
    fn test_extra_engine_key_is_caught_by_traversal() {
        let config = config(FileType::Row, 10, 0);
        let mut ctx = RunContext::new(config.clone()).unwrap();
        let (mut engine, mut reference) = stores(&config);
        bulk_load(&mut ctx, &mut engine, &mut reference).unwrap();

        let stray = RecordKey::Row(b"0000000003.05".to_vec());
        engine.put(&stray, b"stray", PutMode::Upsert).unwrap();

        let err = dump_compare(&mut ctx, &mut engine, &mut reference).unwrap_err();
        assert!(matches!(err, Error::KeyMismatch { op: "dump compare", .. }));
    }

    #[test]
    fn test_reference_store_is_not_the_engine() {
        let mut reference = ReferenceStore::new(FileType::Fix, Collator::Default);
        assert_eq!(reference.name(), "reference store");
        assert_eq!(reference.get(&RecordKey::Recno(1)).unwrap(), Some(vec![0]));
    }
}
