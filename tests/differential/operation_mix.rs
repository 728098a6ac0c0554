//! Runs across skewed operation mixes and schema options.

use kvformat::{FileType, FormatConfig};

use crate::common::{run_clean, small_config, VARIANTS};

#[test]
fn test_delete_heavy_mix() {
    for file_type in VARIANTS {
        let config = FormatConfig {
            delete_pct: 70,
            insert_pct: 10,
            write_pct: 10,
            ..small_config(file_type, 11)
        };
        let summary = run_clean(config);
        assert!(summary.ops.deletes > summary.ops.writes);
    }
}

#[test]
fn test_append_heavy_column_stores_grow() {
    for file_type in [FileType::Var, FileType::Fix] {
        let config = FormatConfig {
            delete_pct: 0,
            insert_pct: 80,
            write_pct: 0,
            ..small_config(file_type, 12)
        };
        let summary = run_clean(config);
        assert_eq!(summary.rows, summary.loaded + summary.ops.inserts);
    }
}

#[test]
fn test_read_only_mix_changes_nothing() {
    for file_type in VARIANTS {
        let config = FormatConfig {
            delete_pct: 0,
            insert_pct: 0,
            write_pct: 0,
            ..small_config(file_type, 13)
        };
        let summary = run_clean(config);
        assert_eq!(summary.rows, summary.loaded);
        assert_eq!(summary.compared, summary.loaded);
        assert_eq!(summary.ops.probes, 0);
    }
}

#[test]
fn test_reverse_collation_and_schema_options() {
    let config = FormatConfig {
        reverse: true,
        compression: true,
        huffman_key: true,
        huffman_value: true,
        internal_node_max: 9,
        leaf_node_max: 9,
        value_max: 2000,
        ..small_config(FileType::Row, 14)
    };
    let summary = run_clean(config);
    let overflow = summary
        .engine_stats
        .iter()
        .find(|(name, _)| name == "overflow items")
        .map(|(_, value)| *value);
    assert!(overflow.unwrap_or(0) > 0);
}
