//! kvformat - differential testing harness for key-value storage engines
//!
//! Drives an engine under test and an ordered in-memory reference store
//! through the same seeded stream of bulk loads, reads, writes, deletes,
//! appends and cursor steps, and stops at the first disagreement with a
//! byte-level report of both sides.
//!
//! # Quick Start
//!
//! ```
//! use kvformat::{run, FileType, FormatConfig, RunContext};
//!
//! let config = FormatConfig {
//!     file_type: FileType::Fix,
//!     rows: 50,
//!     ops: 50,
//!     seed: Some(3),
//!     ..Default::default()
//! };
//! let summary = run(&mut RunContext::new(config)?)?;
//! assert_eq!(summary.compared, summary.rows);
//! # Ok::<(), kvformat::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`kvformat_core`]: configuration, generator, errors, the `Store` trait
//! - [`kvformat_storage`]: the engine under test and the reference store
//! - [`kvformat_harness`]: reconciliation, the operation driver, scans

pub use kvformat_core::*;
pub use kvformat_harness::{
    bulk_load, dump_compare, read_scan, run, run_ops, run_with, OpCounts, Reconciled, RunContext,
    RunSummary,
};
pub use kvformat_storage::{EngineStore, ReferenceStore, TableSchema};
