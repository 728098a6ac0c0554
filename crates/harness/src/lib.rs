//! Differential test driver for kvformat
//!
//! Drives the engine under test and the reference store through the same
//! operations and stops at the first disagreement:
//! - RunContext: seed, random source, row counters, event handler
//! - reconcile: not-found reconciliation and byte comparison
//! - ops: the randomized operation driver
//! - bulk, scan: initial load, read scan and traversal compare
//! - run: the full lifecycle with guaranteed teardown
//!
//! # Example
//!
//! ```
//! use kvformat_core::{FileType, FormatConfig};
//! use kvformat_harness::{run, RunContext};
//!
//! let config = FormatConfig {
//!     file_type: FileType::Var,
//!     rows: 100,
//!     ops: 100,
//!     seed: Some(1),
//!     ..Default::default()
//! };
//! let mut ctx = RunContext::new(config).unwrap();
//! let summary = run(&mut ctx).unwrap();
//! assert_eq!(summary.loaded, 100);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bulk;
pub mod context;
pub mod ops;
pub mod reconcile;
pub mod run;
pub mod scan;

pub use bulk::bulk_load;
pub use context::RunContext;
pub use ops::{run_ops, OpCounts};
pub use reconcile::{compare_keys, compare_values, reconcile, reconcile_presence, Reconciled};
pub use run::{run, run_with, RunSummary};
pub use scan::{dump_compare, read_scan};
