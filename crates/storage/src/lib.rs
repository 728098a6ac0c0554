//! Stores driven by the kvformat harness
//!
//! This crate implements both sides of a differential run:
//! - EngineStore: the in-memory engine under test, a `Table` behind
//!   `parking_lot::RwLock` shared by cursor handles
//! - ReferenceStore: the trusted ordered-map model the engine is checked against
//! - TableSchema: engine schema derived from the run configuration
//!
//! # Fixed-length tables
//!
//! The two stores deliberately disagree on record numbers past the last
//! written slot of a fixed-length table: the engine reports them missing,
//! the reference store returns the zero value. The harness reconciles the
//! difference.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collation;
pub mod cursor;
pub mod engine;
pub mod reference;
pub mod schema;
pub mod table;

pub use collation::CollatedKey;
pub use cursor::{BulkCursor, Cursor, CursorConfig};
pub use engine::EngineStore;
pub use reference::ReferenceStore;
pub use schema::TableSchema;
pub use table::Table;
