//! Core types and traits for kvformat
//!
//! This crate defines the pieces shared by the stores and the harness:
//! - FileType, RecordKey, Collator: the schema variants and their keys
//! - Error, StoreError: error type hierarchy
//! - FormatConfig: run configuration (TOML)
//! - Generator: deterministic key/value synthesis
//! - Store, BulkSink: the store abstraction both sides implement
//! - EventHandler: message and progress notifications
//! - dump: byte dumps and operation log lines

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dump;
pub mod error;
pub mod event;
pub mod generator;
pub mod traits;
pub mod types;

pub use config::{Charset, FormatConfig};
pub use error::{Error, Result, StoreError, StoreResult};
pub use event::{EventHandler, NoopHandler, RecordingHandler, TracingHandler};
pub use generator::Generator;
pub use traits::{BulkSink, Store};
pub use types::{
    Collator, CursorRole, FileType, OpKind, OpRecord, Presence, PutMode, RecordKey, RowNumber,
    Side,
};
