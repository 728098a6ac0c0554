//! Shared types for the harness, the engine and the reference store
//!
//! - `FileType`: the schema variant of a run (row-store, variable-length
//!   column-store, fixed-length column-store)
//! - `RecordKey`: explicit byte key or implicit record number
//! - `Collator`: key ordering for row-stores
//! - `OpRecord`: ephemeral description of one driver step, used for logging

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 1-based logical record number.
pub type RowNumber = u64;

/// Schema variant of a run, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Row-store: explicit, generated variable-length byte keys
    Row,
    /// Column-store keyed by record number with variable-length values
    Var,
    /// Column-store keyed by record number with fixed-bit-width values
    Fix,
}

impl FileType {
    /// True for the record-number keyed variants.
    pub fn is_column(&self) -> bool {
        matches!(self, FileType::Var | FileType::Fix)
    }

    /// Lowercase name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Row => "row",
            FileType::Var => "var",
            FileType::Fix => "fix",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" => Ok(FileType::Row),
            "var" | "variable" => Ok(FileType::Var),
            "fix" | "fixed" => Ok(FileType::Fix),
            other => Err(format!(
                "unknown file type '{}', expected \"row\", \"var\" or \"fix\"",
                other
            )),
        }
    }
}

/// Key ordering for row-store tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Collator {
    /// Lexicographic byte order
    #[default]
    Default,
    /// Inverse of lexicographic byte order
    Reverse,
}

impl Collator {
    /// Compare two keys under this collator.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Collator::Default => a.cmp(b),
            Collator::Reverse => b.cmp(a),
        }
    }
}

/// Key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// Explicit key of a row-store record
    Row(Vec<u8>),
    /// Implicit key of a column-store record
    Recno(RowNumber),
}

impl RecordKey {
    /// Record number, for column-store keys.
    pub fn recno(&self) -> Option<RowNumber> {
        match self {
            RecordKey::Recno(r) => Some(*r),
            RecordKey::Row(_) => None,
        }
    }

    /// Key bytes, for row-store keys.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RecordKey::Row(k) => Some(k),
            RecordKey::Recno(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Row(k) => f.write_str(&crate::dump::escape_bytes(k)),
            RecordKey::Recno(r) => write!(f, "{}", r),
        }
    }
}

/// Write behaviour when the key may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fail with `StoreError::DuplicateKey` if the key exists
    Insert,
    /// Insert or overwrite
    Upsert,
}

/// Whether a keyed operation found its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The record existed
    Found,
    /// The record did not exist
    NotFound,
}

impl Presence {
    /// True for `Presence::Found`.
    pub fn is_found(&self) -> bool {
        matches!(self, Presence::Found)
    }
}

impl From<bool> for Presence {
    fn from(found: bool) -> Self {
        if found {
            Presence::Found
        } else {
            Presence::NotFound
        }
    }
}

/// The two standing cursors each store keeps open for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorRole {
    /// Keyed reads and writes against possibly pre-existing records
    Overwrite,
    /// Column-store appends, where the record number is assigned by the store
    Insert,
}

/// Which store produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The store under test
    Engine,
    /// The trusted reference store
    Reference,
}

impl Side {
    /// The opposite side.
    pub fn other(&self) -> Side {
        match self {
            Side::Engine => Side::Reference,
            Side::Reference => Side::Engine,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Engine => f.write_str("engine"),
            Side::Reference => f.write_str("reference store"),
        }
    }
}

/// Kind of a driver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Point read
    Read,
    /// Append-insert (column-store) or insert of a new key (row-store)
    Insert,
    /// Overwrite of an existing row
    Update,
    /// Removal
    Delete,
    /// Forward cursor step
    Next,
    /// Backward cursor step
    Prev,
}

impl OpKind {
    /// Verb label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            OpKind::Read => "read",
            OpKind::Insert => "insert",
            OpKind::Update => "put",
            OpKind::Delete => "delete",
            OpKind::Next => "next",
            OpKind::Prev => "prev",
        }
    }
}

/// One driver step: what was done, to which row, and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpRecord {
    /// Operation kind
    pub kind: OpKind,
    /// Target row, when known
    pub row: Option<RowNumber>,
    /// Resulting key
    pub key: Option<RecordKey>,
    /// Resulting value
    pub value: Option<Vec<u8>>,
    /// Both stores reported the record absent
    pub not_found: bool,
}

impl OpRecord {
    /// Start a record for an operation on `row`.
    pub fn new(kind: OpKind, row: Option<RowNumber>) -> Self {
        OpRecord {
            kind,
            row,
            key: None,
            value: None,
            not_found: false,
        }
    }

    /// Attach the key.
    pub fn with_key(mut self, key: RecordKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Attach the value.
    pub fn with_value(mut self, value: Vec<u8>) -> Self {
        self.value = Some(value);
        self
    }

    /// Mark the record absent in both stores.
    pub fn with_not_found(mut self, not_found: bool) -> Self {
        self.not_found = not_found;
        self
    }
}
