//! Engine table: the record data behind every cursor
//!
//! - Row-stores: `BTreeMap<CollatedKey, Vec<u8>>` ordered by the schema's collator
//! - Variable-length column-stores: sparse `BTreeMap<u64, Vec<u8>>`; removed
//!   records disappear, `last_recno` never moves backwards
//! - Fixed-length column-stores: dense slots for record numbers
//!   `1..=last_recno`; removing or never writing a slot leaves it zero, and
//!   record numbers beyond `last_recno` do not exist
//!
//! The data sits behind a `parking_lot::RwLock` and the counters are
//! atomics, so a table can be shared by cursor handles through an `Arc`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

use kvformat_core::{FileType, Presence, RecordKey, RowNumber, StoreError, StoreResult};

use crate::collation::{step_backward, step_forward, CollatedKey};
use crate::schema::TableSchema;

/// A cursor position: the key of the record the cursor last touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Position {
    Row(CollatedKey),
    Recno(RowNumber),
}

impl Position {
    pub(crate) fn record_key(&self) -> RecordKey {
        match self {
            Position::Row(k) => RecordKey::Row(k.bytes().to_vec()),
            Position::Recno(r) => RecordKey::Recno(*r),
        }
    }
}

#[derive(Debug)]
enum TableData {
    Row(BTreeMap<CollatedKey, Vec<u8>>),
    Var {
        records: BTreeMap<RowNumber, Vec<u8>>,
        last_recno: RowNumber,
    },
    Fix {
        slots: Vec<u8>,
    },
}

/// Operation counters, reported by `Table::statistics`.
#[derive(Debug, Default)]
struct TableStats {
    searches: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    removes: AtomicU64,
    appends: AtomicU64,
    bulk_loaded: AtomicU64,
    cursor_steps: AtomicU64,
    overflow_items: AtomicU64,
    syncs: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// In-memory table.
#[derive(Debug)]
pub struct Table {
    schema: TableSchema,
    data: RwLock<TableData>,
    open_cursors: AtomicUsize,
    write_gen: AtomicU64,
    stats: TableStats,
}

impl Table {
    /// Create an empty table.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid.
    pub fn create(schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        let data = match schema.file_type {
            FileType::Row => TableData::Row(BTreeMap::new()),
            FileType::Var => TableData::Var {
                records: BTreeMap::new(),
                last_recno: 0,
            },
            FileType::Fix => TableData::Fix { slots: Vec::new() },
        };
        Ok(Table {
            schema,
            data: RwLock::new(data),
            open_cursors: AtomicUsize::new(0),
            write_gen: AtomicU64::new(0),
            stats: TableStats::default(),
        })
    }

    /// Table schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of cursor handles currently open on this table.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    pub(crate) fn cursor_opened(&self) {
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn cursor_closed(&self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of stored records (every slot, for fixed-length tables).
    pub fn len(&self) -> u64 {
        match &*self.data.read() {
            TableData::Row(map) => map.len() as u64,
            TableData::Var { records, .. } => records.len() as u64,
            TableData::Fix { slots } => slots.len() as u64,
        }
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest record number ever assigned (column-stores), 0 for row-stores.
    pub fn last_recno(&self) -> RowNumber {
        match &*self.data.read() {
            TableData::Row(_) => 0,
            TableData::Var { last_recno, .. } => *last_recno,
            TableData::Fix { slots } => slots.len() as RowNumber,
        }
    }

    /// Number of completed writes.
    pub fn write_generation(&self) -> u64 {
        self.write_gen.load(Ordering::SeqCst)
    }

    pub(crate) fn position_for(&self, key: &RecordKey) -> StoreResult<Position> {
        match (self.schema.file_type, key) {
            (FileType::Row, RecordKey::Row(k)) => Ok(Position::Row(CollatedKey::new(
                k.clone(),
                self.schema.collator,
            ))),
            (FileType::Row, RecordKey::Recno(_)) => Err(StoreError::WrongKeyKind {
                expected: "byte string",
            }),
            (_, RecordKey::Recno(r)) => Ok(Position::Recno(*r)),
            (_, RecordKey::Row(_)) => Err(StoreError::WrongKeyKind {
                expected: "record number",
            }),
        }
    }

    pub(crate) fn search(&self, pos: &Position) -> Option<Vec<u8>> {
        bump(&self.stats.searches);
        let data = self.data.read();
        match (&*data, pos) {
            (TableData::Row(map), Position::Row(k)) => map.get(k).cloned(),
            (TableData::Var { records, .. }, Position::Recno(r)) => records.get(r).cloned(),
            (TableData::Fix { slots }, Position::Recno(r)) => fix_slot(slots, *r).map(|v| vec![v]),
            _ => None,
        }
    }

    pub(crate) fn insert(&self, pos: &Position, value: &[u8], overwrite: bool) -> StoreResult<()> {
        self.check_value(value)?;
        let mut data = self.data.write();
        let existed = match (&mut *data, pos) {
            (TableData::Row(map), Position::Row(k)) => {
                if !overwrite && map.contains_key(k) {
                    return Err(StoreError::DuplicateKey);
                }
                map.insert(k.clone(), value.to_vec()).is_some()
            }
            (TableData::Var { records, last_recno }, Position::Recno(r)) => {
                check_recno(*r)?;
                if !overwrite && records.contains_key(r) {
                    return Err(StoreError::DuplicateKey);
                }
                *last_recno = (*last_recno).max(*r);
                records.insert(*r, value.to_vec()).is_some()
            }
            (TableData::Fix { slots }, Position::Recno(r)) => {
                check_recno(*r)?;
                let existed = fix_slot(slots, *r).is_some();
                if !overwrite && existed {
                    return Err(StoreError::DuplicateKey);
                }
                let idx = (*r - 1) as usize;
                if idx >= slots.len() {
                    slots.resize(idx + 1, 0);
                }
                slots[idx] = value[0] & self.schema.value_mask();
                existed
            }
            _ => return Err(self.wrong_kind()),
        };
        drop(data);

        if existed {
            bump(&self.stats.updates);
        } else {
            bump(&self.stats.inserts);
        }
        self.note_write(value);
        Ok(())
    }

    pub(crate) fn remove(&self, pos: &Position) -> StoreResult<Presence> {
        let mut data = self.data.write();
        let found = match (&mut *data, pos) {
            (TableData::Row(map), Position::Row(k)) => map.remove(k).is_some(),
            (TableData::Var { records, .. }, Position::Recno(r)) => records.remove(r).is_some(),
            (TableData::Fix { slots }, Position::Recno(r)) => {
                // Removing a fixed-length record zeroes its slot.
                match (*r as usize).checked_sub(1).and_then(|i| slots.get_mut(i)) {
                    Some(slot) => {
                        *slot = 0;
                        true
                    }
                    None => false,
                }
            }
            _ => return Err(self.wrong_kind()),
        };
        drop(data);

        if found {
            bump(&self.stats.removes);
            self.write_gen.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Presence::from(found))
    }

    /// Append a column-store record at `last_recno + 1`.
    pub(crate) fn append(&self, value: &[u8]) -> StoreResult<RowNumber> {
        self.check_value(value)?;
        let mut data = self.data.write();
        let recno = match &mut *data {
            TableData::Row(_) => {
                return Err(StoreError::Unsupported(
                    "append requires a column-store".to_string(),
                ))
            }
            TableData::Var {
                records,
                last_recno,
            } => {
                *last_recno += 1;
                records.insert(*last_recno, value.to_vec());
                *last_recno
            }
            TableData::Fix { slots } => {
                slots.push(value[0] & self.schema.value_mask());
                slots.len() as RowNumber
            }
        };
        drop(data);

        bump(&self.stats.appends);
        self.note_write(value);
        Ok(recno)
    }

    /// Bulk-load the next record: the key (row-stores) must sort after
    /// every stored key, column-stores receive `last_recno + 1`.
    pub(crate) fn bulk_append(&self, key: Option<&[u8]>, value: &[u8]) -> StoreResult<RowNumber> {
        self.check_value(value)?;
        let mut data = self.data.write();
        let recno = match (&mut *data, key) {
            (TableData::Row(map), Some(k)) => {
                let key = CollatedKey::new(k.to_vec(), self.schema.collator);
                if let Some((last, _)) = map.iter().next_back() {
                    if key <= *last {
                        return Err(StoreError::OutOfOrder(format!(
                            "key {} does not sort after {}",
                            kvformat_core::dump::escape_bytes(k),
                            kvformat_core::dump::escape_bytes(last.bytes())
                        )));
                    }
                }
                map.insert(key, value.to_vec());
                map.len() as RowNumber
            }
            (TableData::Row(_), None) => {
                return Err(StoreError::InvalidArgument(
                    "row-store bulk load requires a key".to_string(),
                ))
            }
            (_, Some(_)) => {
                return Err(StoreError::InvalidArgument(
                    "column-store bulk load assigns record numbers".to_string(),
                ))
            }
            (
                TableData::Var {
                    records,
                    last_recno,
                },
                None,
            ) => {
                *last_recno += 1;
                records.insert(*last_recno, value.to_vec());
                *last_recno
            }
            (TableData::Fix { slots }, None) => {
                slots.push(value[0] & self.schema.value_mask());
                slots.len() as RowNumber
            }
        };
        drop(data);

        bump(&self.stats.bulk_loaded);
        self.note_write(value);
        Ok(recno)
    }

    /// Record after `from` (or the first record when unpositioned).
    pub(crate) fn step_next(&self, from: Option<&Position>) -> Option<(Position, Vec<u8>)> {
        bump(&self.stats.cursor_steps);
        let data = self.data.read();
        match &*data {
            TableData::Row(map) => {
                let from = match from {
                    Some(Position::Row(k)) => Some(k),
                    _ => None,
                };
                step_forward(map, from).map(|(k, v)| (Position::Row(k.clone()), v.clone()))
            }
            TableData::Var { records, .. } => {
                let from = match from {
                    Some(Position::Recno(r)) => Some(r),
                    _ => None,
                };
                step_forward(records, from).map(|(r, v)| (Position::Recno(*r), v.clone()))
            }
            TableData::Fix { slots } => {
                let next = match from {
                    Some(Position::Recno(r)) => r + 1,
                    _ => 1,
                };
                fix_slot(slots, next).map(|v| (Position::Recno(next), vec![v]))
            }
        }
    }

    /// Record before `from` (or the last record when unpositioned).
    pub(crate) fn step_prev(&self, from: Option<&Position>) -> Option<(Position, Vec<u8>)> {
        bump(&self.stats.cursor_steps);
        let data = self.data.read();
        match &*data {
            TableData::Row(map) => {
                let from = match from {
                    Some(Position::Row(k)) => Some(k),
                    _ => None,
                };
                step_backward(map, from).map(|(k, v)| (Position::Row(k.clone()), v.clone()))
            }
            TableData::Var { records, .. } => {
                let from = match from {
                    Some(Position::Recno(r)) => Some(r),
                    _ => None,
                };
                step_backward(records, from).map(|(r, v)| (Position::Recno(*r), v.clone()))
            }
            TableData::Fix { slots } => {
                let prev = match from {
                    Some(Position::Recno(r)) => {
                        (*r).min(slots.len() as RowNumber + 1).saturating_sub(1)
                    }
                    _ => slots.len() as RowNumber,
                };
                fix_slot(slots, prev).map(|v| (Position::Recno(prev), vec![v]))
            }
        }
    }

    pub(crate) fn note_sync(&self) {
        bump(&self.stats.syncs);
    }

    /// Check internal invariants.
    ///
    /// # Errors
    ///
    /// `StoreError::Corruption` describing the first violation.
    pub fn verify(&self) -> StoreResult<()> {
        let data = self.data.read();
        match &*data {
            TableData::Row(map) => {
                if let Some(k) = map.keys().find(|k| k.collator() != self.schema.collator) {
                    return Err(StoreError::Corruption(format!(
                        "key {} stored with the wrong collator",
                        kvformat_core::dump::escape_bytes(k.bytes())
                    )));
                }
            }
            TableData::Var {
                records,
                last_recno,
            } => {
                if records.contains_key(&0) {
                    return Err(StoreError::Corruption("record number 0 is stored".to_string()));
                }
                if let Some((&max, _)) = records.iter().next_back() {
                    if max > *last_recno {
                        return Err(StoreError::Corruption(format!(
                            "record {} is beyond the last record number {}",
                            max, last_recno
                        )));
                    }
                }
            }
            TableData::Fix { slots } => {
                let mask = self.schema.value_mask();
                if let Some(i) = slots.iter().position(|v| v & !mask != 0) {
                    return Err(StoreError::Corruption(format!(
                        "record {} holds 0x{:02x}, wider than {} bits",
                        i + 1,
                        slots[i],
                        self.schema.bit_width
                    )));
                }
            }
        }
        Ok(())
    }

    /// Named counters describing the table.
    pub fn statistics(&self) -> Vec<(String, u64)> {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        vec![
            ("entries".to_string(), self.len()),
            ("last record number".to_string(), self.last_recno()),
            ("write generation".to_string(), self.write_generation()),
            ("searches".to_string(), load(&self.stats.searches)),
            ("inserts".to_string(), load(&self.stats.inserts)),
            ("updates".to_string(), load(&self.stats.updates)),
            ("removes".to_string(), load(&self.stats.removes)),
            ("appends".to_string(), load(&self.stats.appends)),
            ("bulk loaded".to_string(), load(&self.stats.bulk_loaded)),
            ("cursor steps".to_string(), load(&self.stats.cursor_steps)),
            ("overflow items".to_string(), load(&self.stats.overflow_items)),
            ("syncs".to_string(), load(&self.stats.syncs)),
            ("open cursors".to_string(), self.open_cursors() as u64),
            ("leaf node max".to_string(), self.schema.leaf_node_max as u64),
            ("leaf overflow size".to_string(), self.schema.leaf_overflow_size as u64),
        ]
    }

    fn check_value(&self, value: &[u8]) -> StoreResult<()> {
        if self.schema.file_type == FileType::Fix && value.len() != 1 {
            return Err(StoreError::InvalidArgument(format!(
                "fixed-length value must be 1 byte, got {}",
                value.len()
            )));
        }
        Ok(())
    }

    fn note_write(&self, value: &[u8]) {
        if value.len() > self.schema.leaf_overflow_size as usize {
            bump(&self.stats.overflow_items);
        }
        self.write_gen.fetch_add(1, Ordering::SeqCst);
    }

    fn wrong_kind(&self) -> StoreError {
        StoreError::WrongKeyKind {
            expected: if self.schema.file_type == FileType::Row {
                "byte string"
            } else {
                "record number"
            },
        }
    }
}

fn fix_slot(slots: &[u8], recno: RowNumber) -> Option<u8> {
    (recno as usize)
        .checked_sub(1)
        .and_then(|i| slots.get(i))
        .copied()
}

fn check_recno(recno: RowNumber) -> StoreResult<()> {
    if recno == 0 {
        return Err(StoreError::InvalidArgument(
            "record number 0 is not valid".to_string(),
        ));
    }
    Ok(())
}
