//! Reference store: the trusted side of every comparison
//!
//! A plain ordered map with no tuning. It differs from the engine only
//! where the record-number conventions say it should:
//! - fixed-length tables hold every slot explicitly, so writing past the
//!   end fills the gap with zeros and a read of any missing record returns
//!   the zero value
//! - removing a fixed-length record within range stores a zero

use std::collections::BTreeMap;

use tracing::debug;

use kvformat_core::{
    BulkSink, Collator, CursorRole, FileType, Presence, PutMode, RecordKey, RowNumber, Store,
    StoreError, StoreResult,
};

use crate::collation::{step_backward, step_forward, CollatedKey};
use crate::table::Position;

#[derive(Debug)]
enum Records {
    Row(BTreeMap<CollatedKey, Vec<u8>>),
    Column(BTreeMap<RowNumber, Vec<u8>>),
}

/// Reference key/value store.
#[derive(Debug)]
pub struct ReferenceStore {
    file_type: FileType,
    collator: Collator,
    records: Records,
    last_recno: RowNumber,
    positions: [Option<Position>; 2],
    cursors_open: bool,
    /// Writes applied, including bulk loads
    writes: u64,
    /// Removes that found their record
    removes: u64,
}

const FIX_ZERO: [u8; 1] = [0];

impl ReferenceStore {
    /// Create an empty store for `file_type`, ordering row-store keys by
    /// `collator`.
    pub fn new(file_type: FileType, collator: Collator) -> Self {
        debug!(target: "kvformat::reference", %file_type, ?collator, "Opening reference store");
        let records = match file_type {
            FileType::Row => Records::Row(BTreeMap::new()),
            FileType::Var | FileType::Fix => Records::Column(BTreeMap::new()),
        };
        ReferenceStore {
            file_type,
            collator,
            records,
            last_recno: 0,
            positions: [None, None],
            cursors_open: true,
            writes: 0,
            removes: 0,
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        match &self.records {
            Records::Row(map) => map.len(),
            Records::Column(map) => map.len(),
        }
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest record number assigned (column-stores).
    pub fn last_recno(&self) -> RowNumber {
        self.last_recno
    }

    fn slot(&mut self, role: CursorRole) -> StoreResult<&mut Option<Position>> {
        if !self.cursors_open {
            return Err(StoreError::InvalidArgument(
                "reference store cursors are closed".to_string(),
            ));
        }
        Ok(match role {
            CursorRole::Overwrite => &mut self.positions[0],
            CursorRole::Insert => &mut self.positions[1],
        })
    }

    fn position_for(&self, key: &RecordKey) -> StoreResult<Position> {
        match (&self.records, key) {
            (Records::Row(_), RecordKey::Row(k)) => {
                Ok(Position::Row(CollatedKey::new(k.clone(), self.collator)))
            }
            (Records::Column(_), RecordKey::Recno(r)) => Ok(Position::Recno(*r)),
            (Records::Row(_), RecordKey::Recno(_)) => Err(StoreError::WrongKeyKind {
                expected: "byte string",
            }),
            (Records::Column(_), RecordKey::Row(_)) => Err(StoreError::WrongKeyKind {
                expected: "record number",
            }),
        }
    }

    fn lookup(&self, pos: &Position) -> Option<Vec<u8>> {
        match (&self.records, pos) {
            (Records::Row(map), Position::Row(k)) => map.get(k).cloned(),
            (Records::Column(map), Position::Recno(r)) => map.get(r).cloned(),
            _ => None,
        }
    }

    fn contains(&self, pos: &Position) -> bool {
        match (&self.records, pos) {
            (Records::Row(map), Position::Row(k)) => map.contains_key(k),
            (Records::Column(map), Position::Recno(r)) => map.contains_key(r),
            _ => false,
        }
    }

    fn store(&mut self, pos: &Position, value: &[u8]) -> StoreResult<()> {
        match (&mut self.records, pos) {
            (Records::Row(map), Position::Row(k)) => {
                map.insert(k.clone(), value.to_vec());
            }
            (Records::Column(map), Position::Recno(r)) => {
                if *r == 0 {
                    return Err(StoreError::InvalidArgument(
                        "record number 0 is not valid".to_string(),
                    ));
                }
                if self.file_type == FileType::Fix {
                    for gap in self.last_recno + 1..*r {
                        map.insert(gap, FIX_ZERO.to_vec());
                    }
                }
                map.insert(*r, value.to_vec());
                self.last_recno = self.last_recno.max(*r);
            }
            _ => {
                return Err(StoreError::InvalidArgument(
                    "key does not match the table".to_string(),
                ))
            }
        }
        self.writes += 1;
        Ok(())
    }

    fn step(&self, from: Option<&Position>, forward: bool) -> Option<(Position, Vec<u8>)> {
        match &self.records {
            Records::Row(map) => {
                let from = match from {
                    Some(Position::Row(k)) => Some(k),
                    _ => None,
                };
                let hit = if forward {
                    step_forward(map, from)
                } else {
                    step_backward(map, from)
                };
                hit.map(|(k, v)| (Position::Row(k.clone()), v.clone()))
            }
            Records::Column(map) => {
                let from = match from {
                    Some(Position::Recno(r)) => Some(r),
                    _ => None,
                };
                let hit = if forward {
                    step_forward(map, from)
                } else {
                    step_backward(map, from)
                };
                hit.map(|(r, v)| (Position::Recno(*r), v.clone()))
            }
        }
    }

    fn move_cursor(
        &mut self,
        role: CursorRole,
        forward: bool,
    ) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        let from = self.slot(role)?.clone();
        let hit = self.step(from.as_ref(), forward);
        let slot = self.slot(role)?;
        Ok(match hit {
            Some((pos, value)) => {
                let key = pos.record_key();
                *slot = Some(pos);
                Some((key, value))
            }
            None => {
                *slot = None;
                None
            }
        })
    }
}

impl Store for ReferenceStore {
    fn name(&self) -> &str {
        "reference store"
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn get(&mut self, key: &RecordKey) -> StoreResult<Option<Vec<u8>>> {
        let pos = self.position_for(key)?;
        let value = match self.lookup(&pos) {
            Some(v) => Some(v),
            None if self.file_type == FileType::Fix => Some(FIX_ZERO.to_vec()),
            None => None,
        };
        *self.slot(CursorRole::Overwrite)? = value.as_ref().map(|_| pos);
        Ok(value)
    }

    fn put(&mut self, key: &RecordKey, value: &[u8], mode: PutMode) -> StoreResult<()> {
        let pos = self.position_for(key)?;
        if mode == PutMode::Insert && self.contains(&pos) {
            return Err(StoreError::DuplicateKey);
        }
        self.store(&pos, value)?;
        *self.slot(CursorRole::Overwrite)? = Some(pos);
        Ok(())
    }

    fn delete(&mut self, key: &RecordKey) -> StoreResult<Presence> {
        let pos = self.position_for(key)?;
        let found = match (&mut self.records, &pos) {
            (Records::Row(map), Position::Row(k)) => map.remove(k).is_some(),
            (Records::Column(map), Position::Recno(r)) if self.file_type == FileType::Fix => {
                match map.get_mut(r) {
                    Some(slot) => {
                        *slot = FIX_ZERO.to_vec();
                        true
                    }
                    None => false,
                }
            }
            (Records::Column(map), Position::Recno(r)) => map.remove(r).is_some(),
            _ => false,
        };
        if found {
            self.removes += 1;
        }
        *self.slot(CursorRole::Overwrite)? = found.then_some(pos);
        Ok(Presence::from(found))
    }

    fn next(&mut self, role: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        self.move_cursor(role, true)
    }

    fn prev(&mut self, role: CursorRole) -> StoreResult<Option<(RecordKey, Vec<u8>)>> {
        self.move_cursor(role, false)
    }

    fn reset(&mut self, role: CursorRole) -> StoreResult<()> {
        *self.slot(role)? = None;
        Ok(())
    }

    fn append(&mut self, value: &[u8]) -> StoreResult<RowNumber> {
        if self.file_type == FileType::Row {
            return Err(StoreError::Unsupported(
                "append requires a column-store".to_string(),
            ));
        }
        self.slot(CursorRole::Insert)?;
        let recno = self.last_recno + 1;
        let pos = Position::Recno(recno);
        self.store(&pos, value)?;
        *self.slot(CursorRole::Insert)? = Some(pos);
        Ok(recno)
    }

    fn bulk(&mut self) -> StoreResult<Box<dyn BulkSink + '_>> {
        if !self.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "bulk load requires an empty table ({} records present)",
                self.len()
            )));
        }
        Ok(Box::new(ReferenceBulk { store: self }))
    }

    fn sync(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn verify(&mut self) -> StoreResult<()> {
        if let Records::Column(map) = &self.records {
            if let Some((&max, _)) = map.iter().next_back() {
                if max > self.last_recno {
                    return Err(StoreError::Corruption(format!(
                        "record {} is beyond the last record number {}",
                        max, self.last_recno
                    )));
                }
            }
            if self.file_type == FileType::Fix && map.len() as RowNumber != self.last_recno {
                return Err(StoreError::Corruption(format!(
                    "{} slots stored for {} records",
                    map.len(),
                    self.last_recno
                )));
            }
        }
        Ok(())
    }

    fn statistics(&self) -> Vec<(String, u64)> {
        vec![
            ("entries".to_string(), self.len() as u64),
            ("last record number".to_string(), self.last_recno),
            ("writes".to_string(), self.writes),
            ("removes".to_string(), self.removes),
        ]
    }

    fn close_cursors(&mut self) -> StoreResult<()> {
        self.positions = [None, None];
        self.cursors_open = false;
        Ok(())
    }
}

/// Ordered load into the reference store, with the engine's ordering rules.
struct ReferenceBulk<'a> {
    store: &'a mut ReferenceStore,
}

impl BulkSink for ReferenceBulk<'_> {
    fn append(&mut self, key: Option<&[u8]>, value: &[u8]) -> StoreResult<RowNumber> {
        let store = &mut *self.store;
        match (&store.records, key) {
            (Records::Row(map), Some(k)) => {
                let key = CollatedKey::new(k.to_vec(), store.collator);
                if let Some((last, _)) = map.iter().next_back() {
                    if key <= *last {
                        return Err(StoreError::OutOfOrder(format!(
                            "key {} does not sort after {}",
                            kvformat_core::dump::escape_bytes(k),
                            kvformat_core::dump::escape_bytes(last.bytes())
                        )));
                    }
                }
                store.store(&Position::Row(key), value)?;
                Ok(store.len() as RowNumber)
            }
            (Records::Column(_), None) => {
                let recno = store.last_recno + 1;
                store.store(&Position::Recno(recno), value)?;
                Ok(recno)
            }
            (Records::Row(_), None) => Err(StoreError::InvalidArgument(
                "row-store bulk load requires a key".to_string(),
            )),
            (Records::Column(_), Some(_)) => Err(StoreError::InvalidArgument(
                "column-store bulk load assigns record numbers".to_string(),
            )),
        }
    }
}
