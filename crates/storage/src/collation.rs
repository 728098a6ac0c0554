//! Collated row-store keys and ordered-map stepping shared by both stores

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use kvformat_core::Collator;

/// Row-store key ordered by the collator it was created with.
///
/// All keys of one map carry the same collator.
#[derive(Debug, Clone)]
pub struct CollatedKey {
    bytes: Vec<u8>,
    collator: Collator,
}

impl CollatedKey {
    /// Wrap `bytes` for ordering under `collator`.
    pub fn new(bytes: Vec<u8>, collator: Collator) -> Self {
        CollatedKey { bytes, collator }
    }

    /// Key bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Collator this key orders by.
    pub fn collator(&self) -> Collator {
        self.collator
    }
}

impl PartialEq for CollatedKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for CollatedKey {}

impl PartialOrd for CollatedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollatedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.collator.compare(&self.bytes, &other.bytes)
    }
}

/// First entry strictly after `from`, or the first entry when unpositioned.
pub(crate) fn step_forward<'a, K: Ord, V>(
    map: &'a BTreeMap<K, V>,
    from: Option<&K>,
) -> Option<(&'a K, &'a V)> {
    match from {
        Some(k) => map.range::<K, _>((Excluded(k), Unbounded)).next(),
        None => map.iter().next(),
    }
}

/// Last entry strictly before `from`, or the last entry when unpositioned.
pub(crate) fn step_backward<'a, K: Ord, V>(
    map: &'a BTreeMap<K, V>,
    from: Option<&K>,
) -> Option<(&'a K, &'a V)> {
    match from {
        Some(k) => map.range::<K, _>((Unbounded, Excluded(k))).next_back(),
        None => map.iter().next_back(),
    }
}
