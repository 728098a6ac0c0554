//! Deterministic key and value synthesis
//!
//! A `Generator` draws its length tables once from the run's random source;
//! after that `generate_key` and `generate_value` are pure functions of the
//! row number, so the driver can regenerate the expected bytes for any row
//! at any time.
//!
//! # Key layout
//!
//! `NNNNNNNNNN.SS[/filler]`: the row number in ten zero-padded digits, a
//! two-digit suffix (`00`, or 1..=15 for append keys) and, for row-stores,
//! a `/` followed by lowercase filler up to the row's length. Keys sort in
//! row-number order under the default collator.
//!
//! # Value layout
//!
//! Row-stores and variable-length column-stores: `NNNNNNNNNN.VALUE.` followed
//! by filler from the configured character set. Fixed-length column-stores:
//! a single byte masked to the configured bit width.

use rand::Rng;

use crate::config::{Charset, FormatConfig};
use crate::types::{FileType, RecordKey, RowNumber};

/// Entries in each length table; a row uses entry `row % LEN_TABLE_SIZE`.
pub const LEN_TABLE_SIZE: usize = 1000;

/// Length of the `NNNNNNNNNN.SS` key prefix.
pub const KEY_PREFIX_LEN: usize = 13;

const VALUE_TAG: &[u8] = b".VALUE.";

/// Every seventh value uses a single repeated filler byte.
const REPEAT_EVERY: u64 = 7;

/// Key/value generator for one run.
#[derive(Debug, Clone)]
pub struct Generator {
    file_type: FileType,
    bit_mask: u8,
    key_lens: Vec<u32>,
    value_lens: Vec<u32>,
    charset: Vec<u8>,
}

impl Generator {
    /// Build a generator, drawing the length tables from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &FormatConfig, rng: &mut R) -> Self {
        let key_lens = (0..LEN_TABLE_SIZE)
            .map(|_| rng.gen_range(config.key_min..=config.key_max))
            .collect();
        let value_lens = (0..LEN_TABLE_SIZE)
            .map(|_| rng.gen_range(config.value_min..=config.value_max))
            .collect();

        Generator {
            file_type: config.file_type,
            bit_mask: bit_mask(config.bit_width),
            key_lens,
            value_lens,
            charset: charset_bytes(config.charset),
        }
    }

    /// Schema variant this generator encodes for.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Mask applied to fixed-length values.
    pub fn bit_mask(&self) -> u8 {
        self.bit_mask
    }

    /// Byte key for `row`.
    ///
    /// For column-stores the byte key only appears in diagnostics; the
    /// stores are keyed by record number (see [`Generator::record_key`]).
    pub fn generate_key(&self, row: RowNumber, is_append: bool) -> Vec<u8> {
        let suffix = if is_append { append_suffix(row) } else { 0 };
        let mut key = format!("{:010}.{:02}", row, suffix).into_bytes();

        if self.file_type == FileType::Row {
            let target = self.key_lens[table_slot(row)] as usize;
            if target > key.len() {
                key.reserve(target - key.len());
                key.push(b'/');
                let mut c = (row % 26) as u8;
                while key.len() < target {
                    key.push(b'a' + c);
                    c = (c + 1) % 26;
                }
            }
        }
        key
    }

    /// Store key for `row`: the byte key for row-stores, the record number
    /// otherwise.
    pub fn record_key(&self, row: RowNumber, is_append: bool) -> RecordKey {
        match self.file_type {
            FileType::Row => RecordKey::Row(self.generate_key(row, is_append)),
            FileType::Var | FileType::Fix => RecordKey::Recno(row),
        }
    }

    /// Value for `row`.
    pub fn generate_value(&self, row: RowNumber) -> Vec<u8> {
        if self.file_type == FileType::Fix {
            return vec![((row % 255) as u8).wrapping_add(1) & self.bit_mask];
        }

        let target = self.value_lens[table_slot(row)] as usize;
        let mut value = format!("{:010}", row).into_bytes();
        value.extend_from_slice(VALUE_TAG);

        let n = self.charset.len();
        let start = (row % n as u64) as usize;
        if row % REPEAT_EVERY == 0 {
            let fill = self.charset[start];
            value.resize(value.len().max(target), fill);
        } else {
            let mut i = start;
            while value.len() < target {
                value.push(self.charset[i]);
                i = (i + 1) % n;
            }
        }
        value
    }

    /// The implicit value of an unwritten fixed-length slot.
    pub fn zero_value(&self) -> Vec<u8> {
        vec![0]
    }
}

/// Mask selecting the low `bit_width` bits of a byte.
pub fn bit_mask(bit_width: u8) -> u8 {
    if bit_width >= 8 {
        0xff
    } else {
        (1u8 << bit_width) - 1
    }
}

fn table_slot(row: RowNumber) -> usize {
    (row % LEN_TABLE_SIZE as u64) as usize
}

fn append_suffix(row: RowNumber) -> u64 {
    row % 15 + 1
}

fn charset_bytes(charset: Charset) -> Vec<u8> {
    match charset {
        Charset::Alpha => (b'a'..=b'z').collect(),
        Charset::Printable => (0x20u8..0x7f).collect(),
        Charset::Binary => (0u8..=255).collect(),
    }
}
