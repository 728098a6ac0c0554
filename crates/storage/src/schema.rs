//! Table schema for the engine
//!
//! Derived from the run configuration. Node sizes are powers of two; the
//! overflow sizes (values above which an item is stored out of line) are
//! drawn between 1/50 and 1/40 of the node size, never below 40 bytes.

use std::fmt;

use rand::Rng;

use kvformat_core::generator::bit_mask;
use kvformat_core::{Collator, FileType, FormatConfig, StoreError, StoreResult};

/// Smallest overflow size the schema accepts.
pub const MIN_OVERFLOW_SIZE: u32 = 40;

/// Shape and tuning of an engine table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Schema variant
    pub file_type: FileType,
    /// Bits per value (fixed-length column-stores)
    pub bit_width: u8,
    /// Key ordering (row-stores)
    pub collator: Collator,
    /// Internal node size in bytes
    pub internal_node_max: u32,
    /// Internal item overflow size in bytes
    pub internal_overflow_size: u32,
    /// Leaf node size in bytes
    pub leaf_node_max: u32,
    /// Leaf item overflow size in bytes
    pub leaf_overflow_size: u32,
    /// Block compression enabled
    pub compression: bool,
    /// Dictionary compression of keys (row-stores)
    pub huffman_key: bool,
    /// Dictionary compression of values (row-stores and variable-length column-stores)
    pub huffman_value: bool,
}

impl TableSchema {
    /// Untuned schema for `file_type`.
    pub fn new(file_type: FileType) -> Self {
        TableSchema {
            file_type,
            bit_width: 8,
            collator: Collator::Default,
            internal_node_max: 1 << 12,
            internal_overflow_size: 1 << 12 >> 5,
            leaf_node_max: 1 << 15,
            leaf_overflow_size: 1 << 15 >> 5,
            compression: false,
            huffman_key: false,
            huffman_value: false,
        }
    }

    /// Schema for a run, drawing overflow sizes from `rng`.
    pub fn from_config<R: Rng + ?Sized>(config: &FormatConfig, rng: &mut R) -> Self {
        let internal_node_max = 1u32 << config.internal_node_max;
        let leaf_node_max = 1u32 << config.leaf_node_max;
        let row = config.file_type == FileType::Row;

        TableSchema {
            file_type: config.file_type,
            bit_width: config.bit_width,
            collator: config.collator(),
            internal_node_max,
            internal_overflow_size: overflow_size(internal_node_max, rng),
            leaf_node_max,
            leaf_overflow_size: overflow_size(leaf_node_max, rng),
            compression: config.compression,
            huffman_key: row && config.huffman_key,
            huffman_value: config.file_type != FileType::Fix && config.huffman_value,
        }
    }

    /// Reject inconsistent schemas.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidArgument` naming the offending setting.
    pub fn validate(&self) -> StoreResult<()> {
        if self.file_type == FileType::Fix && !(1..=8).contains(&self.bit_width) {
            return Err(StoreError::InvalidArgument(format!(
                "value_format={}t: bit width must be between 1 and 8",
                self.bit_width
            )));
        }
        if self.collator != Collator::Default && self.file_type != FileType::Row {
            return Err(StoreError::InvalidArgument(
                "collator is only supported for row-stores".to_string(),
            ));
        }
        for (name, max, ovfl) in [
            ("internal", self.internal_node_max, self.internal_overflow_size),
            ("leaf", self.leaf_node_max, self.leaf_overflow_size),
        ] {
            if !max.is_power_of_two() {
                return Err(StoreError::InvalidArgument(format!(
                    "{}_node_max={} is not a power of two",
                    name, max
                )));
            }
            if ovfl < MIN_OVERFLOW_SIZE || ovfl > max {
                return Err(StoreError::InvalidArgument(format!(
                    "{}_overflow_size={} must be between {} and {}",
                    name, ovfl, MIN_OVERFLOW_SIZE, max
                )));
            }
        }
        Ok(())
    }

    /// Mask applied to fixed-length values.
    pub fn value_mask(&self) -> u8 {
        bit_mask(self.bit_width)
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key_format={},internal_node_max={},internal_overflow_size={},\
             leaf_node_max={},leaf_overflow_size={}",
            if self.file_type == FileType::Row { "u" } else { "r" },
            self.internal_node_max,
            self.internal_overflow_size,
            self.leaf_node_max,
            self.leaf_overflow_size
        )?;
        if self.compression {
            f.write_str(",block_compressor=default")?;
        }
        match self.file_type {
            FileType::Fix => write!(f, ",value_format={}t", self.bit_width)?,
            FileType::Row | FileType::Var => {
                if self.huffman_key {
                    f.write_str(",huffman_key=english")?;
                }
                if self.collator == Collator::Reverse {
                    f.write_str(",collator=reverse")?;
                }
                if self.huffman_value {
                    f.write_str(",huffman_value=english")?;
                }
            }
        }
        Ok(())
    }
}

fn overflow_size<R: Rng + ?Sized>(node_max: u32, rng: &mut R) -> u32 {
    rng.gen_range(node_max / 50..=node_max / 40)
        .max(MIN_OVERFLOW_SIZE)
}
