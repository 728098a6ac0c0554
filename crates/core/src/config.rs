//! Run configuration via a TOML file
//!
//! Every field has a default, so an empty file (or `FormatConfig::default()`)
//! describes a valid run. Values are checked eagerly by `validate`, which
//! `from_file` and `from_toml_str` call before returning.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Collator, FileType};

/// Upper bound on the row count: keys carry the row number in ten digits.
pub const MAX_ROWS: u64 = 1_000_000_000;

/// Smallest and largest log2 node sizes accepted for the engine's schema.
pub const MIN_NODE_MAX_LOG2: u32 = 9;
/// See [`MIN_NODE_MAX_LOG2`].
pub const MAX_NODE_MAX_LOG2: u32 = 17;

/// Character set used for generated value filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    /// Lowercase ASCII letters
    #[default]
    Alpha,
    /// All printable ASCII
    Printable,
    /// Every byte value, including non-printable ones
    Binary,
}

/// Configuration of one harness run.
///
/// # Example
///
/// ```toml
/// file_type = "row"
/// rows = 1000
/// ops = 500
/// delete_pct = 10
/// insert_pct = 0
/// write_pct = 40
/// seed = 42
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Schema variant: `"row"`, `"var"` or `"fix"`.
    pub file_type: FileType,
    /// Rows bulk-loaded before the operation phase.
    pub rows: u64,
    /// Operations performed by the driver.
    pub ops: u64,
    /// Percentage of operations that delete.
    pub delete_pct: u32,
    /// Percentage of operations that insert.
    pub insert_pct: u32,
    /// Percentage of operations that overwrite.
    pub write_pct: u32,
    /// Bits per value for fixed-length column-stores (1..=8).
    pub bit_width: u8,
    /// Seed for the run's random source; drawn from entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Emit a log line for every operation.
    pub logging: bool,
    /// Order row-store keys with the reverse collator.
    pub reverse: bool,
    /// Minimum generated key length (row-store).
    pub key_min: u32,
    /// Maximum generated key length (row-store).
    pub key_max: u32,
    /// Minimum generated value length.
    pub value_min: u32,
    /// Maximum generated value length.
    pub value_max: u32,
    /// Character set of generated value filler.
    pub charset: Charset,
    /// log2 of the engine's internal node size.
    pub internal_node_max: u32,
    /// log2 of the engine's leaf node size.
    pub leaf_node_max: u32,
    /// Enable block compression in the engine's schema.
    pub compression: bool,
    /// Enable dictionary compression of row-store keys.
    pub huffman_key: bool,
    /// Enable dictionary compression of values.
    pub huffman_value: bool,
    /// Number of runs the command-line runner performs.
    pub runs: u32,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            file_type: FileType::Row,
            rows: 1000,
            ops: 2000,
            delete_pct: 10,
            insert_pct: 10,
            write_pct: 40,
            bit_width: 8,
            seed: None,
            logging: false,
            reverse: false,
            key_min: 20,
            key_max: 64,
            value_min: 20,
            value_max: 256,
            charset: Charset::Alpha,
            internal_node_max: 12,
            leaf_node_max: 15,
            compression: false,
            huffman_key: false,
            huffman_value: false,
            runs: 1,
        }
    }
}

impl FormatConfig {
    /// Default configuration for the given schema variant.
    pub fn for_file_type(file_type: FileType) -> Self {
        FormatConfig {
            file_type,
            ..Default::default()
        }
    }

    /// Check every field, returning the first problem found.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(Error::Config(format!(
                "rows must be between 1 and {}, got {}",
                MAX_ROWS, self.rows
            )));
        }
        for (name, pct) in [
            ("delete_pct", self.delete_pct),
            ("insert_pct", self.insert_pct),
            ("write_pct", self.write_pct),
        ] {
            if pct > 100 {
                return Err(Error::Config(format!(
                    "{} must be at most 100, got {}",
                    name, pct
                )));
            }
        }
        if self.file_type == FileType::Fix && !(1..=8).contains(&self.bit_width) {
            return Err(Error::Config(format!(
                "bit_width must be between 1 and 8, got {}",
                self.bit_width
            )));
        }
        if self.reverse && self.file_type != FileType::Row {
            return Err(Error::Config(format!(
                "reverse collation is only valid for row-stores, file_type is \"{}\"",
                self.file_type
            )));
        }
        if self.key_min == 0 || self.key_min > self.key_max {
            return Err(Error::Config(format!(
                "key lengths must satisfy 1 <= key_min <= key_max, got {}..{}",
                self.key_min, self.key_max
            )));
        }
        if self.value_min == 0 || self.value_min > self.value_max {
            return Err(Error::Config(format!(
                "value lengths must satisfy 1 <= value_min <= value_max, got {}..{}",
                self.value_min, self.value_max
            )));
        }
        for (name, size) in [
            ("internal_node_max", self.internal_node_max),
            ("leaf_node_max", self.leaf_node_max),
        ] {
            if !(MIN_NODE_MAX_LOG2..=MAX_NODE_MAX_LOG2).contains(&size) {
                return Err(Error::Config(format!(
                    "{} must be between {} and {}, got {}",
                    name, MIN_NODE_MAX_LOG2, MAX_NODE_MAX_LOG2, size
                )));
            }
        }
        if self.runs == 0 {
            return Err(Error::Config("runs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Key collator implied by the configuration.
    pub fn collator(&self) -> Collator {
        if self.reverse {
            Collator::Reverse
        } else {
            Collator::Default
        }
    }

    /// The configured seed, or a fresh one from the thread-local generator.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::thread_rng().gen())
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FormatConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Serialize this configuration to TOML and write it to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize configuration: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kvformat run configuration
#
# Schema variant: "row" (explicit keys), "var" (record numbers, variable
# values) or "fix" (record numbers, fixed-bit-width values)
file_type = "row"

# Rows bulk-loaded before the operation phase, and operations performed
rows = 1000
ops = 2000

# Operation mix; reads take whatever is left. The percentages need not add
# up to 100: a high delete_pct crowds out inserts and writes.
delete_pct = 10
insert_pct = 10
write_pct = 40

# Bits per value, fixed-length column-stores only
bit_width = 8

# Seed for reproducible runs; omit to draw one per run
# seed = 42

# Log every operation
logging = false

# Reverse key collation, row-stores only
reverse = false

# Generated key and value lengths
key_min = 20
key_max = 64
value_min = 20
value_max = 256

# Value filler: "alpha", "printable" or "binary"
charset = "alpha"

# Engine schema tuning (log2 node sizes, compression)
internal_node_max = 12
leaf_node_max = 15
compression = false
huffman_key = false
huffman_value = false

# Runs performed by the command-line runner
runs = 1
"#
    }
}
