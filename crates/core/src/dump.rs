//! Byte dumps and operation log lines
//!
//! Printable ASCII bytes are written verbatim and every other byte as two
//! lowercase hex digits. Fixed-length column-store values are single bytes
//! and always render as `0x` plus two hex digits.

use std::fmt::Write;

use crate::types::{FileType, OpKind, OpRecord, RecordKey};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Width of the verb column in log lines.
pub const LABEL_WIDTH: usize = 10;

/// Escape a byte string for display.
pub fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        if (0x20..0x7f).contains(&b) {
            out.push(b as char);
        } else {
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}

/// Render a value the way the given schema variant stores it.
pub fn render_value(file_type: FileType, data: &[u8]) -> String {
    match file_type {
        FileType::Fix => format!("0x{:02x}", data.first().copied().unwrap_or(0)),
        FileType::Row | FileType::Var => escape_bytes(data),
    }
}

/// One tagged side of a mismatch report: `\t<tag> {<bytes>}`.
pub fn stream_item(tag: &str, file_type: FileType, data: &[u8]) -> String {
    format!("\t{} {{{}}}", tag, render_value(file_type, data))
}

/// One tagged key of a traversal mismatch report.
pub fn stream_key(tag: &str, key: &RecordKey) -> String {
    format!("\t{} {{{}}}", tag, key)
}

/// Log line for a bulk-loaded row.
///
/// Row-stores log the key on its own line before the value.
pub fn bulk_line(file_type: FileType, row: u64, key: Option<&[u8]>, value: &[u8]) -> String {
    let mut out = String::new();
    if let Some(key) = key {
        let _ = writeln!(
            out,
            "{:<width$} {} {{{}}}",
            "bulk K",
            row,
            escape_bytes(key),
            width = LABEL_WIDTH
        );
    }
    let _ = write!(
        out,
        "{:<width$} {} {{{}}}",
        "bulk V",
        row,
        render_value(file_type, value),
        width = LABEL_WIDTH
    );
    out
}

/// Log line for one driver step.
pub fn op_line(file_type: FileType, record: &OpRecord) -> String {
    let label = record.kind.label();
    let row = record.row.map(|r| r.to_string()).unwrap_or_default();
    let value = record
        .value
        .as_deref()
        .map(|v| render_value(file_type, v))
        .unwrap_or_default();

    match record.kind {
        OpKind::Read | OpKind::Delete if record.not_found => {
            format!("{:<width$}{} (not found)", label, row, width = LABEL_WIDTH)
        }
        OpKind::Read if record.value.is_some() => {
            format!("{:<width$}{} {{{}}}", label, row, value, width = LABEL_WIDTH)
        }
        OpKind::Read | OpKind::Delete => format!("{:<width$}{}", label, row, width = LABEL_WIDTH),
        OpKind::Next | OpKind::Prev => {
            let key = record.key.as_ref().map(|k| k.to_string()).unwrap_or_default();
            format!("{:<width$}{{{}/{}}}", label, key, value, width = LABEL_WIDTH)
        }
        OpKind::Insert | OpKind::Update => match &record.key {
            Some(RecordKey::Row(key)) => format!(
                "{:<width$}{{{}}}\n{:<width$}{{{}}}",
                format!("{}K", label),
                escape_bytes(key),
                format!("{}V", label),
                value,
                width = LABEL_WIDTH
            ),
            _ => format!("{:<width$}{} {{{}}}", label, row, value, width = LABEL_WIDTH),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_printable_passthrough() {
        assert_eq!(escape_bytes(b"0000000001.00/abc"), "0000000001.00/abc");
    }

    #[test]
    fn test_escape_non_printable_as_hex() {
        assert_eq!(escape_bytes(&[b'a', 0x00, 0x7f, 0xff, b'z']), "a007fffz");
        assert_eq!(escape_bytes(b"\n"), "0a");
    }

    #[test]
    fn test_render_fix_value() {
        assert_eq!(render_value(FileType::Fix, &[0x0a]), "0x0a");
        assert_eq!(render_value(FileType::Fix, &[]), "0x00");
        assert_eq!(render_value(FileType::Var, &[0x0a]), "0a");
    }

    #[test]
    fn test_stream_item_format() {
        assert_eq!(stream_item("engine", FileType::Row, b"ab"), "\tengine {ab}");
        assert_eq!(stream_item("reference", FileType::Fix, &[3]), "\treference {0x03}");
    }

    #[test]
    fn test_op_line_read() {
        let record = OpRecord::new(OpKind::Read, Some(42));
        assert_eq!(op_line(FileType::Row, &record), "read      42");
    }

    #[test]
    fn test_op_line_read_shows_value() {
        let record = OpRecord::new(OpKind::Read, Some(42)).with_value(b"v42".to_vec());
        assert_eq!(op_line(FileType::Var, &record), "read      42 {v42}");
        let record = OpRecord::new(OpKind::Read, Some(8)).with_value(vec![0x05]);
        assert_eq!(op_line(FileType::Fix, &record), "read      8 {0x05}");
    }

    #[test]
    fn test_op_line_delete_not_found() {
        let record = OpRecord::new(OpKind::Delete, Some(9)).with_not_found(true);
        assert_eq!(op_line(FileType::Var, &record), "delete    9 (not found)");
    }

    #[test]
    fn test_op_line_column_put() {
        let record = OpRecord::new(OpKind::Update, Some(7))
            .with_key(RecordKey::Recno(7))
            .with_value(vec![0x1f]);
        assert_eq!(op_line(FileType::Fix, &record), "put       7 {0x1f}");
    }

    #[test]
    fn test_op_line_row_insert_has_key_and_value_lines() {
        let record = OpRecord::new(OpKind::Insert, Some(3))
            .with_key(RecordKey::Row(b"k3".to_vec()))
            .with_value(b"v3".to_vec());
        assert_eq!(
            op_line(FileType::Row, &record),
            "insertK   {k3}\ninsertV   {v3}"
        );
    }

    #[test]
    fn test_op_line_cursor_step() {
        let record = OpRecord::new(OpKind::Next, None)
            .with_key(RecordKey::Recno(11))
            .with_value(b"x".to_vec());
        assert_eq!(op_line(FileType::Var, &record), "next      {11/x}");
    }

    #[test]
    fn test_bulk_line() {
        let line = bulk_line(FileType::Row, 1, Some(b"k"), b"v");
        assert_eq!(line, "bulk K     1 {k}\nbulk V     1 {v}");
        let line = bulk_line(FileType::Fix, 2, None, &[0xff]);
        assert_eq!(line, "bulk V     2 {0xff}");
    }
}
