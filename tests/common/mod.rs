//! Shared helpers for the root integration suites.
//!
//! Import via `mod common;` from a suite's main.rs.

#![allow(dead_code)]

use kvformat::{FileType, FormatConfig, RecordingHandler, RunContext, RunSummary};

pub const VARIANTS: [FileType; 3] = [FileType::Row, FileType::Var, FileType::Fix];

/// Small seeded configuration for `file_type`.
pub fn small_config(file_type: FileType, seed: u64) -> FormatConfig {
    FormatConfig {
        file_type,
        rows: 200,
        ops: 400,
        seed: Some(seed),
        ..Default::default()
    }
}

/// Run `config` to completion, panicking with the seed on failure.
pub fn run_clean(config: FormatConfig) -> RunSummary {
    let mut ctx = RunContext::new(config).unwrap();
    let seed = ctx.seed();
    match kvformat::run(&mut ctx) {
        Ok(summary) => summary,
        Err(e) => panic!("seed {} failed: {}", seed, e),
    }
}

/// Run `config` with a recording handler and return the handler.
pub fn run_recorded(config: FormatConfig) -> RecordingHandler {
    let mut ctx = RunContext::with_handler(config, RecordingHandler::default()).unwrap();
    kvformat::run(&mut ctx).unwrap();
    ctx.into_handler()
}
