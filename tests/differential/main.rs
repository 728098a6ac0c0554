#[path = "../common/mod.rs"]
mod common;

mod config_files;
mod operation_mix;
mod seeds;
