//! kvformat command-line runner
//!
//! `kvformat [CONFIG] [flags]` runs the differential harness `runs` times,
//! stopping at the first failing run. Verbosity follows `RUST_LOG`; with
//! `--logging` every operation is logged at `info` under `kvformat::ops`.

mod commands;

use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kvformat_core::{FormatConfig, TracingHandler};
use kvformat_harness::{run, RunContext, RunSummary};

use commands::{build_cli, matches_to_action, CliAction};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kvformat=info")),
        )
        .init();

    let matches = build_cli().get_matches();
    let config = match matches_to_action(&matches) {
        Ok(CliAction::PrintDefaultConfig) => {
            print!("{}", FormatConfig::default_toml());
            return;
        }
        Ok(CliAction::Run(config)) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    for run_index in 0..config.runs {
        let mut run_config = config.clone();
        run_config.seed = config.seed.map(|seed| seed.wrapping_add(u64::from(run_index)));

        match run_once(run_config) {
            Ok(summary) => println!(
                "run {}: {} seed {}: {} rows, {} reads, {} inserts, {} writes, {} deletes, \
                 {} records compared",
                run_index + 1,
                summary.file_type,
                summary.seed,
                summary.rows,
                summary.ops.reads,
                summary.ops.inserts,
                summary.ops.writes,
                summary.ops.deletes,
                summary.compared
            ),
            Err((seed, e)) => {
                error!(target: "kvformat::cli", run = run_index + 1, seed, "Run failed");
                eprintln!("run {} (seed {}) failed: {}", run_index + 1, seed, e);
                process::exit(1);
            }
        }
    }
    info!(target: "kvformat::cli", runs = config.runs, "All runs passed");
}

fn run_once(config: FormatConfig) -> Result<RunSummary, (u64, kvformat_core::Error)> {
    let mut ctx = RunContext::with_handler(config, TracingHandler).map_err(|e| (0, e))?;
    let seed = ctx.seed();
    run(&mut ctx).map_err(|e| (seed, e))
}
