//! Clap command definition and conversion of matches into a run plan.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use kvformat_core::{FileType, FormatConfig, Result};

/// Build the command tree.
pub fn build_cli() -> Command {
    Command::new("kvformat")
        .about("Differential tester for key-value storage engines")
        .arg(
            Arg::new("config")
                .help("Run configuration file (TOML)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("file-type")
                .long("file-type")
                .short('t')
                .help("Schema variant: row, var or fix")
                .value_parser(value_parser!(FileType)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .short('s')
                .help("Random seed of the first run (later runs add 1 each)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .help("Rows to bulk-load")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("ops")
                .long("ops")
                .help("Operations per run")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("runs")
                .long("runs")
                .short('r')
                .help("Number of runs")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("logging")
                .long("logging")
                .short('l')
                .help("Log every operation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-default-config")
                .long("print-default-config")
                .help("Print a commented default configuration and exit")
                .action(ArgAction::SetTrue)
                .conflicts_with("config"),
        )
}

/// What the command line asks for.
#[derive(Debug)]
pub enum CliAction {
    /// Print the default configuration file
    PrintDefaultConfig,
    /// Run the harness with this configuration
    Run(FormatConfig),
}

/// Resolve matches into an action. Flags override the configuration file.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction> {
    if matches.get_flag("print-default-config") {
        return Ok(CliAction::PrintDefaultConfig);
    }

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => FormatConfig::from_file(path)?,
        None => FormatConfig::default(),
    };
    if let Some(file_type) = matches.get_one::<FileType>("file-type") {
        config.file_type = *file_type;
        if *file_type != FileType::Row {
            config.reverse = false;
        }
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(rows) = matches.get_one::<u64>("rows") {
        config.rows = *rows;
    }
    if let Some(ops) = matches.get_one::<u64>("ops") {
        config.ops = *ops;
    }
    if let Some(runs) = matches.get_one::<u32>("runs") {
        config.runs = *runs;
    }
    if matches.get_flag("logging") {
        config.logging = true;
    }

    config.validate()?;
    Ok(CliAction::Run(config))
}
