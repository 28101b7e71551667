//! Clap command definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the `tablecopy` command.
pub fn build_cli() -> Command {
    Command::new("tablecopy")
        .about("Copy every item of one table into another using parallel segmented scans")
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .help("Source table name")
                .required(true),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .help("Target table name")
                .required(true),
        )
        .arg(
            Arg::new("num-threads")
                .short('n')
                .long("num-threads")
                .help("Number of parallel scanners, 1-20; other values use 5")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("create-table")
                .short('c')
                .long("create-table")
                .help("Create the target table if it does not exist")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose-copy")
                .short('v')
                .long("verbose-copy")
                .help("Also copy streams, indexes, encryption and tags to a created target")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .help("JSON snapshot file holding the tables")
                .value_parser(value_parser!(std::path::PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file (flags override it)")
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .help("Items per batch write, at most 25")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-retries")
                .long("max-retries")
                .help("Retries of a failed batch write (default: 0)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .help("Log filter, e.g. \"info\" or \"tablecopy_engine=debug\" (default: RUST_LOG or info)"),
        )
}
