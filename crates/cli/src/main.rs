//! tablecopy: copy one table into another with parallel segmented scans.
//!
//! Tables live in a JSON snapshot file (`--store`). The file is loaded,
//! the copy runs, and the updated store is written back. Items written
//! before a mid-copy failure are kept.

mod commands;
mod parse;

use std::process;
use std::sync::Arc;

use tablecopy_core::Result;
use tablecopy_engine::{copy_table, CopyReport};
use tablecopy_storage::{MemoryStore, StoreOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use parse::{matches_to_args, CopyArgs};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_one::<String>("log").map(String::as_str));

    let result = matches_to_args(&matches).and_then(|args| run(&args));
    match result {
        Ok(total) => println!("Total items copied: {}", total),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CopyArgs) -> Result<u64> {
    let store = Arc::new(MemoryStore::load(&args.store, StoreOptions::default())?);
    let outcome = copy_table(
        Arc::clone(&store),
        &args.source,
        &args.target,
        args.config.clone(),
    );

    finish(outcome, || store.save(&args.store))
}

/// Persist the store after a copy and pick the error to report
///
/// Precondition failures leave the store untouched and skip the save. A
/// copy error always wins over a save error; the save error is logged.
fn finish(outcome: Result<CopyReport>, save: impl FnOnce() -> Result<()>) -> Result<u64> {
    if matches!(&outcome, Err(e) if e.is_precondition()) {
        return outcome.map(|r| r.total_items);
    }
    let saved = save();
    match (outcome, saved) {
        (Ok(report), Ok(())) => Ok(report.total_items),
        (Ok(_), Err(save_err)) => Err(save_err),
        (Err(copy_err), Ok(())) => Err(copy_err),
        (Err(copy_err), Err(save_err)) => {
            error!(error = %save_err, "failed to save store after copy failure");
            Err(copy_err)
        }
    }
}
