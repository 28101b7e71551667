//! ArgMatches → copy invocation.

use std::path::PathBuf;

use clap::ArgMatches;
use tablecopy_core::Result;
use tablecopy_engine::CopyConfig;

/// A fully resolved copy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    pub source: String,
    pub target: String,
    pub store: PathBuf,
    pub config: CopyConfig,
}

/// Resolve arguments, loading `--config` first and applying flags on top.
pub fn matches_to_args(matches: &ArgMatches) -> Result<CopyArgs> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CopyConfig::from_file(path)?,
        None => CopyConfig::default(),
    };
    apply_overrides(&mut config, matches);

    Ok(CopyArgs {
        source: required(matches, "source"),
        target: required(matches, "target"),
        store: matches
            .get_one::<PathBuf>("store")
            .cloned()
            .unwrap_or_default(),
        config,
    })
}

fn required(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn apply_overrides(config: &mut CopyConfig, matches: &ArgMatches) {
    if let Some(n) = matches.get_one::<i64>("num-threads") {
        // Anything unrepresentable becomes 0, which falls back to the default
        config.scanner_count = u32::try_from(*n).unwrap_or(0);
    }
    if matches.get_flag("create-table") {
        config.create_target = true;
    }
    if matches.get_flag("verbose-copy") {
        config.verbose_copy = true;
    }
    if let Some(size) = matches.get_one::<usize>("batch-size") {
        config.batch_size = *size;
    }
    if let Some(retries) = matches.get_one::<usize>("max-retries") {
        config.retry.max_attempts = *retries;
    }
}
