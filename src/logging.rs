use std::fs::{self, OpenOptions};
use std::path::Path;

use log::LevelFilter;

/// Maps `-v` occurrences to a level; warnings are always on.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Sends log records to `path`, leaving the terminal to the TUI.
/// `RUST_LOG` still overrides the level. Logging stays off if the file
/// cannot be opened.
pub fn init(path: &Path, verbosity: u8) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::new()
        .filter_level(level_for(verbosity))
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(std::io::Error::other)
}
