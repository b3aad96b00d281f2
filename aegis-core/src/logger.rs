//! logger.rs - `env_logger` setup for binaries and tests embedding the core.
//!
//! The library itself only logs through the `log` facade. Hosts that want
//! output call [`init_logger`] once, usually with the level from
//! `LoggingConfig::level_filter`.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs an `env_logger` backend.
///
/// With `Some(level)` the aegis crates log at `level` and `RUST_LOG` still
/// applies to everything else; with `None` the filter comes from `RUST_LOG`
/// alone (default `warn`). Returns false if a logger was already installed.
pub fn init_logger(level: Option<LevelFilter>) -> bool {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_module("aegis_core", level);
    }
    builder.format_timestamp_millis().try_init().is_ok()
}
