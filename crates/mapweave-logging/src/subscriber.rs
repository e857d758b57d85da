//! Process-wide subscriber installation

use crate::reload::{ReloadHandle, level_filter};
use mapweave_core::LogLevel;
use thiserror::Error;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

/// Environment variable whose directives take precedence over the
/// configured level.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("logging has not been initialized")]
    NotInitialized,

    #[error("failed to reload level filter: {0}")]
    Reload(String),
}

/// Install a subscriber that writes formatted events to stderr.
///
/// The level filter starts at `level` and can be changed later through
/// [`ReloadHandle::global`]. When `RUST_LOG` holds valid directives they
/// decide what is logged and the level filter is opened up to `TRACE`.
///
/// Returns [`LoggingError::AlreadyInitialized`] if another subscriber won
/// the race; logging then goes wherever that subscriber sends it.
pub fn init_logging(level: LogLevel) -> Result<(), LoggingError> {
    let env_filter = env_filter();
    let initial = if env_filter.is_some() {
        LevelFilter::TRACE
    } else {
        level_filter(level)
    };

    let (filter, handle) = reload::Layer::new(initial);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    ReloadHandle::global().set_handle(handle);

    tracing::debug!(%level, "logging initialized");
    Ok(())
}

fn env_filter() -> Option<EnvFilter> {
    std::env::var(RUST_LOG_ENV)
        .ok()
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
}
