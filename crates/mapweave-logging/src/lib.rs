//! mapweave-logging - Tracing subscriber setup
//!
//! This crate provides:
//! - [`init_logging`] to install the process-wide subscriber
//! - [`ReloadHandle`] to change the level after installation
//! - [`level_filter`] to translate a [`LogLevel`] for `tracing-subscriber`

mod reload;
mod subscriber;

pub use mapweave_core::LogLevel;
pub use reload::{ReloadHandle, level_filter};
pub use subscriber::{LoggingError, RUST_LOG_ENV, init_logging};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, LoggingError, ReloadHandle, init_logging};
}
