//! mapweave-cli - Source scanning, code emission and the `mapweave` binary
//!
//! - [`scanner`] reads mapper traits and the types they mention from Rust source
//! - [`emitter`] renders finished plans as Rust implementations
//! - [`config`] loads `mapweave.toml`
//! - [`generate`] ties the three together for the command line

pub mod config;
pub mod emitter;
pub mod generate;
pub mod scanner;
