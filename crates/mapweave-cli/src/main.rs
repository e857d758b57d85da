//! mapweave CLI - Mapper implementation generator
//!
//! Commands:
//! - `mapweave generate` - Generate mapper implementations from a source file
//! - `mapweave plan` - Print the resolved mapping plans as JSON
//! - `mapweave check` - Validate a mapweave.toml config

use anyhow::Result;
use clap::{Parser, Subcommand};
use mapweave_cli::config::{self, MapweaveConfig};
use mapweave_cli::generate;
use mapweave_core::LogLevel;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mapweave")]
#[command(author, version, about = "Generate struct-to-struct mapping code", long_about = None)]
struct Cli {
    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    deny_warnings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate mapper implementations
    Generate {
        /// Rust source file declaring the mapper traits
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the generated code
        #[arg(short, long)]
        output: PathBuf,

        /// Path to mapweave.toml (default: ./mapweave.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print resolved mapping plans as JSON
    Plan {
        /// Rust source file declaring the mapper traits
        #[arg(short, long)]
        input: PathBuf,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to mapweave.toml (default: ./mapweave.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a mapweave.toml config
    Check {
        /// Path to mapweave.toml (default: ./mapweave.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    fn log_level(&self, configured: LogLevel) -> LogLevel {
        match (self.quiet, self.verbose) {
            (true, _) => LogLevel::Error,
            (false, 0) => configured,
            (false, 1) => LogLevel::Debug,
            (false, _) => LogLevel::Trace,
        }
    }
}

/// Load the config and start logging at the level it and the flags ask for.
fn setup(cli: &Cli, config_path: Option<&Path>) -> Result<MapweaveConfig> {
    let config = MapweaveConfig::load(config_path)?;
    mapweave_logging::init_logging(cli.log_level(config.logging.level))?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate {
            input,
            output,
            config,
        } => {
            let config = setup(&cli, config.as_deref())?;
            generate::run(input, output, &config, cli.deny_warnings)?;
        }
        Commands::Plan {
            input,
            output,
            config,
        } => {
            let config = setup(&cli, config.as_deref())?;
            generate::plan(input, output.as_deref(), &config, cli.deny_warnings)?;
        }
        Commands::Check { config: path } => {
            mapweave_logging::init_logging(cli.log_level(LogLevel::Warn))?;
            config::check(path.as_deref())?;
        }
    }

    Ok(())
}
