//! mapweave.toml parsing and validation

use anyhow::{Context, Result};
use mapweave_core::{EnumStrategy, LogLevel, MappingConfiguration, NullHandling, Visibility};
use mapweave_engine::{BuildOptions, DEFAULT_MAPPER_ATTRIBUTE, DEFAULT_MAX_DEPTH, GeneratorOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "mapweave.toml";

/// mapweave.toml structure; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapweaveConfig {
    #[serde(default)]
    pub generator: GeneratorSection,

    /// Options applied to every request unless the mapper overrides them
    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub mapper_attribute: String,
    pub worker_threads: Option<usize>,
    pub max_depth: usize,
    pub min_visibility: Visibility,
    pub report_unmapped_source: bool,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            mapper_attribute: DEFAULT_MAPPER_ATTRIBUTE.to_string(),
            worker_threads: None,
            max_depth: DEFAULT_MAX_DEPTH,
            min_visibility: Visibility::Crate,
            report_unmapped_source: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsSection {
    pub enum_strategy: EnumStrategy,
    pub null_handling: NullHandling,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: LogLevel,
}

impl MapweaveConfig {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from string
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load the given file, or `mapweave.toml` in the working directory if it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                tracing::debug!("no {DEFAULT_CONFIG_FILE}; using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let attribute = &self.generator.mapper_attribute;
        if attribute.is_empty() {
            anyhow::bail!("Mapper attribute cannot be empty");
        }

        if syn::parse_str::<syn::Ident>(attribute).is_err() {
            anyhow::bail!("Mapper attribute must be a plain identifier, got '{}'", attribute);
        }

        if self.generator.max_depth == 0 {
            anyhow::bail!("max_depth must be at least 1");
        }

        if self.generator.worker_threads == Some(0) {
            anyhow::bail!("worker_threads must be at least 1 when set");
        }

        Ok(())
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        let generator = &self.generator;
        let build = BuildOptions::default()
            .with_max_depth(generator.max_depth)
            .with_min_visibility(generator.min_visibility)
            .with_report_unmapped_source(generator.report_unmapped_source);

        let options = GeneratorOptions::default()
            .with_mapper_attribute(generator.mapper_attribute.clone())
            .with_build(build);

        match generator.worker_threads {
            Some(threads) => options.with_worker_threads(threads),
            None => options,
        }
    }

    /// Starting configuration for every scanned request.
    pub fn defaults(&self) -> MappingConfiguration {
        MappingConfiguration {
            enum_strategy: self.defaults.enum_strategy,
            null_handling: self.defaults.null_handling,
            ..MappingConfiguration::default()
        }
    }
}

/// Check command implementation
pub fn check(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    println!("Checking config: {}", path.display());

    let config = MapweaveConfig::from_file(path)?;
    config.validate()?;

    let generator = &config.generator;
    println!("✓ Mapper attribute: #[{}]", generator.mapper_attribute);
    match generator.worker_threads {
        Some(threads) => println!("✓ Workers: {threads}"),
        None => println!("✓ Workers: one per core"),
    }
    println!("✓ Max depth: {}", generator.max_depth);
    println!(
        "✓ Defaults: enum_strategy = {}, null_handling = {}",
        config.defaults.enum_strategy, config.defaults.null_handling
    );
    println!("\nConfig is valid!");

    Ok(())
}
