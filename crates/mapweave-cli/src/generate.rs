//! `generate` and `plan` command implementations

use crate::config::MapweaveConfig;
use crate::emitter;
use crate::scanner::{ScanOutput, Scanner};
use anyhow::{Context, Result};
use mapweave_core::{MapweaveResult, Severity};
use mapweave_engine::{GenerationOutput, Generator};
use std::path::Path;

/// Scanned input together with the plans built from it.
pub struct Generated {
    pub scan: ScanOutput,
    pub output: GenerationOutput,
}

impl Generated {
    /// Print scanner warnings, then every diagnostic to stderr, worst first
    /// within each plan.
    pub fn report(&self) {
        for warning in &self.scan.warnings {
            eprintln!("warning: {warning}");
        }
        for plan in &self.output.plans {
            let mut diagnostics: Vec<_> = plan.diagnostics.iter().collect();
            diagnostics.sort_by_key(|d| std::cmp::Reverse(d.severity));
            for diagnostic in diagnostics {
                eprintln!("{diagnostic}");
            }
        }
    }

    /// Under `deny_warnings`, fail when any plan carries an error or warning.
    ///
    /// Plans with errors still emit code, so without the flag a run only fails
    /// on host-level problems.
    pub fn ensure_clean(&self, deny_warnings: bool) -> Result<()> {
        let errors = self.output.diagnostic_count(Severity::Error);
        let warnings = self.output.diagnostic_count(Severity::Warning);

        if deny_warnings && errors + warnings > 0 {
            anyhow::bail!(
                "generation finished with {errors} error(s) and {warnings} warning(s) (denied)"
            );
        }
        if errors > 0 {
            tracing::warn!(errors, "some mappings could not be generated");
        }

        Ok(())
    }
}

/// Scan `input` and build one plan per mapper method.
pub fn build(input: &Path, config: &MapweaveConfig) -> Result<Generated> {
    let options = config.generator_options();
    let scan = Scanner::new(options.mapper_attribute.clone())
        .with_defaults(config.defaults())
        .scan_file(input)
        .with_context(|| format!("Failed to scan {}", input.display()))?;

    tracing::info!(
        input = %input.display(),
        requests = scan.requests.len(),
        "scanned mapper declarations"
    );

    let output = Generator::new(options)
        .generate(&scan.registry, &scan.requests)
        .context("Generation failed")?;

    Ok(Generated { scan, output })
}

/// Generate mapper implementations into `output`.
pub fn run(
    input: &Path,
    output: &Path,
    config: &MapweaveConfig,
    deny_warnings: bool,
) -> Result<()> {
    let generated = build(input, config)?;
    generated.report();

    let source = emitter::emit(&generated.scan.registry, &generated.output.plans)
        .context("Failed to emit generated code")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, source)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✓ Generated {} mapping(s) into {}",
        generated.output.plans.len(),
        output.display()
    );

    generated.ensure_clean(deny_warnings)
}

/// Print (or write) the plans of `input` as JSON.
pub fn plan(
    input: &Path,
    output: Option<&Path>,
    config: &MapweaveConfig,
    deny_warnings: bool,
) -> Result<()> {
    let generated = build(input, config)?;
    generated.report();

    let json = to_json(&generated.output).context("Failed to serialize plans")?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    generated.ensure_clean(deny_warnings)
}

pub fn to_json(output: &GenerationOutput) -> MapweaveResult<String> {
    Ok(serde_json::to_string_pretty(&output.plans)?)
}
