//! Generation run driver
//!
//! Resolves every request of a run on a worker pool. Requests share nothing
//! but the read-only registry, so each one is built by a single worker from
//! start to finish; results are collected in discovery order.

use crate::builder::{BuildOptions, PlanBuilder};
use crate::plan::MappingPlan;
use mapweave_core::{MappingRequest, MapweaveError, MapweaveResult, Severity, TypeRegistry};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_MAPPER_ATTRIBUTE: &str = "mapper";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Attribute that marks mapper declarations; it must be known to the
    /// registry or the run is aborted.
    pub mapper_attribute: String,
    /// Worker count; `None` uses one per available core.
    pub worker_threads: Option<usize>,
    pub build: BuildOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            mapper_attribute: DEFAULT_MAPPER_ATTRIBUTE.to_string(),
            worker_threads: None,
            build: BuildOptions::default(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_mapper_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.mapper_attribute = attribute.into();
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_build(mut self, build: BuildOptions) -> Self {
        self.build = build;
        self
    }
}

/// Shared flag the host sets to abort a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Plans of one run, one per request, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub plans: Vec<MappingPlan>,
}

impl GenerationOutput {
    pub fn diagnostic_count(&self, severity: Severity) -> usize {
        self.plans
            .iter()
            .flat_map(|plan| plan.diagnostics.iter())
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.plans.iter().any(MappingPlan::has_errors)
    }

    /// Plans declared on `mapper`, in request order.
    pub fn plans_for<'o>(&'o self, mapper: &'o str) -> impl Iterator<Item = &'o MappingPlan> {
        self.plans.iter().filter(move |p| p.declaring_type == mapper)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
    cancellation: CancellationToken,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Build one plan per request.
    ///
    /// Member and request problems end up in the plans' diagnostics. The only
    /// errors are a missing mapper attribute, a pool that cannot be created,
    /// and cancellation, which discards every plan of the run.
    pub fn generate(
        &self,
        registry: &TypeRegistry,
        requests: &[MappingRequest],
    ) -> MapweaveResult<GenerationOutput> {
        if requests.is_empty() {
            tracing::debug!("no mapping requests");
            return Ok(GenerationOutput::default());
        }

        if !registry.has_attribute(&self.options.mapper_attribute) {
            return Err(MapweaveError::MissingAnnotation(
                self.options.mapper_attribute.clone(),
            ));
        }

        let mut pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("mapweave-worker-{index}"));
        if let Some(threads) = self.options.worker_threads {
            pool = pool.num_threads(threads);
        }
        let pool = pool
            .build()
            .map_err(|e| MapweaveError::WorkerPool(e.to_string()))?;

        let builder = PlanBuilder::new(registry, self.options.build.clone());
        let cancellation = &self.cancellation;

        let plans: Option<Vec<MappingPlan>> = pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    if cancellation.is_cancelled() {
                        return None;
                    }
                    Some(builder.build(request))
                })
                .collect()
        });

        let plans = match plans {
            Some(plans) if !cancellation.is_cancelled() => plans,
            _ => {
                tracing::warn!("generation cancelled; discarding plans");
                return Err(MapweaveError::Cancelled);
            }
        };

        let output = GenerationOutput { plans };
        tracing::info!(
            requests = output.plans.len(),
            errors = output.diagnostic_count(Severity::Error),
            warnings = output.diagnostic_count(Severity::Warning),
            "generation finished"
        );

        Ok(output)
    }
}
