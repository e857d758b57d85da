//! Mapping plan builder
//!
//! Drives the catalog, matcher, resolver and recursion guard to turn one
//! [`MappingRequest`] into a finished [`MappingPlan`]. Nothing in here fails
//! the request as a whole: every problem becomes a diagnostic and the plan is
//! still produced.

use crate::catalog::{MemberRole, catalog};
use crate::context::{HelperStatus, ResolutionContext};
use crate::diagnostics::DiagnosticCollector;
use crate::guard::{DEFAULT_MAX_DEPTH, Entry};
use crate::matcher::match_members;
use crate::plan::{
    Argument, Construction, HelperPlan, MappingPair, MappingPlan, ObjectPlan, PlanBody, PlanRef, RefScope,
    Strategy,
};
use crate::resolver::{Failure, NestedResolver, Position, Slot, StrategyResolver};
use mapweave_core::{
    ConstructorDecl, DiagnosticCode, Location, MapperDecl, MappingRequest, ParamDecl, PlanKey,
    StructDecl, TypeRef, TypeRegistry, Visibility,
};
use std::collections::{BTreeMap, BTreeSet};

/// Knobs shared by every request of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub max_depth: usize,
    /// Members and constructors below this visibility are not considered.
    pub min_visibility: Visibility,
    /// Emit an info diagnostic for source members no target consumed.
    pub report_unmapped_source: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            min_visibility: Visibility::Crate,
            report_unmapped_source: true,
        }
    }
}

impl BuildOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_visibility(mut self, visibility: Visibility) -> Self {
        self.min_visibility = visibility;
        self
    }

    pub fn with_report_unmapped_source(mut self, report: bool) -> Self {
        self.report_unmapped_source = report;
        self
    }
}

/// Builds plans against one immutable registry.
#[derive(Debug, Clone)]
pub struct PlanBuilder<'r> {
    registry: &'r TypeRegistry,
    options: BuildOptions,
}

impl<'r> PlanBuilder<'r> {
    pub fn new(registry: &'r TypeRegistry, options: BuildOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Resolve `request` into a plan. Building the same request twice yields
    /// equal plans.
    pub fn build(&self, request: &MappingRequest) -> MappingPlan {
        let request_id = request.id();
        let span = tracing::debug_span!("resolve_request", request = %request_id);
        let _entered = span.enter();

        let mapper = self.registry.mapper(&request.declaring_type);
        let taken = mapper
            .into_iter()
            .flat_map(|m| m.user_methods.iter().chain(m.requests.iter()))
            .map(|sig| sig.name.clone());

        let mut scope = RequestScope {
            registry: self.registry,
            options: &self.options,
            request,
            mapper,
            ctx: ResolutionContext::new(request_id, self.options.max_depth, taken),
        };

        let overrides = scope.check_configuration();
        let body = scope.build_root(&overrides);
        scope.finalize(body)
    }
}

/// Outcome of sweeping one object plan for references to failed mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Clean,
    Pruned,
    /// A constructor argument was lost; the object can no longer be built.
    Broken,
}

struct RequestScope<'b> {
    registry: &'b TypeRegistry,
    options: &'b BuildOptions,
    request: &'b MappingRequest,
    mapper: Option<&'b MapperDecl>,
    ctx: ResolutionContext,
}

impl<'b> RequestScope<'b> {
    fn resolver(&self) -> StrategyResolver<'b> {
        StrategyResolver::new(self.registry, &self.request.configuration, self.mapper)
    }

    fn struct_of(&self, ty: &TypeRef) -> Option<&'b StructDecl> {
        ty.as_named().and_then(|name| self.registry.struct_decl(name))
    }

    /// Report configuration problems once and return the usable overrides.
    fn check_configuration(&mut self) -> BTreeMap<String, String> {
        let request = self.request;
        let config = &request.configuration;

        for option in &config.unrecognized_options {
            self.ctx.report(
                DiagnosticCode::UnknownOption,
                format!("unknown option '{option}' is ignored"),
            );
        }

        let mut overrides = BTreeMap::new();
        let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();

        for (source, target) in &config.member_name_map {
            if config.is_ignored(source) || config.is_ignored(target) {
                self.ctx.report(
                    DiagnosticCode::ContradictoryOption,
                    format!(
                        "'{source}' -> '{target}' names an ignored member; the explicit mapping is ignored"
                    ),
                );
                continue;
            }
            if let Some(first) = claimed.get(target.as_str()) {
                self.ctx.report(
                    DiagnosticCode::ContradictoryOption,
                    format!("'{target}' is mapped from both '{first}' and '{source}'; using '{first}'"),
                );
                continue;
            }
            claimed.insert(target.as_str(), source.as_str());
            overrides.insert(source.clone(), target.clone());
        }

        overrides
    }

    fn build_root(&mut self, overrides: &BTreeMap<String, String>) -> PlanBody {
        let request = self.request;
        let key = request.key();

        let (Some(source), Some(target)) = (
            self.struct_of(&request.source),
            self.struct_of(&request.target),
        ) else {
            self.report_unused_member_options(overrides);
            let resolver = self.resolver();
            return match resolver.resolve(&request.source, &request.target, Position::Root, self) {
                Ok(strategy) => {
                    tracing::trace!(strategy = strategy.kind(), "resolved root value");
                    PlanBody::Value(strategy)
                }
                Err(failure) => {
                    self.ctx.report(failure.code, failure.message);
                    PlanBody::Unmappable
                }
            };
        };

        let token = match self.ctx.guard.enter_or_reuse(&key, &request.method) {
            Ok(Entry::Fresh(token)) => token,
            Ok(Entry::Reuse(_)) | Err(_) => {
                self.ctx.report(
                    DiagnosticCode::MaxDepthExceeded,
                    format!("maximum depth {} leaves no room for '{key}'", self.options.max_depth),
                );
                return PlanBody::Unmappable;
            }
        };

        let ignored = &request.configuration.ignored_members;
        let plan = self.build_object(source, target, Some(ignored), overrides);
        self.ctx.guard.release(token);

        plan.map_or(PlanBody::Unmappable, PlanBody::Object)
    }

    /// Member options only apply to struct roots.
    fn report_unused_member_options(&mut self, overrides: &BTreeMap<String, String>) {
        for (source, target) in overrides {
            self.ctx.report(
                DiagnosticCode::UnknownConfiguredMember,
                format!("'{source}' -> '{target}' has no members to apply to"),
            );
        }
        for member in &self.request.configuration.ignored_members {
            self.ctx.report(
                DiagnosticCode::UnknownConfiguredMember,
                format!("ignored member '{member}' has no members to apply to"),
            );
        }
    }

    fn build_object(
        &mut self,
        source: &StructDecl,
        target: &StructDecl,
        ignored: Option<&BTreeSet<String>>,
        overrides: &BTreeMap<String, String>,
    ) -> Option<ObjectPlan> {
        let min_visibility = self.options.min_visibility;
        let mut sources = catalog(source, MemberRole::Source, min_visibility);
        let mut targets = catalog(target, MemberRole::Target, min_visibility);

        if let Some(ignored) = ignored {
            for name in ignored {
                let known = sources.iter().chain(targets.iter()).any(|m| &m.name == name);
                if !known {
                    self.ctx.report(
                        DiagnosticCode::UnknownConfiguredMember,
                        format!(
                            "ignored member '{name}' exists on neither '{}' nor '{}'",
                            source.name, target.name
                        ),
                    );
                }
            }
            sources.retain(|m| !ignored.contains(&m.name));
            targets.retain(|m| !ignored.contains(&m.name));
        }

        let outcome = match_members(&sources, &targets, overrides);

        for (source_name, target_name) in &outcome.unknown_overrides {
            self.ctx.report(
                DiagnosticCode::UnknownConfiguredMember,
                format!("'{source_name}' -> '{target_name}' names a member that does not exist"),
            );
        }
        for ambiguity in &outcome.ambiguities {
            self.ctx.report_member(
                &ambiguity.target,
                DiagnosticCode::AmbiguousMatch,
                format!(
                    "'{}' matches {} ignoring case; map it explicitly",
                    ambiguity.target,
                    ambiguity.candidates.join(", ")
                ),
            );
        }
        for suppressed in &outcome.suppressed {
            self.ctx.report_member(
                &suppressed.target,
                DiagnosticCode::OverriddenAutomaticMatch,
                format!(
                    "explicit source '{}' replaces automatic match '{}'",
                    suppressed.explicit_source, suppressed.automatic_source
                ),
            );
        }
        for member in &outcome.unmatched_target {
            if outcome.is_ambiguous(&member.name) {
                continue;
            }
            self.ctx.report_member(
                &member.name,
                DiagnosticCode::UnmappedTargetMember,
                format!("'{}' has no source member on '{}'", member.name, source.name),
            );
        }
        if self.options.report_unmapped_source {
            for member in &outcome.unmatched_source {
                self.ctx.report_member(
                    &member.name,
                    DiagnosticCode::UnmappedSourceMember,
                    format!("'{}' of '{}' is not mapped", member.name, source.name),
                );
            }
        }

        let resolver = self.resolver();
        let mut resolved: Vec<(MappingPair, bool)> = Vec::with_capacity(outcome.pairs.len());

        for pair in &outcome.pairs {
            // Without `Default` every member ends up in a constructor call.
            let slot = if pair.target.is_writable && target.has_default {
                Slot::Assignment
            } else {
                Slot::Argument
            };

            self.ctx.path.push(pair.target.name.clone());
            let result = resolver.resolve(
                &pair.source.declared_type,
                &pair.target.declared_type,
                Position::Member(slot),
                self,
            );
            match result {
                Ok(strategy) => {
                    tracing::trace!(
                        member = %pair.target.name,
                        kind = ?pair.kind,
                        strategy = strategy.kind(),
                        "resolved member"
                    );
                    resolved.push((
                        MappingPair {
                            source_member: pair.source.name.clone(),
                            target_member: pair.target.name.clone(),
                            source_type: pair.source.declared_type.clone(),
                            target_type: pair.target.declared_type.clone(),
                            strategy,
                        },
                        pair.target.is_writable,
                    ));
                }
                Err(failure) => {
                    tracing::trace!(member = %pair.target.name, %failure, "member excluded");
                    self.ctx.report(failure.code, failure.message);
                }
            }
            self.ctx.path.pop();
        }

        self.select_construction(target, resolved)
    }

    /// Pick how the target is created and split pairs into constructor
    /// arguments and assignments. Parameters nothing was mapped to are
    /// filled with their default value when the type has one.
    fn select_construction(
        &mut self,
        target: &StructDecl,
        resolved: Vec<(MappingPair, bool)>,
    ) -> Option<ObjectPlan> {
        let registry = self.registry;
        let candidates: Vec<ConstructorDecl> = target
            .construction_candidates()
            .into_iter()
            .filter(|c| c.visibility >= self.options.min_visibility)
            .collect();

        let supplied = |param: &ParamDecl| {
            resolved.iter().any(|(pair, _)| {
                pair.target_member == param.name
                    && pair.target_type == param.ty
                    && !pair.strategy.may_skip()
            })
        };
        // A parameter may only be defaulted when no resolved pair is lost by it.
        let fillable = |param: &ParamDecl| {
            supplied(param)
                || (registry.is_default_constructible(&param.ty)
                    && !resolved.iter().any(|(pair, _)| pair.target_member == param.name))
        };
        let supplies = |constructor: &&ConstructorDecl| constructor.params.iter().all(supplied);
        let fills = |constructor: &&ConstructorDecl| constructor.params.iter().all(fillable);

        let constructor_only: Vec<&str> = resolved
            .iter()
            .filter(|(_, writable)| !writable)
            .map(|(pair, _)| pair.target_member.as_str())
            .collect();
        let covers = |constructor: &&ConstructorDecl| {
            constructor_only
                .iter()
                .all(|name| constructor.params.iter().any(|p| p.name == *name))
        };
        let missing = |constructor: &ConstructorDecl| {
            constructor.params.iter().filter(|&p| !supplied(p)).count()
        };

        let chosen = match most_params(candidates.iter().filter(supplies).filter(covers)) {
            Some(constructor) => Some(constructor),
            None if target.has_default => None,
            None => {
                let fitting = fewest_missing(candidates.iter().filter(fills).filter(covers), missing)
                    .or_else(|| fewest_missing(candidates.iter().filter(fills), missing));
                match fitting {
                    Some(constructor) => Some(constructor),
                    None => {
                        let unfilled: BTreeSet<&str> = candidates
                            .iter()
                            .flat_map(|c| c.params.iter())
                            .filter(|&p| !fillable(p))
                            .map(|p| p.name.as_str())
                            .collect();
                        let mut message = format!(
                            "no accessible constructor of '{}' can be called with the mapped members",
                            target.name
                        );
                        if !unfilled.is_empty() {
                            let names: Vec<&str> = unfilled.into_iter().collect();
                            message.push_str(&format!("; nothing supplies {}", names.join(", ")));
                        }
                        self.ctx.report(DiagnosticCode::NoConstructor, message);
                        return None;
                    }
                }
            }
        };

        let takes = |name: &str| chosen.is_some_and(|c| c.params.iter().any(|p| p.name == name));

        for name in constructor_only.iter().copied().filter(|name| !takes(name)) {
            self.ctx.report_member(
                name,
                DiagnosticCode::ReadOnlyTargetMember,
                format!("'{name}' can only be set through a constructor that cannot be used here"),
            );
        }

        let construction = match chosen {
            None => Construction::Default,
            Some(constructor) => {
                let arguments = constructor
                    .params
                    .iter()
                    .map(|param| {
                        match resolved.iter().find(|(pair, _)| pair.target_member == param.name) {
                            Some((pair, _)) if supplied(param) => Argument::Mapped(pair.clone()),
                            _ => Argument::Default {
                                member: param.name.clone(),
                                ty: param.ty.clone(),
                            },
                        }
                    })
                    .collect::<Vec<_>>();
                for argument in arguments.iter().filter(|a| a.as_pair().is_none()) {
                    tracing::debug!(
                        member = argument.member(),
                        constructor = %constructor.name,
                        "parameter filled with its default value"
                    );
                }
                Construction::Constructor {
                    name: constructor.name.clone(),
                    literal: constructor.literal,
                    arguments,
                }
            }
        };

        let assignments = resolved
            .iter()
            .filter(|(pair, writable)| *writable && !takes(&pair.target_member))
            .map(|(pair, _)| pair.clone())
            .collect();

        Some(ObjectPlan {
            construction,
            assignments,
        })
    }

    /// Drop everything that depends on a failed mapping, prune unreachable
    /// helpers and assemble the plan.
    fn finalize(mut self, mut body: PlanBody) -> MappingPlan {
        let request = self.request;
        let root_key = request.key();

        let mut failed = self.ctx.helpers.failed_keys();
        if matches!(body, PlanBody::Unmappable) {
            failed.insert(root_key.clone());
        }

        loop {
            let before = failed.len();

            match &mut body {
                PlanBody::Object(plan) => {
                    let outcome = sweep_object(
                        self.registry,
                        plan,
                        &failed,
                        &self.ctx.request_id,
                        &[],
                        &mut self.ctx.diagnostics,
                    );
                    if outcome == Sweep::Broken {
                        body = PlanBody::Unmappable;
                        failed.insert(root_key.clone());
                    }
                }
                PlanBody::Value(strategy) => {
                    if depends_on(strategy, &failed) {
                        self.ctx.report(
                            DiagnosticCode::DependsOnFailedMapping,
                            "the value depends on a nested mapping that could not be built",
                        );
                        body = PlanBody::Unmappable;
                    }
                }
                PlanBody::Unmappable => {}
            }

            for key in self.ctx.helpers.completed_keys() {
                let origin = self.ctx.helpers.origin(&key).unwrap_or_default().to_vec();
                let Some(plan) = self.ctx.helpers.plan_mut(&key) else {
                    continue;
                };
                let outcome = sweep_object(
                    self.registry,
                    plan,
                    &failed,
                    &self.ctx.request_id,
                    &origin,
                    &mut self.ctx.diagnostics,
                );
                if outcome == Sweep::Broken {
                    self.ctx.helpers.fail(&key);
                    failed.insert(key);
                }
            }

            if failed.len() == before {
                break;
            }
        }

        let mut helpers = std::mem::take(&mut self.ctx.helpers).into_helpers();
        let reachable = reachable_keys(&body, &helpers);
        helpers.retain(|helper| reachable.contains(&helper.key));

        let diagnostics = self.ctx.diagnostics.drain();
        tracing::debug!(
            helpers = helpers.len(),
            diagnostics = diagnostics.len(),
            mappable = !matches!(body, PlanBody::Unmappable),
            "plan finalized"
        );

        MappingPlan {
            request: self.ctx.request_id,
            declaring_type: request.declaring_type.clone(),
            method: request.method.clone(),
            key: root_key,
            body,
            helpers,
            diagnostics,
        }
    }
}

impl NestedResolver for RequestScope<'_> {
    fn nested_object(
        &mut self,
        source: &StructDecl,
        target: &StructDecl,
        key_source: &TypeRef,
        key_target: &TypeRef,
    ) -> Result<PlanRef, Failure> {
        let key = PlanKey::new(key_source.clone(), key_target.clone());
        let root_key = self.request.key();

        if key != root_key
            && let Some(sibling) = self
                .mapper
                .and_then(|m| m.request_for(key_source, key_target))
        {
            tracing::debug!(%key, method = %sibling.name, "referencing sibling request");
            return Ok(PlanRef::sibling(key, sibling.name.clone()));
        }

        match self.ctx.helpers.status(&key) {
            Some(HelperStatus::Done) => {
                let method = self.ctx.helpers.method(&key).unwrap_or_default().to_string();
                return Ok(PlanRef::local(key, method));
            }
            Some(HelperStatus::Failed) => {
                return Err(Failure::new(
                    DiagnosticCode::DependsOnFailedMapping,
                    format!("nested mapping '{key}' could not be built"),
                ));
            }
            Some(HelperStatus::Pending) | None => {}
        }

        let method = match self.ctx.helpers.method(&key) {
            Some(method) => method.to_string(),
            None if key == root_key => self.request.method.clone(),
            None => self.ctx.helpers.reserve(
                key.clone(),
                &source.name,
                &target.name,
                self.ctx.path.clone(),
            ),
        };

        match self.ctx.guard.enter_or_reuse(&key, &method) {
            Ok(Entry::Reuse(plan_ref)) => Ok(plan_ref),
            Err(exceeded) => {
                self.ctx.helpers.discard(&key);
                Err(Failure::new(
                    DiagnosticCode::MaxDepthExceeded,
                    format!("{exceeded} while mapping '{key}'"),
                ))
            }
            Ok(Entry::Fresh(token)) => {
                tracing::debug!(%key, %method, depth = token.depth(), "resolving nested mapping");

                let plan = self.build_object(source, target, None, &BTreeMap::new());
                self.ctx.guard.release(token);

                match plan {
                    Some(plan) => {
                        self.ctx.helpers.complete(&key, plan);
                        Ok(PlanRef::local(key, method))
                    }
                    None => {
                        self.ctx.helpers.fail(&key);
                        Err(Failure::new(
                            DiagnosticCode::DependsOnFailedMapping,
                            format!("nested mapping '{key}' could not be built"),
                        ))
                    }
                }
            }
        }
    }
}

/// The constructor with the most parameters; ties go to the earliest.
fn most_params<'c>(
    candidates: impl Iterator<Item = &'c ConstructorDecl>,
) -> Option<&'c ConstructorDecl> {
    candidates.fold(None, |best, candidate| match best {
        Some(best) if best.params.len() >= candidate.params.len() => Some(best),
        _ => Some(candidate),
    })
}

/// The constructor needing the fewest defaulted parameters, then the one
/// with the most parameters; ties go to the earliest.
fn fewest_missing<'c>(
    candidates: impl Iterator<Item = &'c ConstructorDecl>,
    missing: impl Fn(&ConstructorDecl) -> usize,
) -> Option<&'c ConstructorDecl> {
    candidates.fold(None, |best, candidate| match best {
        Some(best)
            if (missing(best), std::cmp::Reverse(best.params.len()))
                <= (missing(candidate), std::cmp::Reverse(candidate.params.len())) =>
        {
            Some(best)
        }
        _ => Some(candidate),
    })
}

fn depends_on(strategy: &Strategy, failed: &BTreeSet<PlanKey>) -> bool {
    let mut references = Vec::new();
    strategy.collect_references(&mut references);
    references
        .iter()
        .any(|r| r.scope == RefScope::Local && failed.contains(&r.key))
}

/// Keys of the helpers reachable from the root body through local references.
fn reachable_keys(body: &PlanBody, helpers: &[HelperPlan]) -> BTreeSet<PlanKey> {
    let mut reachable = BTreeSet::new();
    let mut pending: Vec<&PlanRef> = Vec::new();
    body.collect_references(&mut pending);

    while let Some(plan_ref) = pending.pop() {
        if plan_ref.scope != RefScope::Local || !reachable.insert(plan_ref.key.clone()) {
            continue;
        }
        if let Some(helper) = helpers.iter().find(|h| h.key == plan_ref.key) {
            helper.body.collect_references(&mut pending);
        }
    }

    reachable
}

fn sweep_object(
    registry: &TypeRegistry,
    plan: &mut ObjectPlan,
    failed: &BTreeSet<PlanKey>,
    request_id: &str,
    origin: &[String],
    diagnostics: &mut DiagnosticCollector,
) -> Sweep {
    let location = |member: &str| {
        let mut path = origin.to_vec();
        path.push(member.to_string());
        Location::with_path(request_id, path)
    };

    let mut outcome = Sweep::Clean;
    let before = plan.assignments.len();

    if let Construction::Constructor {
        name, arguments, ..
    } = &mut plan.construction
    {
        for argument in arguments.iter_mut() {
            let Argument::Mapped(pair) = argument else {
                continue;
            };
            if !depends_on(&pair.strategy, failed) {
                continue;
            }
            diagnostics.report(
                DiagnosticCode::DependsOnFailedMapping,
                location(&pair.target_member),
                format!(
                    "argument '{}' of '{name}' depends on a nested mapping that could not be built",
                    pair.target_member
                ),
            );
            let fallback = registry
                .is_default_constructible(&pair.target_type)
                .then(|| Argument::Default {
                    member: pair.target_member.clone(),
                    ty: pair.target_type.clone(),
                });
            match fallback {
                Some(fallback) => {
                    *argument = fallback;
                    if outcome == Sweep::Clean {
                        outcome = Sweep::Pruned;
                    }
                }
                None => outcome = Sweep::Broken,
            }
        }
    }

    plan.assignments.retain(|pair| {
        if !depends_on(&pair.strategy, failed) {
            return true;
        }
        diagnostics.report(
            DiagnosticCode::DependsOnFailedMapping,
            location(&pair.target_member),
            format!(
                "'{}' depends on a nested mapping that could not be built",
                pair.target_member
            ),
        );
        false
    });

    if outcome == Sweep::Clean && plan.assignments.len() != before {
        outcome = Sweep::Pruned;
    }

    outcome
}

#[cfg(test)]
#[path = "builder/builder_tests.rs"]
mod builder_tests;
