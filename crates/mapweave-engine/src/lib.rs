//! mapweave-engine - Mapping plan resolution
//!
//! Given a source type, a target type and per-request configuration, the
//! engine decides how every target member is produced and assembles the
//! decisions into a [`MappingPlan`]:
//! - [`catalog`] lists the usable members of a struct
//! - [`match_members`] pairs source and target members by name
//! - [`StrategyResolver`] picks a [`Strategy`] per pair
//! - [`RecursionGuard`] breaks cycles in the type graph
//! - [`PlanBuilder`] drives all of the above for one request
//! - [`Generator`] builds every request of a run in parallel

mod builder;
mod catalog;
mod context;
mod diagnostics;
mod eval;
mod generator;
mod guard;
mod matcher;
pub mod naming;
pub mod plan;
mod resolver;

pub use builder::{BuildOptions, PlanBuilder};
pub use catalog::{MemberDescriptor, MemberRole, catalog};
pub use context::{HelperStatus, HelperTable, ResolutionContext};
pub use diagnostics::DiagnosticCollector;
pub use eval::{EvalError, Evaluator};
pub use generator::{
    CancellationToken, DEFAULT_MAPPER_ATTRIBUTE, GenerationOutput, Generator, GeneratorOptions,
};
pub use guard::{ChainToken, DEFAULT_MAX_DEPTH, DepthExceeded, Entry, RecursionGuard};
pub use matcher::{Ambiguity, MatchKind, MatchOutcome, MatchedPair, SuppressedMatch, match_members};
pub use plan::{
    Argument, CollectionPlan, Construction, Container, ContainerConstruction, Conversion, EnumArm,
    EnumPlan, HelperPlan, MappingPair, MappingPlan, MethodRef, NullDirection, NullPlan, ObjectPlan,
    PlanBody, PlanRef, RefScope, Strategy,
};
pub use resolver::{Failure, NestedResolver, Position, Slot, StrategyResolver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BuildOptions, CancellationToken, GenerationOutput, Generator, GeneratorOptions,
        MappingPlan, PlanBody, PlanBuilder, Strategy,
    };
}
