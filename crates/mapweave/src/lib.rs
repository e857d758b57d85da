//! # mapweave
//!
//! Resolve struct-to-struct mappings ahead of time.
//!
//! A mapper declares methods like `fn to_dto(source: User) -> UserDto;` and
//! mapweave works out, member by member, how the target is produced:
//! - members are paired by name, case-insensitively, with explicit overrides
//! - nested structs get private helper methods, shared and cycle-safe
//! - collections, arrays, options, enums and widening conversions are handled
//! - every problem becomes a [`Diagnostic`] on the request it belongs to
//!
//! ## Quick Start
//!
//! ```
//! use mapweave::prelude::*;
//! use mapweave::{FieldDecl, MapperDecl, Primitive, StructDecl};
//!
//! let id = TypeRef::primitive(Primitive::I64);
//! let registry = TypeRegistry::new()
//!     .with_attribute("mapper")
//!     .with_struct(StructDecl::new("User").with_field(FieldDecl::public("id", id.clone())))
//!     .with_struct(StructDecl::new("UserDto").with_field(FieldDecl::public("id", id)))
//!     .with_mapper(MapperDecl::new("UserMapper"));
//!
//! let request = MappingRequest::new(
//!     "UserMapper",
//!     "to_dto",
//!     TypeRef::named("User"),
//!     TypeRef::named("UserDto"),
//! );
//!
//! let output = Generator::default().generate(&registry, &[request])?;
//! assert!(!output.has_errors());
//! assert!(matches!(output.plans[0].body, PlanBody::Object(_)));
//! # Ok::<(), MapweaveError>(())
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`mapweave_core`] - Type registry, requests, configuration and diagnostics
//! - [`mapweave_engine`] - Plan building and the parallel generator
//! - [`mapweave_logging`] - `tracing` subscriber setup with runtime level changes

// Re-export core types
pub use mapweave_core::{
    AccessorDecl, CollectionKind, ConstructorDecl, Diagnostic, DiagnosticCode, EnumDecl,
    EnumStrategy, FieldDecl, Location, LogLevel, MapperDecl, MappingConfiguration,
    MappingRequest, MapweaveError, MapweaveResult, MethodSig, NullHandling, ParamDecl, PlanKey,
    Primitive, Severity, StructDecl, TypeDecl, TypeRef, TypeRegistry, VariantDecl, Visibility,
};

// Re-export the engine
pub use mapweave_engine::{
    BuildOptions, CancellationToken, EvalError, Evaluator, GenerationOutput, Generator,
    GeneratorOptions, MappingPlan, PlanBody, PlanBuilder, Strategy,
};

/// Plan building blocks for code emitters.
pub mod plan {
    pub use mapweave_engine::plan::*;
}

pub use mapweave_logging::{ReloadHandle, init_logging};

// Re-export common dependencies that hosts need
pub use serde;
pub use serde_json;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use mapweave::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        Diagnostic, Generator, GeneratorOptions, MappingConfiguration, MappingPlan,
        MappingRequest, MapweaveError, MapweaveResult, PlanBody, Severity, TypeRef, TypeRegistry,
    };
}
