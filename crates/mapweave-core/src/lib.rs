//! mapweave-core - Shared data model for mapping generation
//!
//! This crate provides the types the resolution engine and its collaborators
//! exchange:
//! - [`TypeRegistry`] and the type shapes it holds
//! - [`MappingRequest`] and [`MappingConfiguration`]
//! - [`Diagnostic`] for member- and request-level problems
//! - [`MapweaveError`] for run-level failures

mod config;
mod diagnostic;
mod error;
mod model;
mod request;

pub use config::{EnumStrategy, MappingConfiguration, NullHandling};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use error::{MapweaveError, MapweaveResult};
pub use model::{
    AccessorDecl, CollectionKind, ConstructorDecl, EnumDecl, FieldDecl, MapperDecl, MethodSig,
    ParamDecl, Primitive, StructDecl, TypeDecl, TypeRef, TypeRegistry, VariantDecl, Visibility,
};
pub use request::{MappingRequest, PlanKey};

use serde::{Deserialize, Serialize};

/// Log levels understood by the logging setup and configuration files
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Diagnostic, DiagnosticCode, EnumStrategy, LogLevel, MappingConfiguration, MappingRequest,
        MapweaveError, MapweaveResult, NullHandling, PlanKey, Severity, TypeRef, TypeRegistry,
    };
}
