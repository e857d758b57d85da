//! Mapping requests as produced by the declaration scanner

use crate::config::MappingConfiguration;
use crate::model::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a mapping: the (source, target) type pair.
///
/// Plans refer to each other by key, never by ownership.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanKey {
    pub source: TypeRef,
    pub target: TypeRef,
}

impl PlanKey {
    pub fn new(source: TypeRef, target: TypeRef) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// One declared intent to generate a mapping method
///
/// Immutable once created by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    pub source: TypeRef,
    pub target: TypeRef,

    /// Type carrying the mapper annotation
    pub declaring_type: String,

    /// Name of the method to generate
    pub method: String,

    #[serde(default)]
    pub configuration: MappingConfiguration,
}

impl MappingRequest {
    pub fn new(
        declaring_type: impl Into<String>,
        method: impl Into<String>,
        source: TypeRef,
        target: TypeRef,
    ) -> Self {
        Self {
            source,
            target,
            declaring_type: declaring_type.into(),
            method: method.into(),
            configuration: MappingConfiguration::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: MappingConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn key(&self) -> PlanKey {
        PlanKey::new(self.source.clone(), self.target.clone())
    }

    /// `Declaring::method`, used to attribute diagnostics.
    pub fn id(&self) -> String {
        format!("{}::{}", self.declaring_type, self.method)
    }
}
