//! Structured, non-fatal reports attached to mapping plans

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable diagnostic codes.
///
/// `MW1xxx` are structural, `MW2xxx` configuration and `MW3xxx` informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    TypeNotFound,
    UnmappedTargetMember,
    AmbiguousMatch,
    NoMappingStrategy,
    UnmappedEnumVariant,
    ReadOnlyTargetMember,
    NoConstructor,
    MaxDepthExceeded,
    DependsOnFailedMapping,
    UnsupportedNullHandling,
    ArrayLengthMismatch,
    UnknownOption,
    UnknownConfiguredMember,
    ContradictoryOption,
    UnmappedSourceMember,
    OverriddenAutomaticMatch,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::TypeNotFound => "MW1001",
            DiagnosticCode::UnmappedTargetMember => "MW1002",
            DiagnosticCode::AmbiguousMatch => "MW1003",
            DiagnosticCode::NoMappingStrategy => "MW1004",
            DiagnosticCode::UnmappedEnumVariant => "MW1005",
            DiagnosticCode::ReadOnlyTargetMember => "MW1006",
            DiagnosticCode::NoConstructor => "MW1007",
            DiagnosticCode::MaxDepthExceeded => "MW1008",
            DiagnosticCode::DependsOnFailedMapping => "MW1009",
            DiagnosticCode::UnsupportedNullHandling => "MW1010",
            DiagnosticCode::ArrayLengthMismatch => "MW1011",
            DiagnosticCode::UnknownOption => "MW2001",
            DiagnosticCode::UnknownConfiguredMember => "MW2002",
            DiagnosticCode::ContradictoryOption => "MW2003",
            DiagnosticCode::UnmappedSourceMember => "MW3001",
            DiagnosticCode::OverriddenAutomaticMatch => "MW3002",
        }
    }

    /// Severity used when the engine reports this code.
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::UnmappedTargetMember
            | DiagnosticCode::ReadOnlyTargetMember
            | DiagnosticCode::UnknownOption
            | DiagnosticCode::UnknownConfiguredMember
            | DiagnosticCode::ContradictoryOption => Severity::Warning,
            DiagnosticCode::UnmappedSourceMember | DiagnosticCode::OverriddenAutomaticMatch => {
                Severity::Info
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a diagnostic points: the owning request and the member path below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// `Declaring::method` of the owning request
    pub request: String,

    /// Member names from the request's root type down to the offending member
    #[serde(default)]
    pub path: Vec<String>,
}

impl Location {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            path: Vec::new(),
        }
    }

    pub fn with_path(request: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            request: request.into(),
            path,
        }
    }

    /// The innermost member name, if any.
    pub fn member(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.request)
        } else {
            write!(f, "{} @ {}", self.request, self.path.join("."))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            location,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.code, self.location, self.message
        )
    }
}
