//! Per-request mapping configuration

use crate::error::MapweaveError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// How enum variants are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumStrategy {
    /// Match variants by identifier.
    #[default]
    ByName,
    /// Match variants by discriminant value.
    ByValue,
}

impl FromStr for EnumStrategy {
    type Err = MapweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by_name" | "ByName" | "name" => Ok(EnumStrategy::ByName),
            "by_value" | "ByValue" | "value" => Ok(EnumStrategy::ByValue),
            other => Err(MapweaveError::Config(format!(
                "unknown enum strategy '{other}' (expected by_name or by_value)"
            ))),
        }
    }
}

impl fmt::Display for EnumStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumStrategy::ByName => write!(f, "by_name"),
            EnumStrategy::ByValue => write!(f, "by_value"),
        }
    }
}

/// What to do when an optional source feeds a required target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullHandling {
    /// Fail at mapping time with a descriptive message.
    #[default]
    Throw,
    /// Leave the target member untouched.
    IgnoreMember,
    /// Substitute the target type's default value.
    MapToDefault,
}

impl FromStr for NullHandling {
    type Err = MapweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throw" | "Throw" => Ok(NullHandling::Throw),
            "ignore_member" | "IgnoreMember" | "ignore" => Ok(NullHandling::IgnoreMember),
            "map_to_default" | "MapToDefault" | "default" => Ok(NullHandling::MapToDefault),
            other => Err(MapweaveError::Config(format!(
                "unknown null handling '{other}' (expected throw, ignore_member or map_to_default)"
            ))),
        }
    }
}

impl fmt::Display for NullHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullHandling::Throw => write!(f, "throw"),
            NullHandling::IgnoreMember => write!(f, "ignore_member"),
            NullHandling::MapToDefault => write!(f, "map_to_default"),
        }
    }
}

/// Options attached to one mapping request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfiguration {
    /// Member names skipped on both the source and the target side
    #[serde(default)]
    pub ignored_members: BTreeSet<String>,

    /// Explicit source member name to target member name overrides
    #[serde(default)]
    pub member_name_map: BTreeMap<String, String>,

    #[serde(default)]
    pub enum_strategy: EnumStrategy,

    #[serde(default)]
    pub null_handling: NullHandling,

    /// Target variant used for source variants with no counterpart
    #[serde(default)]
    pub enum_fallback: Option<String>,

    /// Option names the scanner saw but did not recognize
    ///
    /// Reported once per request; resolution proceeds without them.
    #[serde(default)]
    pub unrecognized_options: Vec<String>,
}

impl MappingConfiguration {
    /// Create a configuration with every option at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip a member by name
    pub fn ignore(mut self, member: impl Into<String>) -> Self {
        self.ignored_members.insert(member.into());
        self
    }

    /// Map `source` onto `target` regardless of their names
    pub fn map_member(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.member_name_map.insert(source.into(), target.into());
        self
    }

    pub fn with_enum_strategy(mut self, strategy: EnumStrategy) -> Self {
        self.enum_strategy = strategy;
        self
    }

    pub fn with_null_handling(mut self, handling: NullHandling) -> Self {
        self.null_handling = handling;
        self
    }

    pub fn with_enum_fallback(mut self, variant: impl Into<String>) -> Self {
        self.enum_fallback = Some(variant.into());
        self
    }

    pub fn with_unrecognized_option(mut self, option: impl Into<String>) -> Self {
        self.unrecognized_options.push(option.into());
        self
    }

    /// Source member explicitly mapped onto `target`, if any.
    ///
    /// Entries are scanned in key order so the result is stable when several
    /// sources name the same target.
    pub fn override_source_for(&self, target: &str) -> Option<&str> {
        self.member_name_map
            .iter()
            .find(|(_, t)| t.as_str() == target)
            .map(|(s, _)| s.as_str())
    }

    pub fn is_ignored(&self, member: &str) -> bool {
        self.ignored_members.contains(member)
    }
}


#[cfg(test)]
#[path = "config/config_parameterized_tests.rs"]
mod config_parameterized_tests;
