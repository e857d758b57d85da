//! Type strategy resolver
//!
//! Decides how one target value is produced from one source value. The rules
//! are tried in a fixed order and the first applicable one wins:
//!
//! 1. a hand-written method on the mapper with the exact signature
//! 2. identical types, or a lossless primitive conversion
//! 3. enum to enum
//! 4. container to container, resolving the element pair recursively
//! 5. struct to struct, through a nested plan
//! 6. `Option` on either side, wrapping the resolved inner strategy
//!
//! Anything else fails. Failures are returned to the caller, which decides
//! where the diagnostic belongs.

use crate::plan::{
    CollectionPlan, Container, ContainerConstruction, Conversion, EnumArm, EnumPlan, MethodRef,
    NullDirection, NullPlan, PlanRef, Strategy,
};
use mapweave_core::{
    DiagnosticCode, EnumDecl, EnumStrategy, MapperDecl, MappingConfiguration, NullHandling,
    StructDecl, TypeRef, TypeRegistry,
};
use std::fmt;

/// Where the resolved value will be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Assigned after construction; may be left out.
    Assignment,
    /// Passed to the constructor; must always produce a value.
    Argument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Member(Slot),
    /// An element of a container; `fixed` when the target is an array.
    Element { fixed: bool },
    /// The value returned by the request itself.
    Root,
}

impl Position {
    /// Whether a missing value may be dropped instead of produced.
    fn may_skip(self) -> bool {
        matches!(
            self,
            Position::Member(Slot::Assignment) | Position::Element { fixed: false }
        )
    }
}

/// Why no strategy could be chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: DiagnosticCode,
    pub message: String,
}

impl Failure {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Resolves struct pairs into plan references. Implemented by the builder,
/// which owns the recursion guard and the helper memo.
pub trait NestedResolver {
    fn nested_object(
        &mut self,
        source: &StructDecl,
        target: &StructDecl,
        key_source: &TypeRef,
        key_target: &TypeRef,
    ) -> Result<PlanRef, Failure>;
}

#[derive(Debug, Clone, Copy)]
pub struct StrategyResolver<'a> {
    registry: &'a TypeRegistry,
    config: &'a MappingConfiguration,
    mapper: Option<&'a MapperDecl>,
}

impl<'a> StrategyResolver<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        config: &'a MappingConfiguration,
        mapper: Option<&'a MapperDecl>,
    ) -> Self {
        Self {
            registry,
            config,
            mapper,
        }
    }

    pub fn resolve(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        position: Position,
        nested: &mut dyn NestedResolver,
    ) -> Result<Strategy, Failure> {
        // A request never delegates to a user method with its own signature.
        if position != Position::Root
            && let Some(method) = self.mapper.and_then(|m| m.user_method_for(source, target))
        {
            return Ok(Strategy::UserMethod(MethodRef {
                name: method.name.clone(),
            }));
        }

        if source == target {
            return Ok(Strategy::Direct(Conversion::Identity));
        }

        if let (TypeRef::Primitive(from), TypeRef::Primitive(to)) = (source, target)
            && from.widens_to(*to)
        {
            return Ok(Strategy::Direct(Conversion::Widen {
                from: *from,
                to: *to,
            }));
        }

        if let (Some(source_enum), Some(target_enum)) = (self.enum_of(source), self.enum_of(target))
        {
            return self.resolve_enum(source_enum, target_enum);
        }

        if let (Some(source_container), Some(target_container)) =
            (Container::of(source), Container::of(target))
        {
            return self.resolve_collection(
                source,
                target,
                source_container,
                target_container,
                nested,
            );
        }

        if let (Some(source_struct), Some(target_struct)) =
            (self.struct_of(source), self.struct_of(target))
        {
            return nested
                .nested_object(source_struct, target_struct, source, target)
                .map(Strategy::NestedObject);
        }

        if source.is_optional() || target.is_optional() {
            return self.resolve_optional(source, target, position, nested);
        }

        Err(self.no_strategy(source, target))
    }

    fn enum_of(&self, ty: &TypeRef) -> Option<&'a EnumDecl> {
        ty.as_named().and_then(|name| self.registry.enum_decl(name))
    }

    fn struct_of(&self, ty: &TypeRef) -> Option<&'a StructDecl> {
        ty.as_named().and_then(|name| self.registry.struct_decl(name))
    }

    fn no_strategy(&self, source: &TypeRef, target: &TypeRef) -> Failure {
        let missing = [source, target]
            .into_iter()
            .filter_map(TypeRef::as_named)
            .find(|name| self.registry.get(name).is_none());

        if let Some(name) = missing {
            return Failure::new(
                DiagnosticCode::TypeNotFound,
                format!("type '{name}' is not declared in the scanned sources"),
            );
        }

        Failure::new(
            DiagnosticCode::NoMappingStrategy,
            format!("no mapping strategy found between types '{source}' and '{target}'"),
        )
    }

    fn resolve_enum(&self, source: &EnumDecl, target: &EnumDecl) -> Result<Strategy, Failure> {
        for decl in [source, target] {
            if !decl.fieldless {
                return Err(Failure::new(
                    DiagnosticCode::NoMappingStrategy,
                    format!("enum '{}' has variants carrying data", decl.name),
                ));
            }
        }

        let fallback = match &self.config.enum_fallback {
            Some(variant) if !target.has_variant(variant) => {
                return Err(Failure::new(
                    DiagnosticCode::UnknownConfiguredMember,
                    format!(
                        "enum fallback '{variant}' is not a variant of '{}'",
                        target.name
                    ),
                ));
            }
            Some(variant) => Some(variant.clone()),
            None if self.config.null_handling == NullHandling::MapToDefault => {
                target.default_variant.clone()
            }
            None => None,
        };

        let target_values = target.values();
        let counterpart = |name: &str, value: i128| -> Option<String> {
            match self.config.enum_strategy {
                EnumStrategy::ByName => target.has_variant(name).then(|| name.to_string()),
                EnumStrategy::ByValue => target_values
                    .iter()
                    .find(|(_, v)| *v == value)
                    .map(|(n, _)| n.to_string()),
            }
        };

        let mut arms = Vec::with_capacity(source.variants.len());
        let mut missing = Vec::new();
        let mut used_fallback = false;

        for (name, value) in source.values() {
            match (counterpart(name, value), &fallback) {
                (Some(target_variant), _) => arms.push(EnumArm {
                    source: name.to_string(),
                    target: target_variant,
                }),
                (None, Some(fallback)) => {
                    used_fallback = true;
                    arms.push(EnumArm {
                        source: name.to_string(),
                        target: fallback.clone(),
                    });
                }
                (None, None) => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(Failure::new(
                DiagnosticCode::UnmappedEnumVariant,
                format!(
                    "variants {} of '{}' have no counterpart in '{}' ({})",
                    missing.join(", "),
                    source.name,
                    target.name,
                    self.config.enum_strategy
                ),
            ));
        }

        Ok(Strategy::Enum(EnumPlan {
            mode: self.config.enum_strategy,
            arms,
            fallback: fallback.filter(|_| used_fallback),
        }))
    }

    fn resolve_collection(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        source_container: Container,
        target_container: Container,
        nested: &mut dyn NestedResolver,
    ) -> Result<Strategy, Failure> {
        let construction = match target_container {
            Container::Array(len) => match source_container {
                Container::Array(source_len) if source_len == len => {
                    ContainerConstruction::FixedArray(len)
                }
                _ => {
                    return Err(Failure::new(
                        DiagnosticCode::ArrayLengthMismatch,
                        format!("'{target}' needs a source array of length {len}, found '{source}'"),
                    ));
                }
            },
            Container::Collection(kind)
                if source_container.has_known_length() && kind.supports_capacity() =>
            {
                ContainerConstruction::Presized
            }
            Container::Collection(_) => ContainerConstruction::Append,
        };

        let (Some(source_element), Some(target_element)) = (source.element(), target.element())
        else {
            return Err(self.no_strategy(source, target));
        };

        let fixed = matches!(construction, ContainerConstruction::FixedArray(_));
        let element = self
            .resolve(
                source_element,
                target_element,
                Position::Element { fixed },
                nested,
            )
            .map_err(|failure| Failure {
                code: failure.code,
                message: format!("element of '{target}': {}", failure.message),
            })?;

        Ok(Strategy::Collection(CollectionPlan {
            element: Box::new(element),
            source: source_container,
            target: target_container,
            construction,
        }))
    }

    fn resolve_optional(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        position: Position,
        nested: &mut dyn NestedResolver,
    ) -> Result<Strategy, Failure> {
        let handling = self.config.null_handling;

        let (inner_source, inner_target, direction) = match (source, target) {
            (TypeRef::Optional(s), TypeRef::Optional(t)) => (&**s, &**t, NullDirection::Both),
            (TypeRef::Optional(s), t) => (&**s, t, NullDirection::Unwrap),
            (s, TypeRef::Optional(t)) => (s, &**t, NullDirection::WrapSome),
            _ => return Err(self.no_strategy(source, target)),
        };

        if direction == NullDirection::Unwrap {
            match handling {
                NullHandling::IgnoreMember if !position.may_skip() => {
                    return Err(Failure::new(
                        DiagnosticCode::UnsupportedNullHandling,
                        format!(
                            "'{source}' cannot be skipped when None here; \
                             use throw or map_to_default"
                        ),
                    ));
                }
                NullHandling::MapToDefault
                    if !self.registry.is_default_constructible(inner_target) =>
                {
                    return Err(Failure::new(
                        DiagnosticCode::UnsupportedNullHandling,
                        format!("'{inner_target}' has no default value to use for None"),
                    ));
                }
                _ => {}
            }
        }

        let inner = self.resolve(inner_source, inner_target, position, nested)?;

        Ok(Strategy::NullConditional(NullPlan {
            inner: Box::new(inner),
            handling,
            direction,
            target: inner_target.clone(),
        }))
    }
}
