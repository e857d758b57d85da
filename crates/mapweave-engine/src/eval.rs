//! Plan evaluator
//!
//! Executes a [`MappingPlan`] over `serde_json` values. Structs are JSON
//! objects keyed by member name, enums are variant-name strings, `None` is
//! `null`, and every container is an array. Used to check that a plan does
//! what the emitted code would do without compiling it.

use crate::plan::{
    Argument, CollectionPlan, Construction, Container, ContainerConstruction, Conversion,
    EnumPlan, MappingPlan, NullDirection, NullPlan, ObjectPlan, PlanBody, PlanRef, RefScope,
    Strategy,
};
use mapweave_core::{
    CollectionKind, NullHandling, PlanKey, Primitive, TypeDecl, TypeRef, TypeRegistry,
};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("plan for '{0}' is unmappable")]
    Unmappable(String),

    #[error("source value has no member '{0}'")]
    MissingMember(String),

    #[error("expected {expected}, found {found}")]
    Shape { expected: &'static str, found: Value },

    #[error("variant '{0}' has no arm")]
    UnknownVariant(String),

    #[error("'{0}' was None")]
    NullValue(String),

    #[error("no plan registered for '{0}'")]
    UnresolvedReference(String),

    #[error("user method '{0}' is not registered")]
    UnknownUserMethod(String),

    #[error("'{0}' has no default value")]
    NoDefault(String),

    #[error("array of length {expected} received {found} elements")]
    Length { expected: usize, found: usize },
}

type UserMethod<'e> = Box<dyn Fn(&Value) -> Result<Value, EvalError> + 'e>;

/// Runs one plan, following sibling plans registered with
/// [`Evaluator::with_sibling`].
pub struct Evaluator<'e> {
    registry: &'e TypeRegistry,
    plan: &'e MappingPlan,
    siblings: BTreeMap<PlanKey, &'e MappingPlan>,
    user_methods: BTreeMap<String, UserMethod<'e>>,
}

impl<'e> Evaluator<'e> {
    pub fn new(registry: &'e TypeRegistry, plan: &'e MappingPlan) -> Self {
        Self {
            registry,
            plan,
            siblings: BTreeMap::new(),
            user_methods: BTreeMap::new(),
        }
    }

    pub fn with_sibling(mut self, plan: &'e MappingPlan) -> Self {
        self.siblings.insert(plan.key.clone(), plan);
        self
    }

    pub fn with_user_method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&Value) -> Result<Value, EvalError> + 'e,
    ) -> Self {
        self.user_methods.insert(name.into(), Box::new(method));
        self
    }

    /// Map `input` through the root of the plan.
    pub fn run(&self, input: &Value) -> Result<Value, EvalError> {
        self.run_plan(self.plan, input)
    }

    fn run_plan(&self, plan: &MappingPlan, input: &Value) -> Result<Value, EvalError> {
        match &plan.body {
            PlanBody::Object(object) => self.object(plan, object, &plan.key.target, input),
            PlanBody::Value(strategy) => self
                .apply(plan, strategy, input)?
                .ok_or_else(|| EvalError::NullValue(plan.request.clone())),
            PlanBody::Unmappable => Err(EvalError::Unmappable(plan.request.clone())),
        }
    }

    fn object(
        &self,
        plan: &MappingPlan,
        object: &ObjectPlan,
        target: &TypeRef,
        input: &Value,
    ) -> Result<Value, EvalError> {
        let source = input.as_object().ok_or_else(|| EvalError::Shape {
            expected: "object",
            found: input.clone(),
        })?;

        let mut out = match &object.construction {
            Construction::Default => match self.default_value(target)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Construction::Constructor { .. } => {
                let mut map = Map::new();
                for argument in object.arguments() {
                    if let Argument::Default { member, ty } = argument {
                        map.insert(member.clone(), self.default_value(ty)?);
                    }
                }
                map
            }
        };

        for pair in object.pairs() {
            let value = source
                .get(&pair.source_member)
                .ok_or_else(|| EvalError::MissingMember(pair.source_member.clone()))?;
            if let Some(mapped) = self.apply(plan, &pair.strategy, value)? {
                out.insert(pair.target_member.clone(), mapped);
            }
        }

        Ok(Value::Object(out))
    }

    /// `Ok(None)` means the value is skipped.
    fn apply(
        &self,
        plan: &MappingPlan,
        strategy: &Strategy,
        value: &Value,
    ) -> Result<Option<Value>, EvalError> {
        match strategy {
            Strategy::Direct(conversion) => convert(conversion, value).map(Some),
            Strategy::NestedObject(plan_ref) => self.follow(plan, plan_ref, value).map(Some),
            Strategy::Collection(collection) => self.collection(plan, collection, value).map(Some),
            Strategy::Enum(enum_plan) => map_variant(enum_plan, value).map(Some),
            Strategy::UserMethod(method) => {
                let call = self
                    .user_methods
                    .get(&method.name)
                    .ok_or_else(|| EvalError::UnknownUserMethod(method.name.clone()))?;
                call(value).map(Some)
            }
            Strategy::NullConditional(null_plan) => self.null_conditional(plan, null_plan, value),
        }
    }

    fn follow(
        &self,
        plan: &MappingPlan,
        plan_ref: &PlanRef,
        value: &Value,
    ) -> Result<Value, EvalError> {
        let unresolved = || EvalError::UnresolvedReference(plan_ref.key.to_string());

        match plan_ref.scope {
            RefScope::Sibling => {
                let sibling = self.siblings.get(&plan_ref.key).ok_or_else(unresolved)?;
                self.run_plan(sibling, value)
            }
            RefScope::Local if plan_ref.key == plan.key => self.run_plan(plan, value),
            RefScope::Local => {
                let helper = plan.helper(&plan_ref.key).ok_or_else(unresolved)?;
                self.object(plan, &helper.body, &helper.key.target, value)
            }
        }
    }

    fn collection(
        &self,
        plan: &MappingPlan,
        collection: &CollectionPlan,
        value: &Value,
    ) -> Result<Value, EvalError> {
        let elements = value.as_array().ok_or_else(|| EvalError::Shape {
            expected: "array",
            found: value.clone(),
        })?;

        let mut out = match collection.construction {
            ContainerConstruction::Presized | ContainerConstruction::FixedArray(_) => {
                Vec::with_capacity(elements.len())
            }
            ContainerConstruction::Append => Vec::new(),
        };

        for element in elements {
            if let Some(mapped) = self.apply(plan, &collection.element, element)? {
                out.push(mapped);
            }
        }

        if let ContainerConstruction::FixedArray(len) = collection.construction
            && out.len() != len
        {
            return Err(EvalError::Length {
                expected: len,
                found: out.len(),
            });
        }

        if let Container::Collection(CollectionKind::HashSet | CollectionKind::BTreeSet) =
            collection.target
        {
            let mut unique: Vec<Value> = Vec::with_capacity(out.len());
            for value in out {
                if !unique.contains(&value) {
                    unique.push(value);
                }
            }
            out = unique;
        }

        Ok(Value::Array(out))
    }

    fn null_conditional(
        &self,
        plan: &MappingPlan,
        null_plan: &NullPlan,
        value: &Value,
    ) -> Result<Option<Value>, EvalError> {
        match (null_plan.direction, value) {
            (NullDirection::Both, Value::Null) => Ok(Some(Value::Null)),
            (NullDirection::Unwrap, Value::Null) => match null_plan.handling {
                NullHandling::Throw => Err(EvalError::NullValue(null_plan.target.to_string())),
                NullHandling::IgnoreMember => Ok(None),
                NullHandling::MapToDefault => self.default_value(&null_plan.target).map(Some),
            },
            _ => self.apply(plan, &null_plan.inner, value),
        }
    }

    /// The JSON form of `T::default()`.
    pub fn default_value(&self, ty: &TypeRef) -> Result<Value, EvalError> {
        let no_default = || EvalError::NoDefault(ty.to_string());

        match ty {
            TypeRef::Primitive(primitive) => Ok(primitive_default(*primitive)),
            TypeRef::Optional(_) => Ok(Value::Null),
            TypeRef::Collection { .. } => Ok(Value::Array(Vec::new())),
            TypeRef::Array { element, len } => {
                let value = self.default_value(element)?;
                Ok(Value::Array(vec![value; *len]))
            }
            TypeRef::Named(name) => match self.registry.get(name) {
                Some(TypeDecl::Struct(decl)) if decl.has_default => {
                    let mut map = Map::new();
                    for field in &decl.fields {
                        map.insert(field.name.clone(), self.default_value(&field.ty)?);
                    }
                    Ok(Value::Object(map))
                }
                Some(TypeDecl::Enum(decl)) => decl
                    .default_variant
                    .clone()
                    .map(Value::String)
                    .ok_or_else(no_default),
                _ => Err(no_default()),
            },
            TypeRef::Opaque(_) => Err(no_default()),
        }
    }
}

fn primitive_default(primitive: Primitive) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(false),
        Primitive::Char => Value::String("\0".to_string()),
        Primitive::String => Value::String(String::new()),
        Primitive::F32 | Primitive::F64 => Number::from_f64(0.0).map_or(Value::Null, Value::Number),
        _ => Value::Number(Number::from(0)),
    }
}

fn convert(conversion: &Conversion, value: &Value) -> Result<Value, EvalError> {
    let shape = |expected| EvalError::Shape {
        expected,
        found: value.clone(),
    };

    let Conversion::Widen { from, to } = conversion else {
        return Ok(value.clone());
    };

    match (from, value) {
        (Primitive::Bool, Value::Bool(b)) => Ok(Value::Number(Number::from(u8::from(*b)))),
        (Primitive::Char, Value::String(s)) => {
            let c = s.chars().next().ok_or_else(|| shape("char"))?;
            if *to == Primitive::String {
                Ok(Value::String(c.to_string()))
            } else {
                Ok(Value::Number(Number::from(u32::from(c))))
            }
        }
        (Primitive::U8, Value::Number(n)) if *to == Primitive::Char => {
            let byte = n
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| shape("u8"))?;
            Ok(Value::String(char::from(byte).to_string()))
        }
        (_, Value::Number(n)) if matches!(to, Primitive::F32 | Primitive::F64) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| shape("number")),
        (_, Value::Number(_)) => Ok(value.clone()),
        _ => Err(shape(from.as_str())),
    }
}

fn map_variant(plan: &EnumPlan, value: &Value) -> Result<Value, EvalError> {
    let variant = value.as_str().ok_or_else(|| EvalError::Shape {
        expected: "variant name",
        found: value.clone(),
    })?;

    plan.arms
        .iter()
        .find(|arm| arm.source == variant)
        .map(|arm| Value::String(arm.target.clone()))
        .ok_or_else(|| EvalError::UnknownVariant(variant.to_string()))
}
