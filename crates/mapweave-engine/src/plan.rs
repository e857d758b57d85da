//! Mapping plan intermediate representation
//!
//! A [`MappingPlan`] is the emit-ready result of resolving one request. It is
//! a tree of [`Strategy`] values; nested object mappings are referenced by
//! [`PlanKey`] through a [`PlanRef`] and never owned, so cyclic type graphs
//! produce finite plans.

use mapweave_core::{
    CollectionKind, Diagnostic, EnumStrategy, NullHandling, PlanKey, Primitive, Severity, TypeRef,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Where a referenced plan lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefScope {
    /// The root or one of the helpers of the same plan.
    Local,
    /// Another request declared on the same mapper.
    Sibling,
}

/// Non-owning reference to another mapping by its key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PlanRef {
    pub key: PlanKey,
    pub method: String,
    pub scope: RefScope,
}

impl PlanRef {
    pub fn local(key: PlanKey, method: impl Into<String>) -> Self {
        Self {
            key,
            method: method.into(),
            scope: RefScope::Local,
        }
    }

    pub fn sibling(key: PlanKey, method: impl Into<String>) -> Self {
        Self {
            key,
            method: method.into(),
            scope: RefScope::Sibling,
        }
    }
}

/// Reference to a hand-written method on the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "conversion", rename_all = "snake_case")]
pub enum Conversion {
    /// Move or clone the value as is.
    Identity,
    /// Lossless primitive conversion (`From`/`Into`).
    Widen { from: Primitive, to: Primitive },
}

/// Shape of one side of a collection mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Collection(CollectionKind),
    Array(usize),
}

impl Container {
    pub fn of(ty: &TypeRef) -> Option<Self> {
        match ty {
            TypeRef::Collection { kind, .. } => Some(Container::Collection(*kind)),
            TypeRef::Array { len, .. } => Some(Container::Array(*len)),
            _ => None,
        }
    }

    pub fn has_known_length(self) -> bool {
        match self {
            Container::Collection(kind) => kind.has_known_length(),
            Container::Array(_) => true,
        }
    }
}

/// How the target container is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerConstruction {
    /// Allocate with the source length, then push.
    Presized,
    /// Grow while iterating.
    Append,
    /// Build a fixed-size array element by element.
    FixedArray(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CollectionPlan {
    pub element: Box<Strategy>,
    pub source: Container,
    pub target: Container,
    pub construction: ContainerConstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumArm {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumPlan {
    pub mode: EnumStrategy,
    /// One arm per source variant, in source declaration order.
    pub arms: Vec<EnumArm>,
    /// Target variant used for source variants without a counterpart.
    pub fallback: Option<String>,
}

/// Which side of the pair is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullDirection {
    /// `Option<S>` to `Option<T>`; `None` stays `None`.
    Both,
    /// `Option<S>` to `T`; `None` is handled per [`NullHandling`].
    Unwrap,
    /// `S` to `Option<T>`; always `Some`.
    WrapSome,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NullPlan {
    pub inner: Box<Strategy>,
    pub handling: NullHandling,
    pub direction: NullDirection,
    /// Target type once the option is stripped, used for default values.
    pub target: TypeRef,
}

impl NullPlan {
    /// A `None` source leaves the member (or element) out entirely.
    pub fn skips_on_none(&self) -> bool {
        self.direction == NullDirection::Unwrap && self.handling == NullHandling::IgnoreMember
    }
}

/// The technique chosen to produce one target value from source data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    Direct(Conversion),
    NestedObject(PlanRef),
    Collection(CollectionPlan),
    Enum(EnumPlan),
    UserMethod(MethodRef),
    NullConditional(NullPlan),
}

impl Strategy {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Direct(_) => "direct",
            Strategy::NestedObject(_) => "nested_object",
            Strategy::Collection(_) => "collection",
            Strategy::Enum(_) => "enum",
            Strategy::UserMethod(_) => "user_method",
            Strategy::NullConditional(_) => "null_conditional",
        }
    }

    /// Collect every plan reference reachable from this strategy.
    pub fn collect_references<'s>(&'s self, out: &mut Vec<&'s PlanRef>) {
        match self {
            Strategy::NestedObject(plan_ref) => out.push(plan_ref),
            Strategy::Collection(plan) => plan.element.collect_references(out),
            Strategy::NullConditional(plan) => plan.inner.collect_references(out),
            Strategy::Direct(_) | Strategy::Enum(_) | Strategy::UserMethod(_) => {}
        }
    }

    /// Whether the strategy may produce no value at all, which rules it out
    /// as a constructor argument.
    pub fn may_skip(&self) -> bool {
        match self {
            Strategy::NullConditional(plan) => plan.skips_on_none(),
            _ => false,
        }
    }
}

/// A matched source/target member with its resolved strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MappingPair {
    pub source_member: String,
    pub target_member: String,
    pub source_type: TypeRef,
    pub target_type: TypeRef,
    pub strategy: Strategy,
}

/// One constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "argument", rename_all = "snake_case")]
pub enum Argument {
    Mapped(MappingPair),
    /// No usable source value; the parameter gets `Default::default()`.
    Default { member: String, ty: TypeRef },
}

impl Argument {
    pub fn member(&self) -> &str {
        match self {
            Argument::Mapped(pair) => &pair.target_member,
            Argument::Default { member, .. } => member,
        }
    }

    pub fn as_pair(&self) -> Option<&MappingPair> {
        match self {
            Argument::Mapped(pair) => Some(pair),
            Argument::Default { .. } => None,
        }
    }
}

/// How the target instance comes into existence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Construction {
    /// `T::default()`, then assign.
    Default,
    /// A constructor or the struct literal; `arguments` follow parameter order.
    Constructor {
        name: String,
        literal: bool,
        arguments: Vec<Argument>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectPlan {
    pub construction: Construction,
    /// Members assigned after construction, in target declaration order.
    pub assignments: Vec<MappingPair>,
}

impl ObjectPlan {
    pub fn arguments(&self) -> &[Argument] {
        match &self.construction {
            Construction::Default => &[],
            Construction::Constructor { arguments, .. } => arguments,
        }
    }

    /// Mapped constructor arguments followed by assignments.
    pub fn pairs(&self) -> impl Iterator<Item = &MappingPair> {
        self.arguments()
            .iter()
            .filter_map(Argument::as_pair)
            .chain(self.assignments.iter())
    }

    /// Constructor parameters filled with their default value.
    pub fn defaulted(&self) -> impl Iterator<Item = &str> {
        self.arguments()
            .iter()
            .filter(|argument| argument.as_pair().is_none())
            .map(Argument::member)
    }

    pub fn pair(&self, target_member: &str) -> Option<&MappingPair> {
        self.pairs().find(|p| p.target_member == target_member)
    }

    pub fn collect_references<'s>(&'s self, out: &mut Vec<&'s PlanRef>) {
        for pair in self.pairs() {
            pair.strategy.collect_references(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanBody {
    /// Struct to struct.
    Object(ObjectPlan),
    /// Any other pair of types, e.g. enum to enum or `Vec<A>` to `Vec<B>`.
    Value(Strategy),
    /// Nothing could be resolved; see the plan's diagnostics.
    Unmappable,
}

impl PlanBody {
    pub fn as_object(&self) -> Option<&ObjectPlan> {
        match self {
            PlanBody::Object(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn collect_references<'s>(&'s self, out: &mut Vec<&'s PlanRef>) {
        match self {
            PlanBody::Object(plan) => plan.collect_references(out),
            PlanBody::Value(strategy) => strategy.collect_references(out),
            PlanBody::Unmappable => {}
        }
    }
}

/// A generated private mapping for a nested type pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HelperPlan {
    pub key: PlanKey,
    pub method: String,
    pub body: ObjectPlan,
}

/// The resolved plan for one mapping request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MappingPlan {
    /// `Declaring::method` of the request
    pub request: String,
    pub declaring_type: String,
    pub method: String,
    pub key: PlanKey,
    pub body: PlanBody,
    /// Helpers in first-use order; keys are unique and differ from `key`.
    pub helpers: Vec<HelperPlan>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MappingPlan {
    pub fn helper(&self, key: &PlanKey) -> Option<&HelperPlan> {
        self.helpers.iter().find(|h| &h.key == key)
    }

    /// Every plan reference in the root body and all helpers.
    pub fn references(&self) -> Vec<&PlanRef> {
        let mut out = Vec::new();
        self.body.collect_references(&mut out);
        for helper in &self.helpers {
            helper.body.collect_references(&mut out);
        }
        out
    }

    /// Whether every local reference resolves to the root or a helper.
    pub fn is_closed(&self) -> bool {
        let mut local: BTreeSet<&PlanKey> = self.helpers.iter().map(|h| &h.key).collect();
        if !matches!(self.body, PlanBody::Unmappable) {
            local.insert(&self.key);
        }

        self.references()
            .into_iter()
            .filter(|r| r.scope == RefScope::Local)
            .all(|r| local.contains(&r.key))
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics at or above `severity`.
    pub fn diagnostics_at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }
}
