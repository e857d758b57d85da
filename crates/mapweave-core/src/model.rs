//! Type shape snapshot consumed by the resolution engine
//!
//! The [`TypeRegistry`] is filled once by a declaration scanner and is then
//! read-only for the duration of a generation run, so it can be shared by
//! reference across worker threads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    String,
}

impl Primitive {
    /// Look up a primitive by its Rust spelling.
    pub fn from_ident(ident: &str) -> Option<Self> {
        let primitive = match ident {
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "i128" => Primitive::I128,
            "isize" => Primitive::Isize,
            "u8" => Primitive::U8,
            "u16" => Primitive::U16,
            "u32" => Primitive::U32,
            "u64" => Primitive::U64,
            "u128" => Primitive::U128,
            "usize" => Primitive::Usize,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,
            "String" => Primitive::String,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::String => "String",
        }
    }

    /// Whether a value of `self` converts into `target` without data loss.
    ///
    /// Mirrors the `From` implementations the standard library provides
    /// between primitive types.
    pub fn widens_to(self, target: Primitive) -> bool {
        use Primitive::*;

        match self {
            Bool => matches!(
                target,
                I8 | I16 | I32 | I64 | I128 | Isize | U8 | U16 | U32 | U64 | U128 | Usize
            ),
            Char => matches!(target, U32 | U64 | U128 | String),
            U8 => matches!(
                target,
                Char | U16 | U32 | U64 | U128 | Usize | I16 | I32 | I64 | I128 | Isize | F32 | F64
            ),
            U16 => matches!(
                target,
                U32 | U64 | U128 | Usize | I32 | I64 | I128 | F32 | F64
            ),
            U32 => matches!(target, U64 | U128 | I64 | I128 | F64),
            U64 => matches!(target, U128 | I128),
            I8 => matches!(target, I16 | I32 | I64 | I128 | Isize | F32 | F64),
            I16 => matches!(target, I32 | I64 | I128 | Isize | F32 | F64),
            I32 => matches!(target, I64 | I128 | F64),
            I64 => matches!(target, I128),
            F32 => matches!(target, F64),
            I128 | Isize | U128 | Usize | F64 | String => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Iterable container families the engine knows how to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Vec,
    VecDeque,
    HashSet,
    BTreeSet,
    /// Boxed slice (`Box<[T]>`).
    Slice,
    /// Boxed iterator (`Box<dyn Iterator<Item = T>>`); length unknown up front.
    Iterator,
}

impl CollectionKind {
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "Vec" => Some(CollectionKind::Vec),
            "VecDeque" => Some(CollectionKind::VecDeque),
            "HashSet" => Some(CollectionKind::HashSet),
            "BTreeSet" => Some(CollectionKind::BTreeSet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Vec => "Vec",
            CollectionKind::VecDeque => "VecDeque",
            CollectionKind::HashSet => "HashSet",
            CollectionKind::BTreeSet => "BTreeSet",
            CollectionKind::Slice => "Box<[_]>",
            CollectionKind::Iterator => "Iterator",
        }
    }

    /// Whether the element count is available before iterating.
    pub fn has_known_length(self) -> bool {
        !matches!(self, CollectionKind::Iterator)
    }

    /// Whether the container can be allocated with a capacity hint.
    pub fn supports_capacity(self) -> bool {
        matches!(
            self,
            CollectionKind::Vec | CollectionKind::VecDeque | CollectionKind::HashSet
        )
    }
}

/// A type expression as it appears on a member, parameter or request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(Primitive),
    /// A struct or enum declared in the [`TypeRegistry`].
    Named(String),
    Optional(Box<TypeRef>),
    Collection {
        kind: CollectionKind,
        element: Box<TypeRef>,
    },
    Array {
        element: Box<TypeRef>,
        len: usize,
    },
    /// Anything the scanner could not classify; only identical types map.
    Opaque(String),
}

impl TypeRef {
    pub fn primitive(primitive: Primitive) -> Self {
        TypeRef::Primitive(primitive)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(Box::new(inner))
    }

    pub fn vec(element: TypeRef) -> Self {
        Self::collection(CollectionKind::Vec, element)
    }

    pub fn collection(kind: CollectionKind, element: TypeRef) -> Self {
        TypeRef::Collection {
            kind,
            element: Box::new(element),
        }
    }

    pub fn array(element: TypeRef, len: usize) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            len,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeRef::Optional(_))
    }

    /// Name of a registry-declared type, if this is one.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Element type of a collection or array.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Collection { element, .. } | TypeRef::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Strip one level of `Option`.
    pub fn without_option(&self) -> &TypeRef {
        match self {
            TypeRef::Optional(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{p}"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Optional(inner) => write!(f, "Option<{inner}>"),
            TypeRef::Collection { kind, element } => match kind {
                CollectionKind::Slice => write!(f, "Box<[{element}]>"),
                CollectionKind::Iterator => write!(f, "Box<dyn Iterator<Item = {element}>>"),
                other => write!(f, "{}<{element}>", other.as_str()),
            },
            TypeRef::Array { element, len } => write!(f, "[{element}; {len}]"),
            TypeRef::Opaque(text) => f.write_str(text),
        }
    }
}

/// Accessibility of a declared member, ordered from least to most visible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    /// `pub(crate)`, `pub(super)` and `pub(in ..)`.
    Crate,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
    /// Readable by mappers but never assigned after construction.
    pub read_only: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility,
            read_only: false,
        }
    }

    pub fn public(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, Visibility::Public)
    }

    pub fn private(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, Visibility::Private)
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// A `&self` getter returning a member value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorDecl {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A way to build an instance from arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub visibility: Visibility,
    /// The implicit struct-literal initializer rather than an associated fn.
    pub literal: bool,
}

impl ConstructorDecl {
    pub fn new(name: impl Into<String>, params: Vec<ParamDecl>) -> Self {
        Self {
            name: name.into(),
            params,
            visibility: Visibility::Public,
            literal: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub accessors: Vec<AccessorDecl>,
    pub constructors: Vec<ConstructorDecl>,
    /// Implements `Default`.
    pub has_default: bool,
}

impl StructDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            accessors: Vec::new(),
            constructors: Vec::new(),
            has_default: false,
        }
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_accessor(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        visibility: Visibility,
    ) -> Self {
        self.accessors.push(AccessorDecl {
            name: name.into(),
            ty,
            visibility,
        });
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The struct-literal initializer. It is only as visible as the least
    /// visible field.
    pub fn literal_constructor(&self) -> ConstructorDecl {
        let visibility = self
            .fields
            .iter()
            .map(|f| f.visibility)
            .min()
            .unwrap_or(Visibility::Public);

        ConstructorDecl {
            name: self.name.clone(),
            params: self
                .fields
                .iter()
                .map(|f| ParamDecl::new(f.name.clone(), f.ty.clone()))
                .collect(),
            visibility,
            literal: true,
        }
    }

    /// Declared constructors in order, followed by the struct literal.
    pub fn construction_candidates(&self) -> Vec<ConstructorDecl> {
        let mut candidates = self.constructors.clone();
        candidates.push(self.literal_constructor());
        candidates
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    pub discriminant: Option<i128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<VariantDecl>,
    /// Variant marked `#[default]`.
    pub default_variant: Option<String>,
    /// No variant carries data.
    pub fieldless: bool,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            default_variant: None,
            fieldless: true,
        }
    }

    pub fn with_variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(VariantDecl {
            name: name.into(),
            discriminant: None,
        });
        self
    }

    pub fn with_valued_variant(mut self, name: impl Into<String>, discriminant: i128) -> Self {
        self.variants.push(VariantDecl {
            name: name.into(),
            discriminant: Some(discriminant),
        });
        self
    }

    pub fn with_default_variant(mut self, name: impl Into<String>) -> Self {
        self.default_variant = Some(name.into());
        self
    }

    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v.name == name)
    }

    /// Variants paired with their effective discriminant.
    ///
    /// Implicit discriminants continue from the previous variant, starting at 0.
    pub fn values(&self) -> Vec<(&str, i128)> {
        let mut next = 0i128;
        self.variants
            .iter()
            .map(|variant| {
                let value = variant.discriminant.unwrap_or(next);
                next = value.wrapping_add(1);
                (variant.name.as_str(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDecl {
    Struct(StructDecl),
    Enum(EnumDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Struct(s) => &s.name,
            TypeDecl::Enum(e) => &e.name,
        }
    }
}

/// A method signature declared on a mapper type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub source: TypeRef,
    pub target: TypeRef,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, source: TypeRef, target: TypeRef) -> Self {
        Self {
            name: name.into(),
            source,
            target,
        }
    }
}

/// A type carrying the mapper annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperDecl {
    pub name: String,
    /// Hand-written mapping methods; they override automatic resolution.
    pub user_methods: Vec<MethodSig>,
    /// Methods whose bodies are to be generated.
    pub requests: Vec<MethodSig>,
}

impl MapperDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_user_method(mut self, method: MethodSig) -> Self {
        self.user_methods.push(method);
        self
    }

    pub fn with_request(mut self, method: MethodSig) -> Self {
        self.requests.push(method);
        self
    }

    /// First user method with exactly this signature.
    pub fn user_method_for(&self, source: &TypeRef, target: &TypeRef) -> Option<&MethodSig> {
        self.user_methods
            .iter()
            .find(|m| &m.source == source && &m.target == target)
    }

    /// First generated method with exactly this signature.
    pub fn request_for(&self, source: &TypeRef, target: &TypeRef) -> Option<&MethodSig> {
        self.requests
            .iter()
            .find(|m| &m.source == source && &m.target == target)
    }
}

/// Every type and mapper visible to one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDecl>,
    mappers: BTreeMap<String, MapperDecl>,
    attributes: BTreeSet<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_struct(mut self, decl: StructDecl) -> Self {
        self.insert_type(TypeDecl::Struct(decl));
        self
    }

    pub fn with_enum(mut self, decl: EnumDecl) -> Self {
        self.insert_type(TypeDecl::Enum(decl));
        self
    }

    pub fn with_mapper(mut self, decl: MapperDecl) -> Self {
        self.insert_mapper(decl);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.register_attribute(name);
        self
    }

    /// Insert a type declaration; a later declaration with the same name wins.
    pub fn insert_type(&mut self, decl: TypeDecl) {
        self.types.insert(decl.name().to_string(), decl);
    }

    pub fn insert_mapper(&mut self, decl: MapperDecl) {
        self.mappers.insert(decl.name.clone(), decl);
    }

    /// Record an attribute name that is in scope for the scanned sources.
    pub fn register_attribute(&mut self, name: impl Into<String>) {
        self.attributes.insert(name.into());
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        match self.types.get(name) {
            Some(TypeDecl::Struct(decl)) => Some(decl),
            _ => None,
        }
    }

    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        match self.types.get(name) {
            Some(TypeDecl::Enum(decl)) => Some(decl),
            _ => None,
        }
    }

    pub fn mapper(&self, name: &str) -> Option<&MapperDecl> {
        self.mappers.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    pub fn mappers(&self) -> impl Iterator<Item = &MapperDecl> {
        self.mappers.values()
    }

    /// Whether `T::default()` is available for the type.
    pub fn is_default_constructible(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(_) | TypeRef::Optional(_) => true,
            TypeRef::Named(name) => match self.types.get(name) {
                Some(TypeDecl::Struct(decl)) => decl.has_default,
                Some(TypeDecl::Enum(decl)) => decl.default_variant.is_some(),
                None => false,
            },
            TypeRef::Collection { kind, .. } => !matches!(kind, CollectionKind::Iterator),
            TypeRef::Array { element, len } => *len <= 32 && self.is_default_constructible(element),
            TypeRef::Opaque(_) => false,
        }
    }
}
