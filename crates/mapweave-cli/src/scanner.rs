//! Declaration scanner
//!
//! Reads a Rust source file with [`syn`] and produces the [`TypeRegistry`]
//! snapshot plus the ordered list of [`MappingRequest`]s the engine consumes.
//!
//! # Recognized declarations
//!
//! - structs with named fields; `#[derive(Default)]` and the field attribute
//!   `#[mapweave(read_only)]` are honored
//! - enums; discriminants and `#[default]` are recorded
//! - inherent `impl` blocks: `fn name(..) -> Self` becomes a constructor and
//!   `fn name(&self) -> T` an accessor
//! - traits carrying the mapper attribute: methods without a body are
//!   mapping requests, methods with a body are user methods
//!
//! # Request options
//!
//! ```rust,ignore
//! #[mapper(enum_strategy = "by_value", null_handling = "map_to_default")]
//! pub trait UserMapper {
//!     #[map_ignore("password")]
//!     #[map_member(source = "full_name", target = "name")]
//!     fn to_dto(source: User) -> UserDto;
//! }
//! ```
//!
//! Option names the scanner does not know are passed on as unrecognized
//! options so the engine can report them.
//!
//! Declarations are collected into one namespace, inline modules included.
//! When two types share a name the first one wins. Only traits can be
//! mappers; the mapper attribute on any other item is ignored. Both cases are
//! logged and listed in [`ScanOutput::warnings`].

use mapweave_core::{
    AccessorDecl, CollectionKind, ConstructorDecl, EnumDecl, EnumStrategy, FieldDecl, MapperDecl,
    MappingConfiguration, MappingRequest, MapweaveError, MapweaveResult, MethodSig, NullHandling,
    ParamDecl, Primitive, StructDecl, TypeDecl, TypeRef, TypeRegistry, Visibility,
};
use quote::ToTokens;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, Fields, FnArg, GenericArgument, ImplItem, Item, ItemEnum, ItemImpl,
    ItemStruct, ItemTrait, Lit, LitStr, Meta, Pat, PathArguments, ReturnType, Token, TraitItem,
    Type, TypeParamBound, UnOp, UseTree,
};

/// Everything found in one source file.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub registry: TypeRegistry,
    /// In source order.
    pub requests: Vec<MappingRequest>,
    /// Declarations that were skipped, in source order.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    attribute: String,
    defaults: MappingConfiguration,
}

impl Scanner {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            defaults: MappingConfiguration::default(),
        }
    }

    /// Configuration every request starts from before its own options apply.
    pub fn with_defaults(mut self, defaults: MappingConfiguration) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn scan_file(&self, path: &Path) -> MapweaveResult<ScanOutput> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| MapweaveError::Scan(format!("failed to read {}: {e}", path.display())))?;

        self.scan_source(&source)
    }

    pub fn scan_source(&self, source: &str) -> MapweaveResult<ScanOutput> {
        let file = syn::parse_file(source)
            .map_err(|e| MapweaveError::Scan(format!("failed to parse Rust source: {e}")))?;

        let mut collected = Collected::default();
        self.collect(&file.items, &mut collected);

        let mut output = ScanOutput {
            warnings: std::mem::take(&mut collected.warnings),
            ..ScanOutput::default()
        };
        if collected.attribute_in_scope {
            output.registry.register_attribute(self.attribute.clone());
        }

        for item in &collected.impls {
            apply_impl(item, &mut collected.structs);
        }
        for decl in collected.structs.into_values() {
            output.registry.insert_type(TypeDecl::Struct(decl));
        }
        for decl in collected.enums {
            output.registry.insert_type(TypeDecl::Enum(decl));
        }

        for item in &collected.mappers {
            let (mapper, requests) = self.mapper(item);
            output.registry.insert_mapper(mapper);
            output.requests.extend(requests);
        }

        tracing::debug!(
            types = output.registry.types().count(),
            mappers = output.registry.mappers().count(),
            requests = output.requests.len(),
            "scanned source"
        );

        Ok(output)
    }

    fn collect<'f>(&self, items: &'f [Item], collected: &mut Collected<'f>) {
        for item in items {
            match item {
                Item::Use(item) if imports(&item.tree, &self.attribute) => {
                    collected.attribute_in_scope = true;
                }
                Item::Struct(item) => {
                    self.reject_mapper_attribute(&item.attrs, "struct", &item.ident, collected);
                    if let Some(decl) = struct_decl(item)
                        && collected.claim(&decl.name)
                    {
                        collected.structs.insert(decl.name.clone(), decl);
                    }
                }
                Item::Enum(item) => {
                    self.reject_mapper_attribute(&item.attrs, "enum", &item.ident, collected);
                    let decl = enum_decl(item);
                    if collected.claim(&decl.name) {
                        collected.enums.push(decl);
                    }
                }
                Item::Impl(item) if item.trait_.is_none() => collected.impls.push(item),
                Item::Trait(item) => {
                    if let Some(attr) = self.mapper_attribute(&item.attrs) {
                        // `#[mapweave::mapper]` names the attribute by path.
                        if attr.path().segments.len() > 1 {
                            collected.attribute_in_scope = true;
                        }
                        collected.mappers.push(item);
                    }
                }
                Item::Mod(item) => {
                    if let Some((_, items)) = &item.content {
                        self.collect(items, collected);
                    }
                }
                _ => {}
            }
        }
    }

    fn reject_mapper_attribute(
        &self,
        attrs: &[Attribute],
        kind: &str,
        ident: &syn::Ident,
        collected: &mut Collected<'_>,
    ) {
        if self.mapper_attribute(attrs).is_none() {
            return;
        }
        tracing::warn!(item = %ident, kind, "mapper attribute is only supported on traits");
        collected.warnings.push(format!(
            "#[{}] on {kind} '{ident}' is ignored; declare the mapper as a trait",
            self.attribute
        ));
    }

    fn mapper_attribute<'a>(&self, attrs: &'a [Attribute]) -> Option<&'a Attribute> {
        attrs.iter().find(|attr| {
            attr.path()
                .segments
                .last()
                .is_some_and(|segment| segment.ident == self.attribute)
        })
    }

    fn mapper(&self, item: &ItemTrait) -> (MapperDecl, Vec<MappingRequest>) {
        let name = item.ident.to_string();
        let mut base = self.defaults.clone();
        if let Some(attr) = self.mapper_attribute(&item.attrs) {
            apply_options(attr, &mut base);
        }

        let mut mapper = MapperDecl::new(&name);
        let mut requests = Vec::new();

        for trait_item in &item.items {
            let TraitItem::Fn(method) = trait_item else {
                continue;
            };
            let method_name = method.sig.ident.to_string();
            let Some((source, target)) = signature(&method.sig) else {
                tracing::warn!(
                    mapper = %name,
                    method = %method_name,
                    "skipping method: expected `fn(source: S) -> T` without a receiver"
                );
                continue;
            };
            let sig = MethodSig::new(&method_name, source.clone(), target.clone());

            if method.default.is_some() {
                mapper = mapper.with_user_method(sig);
                continue;
            }

            let mut configuration = base.clone();
            for attr in &method.attrs {
                apply_method_attribute(attr, &mut configuration);
            }
            mapper = mapper.with_request(sig);
            requests.push(
                MappingRequest::new(&name, &method_name, source, target)
                    .with_configuration(configuration),
            );
        }

        (mapper, requests)
    }
}

/// Scan `source` for mappers marked with `attribute`.
pub fn scan_source(source: &str, attribute: &str) -> MapweaveResult<ScanOutput> {
    Scanner::new(attribute).scan_source(source)
}

#[derive(Default)]
struct Collected<'f> {
    attribute_in_scope: bool,
    names: BTreeSet<String>,
    structs: BTreeMap<String, StructDecl>,
    enums: Vec<EnumDecl>,
    impls: Vec<&'f ItemImpl>,
    mappers: Vec<&'f ItemTrait>,
    warnings: Vec<String>,
}

impl Collected<'_> {
    /// Reserve a type name; later declarations with the same name lose.
    fn claim(&mut self, name: &str) -> bool {
        if self.names.insert(name.to_string()) {
            return true;
        }
        tracing::warn!(name, "duplicate type name, keeping the first declaration");
        self.warnings.push(format!(
            "type '{name}' is declared more than once; the first declaration is used"
        ));
        false
    }
}

fn imports(tree: &UseTree, name: &str) -> bool {
    match tree {
        UseTree::Path(path) => imports(&path.tree, name),
        UseTree::Name(leaf) => leaf.ident == name,
        UseTree::Rename(rename) => rename.rename == name,
        UseTree::Group(group) => group.items.iter().any(|tree| imports(tree, name)),
        UseTree::Glob(_) => false,
    }
}

fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(_) => Visibility::Crate,
        syn::Visibility::Inherited => Visibility::Private,
    }
}

fn struct_decl(item: &ItemStruct) -> Option<StructDecl> {
    if !item.generics.params.is_empty() {
        tracing::debug!(name = %item.ident, "skipping generic struct");
        return None;
    }

    let mut decl = StructDecl::new(item.ident.to_string());
    if derives(&item.attrs, "Default") {
        decl = decl.with_default();
    }

    match &item.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let Some(ident) = &field.ident else {
                    continue;
                };
                let mut field_decl =
                    FieldDecl::new(ident.to_string(), type_ref(&field.ty), visibility(&field.vis));
                if is_read_only(&field.attrs) {
                    field_decl = field_decl.read_only();
                }
                decl = decl.with_field(field_decl);
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            tracing::debug!(name = %item.ident, "skipping tuple struct");
            return None;
        }
    }

    Some(decl)
}

fn derives(attrs: &[Attribute], name: &str) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .any(|path| path.segments.last().is_some_and(|s| s.ident == name))
}

fn is_read_only(attrs: &[Attribute]) -> bool {
    let mut read_only = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("mapweave")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("read_only") {
                read_only = true;
            }
            Ok(())
        });
    }
    read_only
}

fn enum_decl(item: &ItemEnum) -> EnumDecl {
    let mut decl = EnumDecl::new(item.ident.to_string());

    for variant in &item.variants {
        let name = variant.ident.to_string();
        if !matches!(variant.fields, Fields::Unit) {
            decl.fieldless = false;
        }
        if variant.attrs.iter().any(|attr| attr.path().is_ident("default")) {
            decl = decl.with_default_variant(&name);
        }
        decl = match variant.discriminant.as_ref().and_then(|(_, expr)| discriminant(expr)) {
            Some(value) => decl.with_valued_variant(name, value),
            None => decl.with_variant(name),
        };
    }

    decl
}

fn discriminant(expr: &Expr) -> Option<i128> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse().ok(),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            discriminant(&unary.expr).map(|value| -value)
        }
        Expr::Group(group) => discriminant(&group.expr),
        Expr::Paren(paren) => discriminant(&paren.expr),
        _ => None,
    }
}

/// Add constructors and accessors from an inherent impl to its struct.
fn apply_impl(item: &ItemImpl, structs: &mut BTreeMap<String, StructDecl>) {
    let Type::Path(self_ty) = &*item.self_ty else {
        return;
    };
    let Some(name) = self_ty.path.get_ident().map(ToString::to_string) else {
        return;
    };
    let Some(decl) = structs.get_mut(&name) else {
        return;
    };

    for impl_item in &item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let sig = &method.sig;
        let vis = visibility(&method.vis);
        let ReturnType::Type(_, output) = &sig.output else {
            continue;
        };

        match sig.receiver() {
            None if returns_self(output, &name) => {
                let params = sig
                    .inputs
                    .iter()
                    .filter_map(|input| match input {
                        FnArg::Typed(typed) => Some(typed),
                        FnArg::Receiver(_) => None,
                    })
                    .map(|typed| match &*typed.pat {
                        Pat::Ident(ident) => {
                            Some(ParamDecl::new(ident.ident.to_string(), type_ref(&typed.ty)))
                        }
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>();
                if let Some(params) = params {
                    let constructor =
                        ConstructorDecl::new(sig.ident.to_string(), params).with_visibility(vis);
                    decl.constructors.push(constructor);
                }
            }
            Some(receiver)
                if receiver.reference.is_some()
                    && receiver.mutability.is_none()
                    && sig.inputs.len() == 1
                    && !matches!(**output, Type::Reference(_)) =>
            {
                decl.accessors.push(AccessorDecl {
                    name: sig.ident.to_string(),
                    ty: type_ref(output),
                    visibility: vis,
                });
            }
            _ => {}
        }
    }
}

fn returns_self(output: &Type, name: &str) -> bool {
    match output {
        Type::Path(path) => path.path.is_ident("Self") || path.path.is_ident(name),
        _ => false,
    }
}

/// `(source, target)` of a mapper method taking one argument by value.
fn signature(sig: &syn::Signature) -> Option<(TypeRef, TypeRef)> {
    if sig.receiver().is_some() || sig.inputs.len() != 1 || !sig.generics.params.is_empty() {
        return None;
    }
    let FnArg::Typed(input) = sig.inputs.first()? else {
        return None;
    };
    let ReturnType::Type(_, output) = &sig.output else {
        return None;
    };
    Some((type_ref(&input.ty), type_ref(output)))
}

fn apply_options(attr: &Attribute, config: &mut MappingConfiguration) {
    let Meta::List(_) = &attr.meta else {
        return;
    };

    match attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated) {
        Ok(options) => {
            for option in options {
                apply_option(&option, config);
            }
        }
        Err(_) => config
            .unrecognized_options
            .push(attr.meta.to_token_stream().to_string()),
    }
}

fn apply_option(option: &Meta, config: &mut MappingConfiguration) {
    let key = option
        .path()
        .get_ident()
        .map(ToString::to_string)
        .unwrap_or_else(|| option.path().to_token_stream().to_string());

    let value = match option {
        Meta::NameValue(pair) => string_literal(&pair.value),
        _ => None,
    };

    let recognized = match (key.as_str(), &value) {
        ("enum_strategy", Some(value)) => value
            .parse::<EnumStrategy>()
            .map(|strategy| config.enum_strategy = strategy)
            .is_ok(),
        ("null_handling", Some(value)) => value
            .parse::<NullHandling>()
            .map(|handling| config.null_handling = handling)
            .is_ok(),
        ("enum_fallback", Some(value)) => {
            config.enum_fallback = Some(value.clone());
            true
        }
        _ => false,
    };

    if !recognized {
        let text = match value {
            Some(value) => format!("{key} = \"{value}\""),
            None => key,
        };
        config.unrecognized_options.push(text);
    }
}

fn apply_method_attribute(attr: &Attribute, config: &mut MappingConfiguration) {
    let Some(name) = attr.path().get_ident().map(ToString::to_string) else {
        return;
    };

    match name.as_str() {
        "map_ignore" => {
            match attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated) {
                Ok(members) => config
                    .ignored_members
                    .extend(members.iter().map(LitStr::value)),
                Err(_) => config
                    .unrecognized_options
                    .push(attr.meta.to_token_stream().to_string()),
            }
        }
        "map_member" => {
            let mut source = None;
            let mut target = None;
            let parsed = attr.parse_nested_meta(|meta| {
                let value: LitStr = meta.value()?.parse()?;
                if meta.path.is_ident("source") {
                    source = Some(value.value());
                } else if meta.path.is_ident("target") {
                    target = Some(value.value());
                } else {
                    return Err(meta.error("expected `source` or `target`"));
                }
                Ok(())
            });
            match (parsed, source, target) {
                (Ok(()), Some(source), Some(target)) => {
                    config.member_name_map.insert(source, target);
                }
                _ => config
                    .unrecognized_options
                    .push(attr.meta.to_token_stream().to_string()),
            }
        }
        "map_options" => apply_options(attr, config),
        other if other.starts_with("map_") => config.unrecognized_options.push(other.to_string()),
        _ => {}
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(value) => Some(value.value()),
            _ => None,
        },
        _ => None,
    }
}

/// Translate a `syn` type into the engine's type expression.
pub fn type_ref(ty: &Type) -> TypeRef {
    let parsed = match ty {
        Type::Path(path) if path.qself.is_none() => path_type(&path.path),
        Type::Array(array) => array_len(&array.len).map(|len| TypeRef::Array {
            element: Box::new(type_ref(&array.elem)),
            len,
        }),
        Type::Paren(paren) => Some(type_ref(&paren.elem)),
        Type::Group(group) => Some(type_ref(&group.elem)),
        _ => None,
    };

    parsed.unwrap_or_else(|| TypeRef::Opaque(ty.to_token_stream().to_string()))
}

fn path_type(path: &syn::Path) -> Option<TypeRef> {
    let segment = path.segments.last()?;
    let name = segment.ident.to_string();

    match &segment.arguments {
        PathArguments::None => Some(
            Primitive::from_ident(&name)
                .map(TypeRef::Primitive)
                .unwrap_or(TypeRef::Named(name)),
        ),
        PathArguments::AngleBracketed(args) => {
            let types: Vec<&Type> = args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(ty) => Some(ty),
                    _ => None,
                })
                .collect();

            match (name.as_str(), types.as_slice()) {
                ("Option", [inner]) => Some(TypeRef::optional(type_ref(inner))),
                ("Box", [Type::Slice(slice)]) => Some(TypeRef::collection(
                    CollectionKind::Slice,
                    type_ref(&slice.elem),
                )),
                ("Box", [Type::TraitObject(object)]) => iterator_item(&object.bounds)
                    .map(|item| TypeRef::collection(CollectionKind::Iterator, item)),
                (kind, [inner]) => CollectionKind::from_ident(kind)
                    .map(|kind| TypeRef::collection(kind, type_ref(inner))),
                _ => None,
            }
        }
        PathArguments::Parenthesized(_) => None,
    }
}

fn iterator_item(bounds: &Punctuated<TypeParamBound, Token![+]>) -> Option<TypeRef> {
    bounds.iter().find_map(|bound| {
        let TypeParamBound::Trait(bound) = bound else {
            return None;
        };
        let segment = bound.path.segments.last()?;
        if segment.ident != "Iterator" {
            return None;
        }
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return None;
        };
        args.args.iter().find_map(|arg| match arg {
            GenericArgument::AssocType(assoc) if assoc.ident == "Item" => Some(type_ref(&assoc.ty)),
            _ => None,
        })
    })
}

fn array_len(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse().ok(),
            _ => None,
        },
        _ => None,
    }
}
