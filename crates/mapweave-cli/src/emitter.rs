//! Code emitter
//!
//! Turns finished [`MappingPlan`]s into Rust source. For a mapper trait
//! `UserMapper` the output is
//!
//! ```text
//! pub struct UserMapperImpl;
//!
//! impl UserMapper for UserMapperImpl {
//!     fn to_dto(source: User) -> UserDto { .. }      // one per request
//! }
//!
//! impl UserMapperImpl {
//!     fn map_address_to_address_dto(source: Address) -> AddressDto { .. }
//! }
//! ```
//!
//! Tokens are built with `quote` and formatted with `prettyplease`. The
//! emitter trusts the plan: every reference it follows was checked by the
//! engine to resolve to a request or a helper.

use mapweave_core::{
    CollectionKind, MapweaveError, MapweaveResult, NullHandling, PlanKey, Primitive, StructDecl,
    TypeRef, TypeRegistry,
};
use mapweave_engine::naming::claim_unique;
use mapweave_engine::{
    Argument, CollectionPlan, Construction, Container, ContainerConstruction, Conversion, EnumPlan,
    HelperPlan, MappingPair, MappingPlan, NullDirection, NullPlan, ObjectPlan, PlanBody, PlanRef,
    RefScope, Strategy,
};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};
use std::collections::{BTreeMap, BTreeSet};

pub const GENERATED_HEADER: &str = "// @generated by mapweave. Do not edit by hand.";

/// Binding names the generated bodies use themselves.
const RESERVED: &[&str] = &["source", "target", "value", "item", "items", "out"];

/// Render every plan, grouped by mapper in order of first appearance.
pub fn emit(registry: &TypeRegistry, plans: &[MappingPlan]) -> MapweaveResult<String> {
    let mut mappers: Vec<(&str, Vec<&MappingPlan>)> = Vec::new();
    for plan in plans {
        match mappers
            .iter_mut()
            .find(|(name, _)| *name == plan.declaring_type)
        {
            Some((_, group)) => group.push(plan),
            None => mappers.push((plan.declaring_type.as_str(), vec![plan])),
        }
    }

    let items = mappers
        .iter()
        .map(|(mapper, group)| emit_mapper(registry, mapper, group));
    let tokens = quote! {
        use super::*;

        #(#items)*
    };

    let file: syn::File = syn::parse2(tokens).map_err(|e| {
        MapweaveError::Internal(format!("generated code is not valid Rust: {e}"))
    })?;

    Ok(format!("{GENERATED_HEADER}\n\n{}", prettyplease::unparse(&file)))
}

/// The implementing struct and impl blocks for one mapper.
pub fn emit_mapper(
    registry: &TypeRegistry,
    mapper: &str,
    plans: &[&MappingPlan],
) -> TokenStream {
    let trait_ident = ident(mapper);
    let impl_ident = format_ident!("{}Impl", mapper);

    let mut taken: BTreeSet<String> = plans.iter().map(|p| p.method.clone()).collect();
    let mut shared: BTreeMap<&str, &HelperPlan> = BTreeMap::new();
    let mut methods = Vec::with_capacity(plans.len());
    let mut helpers = Vec::new();

    for &plan in plans {
        // Helpers are named per request; the same name from two requests
        // is emitted once when the helpers agree and renamed otherwise.
        let mut renames = BTreeMap::new();
        let mut fresh = Vec::new();
        for helper in &plan.helpers {
            match shared.get(helper.method.as_str()) {
                Some(existing) if **existing == *helper => {}
                Some(_) => {
                    let base = format!("{}_{}", plan.method, helper.method);
                    renames.insert(helper.method.clone(), claim_unique(&base, &mut taken));
                    fresh.push(helper);
                }
                None => {
                    taken.insert(helper.method.clone());
                    shared.insert(helper.method.as_str(), helper);
                    fresh.push(helper);
                }
            }
        }

        let emitter = PlanEmitter {
            registry,
            plan,
            trait_ident: &trait_ident,
            renames,
        };
        methods.push(emitter.root());
        helpers.extend(fresh.into_iter().map(|helper| emitter.helper(helper)));
    }

    let helper_impl = (!helpers.is_empty()).then(|| {
        quote! {
            impl #impl_ident {
                #(#helpers)*
            }
        }
    });

    quote! {
        pub struct #impl_ident;

        impl #trait_ident for #impl_ident {
            #(#methods)*
        }

        #helper_impl
    }
}

struct PlanEmitter<'e> {
    registry: &'e TypeRegistry,
    plan: &'e MappingPlan,
    trait_ident: &'e Ident,
    renames: BTreeMap<String, String>,
}

impl PlanEmitter<'_> {
    fn root(&self) -> TokenStream {
        let plan = self.plan;
        let name = ident(&plan.method);
        let source = type_tokens(&plan.key.source);
        let target = type_tokens(&plan.key.target);

        let body = match &plan.body {
            PlanBody::Object(object) => self.object(object, &plan.key),
            PlanBody::Value(strategy) => self.value(
                strategy,
                quote!(source),
                &plan.key.source,
                &plan.key.target,
                "value",
            ),
            PlanBody::Unmappable => {
                let message = format!(
                    "mapweave could not generate {}; see the generation diagnostics",
                    plan.request
                );
                quote! {
                    let _ = source;
                    unimplemented!(#message)
                }
            }
        };

        quote! {
            fn #name(source: #source) -> #target {
                #body
            }
        }
    }

    fn helper(&self, helper: &HelperPlan) -> TokenStream {
        let name = self.helper_ident(&helper.method);
        let source = type_tokens(&helper.key.source);
        let target = type_tokens(&helper.key.target);
        let body = self.object(&helper.body, &helper.key);

        quote! {
            fn #name(source: #source) -> #target {
                #body
            }
        }
    }

    fn helper_ident(&self, method: &str) -> Ident {
        ident(self.renames.get(method).map_or(method, String::as_str))
    }

    fn object(&self, object: &ObjectPlan, key: &PlanKey) -> TokenStream {
        let source_decl = key
            .source
            .as_named()
            .and_then(|name| self.registry.struct_decl(name));
        let target = type_tokens(&key.target);
        let mut reads = SourceReads::new(source_decl, object);

        let construct = match &object.construction {
            Construction::Default => quote!(<#target>::default()),
            Construction::Constructor {
                literal: true,
                arguments,
                ..
            } => {
                let fields = arguments.iter().map(|argument| ident(argument.member()));
                let values: Vec<TokenStream> = arguments
                    .iter()
                    .map(|argument| self.argument_value(argument, &mut reads))
                    .collect();
                quote!(#target { #(#fields: #values),* })
            }
            Construction::Constructor {
                name, arguments, ..
            } => {
                let constructor = ident(name);
                let values: Vec<TokenStream> = arguments
                    .iter()
                    .map(|argument| self.argument_value(argument, &mut reads))
                    .collect();
                quote!(<#target>::#constructor(#(#values),*))
            }
        };

        let assignments: Vec<TokenStream> = object
            .assignments
            .iter()
            .map(|pair| {
                let member = ident(&pair.target_member);
                if pair.strategy.may_skip() {
                    let value = self.pair_maybe(pair, &mut reads);
                    quote! {
                        if let Some(value) = #value {
                            target.#member = value;
                        }
                    }
                } else {
                    let value = self.pair_value(pair, &mut reads);
                    quote!(target.#member = #value;)
                }
            })
            .collect();

        let bindings = reads.bindings();
        if assignments.is_empty() {
            quote! {
                #bindings
                #construct
            }
        } else {
            quote! {
                #bindings
                let mut target = #construct;
                #(#assignments)*
                target
            }
        }
    }

    fn argument_value(&self, argument: &Argument, reads: &mut SourceReads) -> TokenStream {
        match argument {
            Argument::Mapped(pair) => self.pair_value(pair, reads),
            Argument::Default { .. } => quote!(Default::default()),
        }
    }

    fn pair_value(&self, pair: &MappingPair, reads: &mut SourceReads) -> TokenStream {
        let read = reads.take(&pair.source_member);
        self.value(
            &pair.strategy,
            read,
            &pair.source_type,
            &pair.target_type,
            &pair.target_member,
        )
    }

    fn pair_maybe(&self, pair: &MappingPair, reads: &mut SourceReads) -> TokenStream {
        let read = reads.take(&pair.source_member);
        self.maybe(
            &pair.strategy,
            read,
            &pair.source_type,
            &pair.target_type,
            &pair.target_member,
        )
    }

    /// An expression of the target type.
    fn value(
        &self,
        strategy: &Strategy,
        input: TokenStream,
        source: &TypeRef,
        target: &TypeRef,
        label: &str,
    ) -> TokenStream {
        match strategy {
            Strategy::Direct(Conversion::Identity) => input,
            Strategy::Direct(Conversion::Widen { to, .. }) => {
                let to = primitive_ident(*to);
                quote!(#to::from(#input))
            }
            Strategy::NestedObject(plan_ref) => self.call(plan_ref, input),
            Strategy::UserMethod(method) => {
                let trait_ident = self.trait_ident;
                let method = ident(&method.name);
                quote!(<Self as #trait_ident>::#method(#input))
            }
            Strategy::Enum(plan) => enum_match(plan, input, source, target),
            Strategy::Collection(plan) => self.collection(plan, input, source, target, label),
            Strategy::NullConditional(plan) => {
                self.null_conditional(plan, input, source, target, label)
            }
        }
    }

    /// An `Option` of the target type; `None` means the value is skipped.
    fn maybe(
        &self,
        strategy: &Strategy,
        input: TokenStream,
        source: &TypeRef,
        target: &TypeRef,
        label: &str,
    ) -> TokenStream {
        match strategy {
            Strategy::NullConditional(plan) if plan.skips_on_none() => {
                let inner_source = source.without_option();
                if plan.inner.may_skip() {
                    let inner = self.maybe(&plan.inner, quote!(value), inner_source, target, label);
                    quote!(#input.and_then(|value| #inner))
                } else {
                    let inner = self.value(&plan.inner, quote!(value), inner_source, target, label);
                    quote!(#input.map(|value| #inner))
                }
            }
            _ => {
                let value = self.value(strategy, input, source, target, label);
                quote!(Some(#value))
            }
        }
    }

    fn call(&self, plan_ref: &PlanRef, input: TokenStream) -> TokenStream {
        let is_request = plan_ref.scope == RefScope::Sibling || plan_ref.key == self.plan.key;
        if is_request {
            let trait_ident = self.trait_ident;
            let method = ident(&plan_ref.method);
            quote!(<Self as #trait_ident>::#method(#input))
        } else {
            let method = self.helper_ident(&plan_ref.method);
            quote!(Self::#method(#input))
        }
    }

    fn null_conditional(
        &self,
        plan: &NullPlan,
        input: TokenStream,
        source: &TypeRef,
        target: &TypeRef,
        label: &str,
    ) -> TokenStream {
        let inner_source = source.without_option();
        let inner_target = target.without_option();

        match plan.direction {
            NullDirection::Both => {
                let value = quote!(value);
                if plan.inner.may_skip() {
                    let inner = self.maybe(&plan.inner, value, inner_source, inner_target, label);
                    quote!(#input.and_then(|value| #inner))
                } else {
                    let inner = self.value(&plan.inner, value, inner_source, inner_target, label);
                    quote!(#input.map(|value| #inner))
                }
            }
            NullDirection::WrapSome => {
                let inner = self.value(&plan.inner, input, source, inner_target, label);
                quote!(Some(#inner))
            }
            NullDirection::Unwrap => match plan.handling {
                NullHandling::MapToDefault => {
                    let inner = self.value(&plan.inner, quote!(value), inner_source, target, label);
                    quote!(#input.map(|value| #inner).unwrap_or_default())
                }
                // Skipping is decided by the caller through `maybe`; where a
                // value is required a missing one is an error.
                NullHandling::Throw | NullHandling::IgnoreMember => {
                    let message = format!("{}: '{label}' was None", self.plan.request);
                    self.value(
                        &plan.inner,
                        quote!(#input.expect(#message)),
                        inner_source,
                        target,
                        label,
                    )
                }
            },
        }
    }

    fn collection(
        &self,
        plan: &CollectionPlan,
        input: TokenStream,
        source: &TypeRef,
        target: &TypeRef,
        label: &str,
    ) -> TokenStream {
        let (Some(source_element), Some(target_element)) = (source.element(), target.element())
        else {
            return input;
        };
        let skips = plan.element.may_skip();
        let element = if skips {
            self.maybe(&plan.element, quote!(item), source_element, target_element, label)
        } else {
            self.value(&plan.element, quote!(item), source_element, target_element, label)
        };
        let adapter = if skips {
            quote!(filter_map)
        } else {
            quote!(map)
        };

        match (plan.construction, plan.target) {
            (ContainerConstruction::FixedArray(_), _) => quote!(#input.map(|item| #element)),
            (ContainerConstruction::Presized, Container::Collection(kind)) => {
                let (with_capacity, push) = presized_parts(kind);
                let push = if skips {
                    quote! {
                        if let Some(value) = #element {
                            out.#push(value);
                        }
                    }
                } else {
                    quote!(out.#push(#element);)
                };
                quote! {{
                    let items = #input;
                    let mut out = #with_capacity(items.len());
                    for item in items {
                        #push
                    }
                    out
                }}
            }
            (_, Container::Collection(CollectionKind::Iterator)) => {
                let element_type = type_tokens(target_element);
                quote! {
                    Box::new(#input.into_iter().#adapter(move |item| #element))
                        as Box<dyn Iterator<Item = #element_type>>
                }
            }
            _ => {
                let target = type_tokens(target);
                quote!(#input.into_iter().#adapter(|item| #element).collect::<#target>())
            }
        }
    }
}

/// Source member reads for one object body.
///
/// Every used member is bound once at the top of the body; a member that
/// feeds several targets is cloned for all but its last use. Accessors are
/// read before fields are moved out.
struct SourceReads<'d> {
    decl: Option<&'d StructDecl>,
    remaining: BTreeMap<String, usize>,
}

impl<'d> SourceReads<'d> {
    fn new(decl: Option<&'d StructDecl>, object: &ObjectPlan) -> Self {
        let mut remaining = BTreeMap::new();
        for pair in object.pairs() {
            *remaining.entry(pair.source_member.clone()).or_insert(0) += 1;
        }
        Self { decl, remaining }
    }

    fn is_field(&self, member: &str) -> bool {
        self.decl.is_some_and(|decl| decl.field(member).is_some())
    }

    fn take(&mut self, member: &str) -> TokenStream {
        let binding = binding(member);
        match self.remaining.get_mut(member) {
            Some(count) if *count > 1 => {
                *count -= 1;
                quote!(#binding.clone())
            }
            _ => quote!(#binding),
        }
    }

    fn bindings(&self) -> TokenStream {
        if self.remaining.is_empty() {
            return quote!(let _ = source;);
        }

        let (fields, accessors): (Vec<&String>, Vec<&String>) =
            self.remaining.keys().partition(|member| self.is_field(member));
        let accessor_reads = accessors.iter().map(|member| {
            let binding = binding(member);
            let member = ident(member);
            quote!(let #binding = source.#member();)
        });
        let field_reads = fields.iter().map(|member| {
            let binding = binding(member);
            let member = ident(member);
            quote!(let #binding = source.#member;)
        });

        quote! {
            #(#accessor_reads)*
            #(#field_reads)*
        }
    }
}

fn ident(name: &str) -> Ident {
    format_ident!("{}", name)
}

fn binding(member: &str) -> Ident {
    if RESERVED.contains(&member) {
        format_ident!("{}_", member)
    } else {
        ident(member)
    }
}

fn primitive_ident(primitive: Primitive) -> Ident {
    ident(primitive.as_str())
}

fn presized_parts(kind: CollectionKind) -> (TokenStream, Ident) {
    match kind {
        CollectionKind::VecDeque => (
            quote!(::std::collections::VecDeque::with_capacity),
            ident("push_back"),
        ),
        CollectionKind::HashSet => (
            quote!(::std::collections::HashSet::with_capacity),
            ident("insert"),
        ),
        _ => (quote!(Vec::with_capacity), ident("push")),
    }
}

fn enum_match(
    plan: &EnumPlan,
    input: TokenStream,
    source: &TypeRef,
    target: &TypeRef,
) -> TokenStream {
    let (Some(source), Some(target)) = (source.as_named(), target.as_named()) else {
        return input;
    };
    let source = ident(source);
    let target = ident(target);
    let arms = plan.arms.iter().map(|arm| {
        let from = ident(&arm.source);
        let to = ident(&arm.target);
        quote!(#source::#from => #target::#to,)
    });

    quote! {
        match #input {
            #(#arms)*
        }
    }
}

/// Rust syntax for a type expression.
pub fn type_tokens(ty: &TypeRef) -> TokenStream {
    match ty {
        TypeRef::Primitive(primitive) => {
            let primitive = primitive_ident(*primitive);
            quote!(#primitive)
        }
        TypeRef::Named(name) => {
            let name = ident(name);
            quote!(#name)
        }
        TypeRef::Optional(inner) => {
            let inner = type_tokens(inner);
            quote!(Option<#inner>)
        }
        TypeRef::Collection { kind, element } => {
            let element = type_tokens(element);
            match kind {
                CollectionKind::Vec => quote!(Vec<#element>),
                CollectionKind::VecDeque => quote!(::std::collections::VecDeque<#element>),
                CollectionKind::HashSet => quote!(::std::collections::HashSet<#element>),
                CollectionKind::BTreeSet => quote!(::std::collections::BTreeSet<#element>),
                CollectionKind::Slice => quote!(Box<[#element]>),
                CollectionKind::Iterator => quote!(Box<dyn Iterator<Item = #element>>),
            }
        }
        TypeRef::Array { element, len } => {
            let element = type_tokens(element);
            let len = Literal::usize_unsuffixed(*len);
            quote!([#element; #len])
        }
        TypeRef::Opaque(text) => text.parse().unwrap_or_else(|_| quote!(_)),
    }
}
