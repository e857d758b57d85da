//! Property-based tests for plan building
//!
//! Checks that plans are deterministic, that member matching ignores case
//! when no exact match exists, and that one missing member never takes the
//! rest of the request down with it.

use mapweave_core::{
    DiagnosticCode, FieldDecl, MappingRequest, Primitive, StructDecl, TypeRef, TypeRegistry,
};
use mapweave_engine::{BuildOptions, Generator, GeneratorOptions, PlanBody, PlanBuilder};
use proptest::prelude::*;
use std::collections::BTreeSet;

// Strategy: distinct lowercase member names
fn arb_member_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z][a-z0-9]{0,7}", 1..8)
}

fn arb_primitive() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        Just(Primitive::Bool),
        Just(Primitive::I32),
        Just(Primitive::I64),
        Just(Primitive::String),
    ]
}

fn public_struct<'n>(name: &str, members: impl IntoIterator<Item = (&'n str, TypeRef)>) -> StructDecl {
    literal_struct(name, members).with_default()
}

// Only constructible through the struct literal
fn literal_struct<'n>(name: &str, members: impl IntoIterator<Item = (&'n str, TypeRef)>) -> StructDecl {
    members
        .into_iter()
        .fold(StructDecl::new(name), |decl, (member, ty)| {
            decl.with_field(FieldDecl::public(member, ty))
        })
}

fn request() -> MappingRequest {
    MappingRequest::new("Mapper", "map", TypeRef::named("Src"), TypeRef::named("Dst"))
}

proptest! {
    /// Property: building a request twice gives equal plans
    #[test]
    fn proptest_build_is_deterministic(
        names in arb_member_names(),
        primitive in arb_primitive(),
        keep in any::<u8>(),
    ) {
        let ty = TypeRef::primitive(primitive);
        let sources = names.iter().enumerate().filter(|(i, _)| keep & (1 << (i % 8)) != 0);
        let registry = TypeRegistry::new()
            .with_struct(public_struct("Src", sources.map(|(_, n)| (n.as_str(), ty.clone()))))
            .with_struct(public_struct("Dst", names.iter().map(|n| (n.as_str(), ty.clone()))));
        let builder = PlanBuilder::new(&registry, BuildOptions::default());

        prop_assert_eq!(builder.build(&request()), builder.build(&request()));
    }

    /// Property: worker count does not change the output of a run
    #[test]
    fn proptest_generation_independent_of_workers(
        names in arb_member_names(),
        workers in 1usize..4,
    ) {
        let ty = TypeRef::primitive(Primitive::I32);
        let registry = TypeRegistry::new()
            .with_attribute("mapper")
            .with_struct(public_struct("Src", names.iter().map(|n| (n.as_str(), ty.clone()))))
            .with_struct(public_struct("Dst", names.iter().skip(1).map(|n| (n.as_str(), ty.clone()))));
        let requests = vec![request(); 3];

        let single = Generator::new(GeneratorOptions::default().with_worker_threads(1))
            .generate(&registry, &requests)
            .expect("generation should succeed");
        let pooled = Generator::new(GeneratorOptions::default().with_worker_threads(workers))
            .generate(&registry, &requests)
            .expect("generation should succeed");

        prop_assert_eq!(single, pooled);
    }

    /// Property: a source differing only in case still feeds its target
    #[test]
    fn proptest_case_insensitive_match(names in arb_member_names()) {
        let ty = TypeRef::primitive(Primitive::String);
        let upper: Vec<String> = names.iter().map(|n| n.to_uppercase()).collect();
        let registry = TypeRegistry::new()
            .with_struct(public_struct("Src", upper.iter().map(|n| (n.as_str(), ty.clone()))))
            .with_struct(public_struct("Dst", names.iter().map(|n| (n.as_str(), ty.clone()))));

        let plan = PlanBuilder::new(&registry, BuildOptions::default()).build(&request());

        prop_assert!(plan.diagnostics.is_empty());
        let PlanBody::Object(object) = &plan.body else {
            return Err(TestCaseError::fail("expected an object plan"));
        };
        let pairs: Vec<(&str, &str)> = object
            .pairs()
            .map(|p| (p.source_member.as_str(), p.target_member.as_str()))
            .collect();
        let expected: Vec<(&str, &str)> = upper
            .iter()
            .zip(&names)
            .map(|(s, t)| (s.as_str(), t.as_str()))
            .collect();
        prop_assert_eq!(pairs, expected);
    }

    /// Property: each target without a source costs one diagnostic and
    /// nothing else
    #[test]
    fn proptest_partial_failure_isolated(
        names in arb_member_names(),
        missing_mask in any::<u8>(),
    ) {
        let ty = TypeRef::primitive(Primitive::I64);
        let missing: BTreeSet<&str> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| missing_mask & (1 << (i % 8)) != 0)
            .map(|(_, n)| n.as_str())
            .collect();
        let registry = TypeRegistry::new()
            .with_struct(public_struct(
                "Src",
                names
                    .iter()
                    .filter(|n| !missing.contains(n.as_str()))
                    .map(|n| (n.as_str(), ty.clone())),
            ))
            .with_struct(public_struct("Dst", names.iter().map(|n| (n.as_str(), ty.clone()))));

        let plan = PlanBuilder::new(&registry, BuildOptions::default()).build(&request());

        let unmapped: BTreeSet<&str> = plan
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnmappedTargetMember)
            .filter_map(|d| d.location.path.first().map(String::as_str))
            .collect();
        prop_assert_eq!(plan.diagnostics.len(), missing.len());
        prop_assert_eq!(unmapped, missing.clone());
        let PlanBody::Object(object) = &plan.body else {
            return Err(TestCaseError::fail("expected an object plan"));
        };
        prop_assert_eq!(object.pairs().count(), names.len() - missing.len());
    }

    /// Property: without `Default` the struct literal is still used and
    /// every target without a source is filled with its default value
    #[test]
    fn proptest_partial_failure_isolated_without_default(
        names in arb_member_names(),
        missing_mask in any::<u8>(),
        primitive in arb_primitive(),
    ) {
        let ty = TypeRef::primitive(primitive);
        let missing: BTreeSet<&str> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| missing_mask & (1 << (i % 8)) != 0)
            .map(|(_, n)| n.as_str())
            .collect();
        let registry = TypeRegistry::new()
            .with_struct(literal_struct(
                "Src",
                names
                    .iter()
                    .filter(|n| !missing.contains(n.as_str()))
                    .map(|n| (n.as_str(), ty.clone())),
            ))
            .with_struct(literal_struct("Dst", names.iter().map(|n| (n.as_str(), ty.clone()))));

        let plan = PlanBuilder::new(&registry, BuildOptions::default()).build(&request());

        prop_assert!(!plan.has_errors());
        prop_assert_eq!(plan.diagnostics.len(), missing.len());
        let PlanBody::Object(object) = &plan.body else {
            return Err(TestCaseError::fail("expected an object plan"));
        };
        prop_assert_eq!(object.pairs().count(), names.len() - missing.len());
        let defaulted: BTreeSet<&str> = object.defaulted().collect();
        prop_assert_eq!(defaulted, missing);
    }
}
