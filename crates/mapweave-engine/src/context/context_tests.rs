#![allow(non_snake_case)]

use super::*;
use crate::plan::Construction;
use mapweave_core::TypeRef;

fn key(source: &str, target: &str) -> PlanKey {
    PlanKey::new(TypeRef::named(source), TypeRef::named(target))
}

fn empty_plan() -> ObjectPlan {
    ObjectPlan {
        construction: Construction::Default,
        assignments: Vec::new(),
    }
}

#[test]
fn HelperTable___reserve___names_helper_after_types() {
    let mut table = HelperTable::new(Vec::new());

    let method = table.reserve(key("Address", "AddressDto"), "Address", "AddressDto", Vec::new());

    assert_eq!(method, "map_address_to_address_dto");
    assert_eq!(table.status(&key("Address", "AddressDto")), Some(HelperStatus::Pending));
}

#[test]
fn HelperTable___reserve___avoids_taken_names() {
    let mut table = HelperTable::new(vec!["map_a_to_b".to_string()]);

    let method = table.reserve(key("A", "B"), "A", "B", Vec::new());

    assert_eq!(method, "map_a_to_b_2");
}

#[test]
fn HelperTable___reserve___same_key_returns_same_name() {
    let mut table = HelperTable::new(Vec::new());

    let first = table.reserve(key("A", "B"), "A", "B", Vec::new());
    let second = table.reserve(key("A", "B"), "A", "B", Vec::new());

    assert_eq!(first, second);
}

#[test]
fn HelperTable___discard___frees_name() {
    let mut table = HelperTable::new(Vec::new());
    table.reserve(key("A", "B"), "A", "B", Vec::new());

    table.discard(&key("A", "B"));
    let again = table.reserve(key("A", "B"), "A", "B", Vec::new());

    assert_eq!(again, "map_a_to_b");
}

#[test]
fn HelperTable___into_helpers___keeps_completed_in_first_use_order() {
    let mut table = HelperTable::new(Vec::new());
    table.reserve(key("C", "D"), "C", "D", Vec::new());
    table.reserve(key("A", "B"), "A", "B", Vec::new());
    table.reserve(key("E", "F"), "E", "F", Vec::new());
    table.complete(&key("A", "B"), empty_plan());
    table.complete(&key("C", "D"), empty_plan());
    table.fail(&key("E", "F"));

    assert_eq!(table.completed_keys(), vec![key("C", "D"), key("A", "B")]);
    assert_eq!(table.failed_keys().len(), 1);

    let helpers = table.into_helpers();

    let methods: Vec<&str> = helpers.iter().map(|h| h.method.as_str()).collect();
    assert_eq!(methods, vec!["map_c_to_d", "map_a_to_b"]);
}

#[test]
fn HelperTable___origin___records_member_path() {
    let mut table = HelperTable::new(Vec::new());
    let origin = vec!["address".to_string()];

    table.reserve(key("A", "B"), "A", "B", origin.clone());

    assert_eq!(table.origin(&key("A", "B")), Some(origin.as_slice()));
}

#[test]
fn ResolutionContext___report_member___appends_member_to_path() {
    let mut ctx = ResolutionContext::new("Mapper::map", 8, Vec::new());
    ctx.path.push("address".to_string());

    ctx.report_member("city", DiagnosticCode::UnmappedTargetMember, "missing");

    let diagnostics = ctx.diagnostics.drain();
    assert_eq!(diagnostics[0].location.to_string(), "Mapper::map @ address.city");
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn ResolutionContext___record___uses_current_path() {
    let mut ctx = ResolutionContext::new("Mapper::map", 8, Vec::new());

    ctx.record(Severity::Error, DiagnosticCode::NoConstructor, "none");

    assert_eq!(ctx.location(), Location::new("Mapper::map"));
    assert_eq!(ctx.diagnostics.len(), 1);
}
