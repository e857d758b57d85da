#![allow(non_snake_case)]

use super::*;
use mapweave_core::{
    EnumDecl, FieldDecl, MappingConfiguration, MethodSig, NullHandling, ParamDecl, Primitive,
    Severity,
};

fn int() -> TypeRef {
    TypeRef::primitive(Primitive::I32)
}

fn text() -> TypeRef {
    TypeRef::primitive(Primitive::String)
}

fn named(name: &str) -> TypeRef {
    TypeRef::named(name)
}

fn public_struct(name: &str, fields: &[(&str, TypeRef)]) -> StructDecl {
    fields.iter().fold(StructDecl::new(name), |decl, (field, ty)| {
        decl.with_field(FieldDecl::public(*field, ty.clone()))
    })
}

fn request(source: &str, target: &str) -> MappingRequest {
    MappingRequest::new("Mapper", "map", named(source), named(target))
}

fn build(registry: &TypeRegistry, request: &MappingRequest) -> MappingPlan {
    PlanBuilder::new(registry, BuildOptions::default()).build(request)
}

fn codes(plan: &MappingPlan) -> Vec<DiagnosticCode> {
    plan.diagnostics.iter().map(|d| d.code).collect()
}

fn object(plan: &MappingPlan) -> &ObjectPlan {
    plan.body.as_object().expect("object body")
}

// Matching and partial failure

#[test]
fn PlanBuilder___one_unmatched_target___four_pairs_and_one_diagnostic() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct(
            "User",
            &[("a", int()), ("b", int()), ("c", text()), ("d", text())],
        ))
        .with_struct(
            public_struct(
                "UserDto",
                &[("a", int()), ("b", int()), ("c", text()), ("d", text()), ("e", int())],
            )
            .with_default(),
        );

    let plan = build(&registry, &request("User", "UserDto"));

    let body = object(&plan);
    assert_eq!(body.construction, Construction::Default);
    assert_eq!(body.pairs().count(), 4);
    assert_eq!(codes(&plan), vec![DiagnosticCode::UnmappedTargetMember]);
    assert_eq!(plan.diagnostics[0].location.member(), Some("e"));
}

#[test]
fn PlanBuilder___one_unmatched_target_without_default___literal_fills_missing_field() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct(
            "Src",
            &[("a", int()), ("b", int()), ("c", int()), ("d", int())],
        ))
        .with_struct(public_struct(
            "Dst",
            &[("a", int()), ("b", int()), ("c", int()), ("d", int()), ("e", int())],
        ));

    let plan = build(&registry, &request("Src", "Dst"));

    let body = object(&plan);
    assert!(matches!(
        body.construction,
        Construction::Constructor { literal: true, .. }
    ));
    assert_eq!(body.pairs().count(), 4);
    assert_eq!(body.defaulted().collect::<Vec<_>>(), vec!["e"]);
    assert_eq!(codes(&plan), vec![DiagnosticCode::UnmappedTargetMember]);
    assert_eq!(plan.diagnostics[0].location.member(), Some("e"));
}

#[test]
fn PlanBuilder___failed_member_without_default___siblings_kept_in_literal() {
    let registry = TypeRegistry::new()
        .with_enum(EnumDecl::new("Legacy").with_variant("Active").with_variant("Retired"))
        .with_enum(
            EnumDecl::new("Status")
                .with_variant("Active")
                .with_default_variant("Active"),
        )
        .with_struct(public_struct("User", &[("id", int()), ("status", named("Legacy"))]))
        .with_struct(public_struct("UserDto", &[("id", int()), ("status", named("Status"))]));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(codes(&plan), vec![DiagnosticCode::UnmappedEnumVariant]);
    assert!(object(&plan).pair("id").is_some());
    assert_eq!(object(&plan).defaulted().collect::<Vec<_>>(), vec!["status"]);
}

#[test]
fn PlanBuilder___unmatched_field_without_default_value___no_constructor_names_it() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int())]))
        .with_struct(public_struct(
            "UserDto",
            &[("id", int()), ("token", TypeRef::Opaque("Uuid".to_string()))],
        ));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(plan.body, PlanBody::Unmappable);
    assert_eq!(
        codes(&plan),
        vec![DiagnosticCode::UnmappedTargetMember, DiagnosticCode::NoConstructor]
    );
    assert!(plan.diagnostics[1].message.contains("token"));
}

#[test]
fn PlanBuilder___case_insensitive_match___pairs_members() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("UserId", int())]))
        .with_struct(public_struct("UserDto", &[("userId", int())]).with_default());

    let plan = build(&registry, &request("User", "UserDto"));

    let pair = object(&plan).pair("userId").expect("paired");
    assert_eq!(pair.source_member, "UserId");
    assert!(plan.diagnostics.is_empty());
}

#[test]
fn PlanBuilder___ambiguous_match___reported_once() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("UserId", int()), ("USERID", int())]))
        .with_struct(public_struct("UserDto", &[("userid", int())]).with_default());
    let options = BuildOptions::default().with_report_unmapped_source(false);

    let plan = PlanBuilder::new(&registry, options).build(&request("User", "UserDto"));

    assert_eq!(codes(&plan), vec![DiagnosticCode::AmbiguousMatch]);
    assert!(object(&plan).pairs().next().is_none());
}

#[test]
fn PlanBuilder___unused_source_member___info_diagnostic() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int()), ("password", text())]))
        .with_struct(public_struct("UserDto", &[("id", int())]));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(codes(&plan), vec![DiagnosticCode::UnmappedSourceMember]);
    assert_eq!(plan.diagnostics[0].severity, Severity::Info);
    assert!(!plan.has_errors());
}

#[test]
fn PlanBuilder___failed_member___excluded_and_siblings_kept() {
    let registry = TypeRegistry::new()
        .with_enum(EnumDecl::new("Legacy").with_variant("Active").with_variant("Retired"))
        .with_enum(EnumDecl::new("Status").with_variant("Active"))
        .with_struct(public_struct("User", &[("id", int()), ("status", named("Legacy"))]))
        .with_struct(
            public_struct("UserDto", &[("id", int()), ("status", named("Status"))]).with_default(),
        );

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(codes(&plan), vec![DiagnosticCode::UnmappedEnumVariant]);
    assert!(plan.has_errors());
    assert!(object(&plan).pair("id").is_some());
    assert!(object(&plan).pair("status").is_none());
}

// Construction

#[test]
fn PlanBuilder___constructor_only_member___passed_as_argument() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int()), ("name", text())]))
        .with_struct(
            StructDecl::new("UserDto")
                .with_field(FieldDecl::private("id", int()))
                .with_field(FieldDecl::public("name", text()))
                .with_constructor(ConstructorDecl::new("new", vec![ParamDecl::new("id", int())])),
        );

    let plan = build(&registry, &request("User", "UserDto"));

    let body = object(&plan);
    let Construction::Constructor { name, arguments, .. } = &body.construction else {
        panic!("expected constructor");
    };
    assert_eq!(name, "new");
    assert_eq!(arguments[0].member(), "id");
    assert_eq!(body.assignments.len(), 1);
    assert_eq!(body.assignments[0].target_member, "name");
}

#[test]
fn PlanBuilder___several_constructors___most_parameters_wins() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int()), ("name", text())]))
        .with_struct(
            StructDecl::new("UserDto")
                .with_field(FieldDecl::private("id", int()))
                .with_field(FieldDecl::private("name", text()))
                .with_constructor(ConstructorDecl::new("new", vec![ParamDecl::new("id", int())]))
                .with_constructor(ConstructorDecl::new(
                    "with_name",
                    vec![ParamDecl::new("id", int()), ParamDecl::new("name", text())],
                )),
        );

    let plan = build(&registry, &request("User", "UserDto"));

    let body = object(&plan);
    assert!(matches!(
        &body.construction,
        Construction::Constructor { name, .. } if name == "with_name"
    ));
    assert!(body.assignments.is_empty());
    assert!(plan.diagnostics.is_empty());
}

#[test]
fn PlanBuilder___all_public_fields_without_default___struct_literal() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int())]))
        .with_struct(public_struct("UserDto", &[("id", int())]));

    let plan = build(&registry, &request("User", "UserDto"));

    assert!(matches!(
        object(&plan).construction,
        Construction::Constructor { literal: true, .. }
    ));
}

#[test]
fn PlanBuilder___uncallable_constructor_with_default___read_only_diagnostic() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int()), ("name", text())]))
        .with_struct(
            StructDecl::new("UserDto")
                .with_field(FieldDecl::private("id", int()))
                .with_field(FieldDecl::public("name", text()))
                .with_constructor(ConstructorDecl::new(
                    "new",
                    vec![ParamDecl::new("id", int()), ParamDecl::new("tenant", text())],
                ))
                .with_default(),
        );

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(object(&plan).construction, Construction::Default);
    assert_eq!(
        codes(&plan),
        vec![
            DiagnosticCode::UnmappedTargetMember,
            DiagnosticCode::ReadOnlyTargetMember
        ]
    );
}

#[test]
fn PlanBuilder___no_usable_constructor___unmappable() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int())]))
        .with_struct(StructDecl::new("UserDto").with_field(FieldDecl::private("id", int())));
    let options = BuildOptions::default().with_report_unmapped_source(false);

    let plan = PlanBuilder::new(&registry, options).build(&request("User", "UserDto"));

    assert_eq!(plan.body, PlanBody::Unmappable);
    assert_eq!(codes(&plan), vec![DiagnosticCode::NoConstructor]);
}

#[test]
fn PlanBuilder___ignore_member_null_handling___skippable_member_assigned_after_default() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("name", TypeRef::optional(text()))]))
        .with_struct(public_struct("UserDto", &[("name", text())]).with_default());
    let request = request("User", "UserDto").with_configuration(
        MappingConfiguration::new().with_null_handling(NullHandling::IgnoreMember),
    );

    let plan = build(&registry, &request);

    let body = object(&plan);
    assert_eq!(body.construction, Construction::Default);
    assert!(body.assignments[0].strategy.may_skip());
}

#[test]
fn PlanBuilder___ignore_member_without_default___member_reported_and_siblings_kept() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Src", &[("a", int()), ("b", TypeRef::optional(int()))]))
        .with_struct(public_struct("Dst", &[("a", int()), ("b", int())]));
    let request = request("Src", "Dst").with_configuration(
        MappingConfiguration::new().with_null_handling(NullHandling::IgnoreMember),
    );

    let plan = build(&registry, &request);

    let body = object(&plan);
    assert!(body.pair("a").is_some());
    assert!(body.pair("b").is_none());
    assert_eq!(body.defaulted().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(codes(&plan), vec![DiagnosticCode::UnsupportedNullHandling]);
    assert_eq!(plan.diagnostics[0].location.member(), Some("b"));
}

// Nesting and recursion

#[test]
fn PlanBuilder___nested_struct___helper_generated() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Address", &[("city", text())]))
        .with_struct(public_struct("AddressDto", &[("city", text())]))
        .with_struct(public_struct("User", &[("address", named("Address"))]))
        .with_struct(public_struct("UserDto", &[("address", named("AddressDto"))]));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(plan.helpers.len(), 1);
    assert_eq!(plan.helpers[0].method, "map_address_to_address_dto");
    assert!(plan.is_closed());
}

#[test]
fn PlanBuilder___repeated_nested_pair___single_helper() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Address", &[("city", text())]))
        .with_struct(public_struct("AddressDto", &[("city", text())]))
        .with_struct(public_struct(
            "User",
            &[("home", named("Address")), ("work", named("Address"))],
        ))
        .with_struct(public_struct(
            "UserDto",
            &[("home", named("AddressDto")), ("work", named("AddressDto"))],
        ));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(plan.helpers.len(), 1);
    assert_eq!(plan.references().len(), 2);
}

#[test]
fn PlanBuilder___helper_name_taken_by_user_method___suffixed() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Address", &[("city", text())]))
        .with_struct(public_struct("AddressDto", &[("city", text())]))
        .with_struct(public_struct("User", &[("address", named("Address"))]))
        .with_struct(public_struct("UserDto", &[("address", named("AddressDto"))]))
        .with_mapper(MapperDecl::new("Mapper").with_user_method(MethodSig::new(
            "map_address_to_address_dto",
            text(),
            int(),
        )));

    let plan = build(&registry, &request("User", "UserDto"));

    assert_eq!(plan.helpers[0].method, "map_address_to_address_dto_2");
}

#[test]
fn PlanBuilder___self_referencing_type___references_root() {
    let registry = TypeRegistry::new()
        .with_struct(
            public_struct("Node", &[("value", int()), ("children", TypeRef::vec(named("Node")))])
                .with_default(),
        )
        .with_struct(
            public_struct(
                "NodeDto",
                &[("value", int()), ("children", TypeRef::vec(named("NodeDto")))],
            )
            .with_default(),
        );

    let plan = build(&registry, &request("Node", "NodeDto"));

    assert!(plan.helpers.is_empty());
    assert!(plan.is_closed());
    let references = plan.references();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].key, plan.key);
    assert_eq!(references[0].method, "map");
}

#[test]
fn PlanBuilder___mutually_recursive_types___terminates_with_back_reference() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct(
            "Employee",
            &[("team", TypeRef::optional(named("Team")))],
        ))
        .with_struct(public_struct(
            "Team",
            &[("lead", TypeRef::optional(named("Employee")))],
        ))
        .with_struct(public_struct(
            "EmployeeDto",
            &[("team", TypeRef::optional(named("TeamDto")))],
        ))
        .with_struct(public_struct(
            "TeamDto",
            &[("lead", TypeRef::optional(named("EmployeeDto")))],
        ));

    let plan = build(&registry, &request("Employee", "EmployeeDto"));

    assert_eq!(plan.helpers.len(), 1);
    let helper_refs: Vec<&PlanRef> = {
        let mut out = Vec::new();
        plan.helpers[0].body.collect_references(&mut out);
        out
    };
    assert_eq!(helper_refs[0].key, plan.key);
    assert!(plan.is_closed());
}

#[test]
fn PlanBuilder___failed_helper___dependents_swept() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Root", &[("x", named("A"))]))
        .with_struct(public_struct("RootDto", &[("x", named("ADto"))]).with_default())
        .with_struct(public_struct("A", &[("b", named("B"))]))
        .with_struct(
            StructDecl::new("ADto")
                .with_field(FieldDecl::public("b", named("BDto")))
                .with_field(FieldDecl::private("hidden", int())),
        )
        .with_struct(public_struct("B", &[("a", TypeRef::optional(named("A")))]))
        .with_struct(
            public_struct("BDto", &[("a", TypeRef::optional(named("ADto")))]).with_default(),
        );

    let plan = build(&registry, &request("Root", "RootDto"));

    assert_eq!(
        codes(&plan),
        vec![
            DiagnosticCode::NoConstructor,
            DiagnosticCode::DependsOnFailedMapping,
            DiagnosticCode::DependsOnFailedMapping,
        ]
    );
    assert_eq!(plan.diagnostics[2].location.path, vec!["x", "b", "a"]);
    assert!(plan.helpers.is_empty());
    assert!(object(&plan).pairs().next().is_none());
    assert!(plan.is_closed());
}

#[test]
fn PlanBuilder___failed_helper_behind_literal_argument___argument_defaulted() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct(
            "Root",
            &[("x", TypeRef::optional(named("A"))), ("y", named("B"))],
        ))
        .with_struct(public_struct(
            "RootDto",
            &[("x", TypeRef::optional(named("ADto"))), ("y", named("BDto"))],
        ))
        .with_struct(public_struct("A", &[("b", named("B"))]))
        .with_struct(
            StructDecl::new("ADto")
                .with_field(FieldDecl::public("b", named("BDto")))
                .with_field(FieldDecl::private("hidden", int())),
        )
        .with_struct(public_struct("B", &[("a", TypeRef::optional(named("A")))]))
        .with_struct(public_struct("BDto", &[("a", TypeRef::optional(named("ADto")))]));

    let plan = build(&registry, &request("Root", "RootDto"));

    assert_eq!(
        codes(&plan),
        vec![
            DiagnosticCode::NoConstructor,
            DiagnosticCode::DependsOnFailedMapping,
            DiagnosticCode::DependsOnFailedMapping,
        ]
    );
    assert_eq!(plan.diagnostics[2].location.path, vec!["x", "b", "a"]);
    assert!(object(&plan).pair("y").is_some());
    assert_eq!(object(&plan).defaulted().collect::<Vec<_>>(), vec!["x"]);
    assert_eq!(plan.helpers.len(), 1);
    assert_eq!(plan.helpers[0].body.defaulted().collect::<Vec<_>>(), vec!["a"]);
    assert!(plan.is_closed());
}

#[test]
fn PlanBuilder___unmappable_root___references_into_root_swept() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Parent", &[("child", named("Child"))]))
        .with_struct(
            StructDecl::new("ParentDto")
                .with_field(FieldDecl::public("child", named("ChildDto")))
                .with_field(FieldDecl::private("secret", int())),
        )
        .with_struct(public_struct("Child", &[("parent", TypeRef::optional(named("Parent")))]))
        .with_struct(
            public_struct("ChildDto", &[("parent", TypeRef::optional(named("ParentDto")))])
                .with_default(),
        );

    let plan = build(&registry, &request("Parent", "ParentDto"));

    assert_eq!(plan.body, PlanBody::Unmappable);
    assert!(plan.helpers.is_empty());
    assert!(plan.is_closed());
    assert!(codes(&plan).contains(&DiagnosticCode::NoConstructor));
    assert!(codes(&plan).contains(&DiagnosticCode::DependsOnFailedMapping));
}

#[test]
fn PlanBuilder___depth_limit___fails_deepest_member() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("L1", &[("next", named("L2"))]))
        .with_struct(public_struct("L2", &[("next", named("L3"))]))
        .with_struct(public_struct("L3", &[("value", int())]))
        .with_struct(public_struct("D1", &[("next", named("D2"))]).with_default())
        .with_struct(public_struct("D2", &[("next", named("D3"))]).with_default())
        .with_struct(public_struct("D3", &[("value", int())]).with_default());
    let options = BuildOptions::default().with_max_depth(2);

    let plan = PlanBuilder::new(&registry, options).build(&request("L1", "D1"));

    assert_eq!(codes(&plan), vec![DiagnosticCode::MaxDepthExceeded]);
    assert_eq!(plan.diagnostics[0].location.path, vec!["next", "next"]);
    assert_eq!(plan.helpers.len(), 1);
}

#[test]
fn PlanBuilder___sibling_request_with_same_key___referenced_not_duplicated() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Item", &[("id", int())]))
        .with_struct(public_struct("ItemDto", &[("id", int())]))
        .with_struct(public_struct("Order", &[("item", named("Item"))]))
        .with_struct(public_struct("OrderDto", &[("item", named("ItemDto"))]))
        .with_mapper(
            MapperDecl::new("Mapper")
                .with_request(MethodSig::new("map_item", named("Item"), named("ItemDto")))
                .with_request(MethodSig::new("map", named("Order"), named("OrderDto"))),
        );

    let plan = build(&registry, &request("Order", "OrderDto"));

    assert!(plan.helpers.is_empty());
    let references = plan.references();
    assert_eq!(references[0].scope, RefScope::Sibling);
    assert_eq!(references[0].method, "map_item");
}

// Non-struct roots

#[test]
fn PlanBuilder___collection_root___value_body_with_helper() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Item", &[("id", int())]))
        .with_struct(public_struct("ItemDto", &[("id", int())]));
    let request = MappingRequest::new(
        "Mapper",
        "map_all",
        TypeRef::vec(named("Item")),
        TypeRef::vec(named("ItemDto")),
    );

    let plan = build(&registry, &request);

    assert!(matches!(plan.body, PlanBody::Value(Strategy::Collection(_))));
    assert_eq!(plan.helpers.len(), 1);
    assert!(plan.is_closed());
}

#[test]
fn PlanBuilder___unsupported_root_pair___unmappable_with_diagnostic() {
    let registry = TypeRegistry::new()
        .with_enum(EnumDecl::new("Status").with_variant("Active"))
        .with_struct(public_struct("Item", &[("id", int())]));

    let plan = build(&registry, &request("Status", "Item"));

    assert_eq!(plan.body, PlanBody::Unmappable);
    assert_eq!(codes(&plan), vec![DiagnosticCode::NoMappingStrategy]);
    assert!(plan.diagnostics[0].location.path.is_empty());
}

// Configuration

#[test]
fn PlanBuilder___configuration_problems___reported_once_and_ignored() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("id", int()), ("name", text())]))
        .with_struct(public_struct("UserDto", &[("id", int()), ("label", text())]).with_default());
    let config = MappingConfiguration::new()
        .with_unrecognized_option("deep_clone")
        .ignore("id")
        .map_member("id", "label")
        .ignore("nickname");
    let options = BuildOptions::default().with_report_unmapped_source(false);

    let plan = PlanBuilder::new(&registry, options)
        .build(&request("User", "UserDto").with_configuration(config));

    assert_eq!(
        codes(&plan),
        vec![
            DiagnosticCode::UnknownOption,
            DiagnosticCode::ContradictoryOption,
            DiagnosticCode::UnknownConfiguredMember,
            DiagnosticCode::UnmappedTargetMember,
        ]
    );
    assert!(object(&plan).pair("id").is_none());
}

#[test]
fn PlanBuilder___explicit_member_map___renames() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("User", &[("full_name", text())]))
        .with_struct(public_struct("UserDto", &[("name", text())]));
    let config = MappingConfiguration::new().map_member("full_name", "name");

    let plan = build(&registry, &request("User", "UserDto").with_configuration(config));

    assert_eq!(object(&plan).pair("name").map(|p| p.source_member.as_str()), Some("full_name"));
    assert!(plan.diagnostics.is_empty());
}

#[test]
fn PlanBuilder___member_options_on_value_root___unknown_member_warning() {
    let registry = TypeRegistry::new()
        .with_enum(EnumDecl::new("Status").with_variant("Active"))
        .with_enum(EnumDecl::new("StatusDto").with_variant("Active"));
    let config = MappingConfiguration::new().ignore("id");

    let plan = build(&registry, &request("Status", "StatusDto").with_configuration(config));

    assert!(matches!(plan.body, PlanBody::Value(Strategy::Enum(_))));
    assert_eq!(codes(&plan), vec![DiagnosticCode::UnknownConfiguredMember]);
}

#[test]
fn PlanBuilder___build_twice___equal_plans() {
    let registry = TypeRegistry::new()
        .with_struct(public_struct("Address", &[("city", text())]))
        .with_struct(public_struct("AddressDto", &[("city", text()), ("zip", text())]).with_default())
        .with_struct(public_struct("User", &[("address", named("Address")), ("extra", int())]))
        .with_struct(public_struct("UserDto", &[("address", named("AddressDto"))]));
    let builder = PlanBuilder::new(&registry, BuildOptions::default());
    let request = request("User", "UserDto");

    let first = builder.build(&request);
    let second = builder.build(&request);

    assert_eq!(first, second);
    assert!(!first.diagnostics.is_empty());
}
