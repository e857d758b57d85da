#![allow(non_snake_case)]

use super::*;
use mapweave_core::{ConstructorDecl, FieldDecl, ParamDecl, Primitive};

fn int() -> TypeRef {
    TypeRef::primitive(Primitive::I32)
}

fn text() -> TypeRef {
    TypeRef::primitive(Primitive::String)
}

fn names(members: &[MemberDescriptor]) -> Vec<&str> {
    members.iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn catalog___source_role___lists_accessible_fields_in_declaration_order() {
    let decl = StructDecl::new("User")
        .with_field(FieldDecl::public("id", int()))
        .with_field(FieldDecl::private("secret", text()))
        .with_field(FieldDecl::new("name", text(), Visibility::Crate));

    let members = catalog(&decl, MemberRole::Source, Visibility::Crate);

    assert_eq!(names(&members), vec!["id", "name"]);
    assert!(members.iter().all(|m| m.is_readable));
}

#[test]
fn catalog___source_role___appends_accessors_that_do_not_shadow_fields() {
    let decl = StructDecl::new("User")
        .with_field(FieldDecl::public("id", int()))
        .with_accessor("id", text(), Visibility::Public)
        .with_accessor("display_name", text(), Visibility::Public)
        .with_accessor("internal", text(), Visibility::Private);

    let members = catalog(&decl, MemberRole::Source, Visibility::Crate);

    assert_eq!(names(&members), vec!["id", "display_name"]);
    assert_eq!(members[0].declared_type, int());
    assert!(!members[1].is_writable);
}

#[test]
fn catalog___source_role___private_fields_visible_with_private_minimum() {
    let decl = StructDecl::new("User").with_field(FieldDecl::private("secret", text()));

    let members = catalog(&decl, MemberRole::Source, Visibility::Private);

    assert_eq!(names(&members), vec!["secret"]);
}

#[test]
fn catalog___target_role___writable_fields_are_writable() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::public("id", int()))
        .with_field(FieldDecl::public("name", text()));

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert_eq!(names(&members), vec!["id", "name"]);
    assert!(members.iter().all(|m| m.is_writable));
}

#[test]
fn catalog___target_role___private_field_settable_through_constructor() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::private("id", int()))
        .with_field(FieldDecl::public("name", text()))
        .with_constructor(ConstructorDecl::new("new", vec![ParamDecl::new("id", int())]));

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert_eq!(names(&members), vec!["id", "name"]);
    assert!(members[0].is_constructor_only());
    assert!(members[1].is_writable);
}

#[test]
fn catalog___target_role___private_field_without_constructor_is_skipped() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::private("id", int()))
        .with_field(FieldDecl::public("name", text()));

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert_eq!(names(&members), vec!["name"]);
}

#[test]
fn catalog___target_role___read_only_field_is_constructor_only_via_literal() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::public("id", int()).read_only())
        .with_field(FieldDecl::public("name", text()));

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert_eq!(names(&members), vec!["id", "name"]);
    assert!(members[0].is_constructor_only());
}

#[test]
fn catalog___target_role___appends_parameters_without_fields() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::private("full_name", text()))
        .with_constructor(ConstructorDecl::new(
            "new",
            vec![ParamDecl::new("first", text()), ParamDecl::new("last", text())],
        ));

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert_eq!(names(&members), vec!["first", "last"]);
    assert!(members.iter().all(|m| m.is_constructor_only()));
}

#[test]
fn catalog___target_role___private_constructor_is_ignored() {
    let decl = StructDecl::new("UserDto")
        .with_field(FieldDecl::private("id", int()))
        .with_constructor(
            ConstructorDecl::new("new", vec![ParamDecl::new("id", int())])
                .with_visibility(Visibility::Private),
        );

    let members = catalog(&decl, MemberRole::Target, Visibility::Crate);

    assert!(members.is_empty());
}

#[test]
fn catalog___repeated_calls___return_equal_lists() {
    let decl = StructDecl::new("User")
        .with_field(FieldDecl::public("b", int()))
        .with_field(FieldDecl::public("a", int()));

    let first = catalog(&decl, MemberRole::Source, Visibility::Crate);
    let second = catalog(&decl, MemberRole::Source, Visibility::Crate);

    assert_eq!(first, second);
    assert_eq!(names(&first), vec!["b", "a"]);
}
