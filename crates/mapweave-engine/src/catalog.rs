//! Member catalog: the uniform member list of a struct in a given role

use mapweave_core::{StructDecl, TypeRef, Visibility};
use serde::Serialize;

/// Which side of a mapping the members are collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Members must be readable.
    Source,
    /// Members must be writable or settable through a constructor.
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub declared_type: TypeRef,
    pub is_readable: bool,
    pub is_writable: bool,
    pub accessibility: Visibility,
}

impl MemberDescriptor {
    /// Target members that can only be provided as constructor arguments.
    pub fn is_constructor_only(&self) -> bool {
        !self.is_writable
    }
}

/// Collect the members of `decl` usable in `role`, in declaration order.
///
/// Members below `min_visibility` are skipped. A name appears at most once;
/// the first declaration wins.
pub fn catalog(
    decl: &StructDecl,
    role: MemberRole,
    min_visibility: Visibility,
) -> Vec<MemberDescriptor> {
    match role {
        MemberRole::Source => source_members(decl, min_visibility),
        MemberRole::Target => target_members(decl, min_visibility),
    }
}

fn source_members(decl: &StructDecl, min_visibility: Visibility) -> Vec<MemberDescriptor> {
    let mut members: Vec<MemberDescriptor> = Vec::new();

    for field in decl.fields.iter().filter(|f| f.visibility >= min_visibility) {
        members.push(MemberDescriptor {
            name: field.name.clone(),
            declared_type: field.ty.clone(),
            is_readable: true,
            is_writable: !field.read_only,
            accessibility: field.visibility,
        });
    }

    for accessor in decl.accessors.iter().filter(|a| a.visibility >= min_visibility) {
        if members.iter().any(|m| m.name == accessor.name) {
            continue;
        }
        members.push(MemberDescriptor {
            name: accessor.name.clone(),
            declared_type: accessor.ty.clone(),
            is_readable: true,
            is_writable: false,
            accessibility: accessor.visibility,
        });
    }

    members
}

fn target_members(decl: &StructDecl, min_visibility: Visibility) -> Vec<MemberDescriptor> {
    let constructors: Vec<_> = decl
        .construction_candidates()
        .into_iter()
        .filter(|c| c.visibility >= min_visibility)
        .collect();

    let constructor_param = |name: &str| {
        constructors
            .iter()
            .flat_map(|c| c.params.iter().map(move |p| (c, p)))
            .find(|(_, p)| p.name == name)
    };

    let mut members: Vec<MemberDescriptor> = Vec::new();

    for field in &decl.fields {
        let assignable = field.visibility >= min_visibility && !field.read_only;
        if assignable {
            members.push(MemberDescriptor {
                name: field.name.clone(),
                declared_type: field.ty.clone(),
                is_readable: field.visibility >= min_visibility,
                is_writable: true,
                accessibility: field.visibility,
            });
        } else if let Some((constructor, param)) = constructor_param(&field.name) {
            members.push(MemberDescriptor {
                name: field.name.clone(),
                declared_type: param.ty.clone(),
                is_readable: field.visibility >= min_visibility,
                is_writable: false,
                accessibility: constructor.visibility,
            });
        }
    }

    // Constructor parameters that do not correspond to any field.
    for constructor in &constructors {
        for param in &constructor.params {
            if members.iter().any(|m| m.name == param.name) || decl.field(&param.name).is_some()
            {
                continue;
            }
            members.push(MemberDescriptor {
                name: param.name.clone(),
                declared_type: param.ty.clone(),
                is_readable: false,
                is_writable: false,
                accessibility: constructor.visibility,
            });
        }
    }

    members
}

#[cfg(test)]
#[path = "catalog/catalog_tests.rs"]
mod catalog_tests;
