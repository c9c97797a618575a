//! Merging of partial member declarations.
//!
//! Partial declarations with the same merge key form one group. A group
//! keeps its first definition (no body) and its first implementation (with
//! a body); later ones are reported and dropped. A definition and an
//! implementation pair up: the definition is published, the implementation
//! is hidden and linked to it.

use indexmap::IndexMap;
use sema_common::DiagnosticBag;
use sema_common::diagnostics::diagnostic_codes;
use sema_model::{AccessorKind, MemberDecl, MemberDeclKind, RefKind};
use std::sync::Arc;
use tracing::trace;

use crate::member_table::normalized_type;

/// A declared member on its way into the member table.
#[derive(Clone, Debug)]
pub(crate) struct RawMember {
    /// Ordinal among the aggregate's declared members.
    pub ordinal: u32,
    pub decl: Arc<MemberDecl>,
    /// Table name: metadata name with `IndexerName` applied.
    pub name: String,
}

#[derive(Debug)]
pub(crate) enum MergedMember {
    /// Not partial, or partial where partial is not allowed.
    Single(RawMember),
    /// A partial definition without implementation, or the reverse.
    Lone { member: RawMember, definition: bool },
    Pair {
        definition: RawMember,
        implementation: RawMember,
    },
}

impl MergedMember {
    fn first_ordinal(&self) -> u32 {
        match self {
            Self::Single(m) | Self::Lone { member: m, .. } => m.ordinal,
            Self::Pair {
                definition,
                implementation,
            } => definition.ordinal.min(implementation.ordinal),
        }
    }
}

/// Identity of a partial member group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct MergeKey {
    name: String,
    kind: MemberDeclKind,
    parameters: Vec<(RefKind, String)>,
    arity: usize,
}

impl MergeKey {
    pub(crate) fn of(decl: &MemberDecl) -> Self {
        Self {
            name: decl.metadata_name(),
            kind: decl.kind,
            parameters: decl
                .parameters
                .iter()
                .map(|p| (p.ref_kind, normalized_type(&p.ty, &decl.type_params)))
                .collect(),
            arity: decl.type_params.len(),
        }
    }
}

/// Kinds that may be declared `partial`.
pub(crate) const fn partial_allowed(kind: MemberDeclKind) -> bool {
    matches!(
        kind,
        MemberDeclKind::Method
            | MemberDeclKind::Constructor
            | MemberDeclKind::Property
            | MemberDeclKind::Indexer
            | MemberDeclKind::Event
    )
}

#[derive(Default)]
struct Group {
    definition: Option<RawMember>,
    implementation: Option<RawMember>,
}

/// Merge `raw` (in declaration order). The result is ordered by the first
/// declaration of each merged member.
pub(crate) fn merge_partial_members(
    raw: Vec<RawMember>,
    diagnostics: &mut DiagnosticBag,
) -> Vec<MergedMember> {
    let mut singles = Vec::new();
    let mut groups: IndexMap<MergeKey, Group> = IndexMap::new();

    for member in raw {
        let decl = &member.decl;
        if !decl.is_partial() {
            singles.push(MergedMember::Single(member));
            continue;
        }
        if !partial_allowed(decl.kind) {
            diagnostics.add(
                diagnostic_codes::PARTIAL_NOT_ALLOWED,
                &decl.location,
                &[&member.name],
            );
            singles.push(MergedMember::Single(member));
            continue;
        }

        let group = groups.entry(MergeKey::of(decl)).or_default();
        let is_implementation = decl.has_implementation();
        let slot = if is_implementation {
            &mut group.implementation
        } else {
            &mut group.definition
        };
        if slot.is_some() {
            let code = if is_implementation {
                diagnostic_codes::PARTIAL_DUPLICATE_IMPLEMENTATION
            } else {
                diagnostic_codes::PARTIAL_DUPLICATE_DEFINITION
            };
            trace!(name = %member.name, ordinal = member.ordinal, "dropping extra partial declaration");
            diagnostics.add(code, &decl.location, &[&member.name]);
            continue;
        }
        *slot = Some(member);
    }

    let mut merged = singles;
    for group in groups.into_values() {
        match (group.definition, group.implementation) {
            (Some(definition), Some(implementation)) => {
                check_pair(&definition, &implementation, diagnostics);
                merged.push(MergedMember::Pair {
                    definition,
                    implementation,
                });
            }
            (Some(definition), None) => {
                diagnostics.add(
                    diagnostic_codes::PARTIAL_MISSING_IMPLEMENTATION,
                    &definition.decl.location,
                    &[&definition.name],
                );
                merged.push(MergedMember::Lone {
                    member: definition,
                    definition: true,
                });
            }
            (None, Some(implementation)) => {
                diagnostics.add(
                    diagnostic_codes::PARTIAL_MISSING_DEFINITION,
                    &implementation.decl.location,
                    &[&implementation.name],
                );
                merged.push(MergedMember::Lone {
                    member: implementation,
                    definition: false,
                });
            }
            (None, None) => {}
        }
    }
    merged.sort_by_key(MergedMember::first_ordinal);
    merged
}

/// Consistency of a definition/implementation pair. Every diagnostic is
/// attributed to the implementation, or to its offending accessor.
fn check_pair(definition: &RawMember, implementation: &RawMember, diagnostics: &mut DiagnosticBag) {
    let def = &definition.decl;
    let imp = &implementation.decl;
    let name = definition.name.as_str();
    let location = &imp.location;

    let return_type = |decl: &MemberDecl| {
        decl.ty
            .as_ref()
            .map(|t| normalized_type(t, &decl.type_params))
            .unwrap_or_else(|| "void".to_string())
    };
    if return_type(def) != return_type(imp) {
        diagnostics.add(diagnostic_codes::PARTIAL_RETURN_TYPE_MISMATCH, location, &[name]);
    }
    if def.is_static() != imp.is_static() {
        diagnostics.add(diagnostic_codes::PARTIAL_STATIC_MISMATCH, location, &[name]);
    }
    if def.modifiers.declared_accessibility() != imp.modifiers.declared_accessibility() {
        diagnostics.add(diagnostic_codes::PARTIAL_ACCESSIBILITY_MISMATCH, location, &[name]);
    }
    for (index, (d, i)) in def.parameters.iter().zip(&imp.parameters).enumerate() {
        if d.name != i.name {
            diagnostics.add(
                diagnostic_codes::PARTIAL_PARAMETER_NAME_DIFFERS,
                location,
                &[name, &(index + 1).to_string(), &d.name, &i.name],
            );
        }
    }

    let def_kinds: Vec<AccessorKind> = def.accessors.iter().map(|a| a.kind).collect();
    for kind in &def_kinds {
        if imp.accessor(*kind).is_none() {
            diagnostics.add(
                diagnostic_codes::PARTIAL_MISSING_ACCESSOR,
                location,
                &[name, kind.keyword()],
            );
        }
    }
    for accessor in &imp.accessors {
        if !def_kinds.contains(&accessor.kind) {
            diagnostics.add(
                diagnostic_codes::PARTIAL_UNEXPECTED_ACCESSOR,
                &accessor.location,
                &[name, accessor.kind.keyword()],
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/partial_members_tests.rs"]
mod tests;
