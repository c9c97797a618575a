//! Struct layout cycle detection.
//!
//! A struct is laid out inline in every value that contains it, so a chain
//! of instance fields leading from a struct back to itself has no finite
//! size. The walk follows instance fields of struct type depth-first from
//! the root, substituting type arguments on the way:
//!
//! - reaching the root definition again, under any instantiation, is a cycle
//!   (`struct G<T> { G<int> f; }` cannot be laid out);
//! - reaching an instantiation already on the path stops that branch;
//! - reaching another definition already on the path under a different
//!   instantiation keeps descending, since the new arguments may lead back
//!   to the root. Expanding generics (`struct A<T> { A<A<T>> x; }`) end at
//!   the depth bound;
//! - a struct implementing a builtin value type may contain that builtin
//!   (`struct Int32 { int m_value; }`).

use rustc_hash::{FxHashMap, FxHashSet};
use sema_common::diagnostics::diagnostic_codes;
use sema_common::limits::MAX_STRUCT_LAYOUT_DEPTH;
use sema_common::{Diagnostic, DiagnosticBag, Location};
use sema_model::TypeKind;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::compilation::Compilation;
use crate::context::ResolutionContext;
use crate::entity::TypeEntity;
use crate::ids::EntityId;
use crate::type_resolution::{ResolvedType, TypeScope};

/// The field of the root through which a cycle was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutCycle {
    pub field: String,
    pub field_type: ResolvedType,
    pub location: Location,
}

#[derive(Debug, Default)]
pub struct StructLayoutOutcome {
    pub cycle: Option<LayoutCycle>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StructLayoutOutcome {
    #[inline]
    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }
}

struct CycleWalk<'a> {
    compilation: &'a Compilation,
    root: EntityId,
    /// The root implements a builtin value type.
    primitive_root: bool,
    /// Definitions on the current path and the instantiations they were
    /// entered with, innermost last.
    visiting: FxHashMap<EntityId, Vec<ResolvedType>>,
    /// Instantiations whose fields are known not to reach the root.
    expanded: FxHashSet<ResolvedType>,
}

impl CycleWalk<'_> {
    /// Whether a value of type `ty` contains the root.
    fn reaches_root(&mut self, ty: &ResolvedType, depth: u32, ctx: &mut ResolutionContext) -> bool {
        let ty = match ty {
            ResolvedType::Primitive(p) if p.is_value_type() => {
                match self.compilation.primitive_struct(*p) {
                    Some(id) => ResolvedType::Source {
                        id,
                        args: Vec::new(),
                    },
                    None => return false,
                }
            }
            ResolvedType::Source { .. } => ty.clone(),
            _ => return false,
        };
        let ResolvedType::Source { id, args } = &ty else {
            return false;
        };
        let id = *id;

        if id == self.root {
            return !self.primitive_root;
        }
        let on_path = self
            .visiting
            .get(&id)
            .is_some_and(|instantiations| instantiations.contains(&ty));
        if on_path || self.expanded.contains(&ty) {
            return false;
        }
        if depth >= MAX_STRUCT_LAYOUT_DEPTH {
            trace!(root = %self.root, depth, "struct layout walk reached its depth limit");
            return false;
        }
        let Some(definition) = self.compilation.type_entity(id) else {
            return false;
        };
        if definition.kind() != TypeKind::Struct {
            return false;
        }

        self.visiting.entry(id).or_default().push(ty.clone());
        let found = self
            .instance_field_types(&definition, args, ctx)
            .into_iter()
            .any(|field_ty| self.reaches_root(&field_ty, depth + 1, ctx));
        if let Some(instantiations) = self.visiting.get_mut(&id) {
            instantiations.pop();
            if instantiations.is_empty() {
                self.visiting.remove(&id);
            }
        }
        if !found {
            self.expanded.insert(ty);
        }
        found
    }

    /// Types of the instance fields of `definition` instantiated with `args`.
    fn instance_field_types(
        &self,
        definition: &TypeEntity,
        args: &[ResolvedType],
        ctx: &mut ResolutionContext,
    ) -> Vec<ResolvedType> {
        let Some(table) = self.compilation.early_member_table(definition.id()) else {
            return Vec::new();
        };
        table
            .instance_fields()
            .filter_map(|field| {
                let ty = field.ty()?;
                self.compilation
                    .resolve_type_ref(ty, &TypeScope::of(definition.id()), ctx)
                    .ok()
                    .map(|resolved| resolved.substitute(definition.id(), args))
            })
            .collect()
    }
}

impl Compilation {
    /// Run the layout check of struct `id`.
    pub(crate) fn check_struct_layout(
        &self,
        ty: &TypeEntity,
        ctx: &mut ResolutionContext,
    ) -> StructLayoutOutcome {
        if ty.kind() != TypeKind::Struct {
            return StructLayoutOutcome::default();
        }
        let Some(table) = self.early_member_table(ty.id()) else {
            return StructLayoutOutcome::default();
        };
        let mut walk = CycleWalk {
            compilation: self,
            root: ty.id(),
            primitive_root: ty.primitive().is_some(),
            visiting: FxHashMap::default(),
            expanded: FxHashSet::default(),
        };
        let identity: Vec<ResolvedType> = (0..ty.arity() as u32)
            .map(|ordinal| ResolvedType::TypeParameter {
                owner: ty.id(),
                ordinal,
            })
            .collect();
        walk.visiting.insert(
            ty.id(),
            vec![ResolvedType::Source {
                id: ty.id(),
                args: identity,
            }],
        );

        for field in table.instance_fields() {
            let Some(field_ref) = field.ty() else { continue };
            let Ok(field_ty) = self.resolve_type_ref(field_ref, &TypeScope::of(ty.id()), ctx) else {
                continue;
            };
            if walk.reaches_root(&field_ty, 1, ctx) {
                let mut diagnostics = DiagnosticBag::new();
                let shown = self.display_type(&field_ty);
                diagnostics.add(
                    diagnostic_codes::STRUCT_LAYOUT_CYCLE,
                    &field.decl.location,
                    &[&field.name, &shown],
                );
                debug!(owner = %ty.full_name(), field = %field.name, ty = %shown, "struct layout cycle");
                return StructLayoutOutcome {
                    cycle: Some(LayoutCycle {
                        field: field.name.clone(),
                        field_type: field_ty,
                        location: field.decl.location.clone(),
                    }),
                    diagnostics: diagnostics.into_vec(),
                };
            }
        }
        StructLayoutOutcome::default()
    }

    /// The published layout outcome of struct `id`, computing it if needed.
    pub(crate) fn struct_layout_in(
        &self,
        id: EntityId,
        ctx: &mut ResolutionContext,
    ) -> Option<Arc<StructLayoutOutcome>> {
        let ty = self.type_entity(id)?;
        if let Some(outcome) = ty.layout.get() {
            return Some(Arc::clone(outcome));
        }
        let outcome = self.check_struct_layout(&ty, ctx);
        Some(ty.layout.publish(outcome).value)
    }
}

#[cfg(test)]
#[path = "../tests/struct_layout_tests.rs"]
mod tests;
