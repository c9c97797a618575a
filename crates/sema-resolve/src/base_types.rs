//! Base class and interface list of aggregates.
//!
//! The BaseType phase also checks that the fragments of a partial aggregate
//! agree with each other, since that is the first phase that looks at more
//! than one fragment. Circular base chains are detected on the declared
//! (syntactic) bases, before any member of the chain is completed.

use rustc_hash::FxHashSet;
use sema_common::diagnostics::diagnostic_codes;
use sema_common::limits::MAX_BASE_CHAIN_DEPTH;
use sema_common::{Diagnostic, DiagnosticBag, Location};
use sema_model::{Modifiers, PrimitiveKind, TypeDecl, TypeKind, TypeRef};
use std::sync::Arc;
use tracing::debug;

use crate::compilation::Compilation;
use crate::context::ResolutionContext;
use crate::entity::TypeEntity;
use crate::ids::EntityId;
use crate::type_resolution::{ResolvedType, TypeScope};

#[derive(Debug, Default)]
pub struct BaseTypeOutcome {
    /// The declared base class; `None` when there is none or it was rejected.
    pub base: Option<ResolvedType>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct InterfacesOutcome {
    pub interfaces: Vec<ResolvedType>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Namespace or containing type name, for duplicate-definition messages.
fn container_name(compilation: &Compilation, ty: &TypeEntity) -> String {
    match ty.containing().and_then(|id| compilation.type_entity(id)) {
        Some(outer) => outer.full_name().to_string(),
        None => ty.namespace().unwrap_or("<global namespace>").to_string(),
    }
}

fn check_fragments(compilation: &Compilation, ty: &TypeEntity, diagnostics: &mut DiagnosticBag) {
    let fragments = ty.fragments();
    if fragments.len() < 2 {
        return;
    }
    let any_partial = fragments.iter().any(|f| f.is_partial());
    for fragment in &fragments[1..] {
        if !any_partial {
            diagnostics.add(
                diagnostic_codes::DUPLICATE_TYPE,
                &fragment.location,
                &[&container_name(compilation, ty), ty.name()],
            );
            continue;
        }
        if fragment.kind != ty.kind() {
            diagnostics.add(
                diagnostic_codes::PARTIAL_KIND_MISMATCH,
                &fragment.location,
                &[ty.full_name()],
            );
        }
    }
    if any_partial {
        for fragment in fragments.iter().filter(|f| !f.is_partial()) {
            diagnostics.add(
                diagnostic_codes::MISSING_PARTIAL_MODIFIER,
                &fragment.location,
                &[ty.full_name()],
            );
        }
    }
}

fn is_sealed(decl: &TypeDecl) -> bool {
    decl.modifiers.intersects(Modifiers::SEALED | Modifiers::STATIC)
}

impl Compilation {
    pub(crate) fn compute_base_type(
        &self,
        ty: &TypeEntity,
        ctx: &mut ResolutionContext,
    ) -> BaseTypeOutcome {
        let mut diagnostics = DiagnosticBag::new();
        check_fragments(self, ty, &mut diagnostics);

        let scope = TypeScope::of(ty.id());
        let mut chosen: Option<(&Arc<TypeDecl>, ResolvedType)> = None;
        for fragment in ty.fragments() {
            let Some(base_ref) = &fragment.base else { continue };
            let resolved = match self.resolve_type_ref(base_ref, &scope, ctx) {
                Ok(resolved) => resolved,
                Err(err) => {
                    err.report(&mut diagnostics, &fragment.location);
                    ResolvedType::Error
                }
            };
            if let Some((_, first)) = &chosen {
                if *first != resolved && !first.is_error() && !resolved.is_error() {
                    diagnostics.add(
                        diagnostic_codes::PARTIAL_BASE_MISMATCH,
                        &fragment.location,
                        &[ty.full_name()],
                    );
                }
                continue;
            }
            chosen = Some((fragment, resolved));
        }

        let Some((fragment, base)) = chosen else {
            return BaseTypeOutcome {
                base: None,
                diagnostics: diagnostics.into_vec(),
            };
        };
        if base.is_error() {
            return BaseTypeOutcome {
                base: None,
                diagnostics: diagnostics.into_vec(),
            };
        }
        let location = &fragment.location;
        let shown = self.display_type(&base);

        let accepted = match ty.kind() {
            TypeKind::Enum => {
                let integral = fragment.base.as_ref().is_some_and(is_integral_ref);
                if !integral {
                    diagnostics.add(
                        diagnostic_codes::BASE_NOT_ALLOWED,
                        location,
                        &[ty.full_name(), ty.kind().keyword()],
                    );
                }
                false
            }
            TypeKind::Struct | TypeKind::Interface => {
                diagnostics.add(
                    diagnostic_codes::BASE_NOT_ALLOWED,
                    location,
                    &[ty.full_name(), ty.kind().keyword()],
                );
                false
            }
            TypeKind::Class => self.check_class_base(ty, &base, &shown, location, &mut diagnostics),
        };
        if accepted && self.base_chain_reaches(&base, ty.id(), ctx) {
            debug!(ty = %ty.full_name(), base = %shown, "circular base type");
            diagnostics.add(
                diagnostic_codes::CIRCULAR_BASE,
                location,
                &[ty.full_name(), &shown],
            );
            return BaseTypeOutcome {
                base: None,
                diagnostics: diagnostics.into_vec(),
            };
        }
        BaseTypeOutcome {
            base: accepted.then_some(base),
            diagnostics: diagnostics.into_vec(),
        }
    }

    fn check_class_base(
        &self,
        ty: &TypeEntity,
        base: &ResolvedType,
        shown: &str,
        location: &Location,
        diagnostics: &mut DiagnosticBag,
    ) -> bool {
        let (is_class, sealed) = match base {
            ResolvedType::Primitive(PrimitiveKind::Object) => (true, false),
            ResolvedType::Primitive(PrimitiveKind::String) => (true, true),
            ResolvedType::Source { id, .. } => match self.type_entity(*id) {
                Some(decl) => (decl.kind() == TypeKind::Class, decl.any_fragment(is_sealed)),
                None => (false, false),
            },
            ResolvedType::External { unit, name, kind, .. } => {
                let sealed = self
                    .reference(*unit)
                    .and_then(|r| r.types.iter().find(|t| &t.name == name))
                    .is_some_and(|t| t.sealed);
                (*kind == TypeKind::Class, sealed)
            }
            _ => (false, false),
        };
        if !is_class {
            diagnostics.add(
                diagnostic_codes::BASE_NOT_CLASS,
                location,
                &[ty.full_name(), shown],
            );
            return false;
        }
        if sealed {
            diagnostics.add(
                diagnostic_codes::BASE_CLASS_SEALED,
                location,
                &[ty.full_name(), shown],
            );
            return false;
        }
        true
    }

    /// Whether following declared bases from `start` leads to `target`.
    fn base_chain_reaches(
        &self,
        start: &ResolvedType,
        target: EntityId,
        ctx: &mut ResolutionContext,
    ) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = match start {
            ResolvedType::Source { id, .. } => Some(*id),
            _ => None,
        };
        let mut depth = 0;
        while let Some(id) = current {
            if id == target {
                return true;
            }
            if !visited.insert(id) || depth >= MAX_BASE_CHAIN_DEPTH {
                return false;
            }
            depth += 1;
            current = self.declared_base(id, ctx);
        }
        false
    }

    /// The source class named by the first base clause of `id`, without
    /// completing it.
    fn declared_base(&self, id: EntityId, ctx: &mut ResolutionContext) -> Option<EntityId> {
        let ty = self.type_entity(id)?;
        let base_ref = ty.fragments().iter().find_map(|f| f.base.as_ref())?;
        match self.resolve_type_ref(base_ref, &TypeScope::of(id), ctx) {
            Ok(ResolvedType::Source { id, .. }) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn compute_interfaces(
        &self,
        ty: &TypeEntity,
        ctx: &mut ResolutionContext,
    ) -> InterfacesOutcome {
        let mut diagnostics = DiagnosticBag::new();
        let mut interfaces: Vec<ResolvedType> = Vec::new();
        if ty.kind() == TypeKind::Enum {
            return InterfacesOutcome::default();
        }
        let scope = TypeScope::of(ty.id());
        // Partial fragments may repeat an interface; only one fragment
        // repeating it is a duplicate.
        let mut from_earlier: FxHashSet<ResolvedType> = FxHashSet::default();
        for fragment in ty.fragments() {
            let mut in_fragment: FxHashSet<ResolvedType> = FxHashSet::default();
            for iface_ref in &fragment.interfaces {
                let resolved = match self.resolve_type_ref(iface_ref, &scope, ctx) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        err.report(&mut diagnostics, &fragment.location);
                        continue;
                    }
                };
                let shown = self.display_type(&resolved);
                if self.type_kind(&resolved) != Some(TypeKind::Interface) {
                    diagnostics.add(
                        diagnostic_codes::INTERFACE_EXPECTED,
                        &fragment.location,
                        &[&shown],
                    );
                    continue;
                }
                if !in_fragment.insert(resolved.clone()) {
                    diagnostics.add(
                        diagnostic_codes::DUPLICATE_INTERFACE,
                        &fragment.location,
                        &[&shown],
                    );
                    continue;
                }
                if from_earlier.insert(resolved.clone()) {
                    interfaces.push(resolved);
                }
            }
        }
        InterfacesOutcome {
            interfaces,
            diagnostics: diagnostics.into_vec(),
        }
    }
}

/// Whether `ty` is a valid enum underlying type.
pub fn is_integral_ref(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Primitive(p) if p.is_integral() && *p != PrimitiveKind::Char)
}

#[cfg(test)]
#[path = "../tests/base_types_tests.rs"]
mod tests;
