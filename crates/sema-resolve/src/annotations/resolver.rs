//! Binding annotation applications to annotation types.

use sema_model::{AnnotationApplication, TypeKind};
use tracing::trace;

use super::kinds::{AnnotationTargets, WellKnownAnnotation};
use crate::compilation::Compilation;
use crate::context::ResolutionContext;
use crate::ids::{EntityId, ReferenceId};
use crate::type_resolution::{NamedType, TypeLookupError, TypeScope};

/// One application to bind.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationRequest<'a> {
    pub application: &'a AnnotationApplication,
    /// Aggregate whose scope the name is looked up in; `None` for the unit.
    pub scope_owner: Option<EntityId>,
    pub target: AnnotationTargets,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationTypeResolution {
    WellKnown(WellKnownAnnotation),
    Source(EntityId),
    External { unit: ReferenceId, name: String },
    NotFound,
    /// The name denotes a type this unit may not see.
    Inaccessible(String),
    /// Binding was refused because it re-entered itself; treated as no
    /// match without a diagnostic.
    Unresolved,
    /// Binding was refused because the chain hit its depth or iteration
    /// limit.
    LimitExceeded,
}

/// Oracle deciding which annotation type an application denotes.
///
/// Implementations may perform arbitrary lookups through `compilation`,
/// including grant checks; reentrancy is cut by the caller's guard.
pub trait AnnotationResolver: Send + Sync {
    fn resolve(
        &self,
        compilation: &Compilation,
        request: &AnnotationRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution;
}

/// Looks the written name up as `Name` and `NameAttribute`: source classes
/// first, then classes of referenced units, then the well-known builtins.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAnnotationResolver;

impl AnnotationResolver for DefaultAnnotationResolver {
    fn resolve(
        &self,
        compilation: &Compilation,
        request: &AnnotationRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution {
        let written = request.application.name.as_str();
        let scope = TypeScope {
            owner: request.scope_owner,
            method_type_params: &[],
        };
        let mut inaccessible = None;

        let suffixed = (!written.ends_with("Attribute")).then(|| format!("{written}Attribute"));
        for candidate in std::iter::once(written).chain(suffixed.as_deref()) {
            match compilation.lookup_type_name(candidate, 0, &scope, ctx) {
                Ok(NamedType::Source(id)) => {
                    if compilation.type_entity(id).is_some_and(|t| t.kind() == TypeKind::Class) {
                        return AnnotationTypeResolution::Source(id);
                    }
                }
                Ok(NamedType::External { unit, ty }) if ty.kind == TypeKind::Class => {
                    return AnnotationTypeResolution::External { unit, name: ty.name };
                }
                Err(TypeLookupError::Inaccessible { name }) => {
                    inaccessible.get_or_insert(name);
                }
                Ok(_) | Err(_) => {}
            }
        }

        if let Some(kind) = WellKnownAnnotation::from_name(written) {
            return AnnotationTypeResolution::WellKnown(kind);
        }
        match inaccessible {
            Some(name) => AnnotationTypeResolution::Inaccessible(name),
            None => {
                trace!(name = written, "annotation type not found");
                AnnotationTypeResolution::NotFound
            }
        }
    }
}
