//! Two-pass annotation decoding.
//!
//! The early pass reads only the kinds in [`WellKnownAnnotation::EARLY`]. A
//! syntactic pre-filter picks candidate applications by written name, and
//! only those are bound, so reading an entity's version, key or usage never
//! binds its unrelated annotations. The full pass binds everything, validates
//! targets and multiplicity, decodes every kind and seals the result into an
//! [`AnnotationBag`]. Both results are published once per entity.

mod args;
mod data;
mod decode;
mod kinds;
mod resolver;

pub use args::{ArgValue, EvaluatedArguments};
pub use data::{
    DeclaredGrant, EarlyAnnotationData, ForwardedType, FullAnnotationData, InternalsGrant,
    LayoutData, LayoutKind, ObsoleteData, UnitVersion, UserAnnotation, UserAnnotationType,
    normalize_public_key,
};
pub use kinds::{AnnotationTargets, AnnotationUsage, WellKnownAnnotation};
pub use resolver::{
    AnnotationRequest, AnnotationResolver, AnnotationTypeResolution, DefaultAnnotationResolver,
};

use fixedbitset::FixedBitSet;
use rustc_hash::FxHashSet;
use sema_common::diagnostics::diagnostic_codes;
use sema_common::{Diagnostic, DiagnosticBag};
use sema_model::{AnnotationApplication, ConstValue, TypeRef};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::compilation::Compilation;
use crate::context::{GuardKey, ResolutionContext};
use crate::entity::EntityRef;
use crate::ids::EntityId;
use crate::type_resolution::TypeScope;
use decode::{DecodeInput, decode_early, decode_full};

/// What one application was bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundAnnotation {
    WellKnown(WellKnownAnnotation),
    User(UserAnnotationType),
    /// Not found, inaccessible or refused by the reentrancy guard.
    Unbound,
}

/// The sealed, decoded annotations of one entity.
#[derive(Debug)]
pub struct AnnotationBag {
    applications: Vec<BoundAnnotation>,
    early: Arc<EarlyAnnotationData>,
    full: FullAnnotationData,
    omitted: FixedBitSet,
    diagnostics: Vec<Diagnostic>,
}

impl AnnotationBag {
    /// Binding of each application, parallel to the entity's applications.
    pub fn applications(&self) -> &[BoundAnnotation] {
        &self.applications
    }

    pub fn early(&self) -> &EarlyAnnotationData {
        &self.early
    }

    pub fn full(&self) -> &FullAnnotationData {
        &self.full
    }

    /// Whether application `index` is excluded from emission.
    pub fn is_omitted(&self, index: usize) -> bool {
        self.omitted.contains(index)
    }

    pub fn omitted_count(&self) -> usize {
        self.omitted.count_ones(..)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has(&self, kind: WellKnownAnnotation) -> bool {
        self.applications
            .iter()
            .enumerate()
            .any(|(i, b)| *b == BoundAnnotation::WellKnown(kind) && !self.is_omitted(i))
    }
}

/// Mutable state of a full decode. Consumed by [`seal`](Self::seal).
struct AnnotationBagBuilder {
    applications: Vec<BoundAnnotation>,
    full: FullAnnotationData,
    omitted: FixedBitSet,
    diagnostics: DiagnosticBag,
}

impl AnnotationBagBuilder {
    fn new(len: usize) -> Self {
        Self {
            applications: vec![BoundAnnotation::Unbound; len],
            full: FullAnnotationData::default(),
            omitted: FixedBitSet::with_capacity(len),
            diagnostics: DiagnosticBag::new(),
        }
    }

    fn omit(&mut self, index: usize) {
        self.omitted.insert(index);
    }

    fn seal(self, early: Arc<EarlyAnnotationData>) -> AnnotationBag {
        AnnotationBag {
            applications: self.applications,
            early,
            full: self.full,
            omitted: self.omitted,
            diagnostics: self.diagnostics.into_vec(),
        }
    }
}

/// A list of applications together with how to bind them.
pub(crate) struct AnnotationSite<'a> {
    /// Owner and slot form the reentrancy key of each application.
    pub owner: EntityId,
    pub slot: u32,
    pub applications: &'a [AnnotationApplication],
    pub scope_owner: Option<EntityId>,
    pub method_type_params: &'a [String],
    pub target: AnnotationTargets,
}

impl<'a> AnnotationSite<'a> {
    pub(crate) fn of(entity: &'a EntityRef) -> Self {
        Self {
            owner: entity.id(),
            slot: 0,
            applications: entity.applications(),
            scope_owner: entity.scope_owner(),
            method_type_params: match entity {
                EntityRef::Member(m) => &m.decl().type_params,
                _ => &[],
            },
            target: entity.annotation_target(),
        }
    }

    fn type_scope(&self) -> TypeScope<'a> {
        TypeScope {
            owner: self.scope_owner,
            method_type_params: self.method_type_params,
        }
    }
}

impl Compilation {
    /// Early annotation data of `entity`, computed and published on first
    /// use. A request that re-enters the computation for the same entity
    /// sees empty data and publishes nothing.
    pub(crate) fn early_annotations(
        &self,
        entity: &EntityRef,
        ctx: &mut ResolutionContext,
    ) -> Arc<EarlyAnnotationData> {
        let core = entity.core();
        if let Some(data) = core.early.get() {
            return Arc::clone(data);
        }
        // Unit annotations are decoded by the identity computation.
        if matches!(entity, EntityRef::Unit(_)) && !ctx.is_in_flight(GuardKey::Identity) {
            if self.identity_in(ctx).is_err() {
                trace!("unit annotations requested by a cancelled request");
                return Arc::new(EarlyAnnotationData::default());
            }
            if let Some(data) = core.early.get() {
                return Arc::clone(data);
            }
        }
        let key = GuardKey::EarlyAnnotations(entity.id());
        match ctx.guarded(key, |ctx| {
            self.decode_early_site(&AnnotationSite::of(entity), None, ctx)
        }) {
            Ok(data) => core.early.publish(data).value,
            Err(_) => {
                trace!(entity = %entity.id(), "early annotations requested while being computed");
                Arc::new(EarlyAnnotationData::default())
            }
        }
    }

    /// Early data restricted to `kinds`, without sealing a bag or touching
    /// the Annotations phase. Kinds not decoded early are ignored.
    ///
    /// The unit's early data is only ever decoded by the identity
    /// computation, so a unit peek outside it finalizes the identity.
    pub fn peek_annotations_in(
        &self,
        entity: &EntityRef,
        kinds: &[WellKnownAnnotation],
        ctx: &mut ResolutionContext,
    ) -> EarlyAnnotationData {
        if let Some(data) = entity.core().early.get() {
            return data.restricted_to(kinds);
        }
        if matches!(entity, EntityRef::Unit(_)) && !ctx.is_in_flight(GuardKey::Identity) {
            return self.early_annotations(entity, ctx).restricted_to(kinds);
        }
        let key = GuardKey::EarlyAnnotations(entity.id());
        ctx.guarded(key, |ctx| {
            self.decode_early_site(&AnnotationSite::of(entity), Some(kinds), ctx)
        })
        .unwrap_or_default()
    }

    pub(crate) fn decode_early_site(
        &self,
        site: &AnnotationSite<'_>,
        kinds: Option<&[WellKnownAnnotation]>,
        ctx: &mut ResolutionContext,
    ) -> EarlyAnnotationData {
        let mut data = EarlyAnnotationData::default();
        let mut scratch = DiagnosticBag::new();
        let mut seen = FxHashSet::default();

        for (index, application) in site.applications.iter().enumerate() {
            let Some(kind) = WellKnownAnnotation::EARLY.into_iter().find(|k| {
                k.matches_syntax(application) && kinds.is_none_or(|ks| ks.contains(k))
            }) else {
                continue;
            };
            if self.bind_application(site, index, ctx) != AnnotationTypeResolution::WellKnown(kind) {
                continue;
            }
            let usage = kind.usage();
            if !usage.targets.intersects(site.target) {
                continue;
            }
            if !usage.allow_multiple && !seen.insert(kind) {
                continue;
            }
            let args = self.evaluate_arguments(application, &site.type_scope(), ctx, &mut scratch);
            let input = DecodeInput {
                kind,
                application,
                args: &args,
            };
            decode_early(&input, &mut data, &mut scratch);
        }
        data
    }

    /// The sealed annotation bag of `entity`, computed and published on
    /// first use. Publishing the bag does not complete the entity's
    /// Annotations phase.
    pub(crate) fn annotation_bag(
        &self,
        entity: &EntityRef,
        ctx: &mut ResolutionContext,
    ) -> Arc<AnnotationBag> {
        let core = entity.core();
        if let Some(bag) = core.bag.get() {
            return Arc::clone(bag);
        }
        let early = self.early_annotations(entity, ctx);
        let bag = self.decode_full_site(&AnnotationSite::of(entity), early, ctx);
        let published = core.bag.publish(bag);
        if published.won {
            debug!(
                entity = %entity.id(),
                applications = published.value.applications.len(),
                omitted = published.value.omitted_count(),
                "annotation bag sealed"
            );
        }
        published.value
    }

    fn decode_full_site(
        &self,
        site: &AnnotationSite<'_>,
        early: Arc<EarlyAnnotationData>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationBag {
        let mut builder = AnnotationBagBuilder::new(site.applications.len());
        let unit_signed = site.target == AnnotationTargets::UNIT && early.public_key.is_some();
        let mut seen = FxHashSet::default();
        let mut early_scratch = EarlyAnnotationData::default();

        for (index, application) in site.applications.iter().enumerate() {
            let location = &application.location;
            let (bound, usage) = match self.bind_application(site, index, ctx) {
                AnnotationTypeResolution::WellKnown(kind) => {
                    (BoundAnnotation::WellKnown(kind), kind.usage())
                }
                AnnotationTypeResolution::Source(id) => (
                    BoundAnnotation::User(UserAnnotationType::Source(id)),
                    self.user_annotation_usage(id, ctx),
                ),
                AnnotationTypeResolution::External { unit, name } => (
                    BoundAnnotation::User(UserAnnotationType::External { unit, name }),
                    AnnotationUsage::default(),
                ),
                AnnotationTypeResolution::NotFound => {
                    builder.diagnostics.add(
                        diagnostic_codes::ANNOTATION_NOT_FOUND,
                        location,
                        &[&application.name],
                    );
                    builder.omit(index);
                    continue;
                }
                AnnotationTypeResolution::Inaccessible(name) => {
                    builder
                        .diagnostics
                        .add(diagnostic_codes::TYPE_NOT_ACCESSIBLE, location, &[&name]);
                    builder.omit(index);
                    continue;
                }
                AnnotationTypeResolution::Unresolved => {
                    builder.omit(index);
                    continue;
                }
                AnnotationTypeResolution::LimitExceeded => {
                    builder.diagnostics.add(
                        diagnostic_codes::RESOLUTION_LIMIT_EXCEEDED,
                        location,
                        &[&application.name],
                    );
                    builder.omit(index);
                    continue;
                }
            };
            builder.applications[index] = bound.clone();

            let display_name = match &bound {
                BoundAnnotation::WellKnown(kind) => kind.name(),
                _ => application.name.as_str(),
            };
            if !usage.targets.intersects(site.target) {
                builder.diagnostics.add(
                    diagnostic_codes::ANNOTATION_INVALID_TARGET,
                    location,
                    &[display_name, &usage.targets.to_string()],
                );
                builder.omit(index);
                continue;
            }
            if !usage.allow_multiple && !seen.insert(bound.clone()) {
                builder.diagnostics.add(
                    diagnostic_codes::DUPLICATE_ANNOTATION,
                    location,
                    &[display_name],
                );
                builder.omit(index);
                continue;
            }

            match bound {
                BoundAnnotation::WellKnown(WellKnownAnnotation::TypeForwardedTo) => {
                    self.decode_forwarder(application, &mut builder, ctx);
                }
                BoundAnnotation::WellKnown(kind) => {
                    let args = self.evaluate_arguments(
                        application,
                        &site.type_scope(),
                        ctx,
                        &mut builder.diagnostics,
                    );
                    let input = DecodeInput {
                        kind,
                        application,
                        args: &args,
                    };
                    if kind.is_early() {
                        decode_early(&input, &mut early_scratch, &mut builder.diagnostics);
                    } else {
                        decode_full(&input, &mut builder.full, unit_signed, &mut builder.diagnostics);
                    }
                }
                BoundAnnotation::User(ty) => {
                    let args = self.evaluate_arguments(
                        application,
                        &site.type_scope(),
                        ctx,
                        &mut builder.diagnostics,
                    );
                    builder.full.user.push(UserAnnotation {
                        index,
                        ty,
                        positional: args.positional,
                        named: args.named,
                    });
                }
                BoundAnnotation::Unbound => {}
            }
        }
        builder.seal(early)
    }

    fn bind_application(
        &self,
        site: &AnnotationSite<'_>,
        index: usize,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution {
        let key = GuardKey::AnnotationSite {
            owner: site.owner,
            slot: site.slot,
            index: index as u32,
        };
        let request = AnnotationRequest {
            application: &site.applications[index],
            scope_owner: site.scope_owner,
            target: site.target,
        };
        match ctx.guarded(key, |ctx| self.resolver.resolve(self, &request, ctx)) {
            Ok(resolution) => resolution,
            Err(denied) if denied.is_exceeded() => AnnotationTypeResolution::LimitExceeded,
            Err(_) => AnnotationTypeResolution::Unresolved,
        }
    }

    /// Usage declared on a source annotation class, read through the early
    /// pass of that class.
    fn user_annotation_usage(&self, id: EntityId, ctx: &mut ResolutionContext) -> AnnotationUsage {
        match self.type_entity(id) {
            Some(ty) => {
                let entity = EntityRef::Type(ty);
                self.early_annotations(&entity, ctx).usage.unwrap_or_default()
            }
            None => AnnotationUsage::default(),
        }
    }

    fn decode_forwarder(
        &self,
        application: &AnnotationApplication,
        builder: &mut AnnotationBagBuilder,
        ctx: &mut ResolutionContext,
    ) {
        let location = &application.location;
        let name = WellKnownAnnotation::TypeForwardedTo.name();
        let positional: Vec<&ConstValue> = application.positional().collect();
        if positional.len() != 1 {
            builder.diagnostics.add(
                diagnostic_codes::ANNOTATION_ARGUMENT_COUNT,
                location,
                &[name, "1", &positional.len().to_string()],
            );
            return;
        }
        let ConstValue::Type(TypeRef::Named { name: forwarded, args }) = positional[0] else {
            builder.diagnostics.add(
                diagnostic_codes::ANNOTATION_ARGUMENT_TYPE,
                location,
                &["1", name, "a named type"],
            );
            return;
        };
        let arity = args.len();

        if self.lookup_source_type(forwarded, arity, &TypeScope::unit()).is_some() {
            builder.diagnostics.add(
                diagnostic_codes::FORWARDER_CONFLICTS_WITH_SOURCE,
                location,
                &[forwarded],
            );
            return;
        }
        match self.lookup_external_type(forwarded, arity, ctx) {
            Ok(Some((target, ty))) => {
                let duplicate = builder
                    .full
                    .forwarded_types
                    .iter()
                    .any(|f| f.name == ty.name && f.arity == arity);
                if duplicate {
                    builder.diagnostics.add(
                        diagnostic_codes::DUPLICATE_FORWARDER,
                        location,
                        &[&ty.name],
                    );
                    return;
                }
                builder.full.forwarded_types.push(ForwardedType {
                    name: ty.name,
                    arity,
                    target,
                    location: location.clone(),
                });
            }
            Ok(None) => {
                builder.diagnostics.add(
                    diagnostic_codes::FORWARDER_TARGET_NOT_FOUND,
                    location,
                    &[forwarded],
                );
            }
            Err(err) => err.report(&mut builder.diagnostics, location),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/annotations_tests.rs"]
mod tests;
