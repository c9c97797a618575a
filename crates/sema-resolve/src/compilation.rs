//! The compilation: entity registry and the completion driver.
//!
//! A [`Compilation`] owns every entity of one unit. Aggregates are created
//! up front by [`CompilationBuilder::build`]; members appear when their
//! owner's member table is published. All derived data is computed lazily
//! and published once, so any number of threads may query and complete
//! entities of the same compilation concurrently.
//!
//! [`Compilation::force_complete`] drives an entity through its parts in
//! order. Each part is claimed by exactly one thread, which executes it and
//! appends the part's diagnostics to the entity; every other thread waits
//! for the part to become Done. The `Members` part is never claimed: it is
//! done once every child (top-level types of the unit, members and nested
//! types of an aggregate) is complete.

use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use sema_common::diagnostics::diagnostic_codes;
use sema_common::{CancellationToken, Cancelled, Diagnostic, DiagnosticBag, DiagnosticCategory};
use sema_model::{MemberDeclKind, PrimitiveKind, ReferencedUnit, SourceUnit, TypeDecl, TypeRef};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError};
use tracing::{debug, trace, warn};

use crate::annotations::{
    AnnotationBag, AnnotationResolver, ArgValue, DefaultAnnotationResolver, EarlyAnnotationData,
    WellKnownAnnotation,
};
use crate::completion::{CompletionOutcome, CompletionPart, CompletionScope};
use crate::constants::ConstantOutcome;
use crate::context::ResolutionContext;
use crate::entity::{EntityRef, MemberEntity, MemberSignature, TypeEntity, UnitEntity};
use crate::field_usage::FieldUsageTracker;
use crate::ids::{EntityId, ReferenceId};
use crate::member_table::MemberTable;
use crate::synthesize::{MemberSynthesizer, default_synthesizers};
use crate::type_resolution::{ResolvedType, TypeScope};

/// Switches that change what a compilation reports.
#[derive(Clone, Debug)]
pub struct CompilationOptions {
    /// Report private fields that are never read or never written.
    pub report_unused_fields: bool,
    /// Report warnings as errors.
    pub warnings_as_errors: bool,
    /// Run the member synthesizers when building member tables.
    pub synthesize_members: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            report_unused_fields: false,
            warnings_as_errors: false,
            synthesize_members: true,
        }
    }
}

/// Receives the diagnostics of every part as soon as the part is done.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, entity: EntityId, part: CompletionPart, diagnostics: &[Diagnostic]);
}

pub struct Compilation {
    options: CompilationOptions,
    unit: Arc<UnitEntity>,
    types: FxHashMap<EntityId, Arc<TypeEntity>>,
    top_level: Vec<EntityId>,
    pub(crate) by_full_name: FxHashMap<(String, usize), EntityId>,
    pub(crate) by_simple_name: FxHashMap<(String, usize), SmallVec<[EntityId; 2]>>,
    /// Arities declared for each simple type name.
    pub(crate) arities: FxHashMap<String, SmallVec<[usize; 2]>>,
    primitive_structs: FxHashMap<PrimitiveKind, EntityId>,
    pub(crate) references: Vec<ReferencedUnit>,
    members: DashMap<EntityId, Arc<MemberEntity>>,
    next_id: AtomicU32,
    pub(crate) resolver: Arc<dyn AnnotationResolver>,
    synthesizers: Vec<Arc<dyn MemberSynthesizer>>,
    field_usage: FieldUsageTracker,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

// =============================================================================
// Construction
// =============================================================================

pub struct CompilationBuilder {
    source: SourceUnit,
    options: CompilationOptions,
    resolver: Arc<dyn AnnotationResolver>,
    synthesizers: Vec<Arc<dyn MemberSynthesizer>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl CompilationBuilder {
    pub fn new(source: SourceUnit) -> Self {
        Self {
            source,
            options: CompilationOptions::default(),
            resolver: Arc::new(DefaultAnnotationResolver),
            synthesizers: default_synthesizers(),
            sink: None,
        }
    }

    #[must_use]
    pub fn options(mut self, options: CompilationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn AnnotationResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register a synthesizer after the ones already registered.
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn MemberSynthesizer>) -> Self {
        self.synthesizers.push(synthesizer);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Compilation {
        let SourceUnit {
            name,
            annotations,
            types,
            references,
        } = self.source;

        let mut index = TypeIndex {
            next: EntityId::FIRST_ALLOCATED,
            ..TypeIndex::default()
        };
        let top_level = index.collect(types.into_iter().map(Arc::new).collect(), None);
        debug!(
            unit = %name,
            types = index.types.len(),
            references = references.len(),
            "compilation built"
        );

        Compilation {
            options: self.options,
            unit: Arc::new(UnitEntity::new(name, annotations)),
            types: index.types,
            top_level,
            by_full_name: index.by_full_name,
            by_simple_name: index.by_simple_name,
            arities: index.arities,
            primitive_structs: index.primitive_structs,
            references,
            members: DashMap::new(),
            next_id: AtomicU32::new(index.next),
            resolver: self.resolver,
            synthesizers: self.synthesizers,
            field_usage: FieldUsageTracker::new(),
            sink: self.sink,
        }
    }
}

#[derive(Default)]
struct TypeIndex {
    types: FxHashMap<EntityId, Arc<TypeEntity>>,
    by_full_name: FxHashMap<(String, usize), EntityId>,
    by_simple_name: FxHashMap<(String, usize), SmallVec<[EntityId; 2]>>,
    arities: FxHashMap<String, SmallVec<[usize; 2]>>,
    primitive_structs: FxHashMap<PrimitiveKind, EntityId>,
    next: u32,
}

impl TypeIndex {
    /// Group `decls` into aggregates by full name and arity, recursively.
    fn collect(&mut self, decls: Vec<Arc<TypeDecl>>, container: Option<(EntityId, &str)>) -> Vec<EntityId> {
        let mut groups: IndexMap<(String, usize), Vec<Arc<TypeDecl>>> = IndexMap::new();
        for decl in decls {
            let full_name = decl.full_name(container.map(|(_, name)| name));
            groups
                .entry((full_name, decl.arity()))
                .or_default()
                .push(decl);
        }

        let mut ids = Vec::with_capacity(groups.len());
        for ((full_name, arity), mut fragments) in groups {
            fragments.sort_by(|a, b| a.location.cmp(&b.location));
            let id = EntityId(self.next);
            self.next += 1;

            let nested_decls = fragments
                .iter()
                .flat_map(|f| f.nested_types.iter().cloned().map(Arc::new))
                .collect();
            let nested = self.collect(nested_decls, Some((id, &full_name)));

            let ty = TypeEntity::new(id, full_name.clone(), container.map(|(id, _)| id), fragments, nested);
            self.by_full_name.insert((full_name, arity), id);
            self.by_simple_name
                .entry((ty.name().to_string(), arity))
                .or_default()
                .push(id);
            let arities = self.arities.entry(ty.name().to_string()).or_default();
            if !arities.contains(&arity) {
                arities.push(arity);
            }
            if let Some(primitive) = ty.primitive() {
                self.primitive_structs.entry(primitive).or_insert(id);
            }
            self.types.insert(id, Arc::new(ty));
            ids.push(id);
        }
        ids
    }
}

// =============================================================================
// Registry
// =============================================================================

impl Compilation {
    #[inline]
    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn unit(&self) -> &UnitEntity {
        &self.unit
    }

    pub(crate) fn unit_arc(&self) -> Arc<UnitEntity> {
        Arc::clone(&self.unit)
    }

    pub(crate) fn synthesizers(&self) -> &[Arc<dyn MemberSynthesizer>] {
        &self.synthesizers
    }

    pub(crate) fn allocate_id(&self) -> EntityId {
        EntityId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Make the members of a published table addressable by id.
    pub(crate) fn register_members(&self, table: &MemberTable) {
        for member in table.all() {
            self.members
                .entry(member.id())
                .or_insert_with(|| Arc::clone(member));
        }
    }

    /// Top-level aggregates in declaration order.
    pub fn top_level_types(&self) -> &[EntityId] {
        &self.top_level
    }

    /// Every aggregate, nested ones included, in id order.
    pub fn types(&self) -> Vec<Arc<TypeEntity>> {
        let mut types: Vec<_> = self.types.values().cloned().collect();
        types.sort_by_key(|t| t.id());
        types
    }

    pub fn type_entity(&self, id: EntityId) -> Option<Arc<TypeEntity>> {
        self.types.get(&id).cloned()
    }

    /// A member, once its owner's member table is published.
    pub fn member_entity(&self, id: EntityId) -> Option<Arc<MemberEntity>> {
        self.members.get(&id).map(|m| Arc::clone(&m))
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRef> {
        if id == EntityId::UNIT {
            return Some(EntityRef::Unit(self.unit_arc()));
        }
        if let Some(ty) = self.type_entity(id) {
            return Some(EntityRef::Type(ty));
        }
        self.member_entity(id).map(EntityRef::Member)
    }

    /// The aggregate declared as `full_name` with `arity` type parameters.
    pub fn find_type(&self, full_name: &str, arity: usize) -> Option<EntityId> {
        self.by_full_name
            .get(&(full_name.to_string(), arity))
            .copied()
    }

    pub fn references(&self) -> &[ReferencedUnit] {
        &self.references
    }

    pub fn reference(&self, id: ReferenceId) -> Option<&ReferencedUnit> {
        self.references.get(id.index())
    }

    pub fn find_reference(&self, name: &str) -> Option<ReferenceId> {
        self.references
            .iter()
            .position(|r| r.name == name)
            .map(|index| ReferenceId(index as u32))
    }

    /// The source struct implementing `primitive`, if this unit declares it.
    pub(crate) fn primitive_struct(&self, primitive: PrimitiveKind) -> Option<EntityId> {
        self.primitive_structs.get(&primitive).copied()
    }
}

// =============================================================================
// Queries
// =============================================================================

impl Compilation {
    /// Visible members of aggregate `id`, building its member table if
    /// needed. Hidden implementation halves are not returned.
    pub fn get_members(&self, id: EntityId) -> Vec<Arc<MemberEntity>> {
        let mut ctx = ResolutionContext::uncancellable();
        self.member_table_in(id, &mut ctx)
            .map(|table| table.members().to_vec())
            .unwrap_or_default()
    }

    pub fn get_members_by_name(&self, id: EntityId, name: &str) -> Vec<Arc<MemberEntity>> {
        let mut ctx = ResolutionContext::uncancellable();
        self.member_table_in(id, &mut ctx)
            .map(|table| table.by_name(name).cloned().collect())
            .unwrap_or_default()
    }

    /// Nested aggregates of `id`; the top-level aggregates for the unit.
    pub fn get_nested_types(&self, id: EntityId) -> Vec<EntityId> {
        if id == EntityId::UNIT {
            return self.top_level.clone();
        }
        self.type_entity(id)
            .map(|t| t.nested_types().to_vec())
            .unwrap_or_default()
    }

    /// The sealed annotation bag of `id`.
    pub fn get_annotation_data(&self, id: EntityId) -> Option<Arc<AnnotationBag>> {
        let entity = self.entity(id)?;
        Some(self.annotation_bag(&entity, &mut ResolutionContext::uncancellable()))
    }

    /// Early data of `id` restricted to `kinds`, without sealing its bag.
    pub fn peek_annotations(&self, id: EntityId, kinds: &[WellKnownAnnotation]) -> Option<EarlyAnnotationData> {
        let entity = self.entity(id)?;
        Some(self.peek_annotations_in(&entity, kinds, &mut ResolutionContext::uncancellable()))
    }

    /// Whether application `index` of `id` is omitted from its bag.
    pub fn is_annotation_omitted(&self, id: EntityId, index: usize) -> bool {
        self.get_annotation_data(id)
            .is_some_and(|bag| bag.is_omitted(index))
    }

    /// Whether struct `id` contains itself through its instance fields.
    pub fn has_struct_cycle(&self, id: EntityId) -> bool {
        self.struct_layout_in(id, &mut ResolutionContext::uncancellable())
            .is_some_and(|outcome| outcome.has_cycle())
    }

    /// The accepted base class of aggregate `id`.
    pub fn base_type(&self, id: EntityId) -> Option<ResolvedType> {
        let ty = self.type_entity(id)?;
        let mut ctx = ResolutionContext::uncancellable();
        ty.base
            .get_or_publish(|| self.compute_base_type(&ty, &mut ctx))
            .value
            .base
            .clone()
    }

    pub fn interfaces(&self, id: EntityId) -> Vec<ResolvedType> {
        let Some(ty) = self.type_entity(id) else {
            return Vec::new();
        };
        let mut ctx = ResolutionContext::uncancellable();
        ty.interfaces
            .get_or_publish(|| self.compute_interfaces(&ty, &mut ctx))
            .value
            .interfaces
            .clone()
    }

    /// Resolved types of member `id`.
    pub fn member_signature(&self, id: EntityId) -> Option<Arc<MemberSignature>> {
        let member = self.member_entity(id)?;
        if let Some(signature) = member.signature.get() {
            return Some(Arc::clone(signature));
        }
        let (signature, _) = self.compute_signature(&member, &mut ResolutionContext::uncancellable());
        Some(member.signature.publish(signature).value)
    }

    /// Value of constant field `id`; `None` for other members and for
    /// constants that cannot be evaluated.
    pub fn constant_value(&self, id: EntityId) -> Option<ArgValue> {
        let member = self.member_entity(id)?;
        let field = member.early_field().filter(|f| f.is_const)?;
        match self
            .field_constant(field, &mut ResolutionContext::uncancellable())
            .ok()?
            .as_ref()
        {
            ConstantOutcome::Value(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn note_field_read(&self, field: EntityId) {
        self.field_usage.note_read(field);
    }

    pub fn note_field_written(&self, field: EntityId) {
        self.field_usage.note_written(field);
    }

    /// Diagnostics of every entity, ordered by location.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.unit.core().diagnostics();
        for ty in self.types.values() {
            all.extend(ty.core().diagnostics());
        }
        for member in &self.members {
            all.extend(member.core().diagnostics());
        }
        all.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.message_text.cmp(&b.message_text))
        });
        all
    }
}

// =============================================================================
// Completion
// =============================================================================

impl Compilation {
    /// Complete `id` as far as `scope` allows.
    pub fn force_complete(
        &self,
        id: EntityId,
        scope: &CompletionScope,
        cancel: &CancellationToken,
    ) -> Result<CompletionOutcome, Cancelled> {
        let mut ctx = ResolutionContext::new(cancel.clone());
        self.force_complete_in(id, scope, &mut ctx)
    }

    /// Complete the unit and everything in it.
    pub fn complete_all(&self, cancel: &CancellationToken) -> Result<CompletionOutcome, Cancelled> {
        self.force_complete(EntityId::UNIT, &CompletionScope::all(), cancel)
    }

    pub fn force_complete_in(
        &self,
        id: EntityId,
        scope: &CompletionScope,
        ctx: &mut ResolutionContext,
    ) -> Result<CompletionOutcome, Cancelled> {
        let Some(entity) = self.entity(id) else {
            warn!(entity = %id, "completion requested for an unknown entity");
            return Ok(CompletionOutcome::Partial);
        };
        let state = entity.core().state();

        loop {
            ctx.check_cancelled()?;
            let Some(part) = state.next_incomplete() else {
                return Ok(CompletionOutcome::Complete);
            };

            if part == CompletionPart::Members {
                if !self.complete_children(&entity, scope, ctx)? {
                    return Ok(CompletionOutcome::Partial);
                }
                state.mark_observed(part);
                continue;
            }

            if ctx.holds_claim(id, part) {
                warn!(entity = %id, %part, "completion re-entered a part it is executing");
                return Ok(CompletionOutcome::Partial);
            }

            if state.try_claim(part) {
                ctx.push_claim(id, part);
                let executed = self.execute_part(&entity, part, ctx);
                ctx.pop_claim(id, part);
                match executed {
                    Ok(diagnostics) => {
                        self.record(&entity, part, diagnostics);
                        state.mark_done(part);
                        trace!(entity = %id, %part, "part done");
                    }
                    Err(cancelled) => {
                        state.release(part);
                        debug!(entity = %id, %part, "part released after cancellation");
                        return Err(cancelled);
                    }
                }
            } else {
                state.wait_while_claimed(part, ctx.cancel_token())?;
            }
        }
    }

    /// Complete the children `scope` admits. Returns whether every child is
    /// now complete.
    fn complete_children(
        &self,
        entity: &EntityRef,
        scope: &CompletionScope,
        ctx: &mut ResolutionContext,
    ) -> Result<bool, Cancelled> {
        let children: Vec<EntityRef> = match entity {
            EntityRef::Unit(_) => self
                .top_level
                .iter()
                .filter_map(|&id| self.type_entity(id).map(EntityRef::Type))
                .collect(),
            EntityRef::Type(ty) => {
                let Some(table) = self.member_table_in(ty.id(), ctx) else {
                    return Ok(true);
                };
                table
                    .all()
                    .cloned()
                    .map(EntityRef::Member)
                    .chain(
                        table
                            .nested_types()
                            .iter()
                            .filter_map(|&id| self.type_entity(id).map(EntityRef::Type)),
                    )
                    .collect()
            }
            EntityRef::Member(_) => return Ok(true),
        };

        let mut all_complete = true;
        for child in children {
            if child.core().state().is_complete() {
                continue;
            }
            if !scope.admits(child.id(), child.locations().into_iter()) {
                all_complete = false;
                continue;
            }
            if self.force_complete_in(child.id(), scope, ctx)? == CompletionOutcome::Partial {
                all_complete = false;
            }
        }
        Ok(all_complete)
    }

    /// Append the diagnostics of a finished part to its entity.
    fn record(&self, entity: &EntityRef, part: CompletionPart, mut diagnostics: Vec<Diagnostic>) {
        if self.options.warnings_as_errors {
            for diagnostic in &mut diagnostics {
                if diagnostic.category == DiagnosticCategory::Warning {
                    diagnostic.category = DiagnosticCategory::Error;
                }
            }
        }
        if let Some(sink) = &self.sink {
            sink.report(entity.id(), part, &diagnostics);
        }
        entity.core().append_diagnostics(diagnostics);
    }

    fn execute_part(
        &self,
        entity: &EntityRef,
        part: CompletionPart,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<Diagnostic>, Cancelled> {
        match entity {
            EntityRef::Unit(_) => self.execute_unit_part(entity, part, ctx),
            EntityRef::Type(ty) => Ok(self.execute_type_part(entity, ty, part, ctx)),
            EntityRef::Member(member) => Ok(self.execute_member_part(entity, member, part, ctx)),
        }
    }

    fn execute_unit_part(
        &self,
        entity: &EntityRef,
        part: CompletionPart,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<Diagnostic>, Cancelled> {
        Ok(match part {
            CompletionPart::Identity => {
                self.identity_in(ctx)?;
                Vec::new()
            }
            CompletionPart::Annotations => self.annotation_bag(entity, ctx).diagnostics().to_vec(),
            CompletionPart::GrantChecks => {
                self.identity_in(ctx)?;
                self.grant_diagnostics()
            }
            CompletionPart::PostChecks if self.options.report_unused_fields => self.field_usage.report(),
            _ => Vec::new(),
        })
    }

    fn execute_type_part(
        &self,
        entity: &EntityRef,
        ty: &Arc<TypeEntity>,
        part: CompletionPart,
        ctx: &mut ResolutionContext,
    ) -> Vec<Diagnostic> {
        match part {
            CompletionPart::Annotations => self.annotation_bag(entity, ctx).diagnostics().to_vec(),
            CompletionPart::BaseType => ty
                .base
                .get_or_publish(|| self.compute_base_type(ty, ctx))
                .value
                .diagnostics
                .clone(),
            CompletionPart::Interfaces => ty
                .interfaces
                .get_or_publish(|| self.compute_interfaces(ty, ctx))
                .value
                .diagnostics
                .clone(),
            CompletionPart::MemberChecks => {
                let Some(table) = self.member_table_in(ty.id(), ctx) else {
                    return Vec::new();
                };
                let mut diagnostics = DiagnosticBag::from(table.diagnostics().to_vec());
                let bag = self.annotation_bag(entity, ctx);
                if let Some((_, location)) = &bag.full().default_member {
                    if table.has_indexer() {
                        diagnostics.add(diagnostic_codes::DEFAULT_MEMBER_WITH_INDEXER, location, &[]);
                    }
                }
                diagnostics.into_vec()
            }
            CompletionPart::StructLayout => self
                .struct_layout_in(ty.id(), ctx)
                .map(|outcome| outcome.diagnostics.clone())
                .unwrap_or_default(),
            CompletionPart::PostChecks => {
                if self.options.report_unused_fields {
                    self.register_unused_candidates(ty, ctx);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn register_unused_candidates(&self, ty: &TypeEntity, ctx: &mut ResolutionContext) {
        let mut registered = ty
            .unused_registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *registered {
            return;
        }
        if let Some(table) = self.member_table_in(ty.id(), ctx) {
            let count = self.field_usage.register_candidates(table.all());
            trace!(owner = %ty.full_name(), count, "unused-field candidates registered");
        }
        *registered = true;
    }

    fn execute_member_part(
        &self,
        entity: &EntityRef,
        member: &Arc<MemberEntity>,
        part: CompletionPart,
        ctx: &mut ResolutionContext,
    ) -> Vec<Diagnostic> {
        match part {
            CompletionPart::Annotations => self.annotation_bag(entity, ctx).diagnostics().to_vec(),
            CompletionPart::MemberChecks => self.check_member(entity, member, ctx),
            _ => Vec::new(),
        }
    }

    fn check_member(
        &self,
        entity: &EntityRef,
        member: &Arc<MemberEntity>,
        ctx: &mut ResolutionContext,
    ) -> Vec<Diagnostic> {
        let (signature, diagnostics) = self.compute_signature(member, ctx);
        let signature = member.signature.publish(signature).value;
        let mut diagnostics = DiagnosticBag::from(diagnostics);
        let location = member.location();

        if let Some(field) = member.early_field().filter(|f| f.is_const) {
            if let Ok(outcome) = self.field_constant(field, ctx) {
                match outcome.as_ref() {
                    ConstantOutcome::Cycle { .. } => {
                        diagnostics.add(diagnostic_codes::CONSTANT_CYCLE, location, &[member.name()]);
                    }
                    ConstantOutcome::Missing(name) => {
                        diagnostics.add(diagnostic_codes::CONSTANT_NOT_FOUND, location, &[name]);
                    }
                    ConstantOutcome::Value(_) | ConstantOutcome::DependsOnError => {}
                }
            }
        }

        if member.kind() == MemberDeclKind::Method
            && signature.ty != ResolvedType::Primitive(PrimitiveKind::Void)
        {
            let bag = self.annotation_bag(entity, ctx);
            if !bag.early().conditional_symbols.is_empty() {
                diagnostics.add(
                    diagnostic_codes::CONDITIONAL_REQUIRES_VOID,
                    location,
                    &[member.name()],
                );
            }
        }
        diagnostics.into_vec()
    }

    /// Resolve the types of `member`, reporting lookup failures at the
    /// member's declaration.
    pub(crate) fn compute_signature(
        &self,
        member: &MemberEntity,
        ctx: &mut ResolutionContext,
    ) -> (MemberSignature, Vec<Diagnostic>) {
        let decl = member.decl();
        let scope = TypeScope::of(member.owner()).with_method_type_params(&decl.type_params);
        let mut diagnostics = DiagnosticBag::new();
        let mut resolve = |ty: &TypeRef, ctx: &mut ResolutionContext| match self.resolve_type_ref(ty, &scope, ctx) {
            Ok(resolved) => resolved,
            Err(err) => {
                err.report(&mut diagnostics, &decl.location);
                ResolvedType::Error
            }
        };

        let ty = match &decl.ty {
            Some(ty) => resolve(ty, ctx),
            None => ResolvedType::Primitive(PrimitiveKind::Void),
        };
        let parameters = decl
            .parameters
            .iter()
            .map(|p| (p.ref_kind, resolve(&p.ty, ctx)))
            .collect();
        (MemberSignature { ty, parameters }, diagnostics.into_vec())
    }
}

#[cfg(test)]
#[path = "../tests/compilation_tests.rs"]
mod tests;
