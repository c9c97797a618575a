//! Member tables of aggregates.
//!
//! The early table holds only fields and nested types and is built without
//! binding anything, so it can answer constant lookups and layout questions
//! while the aggregate's annotations are still being decoded. The full table
//! runs the partial merger, the conflict rules and the synthesizers.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use sema_common::diagnostics::diagnostic_codes;
use sema_common::{Diagnostic, DiagnosticBag};
use sema_model::{
    AccessorKind, MemberDecl, MemberDeclKind, Modifiers, OperatorKind, RefKind, TypeKind, TypeRef,
};
use smallvec::SmallVec;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use crate::annotations::{AnnotationSite, WellKnownAnnotation};
use crate::compilation::Compilation;
use crate::constants::{ConstantOutcome, FieldKey};
use crate::context::ResolutionContext;
use crate::entity::{
    LinkedAccessor, MemberEntity, MemberOrigin, PartialLink, PartialRole, TypeEntity, member_target,
};
use crate::ids::EntityId;
use crate::partial_members::{MergedMember, RawMember, merge_partial_members};
use crate::publish::PublishOnce;
use crate::synthesize::SynthesisContext;

/// Spelling of a type reference used to compare signatures: method type
/// parameters are written by position as `!!0`, `!!1`, ...
pub(crate) fn normalized_type(ty: &TypeRef, method_type_params: &[String]) -> String {
    let mut out = String::new();
    write_normalized(&mut out, ty, method_type_params);
    out
}

fn write_normalized(out: &mut String, ty: &TypeRef, method_type_params: &[String]) {
    match ty {
        TypeRef::Primitive(p) => out.push_str(p.keyword()),
        TypeRef::Array(elem) => {
            write_normalized(out, elem, method_type_params);
            out.push_str("[]");
        }
        TypeRef::Named { name, args } => {
            if args.is_empty() {
                if let Some(ordinal) = method_type_params.iter().position(|p| p == name) {
                    let _ = write!(out, "!!{ordinal}");
                    return;
                }
            }
            out.push_str(name);
            if !args.is_empty() {
                out.push('<');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_normalized(out, arg, method_type_params);
                }
                out.push('>');
            }
        }
    }
}

// =============================================================================
// Early table
// =============================================================================

/// A field as seen by the early table.
#[derive(Debug)]
pub struct EarlyField {
    pub ordinal: u32,
    /// Ordinal of the declaring member (the event, for backing fields).
    pub declared: u32,
    pub owner: EntityId,
    pub name: String,
    pub decl: Arc<MemberDecl>,
    pub is_static: bool,
    pub is_const: bool,
    /// Backing field of a field-like event.
    pub implicit: bool,
    pub(crate) constant: PublishOnce<ConstantOutcome>,
}

impl EarlyField {
    #[inline]
    pub fn key(&self) -> FieldKey {
        (self.owner, self.ordinal)
    }

    pub fn ty(&self) -> Option<&TypeRef> {
        self.decl.ty.as_ref()
    }
}

/// Fields and nested types of one aggregate.
#[derive(Debug, Default)]
pub struct EarlyMemberTable {
    fields: Vec<Arc<EarlyField>>,
    by_name: FxHashMap<String, usize>,
    nested: Vec<EntityId>,
}

impl EarlyMemberTable {
    pub fn fields(&self) -> &[Arc<EarlyField>] {
        &self.fields
    }

    /// The first field called `name`.
    pub fn field(&self, name: &str) -> Option<&Arc<EarlyField>> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &Arc<EarlyField>> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    pub fn nested_types(&self) -> &[EntityId] {
        &self.nested
    }

    fn field_for(&self, declared: u32, implicit: bool) -> Option<&Arc<EarlyField>> {
        self.fields
            .iter()
            .find(|f| f.declared == declared && f.implicit == implicit)
    }
}

/// Backing field declaration of a field-like event.
fn backing_field_decl(event: &MemberDecl) -> MemberDecl {
    let mut modifiers = Modifiers::PRIVATE;
    if event.modifiers.contains(Modifiers::STATIC) {
        modifiers |= Modifiers::STATIC;
    }
    MemberDecl {
        kind: MemberDeclKind::Field,
        name: event.name.clone(),
        modifiers,
        type_params: Vec::new(),
        parameters: Vec::new(),
        ty: event.ty.clone(),
        accessors: Vec::new(),
        annotations: Vec::new(),
        constant: None,
        has_body: false,
        has_initializer: event.has_initializer,
        location: event.location.clone(),
    }
}

pub(crate) fn build_early(ty: &TypeEntity) -> EarlyMemberTable {
    let mut table = EarlyMemberTable {
        nested: ty.nested_types().to_vec(),
        ..EarlyMemberTable::default()
    };
    for member in ty.declared_members() {
        let decl = &member.decl;
        let (field_decl, implicit) = match decl.kind {
            MemberDeclKind::Field => (Arc::clone(decl), false),
            MemberDeclKind::Event if decl.is_field_like_event() => {
                (Arc::new(backing_field_decl(decl)), true)
            }
            _ => continue,
        };
        let ordinal = table.fields.len() as u32;
        table.by_name.entry(field_decl.name.clone()).or_insert(ordinal as usize);
        table.fields.push(Arc::new(EarlyField {
            ordinal,
            declared: member.ordinal,
            owner: ty.id(),
            name: field_decl.name.clone(),
            is_static: field_decl.is_static(),
            is_const: field_decl.modifiers.contains(Modifiers::CONST),
            implicit,
            decl: field_decl,
            constant: PublishOnce::new(),
        }));
    }
    table
}

// =============================================================================
// Full table
// =============================================================================

/// The conflict-checked members of one aggregate.
#[derive(Debug)]
pub struct MemberTable {
    members: Vec<Arc<MemberEntity>>,
    by_name: IndexMap<String, SmallVec<[usize; 2]>>,
    hidden: Vec<Arc<MemberEntity>>,
    nested: Vec<EntityId>,
    diagnostics: Vec<Diagnostic>,
}

impl MemberTable {
    /// Published members in declaration order, synthesized members last.
    pub fn members(&self) -> &[Arc<MemberEntity>] {
        &self.members
    }

    /// Members called `name`, in declaration order.
    pub fn by_name<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Arc<MemberEntity>> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.members[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Implementation halves of partial pairs.
    pub fn hidden(&self) -> &[Arc<MemberEntity>] {
        &self.hidden
    }

    /// Published and hidden members.
    pub fn all(&self) -> impl Iterator<Item = &Arc<MemberEntity>> {
        self.members.iter().chain(&self.hidden)
    }

    pub fn nested_types(&self) -> &[EntityId] {
        &self.nested
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_indexer(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.kind() == MemberDeclKind::Indexer)
    }
}

/// Builds the full table of one aggregate. Losing builders are discarded
/// together with their diagnostics and member ids.
pub(crate) struct MemberTableBuilder<'a> {
    compilation: &'a Compilation,
    ty: &'a TypeEntity,
    early: Arc<EarlyMemberTable>,
    diagnostics: DiagnosticBag,
    members: Vec<Arc<MemberEntity>>,
    hidden: Vec<Arc<MemberEntity>>,
}

impl<'a> MemberTableBuilder<'a> {
    pub(crate) fn new(compilation: &'a Compilation, ty: &'a TypeEntity, early: Arc<EarlyMemberTable>) -> Self {
        Self {
            compilation,
            ty,
            early,
            diagnostics: DiagnosticBag::new(),
            members: Vec::new(),
            hidden: Vec::new(),
        }
    }

    pub(crate) fn build_full(mut self, ctx: &mut ResolutionContext) -> MemberTable {
        let raw = self.declared(ctx);
        let merged = merge_partial_members(raw, &mut self.diagnostics);
        for member in merged {
            self.add_merged(member);
        }
        self.check_conflicts();
        if self.compilation.options().synthesize_members {
            self.synthesize();
        }
        self.finish()
    }

    /// Declared members with their table names.
    fn declared(&self, ctx: &mut ResolutionContext) -> Vec<RawMember> {
        self.ty
            .declared_members()
            .iter()
            .map(|member| {
                let decl = &member.decl;
                let mut name = decl.metadata_name();
                if decl.kind == MemberDeclKind::Indexer
                    && decl
                        .annotations
                        .iter()
                        .any(|a| WellKnownAnnotation::IndexerName.matches_syntax(a))
                {
                    let site = AnnotationSite {
                        owner: self.ty.id(),
                        slot: member.ordinal + 1,
                        applications: &decl.annotations,
                        scope_owner: Some(self.ty.id()),
                        method_type_params: &decl.type_params,
                        target: member_target(decl.kind),
                    };
                    let early = self.compilation.decode_early_site(
                        &site,
                        Some(&[WellKnownAnnotation::IndexerName][..]),
                        ctx,
                    );
                    if let Some(indexer_name) = early.indexer_name {
                        name = indexer_name;
                    }
                }
                RawMember {
                    ordinal: member.ordinal,
                    decl: Arc::clone(decl),
                    name,
                }
            })
            .collect()
    }

    fn new_member(&self, raw: &RawMember) -> MemberEntity {
        let early_field = (raw.decl.kind == MemberDeclKind::Field)
            .then(|| self.early.field_for(raw.ordinal, false).cloned())
            .flatten();
        MemberEntity::new(
            self.compilation.allocate_id(),
            self.ty.id(),
            raw.name.clone(),
            Arc::clone(&raw.decl),
            MemberOrigin::Declared {
                ordinal: raw.ordinal,
            },
        )
        .with_early_field(early_field)
    }

    fn add_merged(&mut self, merged: MergedMember) {
        match merged {
            MergedMember::Single(raw) => {
                let member = self.new_member(&raw);
                self.push_declared(member, &raw);
            }
            MergedMember::Lone { member: raw, definition } => {
                let role = if definition {
                    PartialRole::Definition
                } else {
                    PartialRole::Implementation
                };
                let member = self
                    .new_member(&raw)
                    .with_partial(PartialLink { role, partner: None }, false);
                self.push_declared(member, &raw);
            }
            MergedMember::Pair {
                definition,
                implementation,
            } => {
                let def_entity = self.new_member(&definition);
                let imp_entity = self.new_member(&implementation);
                let (def_id, imp_id) = (def_entity.id(), imp_entity.id());
                let (def_accessors, imp_accessors) =
                    link_accessors(&definition.decl, &implementation.decl);

                let applications = definition
                    .decl
                    .annotations
                    .iter()
                    .chain(&implementation.decl.annotations)
                    .cloned()
                    .collect();
                let def_entity = def_entity
                    .with_applications(applications)
                    .with_accessors(def_accessors)
                    .with_partial(
                        PartialLink {
                            role: PartialRole::Definition,
                            partner: Some(imp_id),
                        },
                        false,
                    );
                let imp_entity = imp_entity
                    .with_applications(Vec::new())
                    .with_accessors(imp_accessors)
                    .with_partial(
                        PartialLink {
                            role: PartialRole::Implementation,
                            partner: Some(def_id),
                        },
                        true,
                    );
                self.members.push(Arc::new(def_entity));
                self.hidden.push(Arc::new(imp_entity));
            }
        }
    }

    /// Push a declared member, followed by its implicit backing field when
    /// it is a field-like event.
    fn push_declared(&mut self, member: MemberEntity, raw: &RawMember) {
        self.members.push(Arc::new(member));
        if raw.decl.is_field_like_event() {
            if let Some(field) = self.early.field_for(raw.ordinal, true) {
                let backing = MemberEntity::new(
                    self.compilation.allocate_id(),
                    self.ty.id(),
                    field.name.clone(),
                    Arc::clone(&field.decl),
                    MemberOrigin::ImplicitBackingField {
                        event_ordinal: raw.ordinal,
                    },
                )
                .with_early_field(Some(Arc::clone(field)));
                self.members.push(Arc::new(backing));
            }
        }
    }

    fn check_conflicts(&mut self) {
        let type_name = self.ty.full_name().to_string();
        let nested_names: FxHashSet<String> = self
            .ty
            .nested_types()
            .iter()
            .filter_map(|&id| self.compilation.type_entity(id))
            .map(|t| t.name().to_string())
            .collect();

        let mut seen: FxHashMap<&str, SmallVec<[usize; 2]>> = FxHashMap::default();
        let mut indexer_anchor: Option<&str> = None;
        let members = &self.members;
        let diagnostics = &mut self.diagnostics;

        for (index, member) in members.iter().enumerate() {
            if member.is_implicit() {
                continue;
            }
            let name = member.name();
            let location = member.location();

            if nested_names.contains(name) {
                diagnostics.add(
                    diagnostic_codes::DUPLICATE_MEMBER_NAME,
                    location,
                    &[&type_name, name],
                );
            } else if let Some(previous) = seen.get(name) {
                for &other in previous {
                    if let Some(code_args) = conflict(&members[other], member) {
                        report_conflict(diagnostics, &type_name, member, code_args);
                        break;
                    }
                }
            }
            seen.entry(name).or_default().push(index);

            if member.kind() == MemberDeclKind::Indexer {
                match indexer_anchor {
                    None => indexer_anchor = Some(name),
                    Some(anchor) if anchor != name => {
                        diagnostics.add(diagnostic_codes::INCONSISTENT_INDEXER_NAMES, location, &[]);
                    }
                    Some(_) => {}
                }
            }

            let is_constructor = matches!(
                member.kind(),
                MemberDeclKind::Constructor | MemberDeclKind::StaticConstructor
            );
            if !is_constructor && member.decl().name == self.ty.name() {
                diagnostics.add(diagnostic_codes::MEMBER_NAME_SAME_AS_TYPE, location, &[name]);
            }

            if self.ty.kind() == TypeKind::Interface {
                match member.kind() {
                    MemberDeclKind::Field if !member.is_static() => {
                        diagnostics.add(
                            diagnostic_codes::INTERFACE_CANNOT_CONTAIN_FIELDS,
                            location,
                            &[],
                        );
                    }
                    MemberDeclKind::Constructor => {
                        diagnostics.add(
                            diagnostic_codes::INTERFACE_CANNOT_CONTAIN_CONSTRUCTORS,
                            location,
                            &[],
                        );
                    }
                    _ => {}
                }
            }
        }

        check_operator_pairs(members, diagnostics);
        check_reserved_accessor_names(members, &type_name, diagnostics);
    }

    fn synthesize(&mut self) {
        let compilation = self.compilation;
        for synthesizer in compilation.synthesizers() {
            let decls = synthesizer.synthesize(&SynthesisContext {
                ty: self.ty,
                members: &self.members,
            });
            for decl in decls {
                let name = decl.metadata_name();
                debug!(
                    owner = %self.ty.full_name(),
                    member = %name,
                    origin = synthesizer.name(),
                    "synthesized member"
                );
                let member = MemberEntity::new(
                    compilation.allocate_id(),
                    self.ty.id(),
                    name,
                    Arc::new(decl),
                    MemberOrigin::Synthesized(synthesizer.name()),
                );
                self.members.push(Arc::new(member));
            }
        }
    }

    fn finish(self) -> MemberTable {
        let mut by_name: IndexMap<String, SmallVec<[usize; 2]>> = IndexMap::new();
        for (index, member) in self.members.iter().enumerate() {
            by_name
                .entry(member.name().to_string())
                .or_default()
                .push(index);
        }
        MemberTable {
            members: self.members,
            by_name,
            hidden: self.hidden,
            nested: self.early.nested_types().to_vec(),
            diagnostics: self.diagnostics.into_vec(),
        }
    }
}

fn link_accessors(
    definition: &MemberDecl,
    implementation: &MemberDecl,
) -> (Vec<LinkedAccessor>, Vec<LinkedAccessor>) {
    let link = |from: &MemberDecl, to: &MemberDecl| {
        from.accessors
            .iter()
            .map(|a| LinkedAccessor {
                kind: a.kind,
                location: a.location.clone(),
                partner: to.accessor(a.kind).map(|p| p.location.clone()),
            })
            .collect()
    };
    (link(definition, implementation), link(implementation, definition))
}

// =============================================================================
// Conflict rules
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum OverloadClass {
    MethodLike,
    Indexer,
    NotOverloadable,
}

fn overload_class(kind: MemberDeclKind) -> OverloadClass {
    match kind {
        MemberDeclKind::Method
        | MemberDeclKind::Operator(_)
        | MemberDeclKind::Constructor
        | MemberDeclKind::StaticConstructor => OverloadClass::MethodLike,
        MemberDeclKind::Indexer => OverloadClass::Indexer,
        _ => OverloadClass::NotOverloadable,
    }
}

/// Parameter types and ref kinds as compared for overloading. Conversion
/// operators also differ by return type.
fn signature(member: &MemberEntity) -> (usize, Vec<String>, Vec<RefKind>, Option<String>) {
    let decl = member.decl();
    let types = decl
        .parameters
        .iter()
        .map(|p| normalized_type(&p.ty, &decl.type_params))
        .collect();
    let ref_kinds = decl.parameters.iter().map(|p| p.ref_kind).collect();
    let conversion = matches!(
        decl.kind,
        MemberDeclKind::Operator(OperatorKind::Implicit | OperatorKind::Explicit)
    );
    let ret = conversion.then(|| {
        decl.ty
            .as_ref()
            .map(|t| normalized_type(t, &decl.type_params))
            .unwrap_or_default()
    });
    (decl.type_params.len(), types, ref_kinds, ret)
}

enum Conflict {
    DuplicateName,
    DuplicateSignature,
    RefKindOnly(RefKind, RefKind),
}

/// How `later` conflicts with the earlier same-named `earlier`.
fn conflict(earlier: &MemberEntity, later: &MemberEntity) -> Option<Conflict> {
    if earlier.is_implicit() {
        return None;
    }
    let class = overload_class(later.kind());
    if class == OverloadClass::NotOverloadable || class != overload_class(earlier.kind()) {
        return Some(Conflict::DuplicateName);
    }
    let (arity_a, types_a, refs_a, ret_a) = signature(earlier);
    let (arity_b, types_b, refs_b, ret_b) = signature(later);
    if arity_a != arity_b || types_a != types_b || ret_a != ret_b {
        return None;
    }
    match refs_a.iter().zip(&refs_b).find(|(a, b)| a != b) {
        None => Some(Conflict::DuplicateSignature),
        Some((a, b)) => Some(Conflict::RefKindOnly(*a, *b)),
    }
}

fn ref_kind_name(kind: RefKind) -> &'static str {
    match kind {
        RefKind::Value => "by-value",
        other => other.keyword(),
    }
}

fn report_conflict(
    diagnostics: &mut DiagnosticBag,
    type_name: &str,
    member: &MemberEntity,
    conflict: Conflict,
) {
    let location = member.location();
    match conflict {
        Conflict::DuplicateName => {
            diagnostics.add(
                diagnostic_codes::DUPLICATE_MEMBER_NAME,
                location,
                &[type_name, member.name()],
            );
        }
        Conflict::DuplicateSignature => {
            diagnostics.add(
                diagnostic_codes::DUPLICATE_SIGNATURE,
                location,
                &[type_name, member.name()],
            );
        }
        Conflict::RefKindOnly(a, b) => {
            diagnostics.add(
                diagnostic_codes::OVERLOAD_DIFFERS_ONLY_BY_REF_KIND,
                location,
                &[
                    type_name,
                    member.kind().description(),
                    ref_kind_name(a),
                    ref_kind_name(b),
                ],
            );
        }
    }
}

fn check_operator_pairs(members: &[Arc<MemberEntity>], diagnostics: &mut DiagnosticBag) {
    let present: FxHashSet<OperatorKind> = members
        .iter()
        .filter_map(|m| match m.kind() {
            MemberDeclKind::Operator(op) => Some(op),
            _ => None,
        })
        .collect();
    for member in members {
        let MemberDeclKind::Operator(op) = member.kind() else {
            continue;
        };
        if let Some(partner) = op.required_partner() {
            if !present.contains(&partner) {
                diagnostics.add(
                    diagnostic_codes::OPERATOR_REQUIRES_MATCHING,
                    member.location(),
                    &[op.token(), partner.token()],
                );
            }
        }
    }
}

/// Accessor methods reserved by properties, indexers and events, with the
/// parameter types they take.
fn reserved_accessor_names(member: &MemberEntity) -> Vec<(String, Vec<String>)> {
    let decl = member.decl();
    let value_type = decl
        .ty
        .as_ref()
        .map(|t| normalized_type(t, &[]))
        .unwrap_or_default();
    let index_params: Vec<String> = decl
        .parameters
        .iter()
        .map(|p| normalized_type(&p.ty, &[]))
        .collect();

    let declared: Vec<AccessorKind> = match decl.kind {
        MemberDeclKind::Property | MemberDeclKind::Indexer if decl.accessors.is_empty() => {
            vec![AccessorKind::Get, AccessorKind::Set]
        }
        MemberDeclKind::Event if decl.accessors.is_empty() => {
            vec![AccessorKind::Add, AccessorKind::Remove]
        }
        MemberDeclKind::Property | MemberDeclKind::Indexer | MemberDeclKind::Event => {
            decl.accessors.iter().map(|a| a.kind).collect()
        }
        _ => return Vec::new(),
    };
    declared
        .into_iter()
        .map(|kind| {
            let params = match kind {
                AccessorKind::Get => index_params.clone(),
                AccessorKind::Set => {
                    let mut params = index_params.clone();
                    params.push(value_type.clone());
                    params
                }
                AccessorKind::Add | AccessorKind::Remove => vec![value_type.clone()],
            };
            (kind.method_name(member.name()), params)
        })
        .collect()
}

fn check_reserved_accessor_names(
    members: &[Arc<MemberEntity>],
    type_name: &str,
    diagnostics: &mut DiagnosticBag,
) {
    let reserved: Vec<(String, Vec<String>)> = members
        .iter()
        .filter(|m| !m.is_implicit())
        .flat_map(|m| reserved_accessor_names(m))
        .collect();
    if reserved.is_empty() {
        return;
    }
    for member in members {
        if member.kind() != MemberDeclKind::Method || member.is_implicit() {
            continue;
        }
        let decl = member.decl();
        let params: Vec<String> = decl
            .parameters
            .iter()
            .map(|p| normalized_type(&p.ty, &decl.type_params))
            .collect();
        if reserved
            .iter()
            .any(|(name, reserved_params)| name == member.name() && *reserved_params == params)
        {
            diagnostics.add(
                diagnostic_codes::ACCESSOR_NAME_RESERVED,
                member.location(),
                &[type_name, member.name()],
            );
        }
    }
}

// =============================================================================
// Compilation entry points
// =============================================================================

impl Compilation {
    /// The early table of aggregate `id`.
    pub fn early_member_table(&self, id: EntityId) -> Option<Arc<EarlyMemberTable>> {
        let ty = self.type_entity(id)?;
        Some(ty.early_members.get_or_publish(|| build_early(&ty)).value)
    }

    /// The full table of aggregate `id`, built and published on first use.
    pub(crate) fn member_table_in(
        &self,
        id: EntityId,
        ctx: &mut ResolutionContext,
    ) -> Option<Arc<MemberTable>> {
        let ty = self.type_entity(id)?;
        let table = match ty.members.get() {
            Some(table) => Arc::clone(table),
            None => {
                let early = self.early_member_table(id)?;
                let built = MemberTableBuilder::new(self, &ty, early).build_full(ctx);
                let published = ty.members.publish(built);
                if published.won {
                    debug!(
                        owner = %ty.full_name(),
                        members = published.value.members().len(),
                        hidden = published.value.hidden().len(),
                        diagnostics = published.value.diagnostics().len(),
                        "member table published"
                    );
                }
                published.value
            }
        };
        self.register_members(&table);
        Some(table)
    }
}

#[cfg(test)]
#[path = "../tests/member_table_tests.rs"]
mod tests;
