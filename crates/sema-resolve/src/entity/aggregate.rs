use sema_common::Location;
use sema_model::{AnnotationApplication, MemberDecl, PrimitiveKind, TypeDecl, TypeKind};
use std::sync::{Arc, Mutex};

use super::EntityCore;
use crate::base_types::{BaseTypeOutcome, InterfacesOutcome};
use crate::completion::CompletionPart;
use crate::ids::EntityId;
use crate::member_table::{EarlyMemberTable, MemberTable};
use crate::publish::PublishOnce;
use crate::struct_layout::StructLayoutOutcome;

const CLASS_PARTS: &[CompletionPart] = &[
    CompletionPart::Annotations,
    CompletionPart::BaseType,
    CompletionPart::Interfaces,
    CompletionPart::Members,
    CompletionPart::MemberChecks,
    CompletionPart::PostChecks,
];

const STRUCT_PARTS: &[CompletionPart] = &[
    CompletionPart::Annotations,
    CompletionPart::BaseType,
    CompletionPart::Interfaces,
    CompletionPart::Members,
    CompletionPart::MemberChecks,
    CompletionPart::StructLayout,
    CompletionPart::PostChecks,
];

/// One member declaration as written, with its position among all declared
/// members of the aggregate (fragments in source order).
#[derive(Clone, Debug)]
pub struct DeclaredMember {
    pub ordinal: u32,
    pub fragment: u32,
    pub decl: Arc<MemberDecl>,
}

/// A class, struct, interface or enum, possibly declared in several
/// fragments.
pub struct TypeEntity {
    pub(crate) core: EntityCore,
    full_name: String,
    name: String,
    kind: TypeKind,
    containing: Option<EntityId>,
    namespace: Option<String>,
    fragments: Vec<Arc<TypeDecl>>,
    applications: Vec<AnnotationApplication>,
    declared: Vec<DeclaredMember>,
    nested: Vec<EntityId>,
    type_params: Vec<String>,
    primitive: Option<PrimitiveKind>,
    pub(crate) early_members: PublishOnce<EarlyMemberTable>,
    pub(crate) members: PublishOnce<MemberTable>,
    pub(crate) base: PublishOnce<BaseTypeOutcome>,
    pub(crate) interfaces: PublishOnce<InterfacesOutcome>,
    pub(crate) layout: PublishOnce<StructLayoutOutcome>,
    pub(crate) unused_registered: Mutex<bool>,
}

impl TypeEntity {
    /// `fragments` must be non-empty and sorted by location.
    pub(crate) fn new(
        id: EntityId,
        full_name: String,
        containing: Option<EntityId>,
        fragments: Vec<Arc<TypeDecl>>,
        nested: Vec<EntityId>,
    ) -> Self {
        let first = &fragments[0];
        let kind = first.kind;
        let parts = if kind == TypeKind::Struct {
            STRUCT_PARTS
        } else {
            CLASS_PARTS
        };

        let applications = fragments
            .iter()
            .flat_map(|f| f.annotations.iter().cloned())
            .collect();
        let mut declared = Vec::new();
        for (fragment, decl) in fragments.iter().enumerate() {
            for member in &decl.members {
                declared.push(DeclaredMember {
                    ordinal: declared.len() as u32,
                    fragment: fragment as u32,
                    decl: Arc::new(member.clone()),
                });
            }
        }

        Self {
            core: EntityCore::new(id, parts),
            name: first.name.clone(),
            namespace: first.namespace.clone(),
            type_params: first.type_params.clone(),
            primitive: fragments.iter().find_map(|f| f.primitive),
            full_name,
            kind,
            containing,
            applications,
            declared,
            nested,
            fragments,
            early_members: PublishOnce::new(),
            members: PublishOnce::new(),
            base: PublishOnce::new(),
            interfaces: PublishOnce::new(),
            layout: PublishOnce::new(),
            unused_registered: Mutex::new(false),
        }
    }

    #[inline]
    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.core.id()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn containing(&self) -> Option<EntityId> {
        self.containing
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn fragments(&self) -> &[Arc<TypeDecl>] {
        &self.fragments
    }

    /// Location of the first fragment.
    pub fn location(&self) -> &Location {
        &self.fragments[0].location
    }

    pub fn applications(&self) -> &[AnnotationApplication] {
        &self.applications
    }

    pub fn declared_members(&self) -> &[DeclaredMember] {
        &self.declared
    }

    pub fn nested_types(&self) -> &[EntityId] {
        &self.nested
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    /// The builtin value type this struct implements, if any.
    #[inline]
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        self.primitive
    }

    /// Whether any fragment satisfies `predicate`.
    pub fn any_fragment(&self, predicate: impl Fn(&TypeDecl) -> bool) -> bool {
        self.fragments.iter().any(|f| predicate(f))
    }
}
