use sema_common::Location;
use sema_model::{AccessorKind, AnnotationApplication, MemberDecl, MemberDeclKind, RefKind};
use std::sync::Arc;

use super::EntityCore;
use crate::completion::CompletionPart;
use crate::ids::EntityId;
use crate::member_table::EarlyField;
use crate::publish::PublishOnce;
use crate::type_resolution::ResolvedType;

const MEMBER_PARTS: &[CompletionPart] = &[CompletionPart::Annotations, CompletionPart::MemberChecks];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberOrigin {
    /// Written in source; `ordinal` indexes the owner's declared members.
    Declared { ordinal: u32 },
    /// Backing field of a field-like event.
    ImplicitBackingField { event_ordinal: u32 },
    /// Injected by the named synthesizer.
    Synthesized(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartialRole {
    Definition,
    Implementation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialLink {
    pub role: PartialRole,
    /// The other half of the pair; `None` when it is missing.
    pub partner: Option<EntityId>,
}

/// An accessor and, for paired partial members, the location of the
/// matching accessor on the other half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedAccessor {
    pub kind: AccessorKind,
    pub location: Location,
    pub partner: Option<Location>,
}

/// Resolved types of a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSignature {
    /// Field, property or event type, or return type (`void` when absent).
    pub ty: ResolvedType,
    pub parameters: Vec<(RefKind, ResolvedType)>,
}

/// A member of an aggregate.
pub struct MemberEntity {
    pub(crate) core: EntityCore,
    owner: EntityId,
    name: String,
    decl: Arc<MemberDecl>,
    origin: MemberOrigin,
    applications: Vec<AnnotationApplication>,
    hidden: bool,
    partial: Option<PartialLink>,
    accessors: Vec<LinkedAccessor>,
    early_field: Option<Arc<EarlyField>>,
    pub(crate) signature: PublishOnce<MemberSignature>,
}

impl MemberEntity {
    pub(crate) fn new(
        id: EntityId,
        owner: EntityId,
        name: String,
        decl: Arc<MemberDecl>,
        origin: MemberOrigin,
    ) -> Self {
        let applications = match origin {
            MemberOrigin::Declared { .. } => decl.annotations.clone(),
            _ => Vec::new(),
        };
        let accessors = decl
            .accessors
            .iter()
            .map(|a| LinkedAccessor {
                kind: a.kind,
                location: a.location.clone(),
                partner: None,
            })
            .collect();
        Self {
            core: EntityCore::new(id, MEMBER_PARTS),
            owner,
            name,
            decl,
            origin,
            applications,
            hidden: false,
            partial: None,
            accessors,
            early_field: None,
            signature: PublishOnce::new(),
        }
    }

    pub(crate) fn with_applications(mut self, applications: Vec<AnnotationApplication>) -> Self {
        self.applications = applications;
        self
    }

    pub(crate) fn with_partial(mut self, link: PartialLink, hidden: bool) -> Self {
        self.partial = Some(link);
        self.hidden = hidden;
        self
    }

    pub(crate) fn with_accessors(mut self, accessors: Vec<LinkedAccessor>) -> Self {
        self.accessors = accessors;
        self
    }

    pub(crate) fn with_early_field(mut self, field: Option<Arc<EarlyField>>) -> Self {
        self.early_field = field;
        self
    }

    #[inline]
    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.core.id()
    }

    #[inline]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Name in the member table: the metadata name, with `IndexerName`
    /// applied to indexers.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MemberDeclKind {
        self.decl.kind
    }

    pub fn decl(&self) -> &MemberDecl {
        &self.decl
    }

    #[inline]
    pub fn origin(&self) -> MemberOrigin {
        self.origin
    }

    /// Implicit and synthesized members have no declaration of their own.
    pub fn is_implicit(&self) -> bool {
        !matches!(self.origin, MemberOrigin::Declared { .. })
    }

    pub fn applications(&self) -> &[AnnotationApplication] {
        &self.applications
    }

    pub fn location(&self) -> &Location {
        &self.decl.location
    }

    /// Hidden members are implementation halves of partial pairs: completed
    /// with their owner, never returned by member lookups.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn partial(&self) -> Option<PartialLink> {
        self.partial
    }

    pub fn accessors(&self) -> &[LinkedAccessor] {
        &self.accessors
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.decl.is_static()
    }

    pub fn is_field(&self) -> bool {
        self.decl.kind == MemberDeclKind::Field
    }

    pub(crate) fn early_field(&self) -> Option<&Arc<EarlyField>> {
        self.early_field.as_ref()
    }

    /// The signature, once the member's checks have run.
    pub fn signature(&self) -> Option<&Arc<MemberSignature>> {
        self.signature.get()
    }
}

impl std::fmt::Debug for MemberEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberEntity")
            .field("id", &self.id())
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("kind", &self.decl.kind)
            .field("origin", &self.origin)
            .field("hidden", &self.hidden)
            .finish()
    }
}
