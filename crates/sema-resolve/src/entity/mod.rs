//! Semantic entities.
//!
//! Three entity kinds share one [`EntityCore`]: the compilation unit, the
//! aggregates (classes, structs, interfaces, enums) and their members. The
//! core carries the completion state, the publish-once annotation slots and
//! the diagnostics appended by the phases the entity has executed.

mod aggregate;
mod member;
mod unit;

pub use aggregate::{DeclaredMember, TypeEntity};
pub use member::{LinkedAccessor, MemberEntity, MemberOrigin, MemberSignature, PartialLink, PartialRole};
pub use unit::UnitEntity;

use sema_common::{Diagnostic, Location};
use sema_model::{AnnotationApplication, MemberDeclKind, TypeKind};
use std::sync::{Arc, Mutex, PoisonError};

use crate::annotations::{AnnotationBag, AnnotationTargets, EarlyAnnotationData};
use crate::completion::{CompletionPart, CompletionState};
use crate::ids::EntityId;
use crate::publish::PublishOnce;

/// State shared by every entity kind.
pub struct EntityCore {
    id: EntityId,
    state: CompletionState,
    pub(crate) early: PublishOnce<EarlyAnnotationData>,
    pub(crate) bag: PublishOnce<AnnotationBag>,
    diagnostics: EntityDiagnostics,
}

impl EntityCore {
    pub(crate) fn new(id: EntityId, parts: &[CompletionPart]) -> Self {
        Self {
            id,
            state: CompletionState::new(parts),
            early: PublishOnce::new(),
            bag: PublishOnce::new(),
            diagnostics: EntityDiagnostics::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> &CompletionState {
        &self.state
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    pub(crate) fn append_diagnostics(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

/// Diagnostics owned by one entity.
///
/// Appended only by the thread executing a claimed phase of the entity, so
/// each phase contributes its diagnostics exactly once.
#[derive(Default)]
pub struct EntityDiagnostics {
    list: Mutex<Vec<Diagnostic>>,
}

impl EntityDiagnostics {
    fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(diagnostics);
    }

    fn snapshot(&self) -> Vec<Diagnostic> {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Borrowed view of any entity.
#[derive(Clone)]
pub enum EntityRef {
    Unit(Arc<UnitEntity>),
    Type(Arc<TypeEntity>),
    Member(Arc<MemberEntity>),
}

impl EntityRef {
    pub fn core(&self) -> &EntityCore {
        match self {
            Self::Unit(u) => &u.core,
            Self::Type(t) => &t.core,
            Self::Member(m) => &m.core,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.core().id()
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unit(u) => u.name(),
            Self::Type(t) => t.full_name(),
            Self::Member(m) => m.name(),
        }
    }

    /// The raw annotation applications of the entity, in source order.
    pub fn applications(&self) -> &[AnnotationApplication] {
        match self {
            Self::Unit(u) => u.applications(),
            Self::Type(t) => t.applications(),
            Self::Member(m) => m.applications(),
        }
    }

    /// Every location the entity is declared at.
    pub fn locations(&self) -> Vec<&Location> {
        match self {
            Self::Unit(u) => vec![u.location()],
            Self::Type(t) => t.fragments().iter().map(|f| &f.location).collect(),
            Self::Member(m) => vec![m.location()],
        }
    }

    /// The aggregate against which names in annotation arguments and type
    /// references are resolved.
    pub fn scope_owner(&self) -> Option<EntityId> {
        match self {
            Self::Unit(_) => None,
            Self::Type(t) => Some(t.id()),
            Self::Member(m) => Some(m.owner()),
        }
    }

    /// Declaration kind used to validate annotation targets.
    pub fn annotation_target(&self) -> AnnotationTargets {
        match self {
            Self::Unit(_) => AnnotationTargets::UNIT,
            Self::Type(t) => match t.kind() {
                TypeKind::Class => AnnotationTargets::CLASS,
                TypeKind::Struct => AnnotationTargets::STRUCT,
                TypeKind::Interface => AnnotationTargets::INTERFACE,
                TypeKind::Enum => AnnotationTargets::ENUM,
            },
            Self::Member(m) => member_target(m.kind()),
        }
    }
}

pub(crate) fn member_target(kind: MemberDeclKind) -> AnnotationTargets {
    match kind {
        MemberDeclKind::Field => AnnotationTargets::FIELD,
        MemberDeclKind::Method | MemberDeclKind::Operator(_) => AnnotationTargets::METHOD,
        MemberDeclKind::Constructor | MemberDeclKind::StaticConstructor => {
            AnnotationTargets::CONSTRUCTOR
        }
        MemberDeclKind::Property => AnnotationTargets::PROPERTY,
        MemberDeclKind::Indexer => AnnotationTargets::INDEXER,
        MemberDeclKind::Event => AnnotationTargets::EVENT,
    }
}
