use sema_common::Location;
use sema_model::AnnotationApplication;

use super::EntityCore;
use crate::completion::CompletionPart;
use crate::grants::GrantLedger;
use crate::ids::EntityId;

const UNIT_PARTS: &[CompletionPart] = &[
    CompletionPart::Identity,
    CompletionPart::Annotations,
    CompletionPart::Members,
    CompletionPart::GrantChecks,
    CompletionPart::PostChecks,
];

/// The compilation unit: the root entity owning unit-level annotations,
/// the identity and the grant ledger.
pub struct UnitEntity {
    pub(crate) core: EntityCore,
    name: String,
    applications: Vec<AnnotationApplication>,
    location: Location,
    pub(crate) ledger: GrantLedger,
}

impl UnitEntity {
    pub(crate) fn new(name: String, applications: Vec<AnnotationApplication>) -> Self {
        let location = applications
            .first()
            .map(|a| Location::synthesized_at(&a.location))
            .unwrap_or_else(|| Location::new(name.as_str(), 0, 0));
        Self {
            core: EntityCore::new(EntityId::UNIT, UNIT_PARTS),
            name,
            applications,
            location,
            ledger: GrantLedger::new(),
        }
    }

    #[inline]
    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applications(&self) -> &[AnnotationApplication] {
        &self.applications
    }

    /// Where unit-level diagnostics without a better anchor are reported.
    pub fn location(&self) -> &Location {
        &self.location
    }
}
