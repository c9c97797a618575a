//! Tracking of fields that are never read or never written.
//!
//! Uses `DashMap` because reads and writes are noted by whatever thread
//! analyzes a body, while candidates are registered by the thread that
//! completes the owning aggregate. Usage noted before registration is kept.

use dashmap::DashMap;
use sema_common::diagnostics::diagnostic_codes;
use sema_common::{Diagnostic, DiagnosticBag, Location};
use sema_model::{Accessibility, Modifiers};
use std::sync::Arc;
use tracing::trace;

use crate::entity::MemberEntity;
use crate::ids::EntityId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldUsage {
    pub read: bool,
    pub written: bool,
}

#[derive(Clone, Debug)]
struct Candidate {
    name: String,
    location: Location,
}

#[derive(Default)]
pub struct FieldUsageTracker {
    candidates: DashMap<EntityId, Candidate>,
    usage: DashMap<EntityId, FieldUsage>,
}

impl FieldUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `member` is checked for use: a private, non-constant field
    /// written in source without an initializer.
    pub fn is_candidate(member: &MemberEntity) -> bool {
        let decl = member.decl();
        member.is_field()
            && !member.is_implicit()
            && decl.accessibility() == Accessibility::Private
            && !decl.modifiers.contains(Modifiers::CONST)
            && !decl.has_initializer
    }

    /// Register the candidate fields among `members`. Returns how many were
    /// registered.
    pub fn register_candidates<'a>(
        &self,
        members: impl IntoIterator<Item = &'a Arc<MemberEntity>>,
    ) -> usize {
        let mut count = 0;
        for member in members {
            if !Self::is_candidate(member) {
                continue;
            }
            self.candidates.insert(
                member.id(),
                Candidate {
                    name: member.name().to_string(),
                    location: member.location().clone(),
                },
            );
            count += 1;
        }
        count
    }

    pub fn note_read(&self, field: EntityId) {
        self.usage.entry(field).or_default().read = true;
    }

    pub fn note_written(&self, field: EntityId) {
        self.usage.entry(field).or_default().written = true;
    }

    pub fn usage(&self, field: EntityId) -> FieldUsage {
        self.usage.get(&field).map(|u| *u).unwrap_or_default()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Diagnostics for every registered candidate, in location order.
    pub fn report(&self) -> Vec<Diagnostic> {
        let mut unused: Vec<(u32, Candidate)> = Vec::new();
        for entry in &self.candidates {
            let usage = self.usage(*entry.key());
            let code = match (usage.read, usage.written) {
                (false, false) => diagnostic_codes::FIELD_NEVER_USED,
                (true, false) => diagnostic_codes::FIELD_NEVER_ASSIGNED,
                (false, true) => diagnostic_codes::FIELD_ASSIGNED_NEVER_READ,
                (true, true) => continue,
            };
            unused.push((code, entry.value().clone()));
        }
        unused.sort_by(|(_, a), (_, b)| a.location.cmp(&b.location));

        let mut diagnostics = DiagnosticBag::new();
        for (code, candidate) in unused {
            trace!(field = %candidate.name, code, "unused field");
            diagnostics.add(code, &candidate.location, &[&candidate.name]);
        }
        diagnostics.into_vec()
    }
}

#[cfg(test)]
#[path = "../tests/field_usage_tests.rs"]
mod tests;
