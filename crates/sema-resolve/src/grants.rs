//! Unit identity and the optimistic grant ledger.
//!
//! Computing the unit's identity decodes its version and key annotations,
//! and binding those can ask whether a referenced unit grants this one
//! access to its internals, which needs the identity being computed. While
//! the identity is being computed, grant checks made by the computing thread
//! are answered speculatively by comparing unit names only, and recorded.
//! Once the identity is final every recorded grant is re-checked against it;
//! a grant that no longer holds produces one diagnostic per granting unit.
//! Checks from any other thread, or after finalization, are authoritative.

use sema_common::diagnostics::diagnostic_codes;
use sema_common::{Cancelled, Diagnostic, DiagnosticBag};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::ThreadId;
use tracing::{debug, trace};

use crate::annotations::{InternalsGrant, UnitVersion};
use crate::compilation::Compilation;
use crate::completion::wait_until;
use crate::context::{GuardKey, ResolutionContext};
use crate::entity::EntityRef;
use crate::ids::ReferenceId;
use crate::publish::PublishOnce;

/// Name, version and public key of the unit being compiled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitIdentity {
    pub name: String,
    pub version: Option<UnitVersion>,
    /// Lowercase hex.
    pub public_key: Option<String>,
}

impl UnitIdentity {
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.public_key.is_some()
    }

    /// Whether `grant` names this identity.
    pub fn satisfies(&self, grant: &InternalsGrant) -> bool {
        grant.name == self.name
            && grant
                .public_key
                .as_ref()
                .is_none_or(|key| self.public_key.as_ref() == Some(key))
    }
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, ", Version={version}")?;
        }
        match &self.public_key {
            Some(key) => write!(f, ", PublicKey={key}"),
            None => f.write_str(", PublicKey=null"),
        }
    }
}

/// A grant answered by name only while the identity was being computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimisticGrant {
    pub granting: ReferenceId,
    pub grant: InternalsGrant,
}

#[derive(Clone, Debug)]
enum LedgerState {
    Idle,
    Computing(ThreadId),
    Finalized(Arc<UnitIdentity>),
}

pub(crate) struct GrantLedger {
    state: Mutex<LedgerState>,
    optimistic: Mutex<Vec<OptimisticGrant>>,
    reconciliation: PublishOnce<Vec<Diagnostic>>,
}

impl GrantLedger {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::Idle),
            optimistic: Mutex::new(Vec::new()),
            reconciliation: PublishOnce::new(),
        }
    }

    fn state(&self) -> LedgerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn finalized(&self) -> Option<Arc<UnitIdentity>> {
        match self.state() {
            LedgerState::Finalized(identity) => Some(identity),
            _ => None,
        }
    }

    /// Grants recorded so far.
    pub(crate) fn optimistic_grants(&self) -> Vec<OptimisticGrant> {
        self.optimistic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, grant: OptimisticGrant) {
        let mut list = self.optimistic.lock().unwrap_or_else(PoisonError::into_inner);
        if !list.contains(&grant) {
            list.push(grant);
        }
    }
}

impl Compilation {
    /// The unit identity, computing and finalizing it on first use.
    ///
    /// On the thread computing it, returns a tentative identity carrying
    /// only the name. Other threads wait for the final identity, giving up
    /// when `ctx` is cancelled. Grant reconciliation is published before the
    /// identity is observable as final.
    pub(crate) fn identity_in(
        &self,
        ctx: &mut ResolutionContext,
    ) -> Result<Arc<UnitIdentity>, Cancelled> {
        let ledger = &self.unit().ledger;
        {
            let mut state = ledger.state.lock().unwrap_or_else(PoisonError::into_inner);
            let current = ctx.thread();
            match state.clone() {
                LedgerState::Finalized(identity) => return Ok(identity),
                LedgerState::Computing(thread) if thread == current => {
                    trace!("tentative identity served to the computing thread");
                    return Ok(Arc::new(self.tentative_identity()));
                }
                LedgerState::Computing(_) => {
                    drop(state);
                    wait_until(ctx.cancel_token(), || ledger.finalized().is_some())?;
                    return Ok(ledger
                        .finalized()
                        .unwrap_or_else(|| Arc::new(self.tentative_identity())));
                }
                LedgerState::Idle => *state = LedgerState::Computing(current),
            }
        }

        let unit = EntityRef::Unit(self.unit_arc());
        let early = ctx
            .guarded(GuardKey::Identity, |ctx| self.early_annotations(&unit, ctx))
            .unwrap_or_default();
        let identity = Arc::new(UnitIdentity {
            name: self.unit().name().to_string(),
            version: early.version,
            public_key: early.public_key.clone(),
        });
        ledger
            .reconciliation
            .get_or_publish(|| self.reconcile_grants(&identity));
        *ledger.state.lock().unwrap_or_else(PoisonError::into_inner) =
            LedgerState::Finalized(Arc::clone(&identity));
        debug!(identity = %identity, "unit identity finalized");
        Ok(identity)
    }

    fn tentative_identity(&self) -> UnitIdentity {
        UnitIdentity {
            name: self.unit().name().to_string(),
            version: None,
            public_key: None,
        }
    }

    /// Grants `reference` declares, skipping malformed ones.
    fn declared_grants(&self, reference: ReferenceId) -> Vec<InternalsGrant> {
        self.reference(reference)
            .map(|r| {
                r.internals_visible_to
                    .iter()
                    .filter_map(|text| InternalsGrant::parse(text).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `reference` grants this unit access to its internals.
    pub fn check_access(&self, reference: ReferenceId, ctx: &mut ResolutionContext) -> bool {
        let grants = self.declared_grants(reference);
        if grants.is_empty() {
            return false;
        }
        let speculative = matches!(
            self.unit().ledger.state(),
            LedgerState::Computing(thread) if thread == ctx.thread()
        );
        if speculative {
            let name = self.unit().name();
            let Some(grant) = grants.into_iter().find(|g| g.name == name) else {
                return false;
            };
            trace!(granting = reference.0, grant = %grant.name, "optimistic grant recorded");
            self.unit().ledger.record(OptimisticGrant {
                granting: reference,
                grant,
            });
            return true;
        }
        match self.identity_in(ctx) {
            Ok(identity) => grants.iter().any(|g| identity.satisfies(g)),
            Err(Cancelled) => {
                trace!(granting = reference.0, "grant check cancelled while waiting for identity");
                let tentative = self.tentative_identity();
                grants.iter().any(|g| tentative.satisfies(g))
            }
        }
    }

    /// Re-check every optimistic grant against the final identity.
    fn reconcile_grants(&self, identity: &UnitIdentity) -> Vec<Diagnostic> {
        let mut diagnostics = DiagnosticBag::new();
        let location = self.unit().location();
        let mut reported: Vec<ReferenceId> = Vec::new();

        for optimistic in self.unit().ledger.optimistic_grants() {
            let granting = optimistic.granting;
            if reported.contains(&granting) {
                continue;
            }
            let grants = self.declared_grants(granting);
            if grants.iter().any(|g| identity.satisfies(g)) {
                continue;
            }
            let Some(reference) = self.reference(granting) else {
                continue;
            };
            reported.push(granting);
            if identity.public_key.is_none() {
                diagnostics.add(
                    diagnostic_codes::GRANT_SIGNING_MISMATCH,
                    location,
                    &[&reference.name],
                );
            } else {
                diagnostics.add(
                    diagnostic_codes::GRANT_KEY_MISMATCH,
                    location,
                    &[&reference.name, &identity.to_string()],
                );
            }
            debug!(granting = %reference.name, "optimistic grant invalidated");
        }
        diagnostics.into_vec()
    }

    /// Diagnostics of grant reconciliation; empty before finalization.
    pub(crate) fn grant_diagnostics(&self) -> Vec<Diagnostic> {
        let ledger = &self.unit().ledger;
        match ledger.finalized() {
            Some(identity) => ledger
                .reconciliation
                .get_or_publish(|| self.reconcile_grants(&identity))
                .value
                .as_ref()
                .clone(),
            None => Vec::new(),
        }
    }

    /// Authoritative answer to whether `reference` grants this unit access,
    /// finalizing the identity first.
    pub fn are_internals_visible(&self, reference: ReferenceId) -> bool {
        let identity = self.identity();
        self.declared_grants(reference)
            .iter()
            .any(|g| identity.satisfies(g))
    }

    /// The final unit identity.
    pub fn identity(&self) -> Arc<UnitIdentity> {
        self.identity_in(&mut ResolutionContext::uncancellable())
            .unwrap_or_else(|Cancelled| Arc::new(self.tentative_identity()))
    }
}

#[cfg(test)]
#[path = "../tests/grants_tests.rs"]
mod tests;
