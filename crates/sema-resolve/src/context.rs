//! Explicit per-call-chain resolution state.

use sema_common::{CancellationToken, Cancelled};
use smallvec::SmallVec;
use std::thread::{self, ThreadId};
use tracing::trace;

use crate::completion::CompletionPart;
use crate::ids::EntityId;
use crate::reentrancy::{ReentrancyGuard, ReentrancyProfile, RecursionResult};

/// Keys guarded against re-entry on one call chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardKey {
    /// Computing the unit identity.
    Identity,
    /// Early (pass 1) annotation decoding of an entity.
    EarlyAnnotations(EntityId),
    /// Binding one annotation application. `slot` 0 is the entity's own
    /// list; raw member lists read during member-table construction use the
    /// member's declaration ordinal plus one.
    AnnotationSite {
        owner: EntityId,
        slot: u32,
        index: u32,
    },
    /// Evaluating the constant value of a field, by early-table ordinal.
    ConstantField { owner: EntityId, field: u32 },
    /// Following a forwarder declared by a referenced unit.
    ForwarderSite { unit: u32, forwarder: u32 },
}

/// State threaded through every resolution call made on behalf of one
/// public request.
///
/// Carries the requesting thread (speculative grants are valid only there),
/// the cancellation token, the reentrancy guard, and the completion parts the
/// chain currently holds claims on.
pub struct ResolutionContext {
    thread: ThreadId,
    cancel: CancellationToken,
    guard: ReentrancyGuard<GuardKey>,
    claims: SmallVec<[(EntityId, CompletionPart); 8]>,
}

impl ResolutionContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self::with_profile(cancel, ReentrancyProfile::Resolution)
    }

    pub fn with_profile(cancel: CancellationToken, profile: ReentrancyProfile) -> Self {
        Self {
            thread: thread::current().id(),
            cancel,
            guard: ReentrancyGuard::with_profile(profile),
            claims: SmallVec::new(),
        }
    }

    /// A context that is never cancelled.
    pub fn uncancellable() -> Self {
        Self::new(CancellationToken::none())
    }

    #[inline]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    #[inline]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[inline]
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        self.cancel.check()
    }

    pub fn enter(&mut self, key: GuardKey) -> RecursionResult {
        let result = self.guard.enter(key);
        if result.is_denied() {
            trace!(?key, ?result, "reentrant resolution refused");
        }
        result
    }

    pub fn leave(&mut self, key: GuardKey) {
        self.guard.leave(key);
    }

    /// Run `f` with `key` entered.
    pub fn guarded<T>(
        &mut self,
        key: GuardKey,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f(self);
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_in_flight(&self, key: GuardKey) -> bool {
        self.guard.is_in_flight(&key)
    }

    pub fn depth(&self) -> u32 {
        self.guard.depth()
    }

    /// Whether this chain is itself executing `part` of `id`.
    pub fn holds_claim(&self, id: EntityId, part: CompletionPart) -> bool {
        self.claims.contains(&(id, part))
    }

    pub(crate) fn push_claim(&mut self, id: EntityId, part: CompletionPart) {
        self.claims.push((id, part));
    }

    pub(crate) fn pop_claim(&mut self, id: EntityId, part: CompletionPart) {
        let popped = self.claims.pop();
        debug_assert_eq!(popped, Some((id, part)), "claims released out of order");
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::uncancellable()
    }
}
