//! Per-entity completion state.
//!
//! Every entity completes a fixed, totally ordered sequence of parts. Each
//! part is an independent atomic moving `NotStarted -> Claimed -> Done`; the
//! first thread to claim a part runs it, everyone else waits for `Done`.
//! `Done` is monotonic.

use sema_common::limits::{WAIT_SLEEP_MICROS, WAIT_SPIN_ITERATIONS, WAIT_YIELD_ITERATIONS};
use sema_common::{CancellationToken, Cancelled, Location};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use crate::ids::EntityId;

/// Named completion steps in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CompletionPart {
    /// Unit identity (name, version, key) and grant finalization.
    Identity = 0,
    /// The entity's annotation bag.
    Annotations,
    /// Declared base class and partial-declaration consistency.
    BaseType,
    Interfaces,
    /// Completion of every child entity. Never claimed; marked done by the
    /// first caller that observes all children complete.
    Members,
    /// Member-table conflicts for aggregates, signature checks for members.
    MemberChecks,
    StructLayout,
    /// Reconciliation of speculative grants.
    GrantChecks,
    /// Unused-field registration and reporting.
    PostChecks,
}

pub const PART_COUNT: usize = 9;

impl CompletionPart {
    pub const ALL: [CompletionPart; PART_COUNT] = [
        Self::Identity,
        Self::Annotations,
        Self::BaseType,
        Self::Interfaces,
        Self::Members,
        Self::MemberChecks,
        Self::StructLayout,
        Self::GrantChecks,
        Self::PostChecks,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CompletionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PartState {
    NotStarted = 0,
    Claimed = 1,
    Done = 2,
}

impl PartState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::NotStarted,
            1 => Self::Claimed,
            _ => Self::Done,
        }
    }
}

/// Completion state of one entity.
pub struct CompletionState {
    parts: [AtomicU8; PART_COUNT],
}

impl CompletionState {
    /// Parts not listed in `applicable` start out Done.
    pub fn new(applicable: &[CompletionPart]) -> Self {
        let parts = std::array::from_fn(|i| {
            let part = CompletionPart::ALL[i];
            let initial = if applicable.contains(&part) {
                PartState::NotStarted
            } else {
                PartState::Done
            };
            AtomicU8::new(initial as u8)
        });
        Self { parts }
    }

    #[inline]
    pub fn state(&self, part: CompletionPart) -> PartState {
        PartState::from_u8(self.parts[part.index()].load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_done(&self, part: CompletionPart) -> bool {
        self.state(part) == PartState::Done
    }

    /// The first part, in order, that is not Done.
    pub fn next_incomplete(&self) -> Option<CompletionPart> {
        CompletionPart::ALL
            .into_iter()
            .find(|&part| !self.is_done(part))
    }

    pub fn is_complete(&self) -> bool {
        self.next_incomplete().is_none()
    }

    /// Try to become the executor of `part`. On `true` the caller must run
    /// the part and then call [`mark_done`](Self::mark_done).
    pub fn try_claim(&self, part: CompletionPart) -> bool {
        self.parts[part.index()]
            .compare_exchange(
                PartState::NotStarted as u8,
                PartState::Claimed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Finish a claimed part.
    pub fn mark_done(&self, part: CompletionPart) {
        let previous = self.parts[part.index()].swap(PartState::Done as u8, Ordering::AcqRel);
        debug_assert_eq!(
            PartState::from_u8(previous),
            PartState::Claimed,
            "{part} marked done without being claimed"
        );
    }

    /// Give up a claimed part without finishing it; another request may
    /// claim it again.
    pub fn release(&self, part: CompletionPart) {
        let previous = self.parts[part.index()].swap(PartState::NotStarted as u8, Ordering::AcqRel);
        debug_assert_eq!(
            PartState::from_u8(previous),
            PartState::Claimed,
            "{part} released without being claimed"
        );
    }

    /// Mark a part Done because its precondition was observed, without a
    /// claim. Several observers may race; all of them agree.
    pub fn mark_observed(&self, part: CompletionPart) {
        self.parts[part.index()].store(PartState::Done as u8, Ordering::Release);
    }

    /// Wait until `part` is no longer claimed: Done, or released by an
    /// executor that was cancelled.
    ///
    /// Never returns `Ok` while the part is still claimed. Checks `cancel`
    /// on every iteration.
    pub fn wait_while_claimed(
        &self,
        part: CompletionPart,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        wait_until(cancel, || self.state(part) != PartState::Claimed)
    }
}

impl fmt::Debug for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for part in CompletionPart::ALL {
            list.entry(&part, &self.state(part));
        }
        list.finish()
    }
}

/// Spin, then yield, then sleep until `ready` returns `true`.
pub(crate) fn wait_until(
    cancel: &CancellationToken,
    mut ready: impl FnMut() -> bool,
) -> Result<(), Cancelled> {
    let mut iterations: u32 = 0;
    loop {
        if ready() {
            return Ok(());
        }
        cancel.check()?;
        if iterations < WAIT_SPIN_ITERATIONS {
            std::hint::spin_loop();
        } else if iterations < WAIT_SPIN_ITERATIONS + WAIT_YIELD_ITERATIONS {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(WAIT_SLEEP_MICROS));
        }
        iterations = iterations.saturating_add(1);
    }
}

// =============================================================================
// Scoped completion requests
// =============================================================================

/// Restricts which children a completion request descends into.
///
/// A restricted request that skips any child ends with
/// [`CompletionOutcome::Partial`]; the entity's `Members` part and every part
/// after it stay incomplete until an unrestricted request finishes them.
#[derive(Clone, Default)]
pub struct CompletionScope {
    location: Option<Location>,
    filter: Option<Arc<dyn Fn(EntityId) -> bool + Send + Sync>>,
}

impl CompletionScope {
    /// Complete everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only children whose declaration intersects `location`.
    pub fn at(location: Location) -> Self {
        Self {
            location: Some(location),
            filter: None,
        }
    }

    /// Additionally require `filter` to accept the child.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(EntityId) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.location.is_none() && self.filter.is_none()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Whether a child declared at `locations` may be completed.
    pub fn admits<'a>(&self, id: EntityId, mut locations: impl Iterator<Item = &'a Location>) -> bool {
        if let Some(scope) = &self.location {
            if !locations.any(|loc| loc.intersects(scope)) {
                return false;
            }
        }
        self.filter.as_ref().is_none_or(|f| f(id))
    }
}

impl fmt::Debug for CompletionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionScope")
            .field("location", &self.location)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// How far a completion request got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Every part is Done.
    Complete,
    /// The request stopped early: its scope excluded a child, or it reached
    /// a part its own call chain is still executing.
    Partial,
}

#[cfg(test)]
#[path = "../tests/completion_tests.rs"]
mod tests;
