//! Reentrancy guard for self-referential resolution.
//!
//! Binding an annotation, evaluating a constant or following a type
//! forwarder can, through a chain of lookups, ask for the very thing being
//! computed. `ReentrancyGuard` tracks the keys currently in flight on one
//! call chain and refuses to enter a key twice; the caller then treats the
//! inner request as "no match" instead of recursing.
//!
//! It combines three safety mechanisms:
//! 1. **Cycle detection** via an in-flight set (`FxHashSet<K>`)
//! 2. **Depth limiting** to prevent stack overflow
//! 3. **Iteration bounding** to prevent runaway chains
//!
//! The iteration budget belongs to one outermost entry: it starts over each
//! time the chain returns to depth zero.
//!
//! The guard is owned by a [`ResolutionContext`](crate::context::ResolutionContext),
//! never stored in thread-local state.

use rustc_hash::FxHashSet;
use sema_common::limits::{MAX_FORWARDER_CHAIN, MAX_RESOLUTION_DEPTH};
use std::hash::Hash;

// ---------------------------------------------------------------------------
// ReentrancyProfile
// ---------------------------------------------------------------------------

/// Named limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentrancyProfile {
    /// General resolution chains: annotation binding, early decoding,
    /// constant evaluation.
    ///
    /// depth = `MAX_RESOLUTION_DEPTH`, iterations = 1,000,000
    Resolution,

    /// Forwarder chains across referenced units.
    ///
    /// depth = `MAX_FORWARDER_CHAIN`, iterations = 10,000
    ForwarderChain,

    /// Custom limits for tests.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl ReentrancyProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::Resolution => MAX_RESOLUTION_DEPTH,
            Self::ForwarderChain => MAX_FORWARDER_CHAIN,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Resolution => 1_000_000,
            Self::ForwarderChain => 10_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a guarded computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// This key is already in flight on the current chain.
    Cycle,
    /// Maximum nesting depth exceeded.
    DepthExceeded,
    /// Maximum iteration count exceeded.
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    /// Returns `true` if any limit was exceeded (depth or iterations).
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }

    #[inline]
    pub fn is_denied(self) -> bool {
        !self.is_entered()
    }
}

// ---------------------------------------------------------------------------
// ReentrancyGuard
// ---------------------------------------------------------------------------

/// Tracks in-flight keys of one call chain.
///
/// ```ignore
/// match guard.enter(key) {
///     RecursionResult::Entered => {
///         let result = bind(site);
///         guard.leave(key);
///         result
///     }
///     RecursionResult::Cycle => no_match(),
///     _ => too_deep(),
/// }
/// ```
///
/// In debug builds, dropping a guard with keys still in flight panics, and so
/// does leaving a key that was never entered.
pub struct ReentrancyGuard<K: Hash + Eq + Copy> {
    in_flight: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> ReentrancyGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            in_flight: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: ReentrancyProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter the computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller **must** call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.in_flight.contains(&key) {
            return RecursionResult::Cycle;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }

        self.in_flight.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    /// Leave the computation for `key`.
    pub fn leave(&mut self, key: K) {
        let was_present = self.in_flight.remove(&key);
        debug_assert!(
            was_present,
            "ReentrancyGuard::leave() called with a key that is not in flight"
        );
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.iterations = 0;
        }
    }

    /// Clear all state so the guard can be reused for a new chain.
    pub fn reset(&mut self) {
        self.in_flight.clear();
        self.depth = 0;
        self.iterations = 0;
        self.exceeded = false;
    }

    /// Run `f` with `key` entered. `Err(reason)` if entry was denied.
    ///
    /// `f` receives the guard back so nested requests on the same chain can
    /// enter further keys.
    pub fn scope<T>(
        &mut self,
        key: K,
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
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Sticky: stays set once any limit was hit.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for ReentrancyGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.in_flight.is_empty() {
            panic!(
                "ReentrancyGuard dropped with {} keys still in flight; an enter() was not matched by leave()",
                self.in_flight.len(),
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/reentrancy_tests.rs"]
mod tests;
