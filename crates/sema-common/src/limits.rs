//! Centralized limits and thresholds for the semantic model.
//!
//! Recursion limits for re-entrant resolution are expressed as
//! `ReentrancyProfile`s in `sema-resolve`; the values they use live here so
//! there is one place to tune them.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum number of struct fields followed from the root during one layout
/// cycle check.
///
/// Expanding generic recursion (`S<T> { S<S<T>> f; }`) produces a new
/// instantiation at every level. The traversal refuses to descend past this
/// depth instead of overflowing the stack.
pub const MAX_STRUCT_LAYOUT_DEPTH: u32 = 64;

/// Maximum depth of nested resolution requests on one `ResolutionContext`.
///
/// Each annotation binding, constant evaluation and forwarder hop enters the
/// reentrancy guard once. Chains deeper than this are treated like cycles.
pub const MAX_RESOLUTION_DEPTH: u32 = 256;

/// Maximum number of forwarder hops followed when resolving a type through
/// referenced units.
pub const MAX_FORWARDER_CHAIN: u32 = 32;

/// Maximum length of a declared base-class chain walked by circularity checks.
pub const MAX_BASE_CHAIN_DEPTH: u32 = 128;

// =============================================================================
// Waiting
// =============================================================================

/// Busy-spin iterations before a waiter starts yielding its time slice.
pub const WAIT_SPIN_ITERATIONS: u32 = 64;

/// Yield iterations before a waiter starts sleeping between checks.
pub const WAIT_YIELD_ITERATIONS: u32 = 1_024;

/// Sleep used once spinning and yielding have not seen progress.
pub const WAIT_SLEEP_MICROS: u64 = 50;
