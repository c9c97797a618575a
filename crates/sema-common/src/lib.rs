//! Common types and utilities for the sema semantic model.
//!
//! This crate provides foundational types used across all sema crates:
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, message table)
//! - Source spans and locations (`Span`, `Location`)
//! - Engine limits and thresholds
//! - Cooperative cancellation (`CancellationToken`)

// Diagnostic types and the static message table
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCategory};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Location, Span};

// Centralized limits and thresholds
pub mod limits;

// Cooperative cancellation shared by all long-running entry points
pub mod cancellation;
pub use cancellation::{CancellationToken, Cancelled};
