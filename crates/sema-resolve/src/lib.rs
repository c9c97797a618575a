//! Incremental Symbol Completion and Annotation Resolution
//!
//! Entities of a [`Compilation`] (the unit, its aggregates and their
//! members) are completed lazily, one part at a time, from any number of
//! threads. The pieces:
//!
//! - **Completion state**: per-entity part states with one claimant per part
//! - **Reentrancy guard**: per-request cut-off for self-dependent lookups
//! - **Annotation bags**: early (pre-binding) and full decoding, sealed once
//! - **Grant ledger**: optimistic internals-visibility answers while the unit
//!   identity is computed, reconciled afterwards
//! - **Member tables**: partial-member merging, conflict checks, synthesis
//! - **Struct layout**: cycle detection through instance fields
//!
//! Every derived artifact is published once; losing computations are
//! discarded along with their diagnostics.

pub mod annotations;
pub mod base_types;
pub mod compilation;
pub mod completion;
pub mod constants;
pub mod context;
pub mod entity;
pub mod field_usage;
pub mod grants;
pub mod ids;
pub mod member_table;
mod partial_members;
pub mod publish;
pub mod reentrancy;
pub mod struct_layout;
pub mod synthesize;
pub mod type_resolution;

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
mod fixtures;

pub use annotations::{AnnotationBag, AnnotationResolver, DefaultAnnotationResolver, WellKnownAnnotation};
pub use compilation::{Compilation, CompilationBuilder, CompilationOptions, DiagnosticSink};
pub use completion::{CompletionOutcome, CompletionPart, CompletionScope, PartState};
pub use context::{GuardKey, ResolutionContext};
pub use entity::{EntityRef, MemberEntity, MemberOrigin, TypeEntity, UnitEntity};
pub use grants::UnitIdentity;
pub use ids::{EntityId, ReferenceId};
pub use reentrancy::{ReentrancyGuard, RecursionResult};
pub use synthesize::{MemberSynthesizer, SynthesisContext};
pub use type_resolution::ResolvedType;
